use askama::Template;
use axum::extract::Query;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::views::render;

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    user_name: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    next: String,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
struct SignupTemplate {
    next: String,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl NextQuery {
    /// Post-login destination, restricted to local paths.
    fn destination(&self) -> String {
        match self.next.as_deref() {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
            _ => "/projects".to_string(),
        }
    }
}

pub async fn landing_page(auth: Option<AuthUser>) -> Result<impl IntoResponse, AppError> {
    render(&LandingTemplate {
        user_name: auth.map(|a| a.name),
    })
}

pub async fn login_page(
    auth: Option<AuthUser>,
    Query(q): Query<NextQuery>,
) -> Result<Response, AppError> {
    // If already logged in, skip the form
    if auth.is_some() {
        return Ok(Redirect::to(&q.destination()).into_response());
    }

    Ok(render(&LoginTemplate {
        next: q.destination(),
    })?
    .into_response())
}

pub async fn signup_page(
    auth: Option<AuthUser>,
    Query(q): Query<NextQuery>,
) -> Result<Response, AppError> {
    if auth.is_some() {
        return Ok(Redirect::to(&q.destination()).into_response());
    }

    Ok(render(&SignupTemplate {
        next: q.destination(),
    })?
    .into_response())
}
