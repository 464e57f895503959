use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::SharedState;

pub const ACCESS_COOKIE: &str = "access_token";

/// Fixed identity used when `COGNABASE_BYPASS_AUTH` is on.
pub const DEV_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_7000_8000_0000_0000_0001);
pub const DEV_USER_EMAIL: &str = "dev@localhost.test";
pub const DEV_USER_NAME: &str = "Dev User";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
}

impl AuthUser {
    pub fn dev() -> Self {
        AuthUser {
            user_id: DEV_USER_ID,
            name: DEV_USER_NAME.to_string(),
        }
    }

    /// Resolve the session without rejecting; invalid tokens read as signed out.
    fn resolve(parts: &Parts, state: &SharedState) -> Option<AuthUser> {
        if state.config.bypass_auth {
            return Some(AuthUser::dev());
        }

        let token = bearer_token(parts).or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(ACCESS_COOKIE)
                .map(|c| c.value().to_string())
        })?;

        jwt::decode_token(&token, &state.config.jwt_secret)
            .ok()
            .map(|claims| AuthUser {
                user_id: claims.sub,
                name: claims.name,
            })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.bypass_auth {
            return Ok(AuthUser::dev());
        }

        // Try Bearer token from Authorization header first
        if let Some(token) = bearer_token(parts) {
            let claims = jwt::decode_token(&token, &state.config.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

            return Ok(AuthUser {
                user_id: claims.sub,
                name: claims.name,
            });
        }

        // Try cookie-based auth
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(ACCESS_COOKIE) {
            let claims = jwt::decode_token(cookie.value(), &state.config.jwt_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

            return Ok(AuthUser {
                user_id: claims.sub,
                name: claims.name,
            });
        }

        Err(AppError::Unauthorized(
            "Missing authentication token".to_string(),
        ))
    }
}

/// `Option<AuthUser>` for pages that render for both visitors and users.
impl OptionalFromRequestParts<SharedState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(AuthUser::resolve(parts, state))
    }
}
