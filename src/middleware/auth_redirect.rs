use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

/// Redirects 401 responses from dashboard pages to the sign-in page,
/// remembering where the user was headed.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let target = req.uri().path().to_string();
    let response = next.run(req).await;
    if response.status() == StatusCode::UNAUTHORIZED {
        Redirect::to(&login_url(&target)).into_response()
    } else {
        response
    }
}

/// Only same-site absolute paths are carried over.
pub fn login_url(next: &str) -> String {
    if next.starts_with('/') && !next.starts_with("//") && next != "/" {
        format!("/auth/login?next={next}")
    } else {
        "/auth/login".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_keeps_local_paths_only() {
        assert_eq!(login_url("/projects"), "/auth/login?next=/projects");
        assert_eq!(login_url("/"), "/auth/login");
        assert_eq!(login_url("//evil.example.com"), "/auth/login");
    }
}
