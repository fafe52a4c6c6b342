pub mod appointments;
pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod health;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Bearer-token check shared by every `/api` route.
pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
