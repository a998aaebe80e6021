//! Bearer-token middleware for admin routes

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use sailor_common::api::verify_token;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Header naming the admin performing a charge
pub const ADMIN_EMAIL_HEADER: &str = "x-admin-email";

/// Authentication middleware
///
/// Expects `Authorization: Bearer <token>` whose SHA-256 matches the stored
/// hash. A stored hash of `0` lets every request through.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Err(e) = verify_token(token, &state.token_hash) {
        warn!(path = %request.uri().path(), error = %e, "Admin request rejected");
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

/// Admin email from `x-admin-email`, if sent
pub fn admin_email(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(ADMIN_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
