use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Reject any request whose x-admin-token header does not pass the gate.
/// Stateless: nothing is stored per request and no expiry is enforced.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if !state.gate.authorizes(token) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
