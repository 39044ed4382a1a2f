use crate::handlers::auth::{cookie_header, error_response, ApiError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sessionauth_models::UserProfile;
use std::sync::Arc;

/// The user behind the request's session, inserted by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

/// Middleware to require a live session cookie
pub async fn require_session(
    State(state): State<Arc<crate::AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie = cookie_header(&headers);
    let user = state
        .auth_service
        .require_user(cookie.as_deref())
        .await
        .map_err(error_response)?;

    tracing::debug!(user_id = %user.id, "Session guard passed");
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
