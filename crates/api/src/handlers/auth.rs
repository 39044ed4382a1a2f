use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{
        header::{COOKIE, SET_COOKIE, USER_AGENT},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sessionauth_auth::{AuthError, ClientInfo, LoginRequest, SignupRequest};
use sessionauth_models::UserProfile;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Raw query pairs. Repeated keys are kept, and the first `action` wins.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct ActionQuery(Vec<(String, String)>);

impl ActionQuery {
    pub fn action(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.as_str())
    }
}

/// `GET /api/auth?action=...`
pub async fn get_action(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    match query.action() {
        Some("me") => me(&state, &headers).await,
        other => {
            tracing::debug!(action = ?other, "Unknown GET auth action");
            Err(not_found_error())
        }
    }
}

/// `POST /api/auth?action=...`
pub async fn post_action(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    match query.action() {
        Some("signup") => signup(&state, &headers, &body).await,
        Some("login") => login(&state, &headers, &body).await,
        Some("logout") => logout(&state, &headers).await,
        other => {
            tracing::debug!(action = ?other, "Unknown POST auth action");
            Err(not_found_error())
        }
    }
}

async fn signup(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<Response, ApiError> {
    let request: SignupRequest = parse_body(body)?;
    let issued = state
        .auth_service
        .signup(request, &client_info(headers))
        .await
        .map_err(error_response)?;

    Ok(ok_with_cookie(issued.set_cookie))
}

async fn login(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<Response, ApiError> {
    let request: LoginRequest = parse_body(body)?;
    let issued = state
        .auth_service
        .login(request, &client_info(headers))
        .await
        .map_err(error_response)?;

    Ok(ok_with_cookie(issued.set_cookie))
}

async fn logout(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let cookie = cookie_header(headers);
    let cleared = state
        .auth_service
        .logout(cookie.as_deref())
        .await
        .map_err(error_response)?;

    Ok(ok_with_cookie(cleared))
}

/// The current user's profile, or JSON `null` when there is no live session.
async fn me(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let cookie = cookie_header(headers);
    let user: Option<UserProfile> = state
        .auth_service
        .me(cookie.as_deref())
        .await
        .map_err(error_response)?;

    Ok(Json(user).into_response())
}

/// `GET /api/session`, behind `require_session`.
pub async fn current_session(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(user)
}

pub async fn not_found() -> ApiError {
    not_found_error()
}

fn not_found_error() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("not_found", "Not found")),
    )
}

/// Map a service error onto the wire. Internal failures are logged here and
/// reach the client only as a generic 500.
pub fn error_response(err: AuthError) -> ApiError {
    let (status, code, message) = match &err {
        AuthError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.clone()),
        AuthError::EmailConflict => (StatusCode::CONFLICT, "email_taken", err.to_string()),
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string()),
        AuthError::DatabaseError(_) | AuthError::PasswordHashError(_) | AuthError::Internal(_) => {
            tracing::error!("Auth request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse::new(code, &message)))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        error_response(AuthError::ValidationError("Invalid request body".to_string()))
    })
}

fn ok_with_cookie(set_cookie: String) -> Response {
    ([(SET_COOKIE, set_cookie)], Json(OkResponse { ok: true })).into_response()
}

/// All `Cookie` headers of the request, joined as one.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    (!joined.is_empty()).then_some(joined)
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // Left-most entry is the originating client.
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_owned);

    ClientInfo { user_agent, ip_address }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn query(raw: &str) -> ActionQuery {
        serde_urlencoded::from_str(raw).unwrap()
    }

    #[test]
    fn test_first_action_wins() {
        assert_eq!(query("action=me").action(), Some("me"));
        assert_eq!(query("action=me&action=logout").action(), Some("me"));
        assert_eq!(query("x=1&action=login").action(), Some("login"));
        assert_eq!(query("").action(), None);
        assert_eq!(query("actions=me").action(), None);
    }

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7, 10.0.0.1"));

        let client = client_info(&headers);
        assert_eq!(client.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(client.ip_address.as_deref(), Some("203.0.113.7"));

        let client = client_info(&HeaderMap::new());
        assert!(client.user_agent.is_none());
        assert!(client.ip_address.is_none());
    }

    #[test]
    fn test_cookie_headers_are_joined() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie_header(&headers), None);

        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("session_token=abc"));
        assert_eq!(
            cookie_header(&headers).as_deref(),
            Some("theme=dark; session_token=abc")
        );
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (AuthError::ValidationError("bad".into()), StatusCode::BAD_REQUEST, "invalid_input"),
            (AuthError::EmailConflict, StatusCode::CONFLICT, "email_taken"),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED, "invalid_credentials"),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
            (
                AuthError::Internal("pool exhausted".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (err, status, code) in cases {
            let (got_status, Json(body)) = error_response(err);
            assert_eq!(got_status, status);
            assert_eq!(body.error, code);
        }
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let (_, Json(body)) = error_response(AuthError::Internal("pool exhausted".into()));
        assert!(!body.message.contains("pool"));
    }
}
