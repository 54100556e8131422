use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::user::models::Principal;
use crate::domain::user::ports::AuthGatePort;
use crate::inbound::http::router::AppState;

/// Establish the request's principal from an `Authorization: Bearer` token.
///
/// Runs on every route and never rejects: a missing or invalid token leaves
/// the request `Anonymous`. A principal already present in the extensions is
/// passed to the gate so the first established identity wins.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let current = req.extensions().get::<Principal>().cloned().unwrap_or_default();
    let token = bearer_token(req.headers()).map(str::to_owned);

    let principal = state
        .auth_gate
        .authenticate_request(&current, token.as_deref())
        .await;

    req.extensions_mut().insert(principal);

    next.run(req).await
}

/// Reject anonymous requests to protected routes.
///
/// Exposes the identity to handlers as an `AuthenticatedIdentity` extension.
pub async fn require_authenticated(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<Principal>()
        .and_then(Principal::identity)
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Token from an `Authorization: Bearer <token>` header, if well formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
