use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::AuthenticatedIdentity;
use crate::domain::user::models::Authority;

/// Report the identity the request is acting as.
pub async fn me(
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Result<ApiSuccess<MeResponseData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, (&identity).into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeResponseData {
    pub username: String,
    pub authorities: Vec<Authority>,
}

impl From<&AuthenticatedIdentity> for MeResponseData {
    fn from(identity: &AuthenticatedIdentity) -> Self {
        Self {
            username: identity.username.as_str().to_string(),
            authorities: identity.authorities.clone(),
        }
    }
}
