//! Trigger and operator authentication.
//!
//! Two independent credentials guard the gateway: a shared secret for
//! machine triggers (schedulers, upstream billing events) and a bearer
//! token for platform operators. Both fail closed: an endpoint whose
//! credential is not configured rejects every request.

use axum::http::HeaderMap;

use crate::error::ApiError;

const API_KEY_HEADER: &str = "x-api-key";

/// Credentials accepted by the gateway.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Shared secret for webhook triggers. Accepted from the `x-api-key`
    /// header or an `api_key` field in the JSON body.
    pub api_key: Option<String>,
    /// Bearer token for operator endpoints.
    pub operator_token: Option<String>,
}

impl AuthConfig {
    /// Authenticate a webhook trigger.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the secret is absent, wrong,
    /// or not configured at all.
    pub fn verify_trigger(
        &self,
        headers: &HeaderMap,
        body_key: Option<&str>,
    ) -> Result<(), ApiError> {
        let Some(expected) = self.api_key.as_deref() else {
            return Err(ApiError::Unauthorized);
        };
        let header_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        if header_key == Some(expected) || body_key == Some(expected) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Authenticate a platform operator via `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is absent, wrong,
    /// or not configured at all.
    pub fn verify_operator(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = self.operator_token.as_deref() else {
            return Err(ApiError::Unauthorized);
        };
        let token = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if token == Some(expected) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
