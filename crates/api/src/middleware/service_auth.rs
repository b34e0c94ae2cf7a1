//! Shared-key authentication for service-to-service callers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rfs_core::error::CoreError;
use rfs_core::secret::secret_matches;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the caller presented `INTERNAL_API_KEY` as a Bearer token.
///
/// Add it as a handler parameter to guard an endpoint:
///
/// ```ignore
/// async fn notify_order(_auth: ServiceAuth, Path(id): Path<Uuid>) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
///
/// When no key is configured every request is rejected.
#[derive(Debug, Clone, Copy)]
pub struct ServiceAuth;

impl FromRequestParts<AppState> for ServiceAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <key>".into(),
            ))
        })?;

        if !secret_matches(Some(token), state.notify_config.internal_api_key.as_deref()) {
            tracing::warn!(path = %parts.uri.path(), "Rejected internal request with bad key");
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid API key".into(),
            )));
        }

        Ok(ServiceAuth)
    }
}
