//! Request extractors for the caller's identity and language

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;
use crate::i18n;
use crate::state::AppState;

/// Set by the auth gateway in front of the API.
pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Carries `ALERT_HOOK_SECRET` on calls from the market watcher.
pub const HOOK_SECRET_HEADER: &str = "X-Alert-Hook-Secret";

/// A trusted internal caller, such as the price-tick hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookCaller;

#[async_trait]
impl FromRequestParts<AppState> for HookCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.alert_hook_secret.as_deref() else {
            warn!("Refused hook call, ALERT_HOOK_SECRET is not set");
            return Err(ApiError::Unauthorized);
        };
        let supplied = parts.headers.get(HOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());
        if supplied != Some(secret) {
            warn!("Rejected hook call with a missing or wrong secret");
            return Err(ApiError::Unauthorized);
        }
        Ok(HookCaller)
    }
}

/// Response language picked from `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lang(pub String);

impl Lang {
    pub fn t(&self, key: &str) -> String {
        i18n::translate(&self.0, key, None)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Lang {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Lang(i18n::locale_from_headers(&parts.headers, &state.default_locale).to_string()))
    }
}
