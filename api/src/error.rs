use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::i18n;
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    /// Carries the locale key of the message shown to the user.
    #[error("bad request: {0}")]
    BadRequest(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Locale key of a failed response, attached for [`localize_errors`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorKey(pub &'static str);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ApiError::NotFound => "error_not_found",
            ApiError::BadRequest(key) => *key,
            ApiError::Unauthorized => "error_unauthorized",
            ApiError::Internal(_) => "error_internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }
        let key = self.key();
        let mut response = (self.status_code(), Json(json!({ "error": key }))).into_response();
        response.extensions_mut().insert(ErrorKey(key));
        response
    }
}

/// Rewrites error bodies into the caller's language.
pub async fn localize_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let locale = i18n::locale_from_headers(req.headers(), &state.default_locale).to_string();
    let response = next.run(req).await;

    let Some(ErrorKey(key)) = response.extensions().get::<ErrorKey>().copied() else {
        return response;
    };
    let status = response.status();
    (status, Json(json!({ "error": i18n::translate(&locale, key, None) }))).into_response()
}
