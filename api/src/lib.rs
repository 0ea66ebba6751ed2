pub mod auth;
pub mod error;
pub mod i18n;
pub mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

// Initialize i18n at crate root (required by rust-i18n)
rust_i18n::i18n!("locales", fallback = "en");

pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(middleware::from_fn_with_state(state.clone(), error::localize_errors))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
