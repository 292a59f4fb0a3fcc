use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::health))
        .route("/add-thread", post(handlers::add_thread))
        .route("/thread-to-notion", post(handlers::add_thread))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::handlers::{ImportRequest, ImportResponse};
    pub use crate::{create_app, AppState};
    pub use pn_core::{Error, Result};
}
