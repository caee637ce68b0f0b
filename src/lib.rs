pub mod adaptive;
pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::state::AppState;

pub fn create_app(config: &Config) -> axum::Router {
    app_with_state(AppState::from_config(config))
}

pub fn app_with_state(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
