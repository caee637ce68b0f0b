mod adaptive;
mod health;

use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let healthcheck_endpoint = normalize_healthcheck_endpoint(
        std::env::var("HEALTHCHECK_ENDPOINT")
            .ok()
            .as_deref()
            .unwrap_or("/health"),
    );

    let mut app = Router::new().nest("/api/adaptive", adaptive::router());

    app = app.nest("/health", health::router());
    if healthcheck_endpoint != "/health" && healthcheck_endpoint != "/" {
        app = app.nest(healthcheck_endpoint.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

fn normalize_healthcheck_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "/health".to_string();
    }

    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if with_slash != "/" {
        with_slash.trim_end_matches('/').to_string()
    } else {
        "/".to_string()
    }
}

async fn fallback_handler() -> Response {
    AppError::not_found("Route not found").into_response()
}
