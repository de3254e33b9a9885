use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod movies;
mod observability;
pub mod rate_limit;
mod types;
mod validation;

pub use error::ApiError;
pub use observability::RequestUser;
pub use rate_limit::SharedLimiter;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub auth_limiter: SharedLimiter,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn search_service(&self) -> &Arc<crate::services::SearchService> {
        &self.shared.search_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let auth_limiter = rate_limit::create_limiter(&shared.config.security.auth_rate_limit);

    Arc::new(AppState {
        shared,
        auth_limiter,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .nest("/auth", auth_router(state.clone()))
        .nest("/movies", movies_router())
        .route("/health", get(observability::health));

    // Credentialed CORS cannot use wildcards, so only listed origins are allowed.
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter(|s| s.as_str() != "*")
        .filter_map(|s| s.parse().ok())
        .collect();
    let cors_layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .nest("/api", api_router)
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn auth_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let limited = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route_layer(middleware::from_fn_with_state(
            state.auth_limiter.clone(),
            rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

fn movies_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(movies::search_movies))
        .route("/genres", get(movies::list_genres))
        .route("/details/{id}", get(movies::get_movie_details))
}
