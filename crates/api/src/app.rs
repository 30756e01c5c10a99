use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{Identity, PlayService};
use persistence::repositories::MatchRepository;
use shared::crypto::KeyError;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, play};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub play: Arc<PlayService>,
}

impl AppState {
    /// Builds the state, decoding the identity key from `config`.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, KeyError> {
        let identity = Identity::new(config.signed_key()?, config.identity.email_domain.clone());
        Ok(Self {
            pool,
            config: Arc::new(config),
            play: Arc::new(PlayService::new(identity)),
        })
    }

    /// Match factory configured with the generation retry budget.
    pub fn matches(&self) -> MatchRepository {
        MatchRepository::new(self.pool.clone())
            .with_max_generation_attempts(self.config.play.max_generation_attempts)
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, KeyError> {
    Ok(router(AppState::new(config, pool)?))
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let play_routes = Router::new()
        .route("/play/h/:uhash", post(play::land))
        .route("/play/code", post(play::code))
        .route("/play/sign", post(play::sign))
        .route("/play/start", post(play::start))
        .route("/play/next", post(play::next))
        .route("/play/rankings/:match_uid", get(play::rankings));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(play_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
