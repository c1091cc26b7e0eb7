use crate::handlers;
use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use terminus_metrics_config::Config;
use terminus_metrics_pipeline::{
    MetricsSource,
    Pipeline,
    Presenter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
    pub presenter: Arc<Presenter>,
}

pub fn create_router(config: Config, source: Arc<dyn MetricsSource>) -> Router {
    let state = AppState {
        presenter: Arc::new(Presenter::new(&config.dashboard)),
        config: Arc::new(config),
        pipeline: Pipeline::new(source),
    };

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/", get(handlers::dashboard))
        .route("/metrics.csv", get(handlers::metrics_csv))
        .route("/api/metrics", get(handlers::metrics_json))
        .route("/sites", get(handlers::sites))
        .route("/api/sites", get(handlers::sites_json))
        .with_state(state)
}
