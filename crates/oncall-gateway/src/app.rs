use std::sync::Arc;

use axum::{routing::get, Router};
use oncall_core::config::OncallConfig;
use oncall_schedules::{Resolver, ScheduleStore};

/// Shared state, handed to every handler as `Arc<AppState>`.
pub struct AppState {
    pub config: OncallConfig,
    pub resolver: Resolver,
}

impl AppState {
    pub fn new(config: OncallConfig, store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            config,
            resolver: Resolver::new(store),
        }
    }

    /// The store chosen at startup; the resolver reads through the same one.
    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        self.resolver.store()
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/schedule",
            get(crate::http::schedule::get_oncall).post(crate::http::schedule::create_schedule),
        )
        .route("/teams/{team}", get(crate::http::teams::get_team))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
