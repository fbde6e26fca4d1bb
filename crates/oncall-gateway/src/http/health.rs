use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::app::AppState;

/// GET /health. Answers 503 when the store does not respond to a ping.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let backend = state.store().backend();
    let (status, store) = match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!(error = %e, %backend, "store ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    let label = if status.is_success() { "ok" } else { "degraded" };
    (
        status,
        Json(json!({
            "status": label,
            "version": env!("CARGO_PKG_VERSION"),
            "backend": backend.to_string(),
            "listen": state.config.listen_addr(),
            "store": store,
        })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{DateTime, FixedOffset};
    use oncall_core::config::StorageBackend;
    use oncall_core::{Schedule, Team};
    use oncall_schedules::{DurableStore, ScheduleStore, StoreError};

    use crate::app::testing::*;

    #[tokio::test]
    async fn memory_store_is_healthy() {
        let (router, _) = memory_app();
        let (status, body) = send(&router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["listen"], "0.0.0.0:1373");
    }

    #[tokio::test]
    async fn sqlite_store_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = DurableStore::open(
            dir.path().join("oncall.db"),
            std::time::Duration::from_millis(500),
        )
        .unwrap();
        let (router, _) = app_with(Arc::new(store));
        let (status, body) = send(&router, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "sqlite");
        assert_eq!(body["store"], "ok");
    }

    struct DeadStore;

    #[async_trait]
    impl ScheduleStore for DeadStore {
        fn backend(&self) -> StorageBackend {
            StorageBackend::Sqlite
        }

        async fn add_schedule(&self, _team: &str, _schedule: Schedule) -> oncall_schedules::Result<()> {
            Ok(())
        }

        async fn get_team(&self, _team: &str) -> oncall_schedules::Result<Option<Team>> {
            Ok(None)
        }

        async fn get_current_oncall(
            &self,
            _team: &str,
            _at: DateTime<FixedOffset>,
        ) -> oncall_schedules::Result<Option<String>> {
            Ok(None)
        }

        async fn ping(&self) -> oncall_schedules::Result<()> {
            Err(StoreError::Task("gone".into()))
        }
    }

    #[tokio::test]
    async fn failed_ping_is_503() {
        let (router, _) = app_with(Arc::new(DeadStore));
        let (status, body) = send(&router, get("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["store"], "unavailable");
    }
}
