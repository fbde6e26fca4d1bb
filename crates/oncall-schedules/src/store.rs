use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use oncall_core::config::{StorageBackend, StorageConfig};
use oncall_core::{Schedule, Team};
use tracing::info;

use crate::durable::DurableStore;
use crate::error::Result;
use crate::volatile::VolatileStore;

/// Capability shared by every schedule store.
///
/// Implementations do not validate schedules; callers run
/// [`Schedule::validate`] first.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Which backend this is, for logs and the health endpoint.
    fn backend(&self) -> StorageBackend;

    /// Insert `schedule` under `team`, creating the team if needed. Either the
    /// whole schedule becomes visible or nothing does.
    async fn add_schedule(&self, team: &str, schedule: Schedule) -> Result<()>;

    /// All schedules for `team`, or `None` if the team has never been seen.
    async fn get_team(&self, team: &str) -> Result<Option<Team>>;

    /// Who is on call for `team` at `at`: the first schedule whose window
    /// contains `at` decides, using this store's rotation policy. `None` for
    /// an unknown team, no matching window, or an empty rotation.
    async fn get_current_oncall(&self, team: &str, at: DateTime<FixedOffset>)
        -> Result<Option<String>>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the store selected by `config.backend`.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn ScheduleStore>> {
    let store: Arc<dyn ScheduleStore> = match config.backend {
        StorageBackend::Memory => Arc::new(VolatileStore::new()),
        StorageBackend::Sqlite => Arc::new(DurableStore::open(
            &config.path,
            Duration::from_millis(config.busy_timeout_ms),
        )?),
    };
    info!(backend = %config.backend, "schedule store ready");
    Ok(store)
}
