use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::store::ScheduleStore;

/// Maps `(team, instant)` to the single identity on duty.
///
/// Holds no cache: every call asks the store again, so a rotation change is
/// visible on the very next lookup.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn ScheduleStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    pub async fn resolve(
        &self,
        team: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<String, ResolveError> {
        match self.store.get_current_oncall(team, at).await? {
            Some(oncall) => {
                info!(%team, %oncall, time = %at.to_rfc3339(), "oncall resolved");
                Ok(oncall)
            }
            None => {
                debug!(%team, time = %at.to_rfc3339(), "no oncall member");
                Err(ResolveError::NotFound {
                    team: team.to_string(),
                })
            }
        }
    }
}
