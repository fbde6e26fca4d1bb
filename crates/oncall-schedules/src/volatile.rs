use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use oncall_core::config::StorageBackend;
use oncall_core::{Schedule, Team};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::rotation::first_member;
use crate::store::ScheduleStore;
use crate::window;

/// In-process schedule store. Nothing survives a restart and there is no
/// rotation pointer: a matching schedule always resolves to its first member.
///
/// Writers take the lock exclusively only while appending; lookups share it.
#[derive(Debug, Default)]
pub struct VolatileStore {
    teams: RwLock<HashMap<String, Vec<Schedule>>>,
}

impl VolatileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for VolatileStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn add_schedule(&self, team: &str, schedule: Schedule) -> Result<()> {
        let name = schedule.name.clone();
        {
            // A panicking writer cannot leave a half-appended Vec behind, so
            // the map is still consistent after poisoning.
            let mut teams = self.teams.write().unwrap_or_else(PoisonError::into_inner);
            let schedules = teams.entry(team.to_string()).or_default();
            if schedules.iter().any(|s| s.name == schedule.name) {
                return Err(StoreError::DuplicateSchedule {
                    team: team.to_string(),
                    name,
                });
            }
            schedules.push(schedule);
        }
        info!(%team, schedule = %name, "schedule added");
        Ok(())
    }

    async fn get_team(&self, team: &str) -> Result<Option<Team>> {
        let teams = self.teams.read().unwrap_or_else(PoisonError::into_inner);
        Ok(teams.get(team).map(|schedules| Team {
            name: team.to_string(),
            schedules: schedules.clone(),
        }))
    }

    async fn get_current_oncall(
        &self,
        team: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<String>> {
        let teams = self.teams.read().unwrap_or_else(PoisonError::into_inner);
        let Some(schedules) = teams.get(team) else {
            return Ok(None);
        };
        let oncall = schedules
            .iter()
            .find(|s| window::matches(s, &at))
            .and_then(|s| first_member(&s.members))
            .map(str::to_owned);
        Ok(oncall)
    }
}
