use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use oncall_core::{Schedule, Team};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::http::error::ApiError;
use crate::parse::{format_clock, weekday_name};

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub name: String,
    pub members: Vec<String>,
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

impl From<&Schedule> for ScheduleView {
    fn from(s: &Schedule) -> Self {
        Self {
            name: s.name.clone(),
            members: s.members.clone(),
            days: s.days.iter().map(|d| weekday_name(*d).to_string()).collect(),
            start: format_clock(s.start),
            end: format_clock(s.end),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    pub team: String,
    pub schedules: Vec<ScheduleView>,
}

impl From<&Team> for TeamResponse {
    fn from(team: &Team) -> Self {
        Self {
            team: team.name.clone(),
            schedules: team.schedules.iter().map(ScheduleView::from).collect(),
        }
    }
}

/// GET /teams/{team}
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(team): Path<String>,
) -> Result<Json<TeamResponse>, ApiError> {
    let team = state
        .store()
        .get_team(&team)
        .await?
        .ok_or_else(|| ApiError::NotFound("team not found".into()))?;
    Ok(Json(TeamResponse::from(&team)))
}
