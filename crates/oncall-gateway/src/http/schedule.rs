use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use oncall_core::{Schedule, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::http::error::ApiError;
use crate::parse::{parse_clock, parse_instant, parse_weekday};

/// Body of `POST /schedule`. Every field is optional at the serde level so a
/// missing field becomes a validation message rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateScheduleRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl CreateScheduleRequest {
    /// Check required fields, parse days and clock times, then run the
    /// domain invariants. Returns the team name and a normalized schedule.
    pub fn into_schedule(self) -> Result<(String, Schedule), ValidationError> {
        let team = self.team.trim().to_string();
        if team.is_empty() {
            return Err(ValidationError::MissingTeam);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.members.is_empty() {
            return Err(ValidationError::NoMembers);
        }
        if self.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        if self.start.trim().is_empty() {
            return Err(ValidationError::MissingStart);
        }
        if self.end.trim().is_empty() {
            return Err(ValidationError::MissingEnd);
        }

        let days = self
            .days
            .iter()
            .map(|d| parse_weekday(d).ok_or_else(|| ValidationError::InvalidDay(d.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let start = parse_clock(&self.start).ok_or(ValidationError::InvalidStartTime)?;
        let end = parse_clock(&self.end).ok_or(ValidationError::InvalidEndTime)?;

        let schedule = Schedule {
            name: self.name.trim().to_string(),
            members: self.members.into_iter().map(|m| m.trim().to_string()).collect(),
            days,
            start,
            end,
        };
        schedule.validate()?;
        Ok((team, schedule.normalized()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub team: String,
    pub name: String,
}

/// POST /schedule
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "rejected schedule body");
        ApiError::BadRequest("invalid request body".into())
    })?;
    let (team, schedule) = req.into_schedule()?;
    let name = schedule.name.clone();

    state.store().add_schedule(&team, schedule).await?;
    info!(%team, schedule = %name, "schedule created");

    Ok((StatusCode::CREATED, Json(CreatedResponse { team, name })))
}

#[derive(Debug, Deserialize)]
pub struct OncallQuery {
    pub team: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OncallResponse {
    pub team: String,
    pub oncall: String,
}

/// GET /schedule?team=..&time=..
pub async fn get_oncall(
    State(state): State<Arc<AppState>>,
    Query(q): Query<OncallQuery>,
) -> Result<Json<OncallResponse>, ApiError> {
    let team = q
        .team
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("team query parameter is required".into()))?;
    let time = q
        .time
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("time query parameter is required".into()))?;
    let at = parse_instant(&time)
        .ok_or_else(|| ApiError::BadRequest("invalid time format, use RFC3339 format".into()))?;

    let oncall = state.resolver.resolve(&team, at).await?;
    Ok(Json(OncallResponse { team, oncall }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{DateTime, FixedOffset, Weekday};
    use oncall_core::config::StorageBackend;
    use oncall_core::Team;
    use oncall_schedules::{ScheduleStore, StoreError};
    use serde_json::{json, Value};

    use super::*;
    use crate::app::testing::*;

    fn weekday_body() -> Value {
        json!({
            "name": "Weekday",
            "team": "ops",
            "members": ["Alice", "Bob"],
            "days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            "start": "9:00AM",
            "end": "5:00PM"
        })
    }

    fn request(value: Value) -> CreateScheduleRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_converts_to_normalized_schedule() {
        let mut body = weekday_body();
        body["days"] = json!(["monday", "Monday", "FRIDAY"]);
        let (team, schedule) = request(body).into_schedule().unwrap();
        assert_eq!(team, "ops");
        assert_eq!(schedule.days, vec![Weekday::Mon, Weekday::Fri]);
        assert_eq!(schedule.members, vec!["Alice", "Bob"]);
    }

    #[test]
    fn validation_messages() {
        let cases: Vec<(&str, Value, &str)> = vec![
            ("team", json!(""), "team is required"),
            ("name", json!("  "), "name is required"),
            ("members", json!([]), "at least one member is required"),
            ("members", json!(["Alice", " "]), "member names must not be blank"),
            ("days", json!([]), "at least one day is required"),
            ("start", json!(""), "start time is required"),
            ("end", json!(""), "end time is required"),
            ("days", json!(["Monday", "Funday"]), "invalid day: Funday"),
            ("start", json!("17:00"), "invalid start time format, use '3:04PM' format"),
            ("end", json!("late"), "invalid end time format, use '3:04PM' format"),
            ("start", json!("6:00PM"), "start time must be before end time"),
            ("end", json!("9:00AM"), "start time must be before end time"),
        ];
        for (field, value, message) in cases {
            let mut body = weekday_body();
            body[field] = value;
            let err = request(body).into_schedule().unwrap_err();
            assert_eq!(err.to_string(), message, "field {field}");
        }
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let err = request(json!({"team": "ops"})).into_schedule().unwrap_err();
        assert_eq!(err, ValidationError::MissingName);
    }

    #[tokio::test]
    async fn create_then_resolve() {
        let (router, _) = memory_app();
        let (status, body) = send(&router, post_json("/schedule", &weekday_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["team"], "ops");
        assert_eq!(body["name"], "Weekday");

        let (status, body) =
            send(&router, get("/schedule?team=ops&time=2025-04-28T10:00:00Z")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"team": "ops", "oncall": "Alice"}));
    }

    #[tokio::test]
    async fn resolve_with_encoded_offset() {
        let (router, _) = memory_app();
        send(&router, post_json("/schedule", &weekday_body())).await;

        // 10:00 local in +05:00 is 05:00 UTC, still inside the local window.
        let (status, body) = send(
            &router,
            get("/schedule?team=ops&time=2025-04-28T10:00:00%2B05:00"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["oncall"], "Alice");
    }

    #[tokio::test]
    async fn no_match_is_404() {
        let (router, _) = memory_app();
        send(&router, post_json("/schedule", &weekday_body())).await;

        for uri in [
            "/schedule?team=ops&time=2025-04-26T10:00:00Z",
            "/schedule?team=ops&time=2025-04-28T17:01:00Z",
            "/schedule?team=dev&time=2025-04-28T10:00:00Z",
        ] {
            let (status, body) = send(&router, get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "no oncall member found");
        }
    }

    #[tokio::test]
    async fn query_errors() {
        let (router, _) = memory_app();
        for (uri, message) in [
            ("/schedule?time=2025-04-28T10:00:00Z", "team query parameter is required"),
            ("/schedule?team=&time=2025-04-28T10:00:00Z", "team query parameter is required"),
            ("/schedule?team=ops", "time query parameter is required"),
            ("/schedule?team=ops&time=", "time query parameter is required"),
            ("/schedule?team=ops&time=invalid-time", "invalid time format, use RFC3339 format"),
        ] {
            let (status, body) = send(&router, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], message, "{uri}");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let (router, _) = memory_app();
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/schedule")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid request body");
    }

    #[tokio::test]
    async fn invalid_schedule_is_400_and_not_stored() {
        let (router, state) = memory_app();
        let mut body = weekday_body();
        body["end"] = json!("8:00AM");
        let (status, resp) = send(&router, post_json("/schedule", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "start time must be before end time");
        assert!(state.store().get_team("ops").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_name_is_409() {
        let (router, _) = memory_app();
        let (status, _) = send(&router, post_json("/schedule", &weekday_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&router, post_json("/schedule", &weekday_body())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("Weekday"));
    }

    struct FailingStore;

    #[async_trait]
    impl ScheduleStore for FailingStore {
        fn backend(&self) -> StorageBackend {
            StorageBackend::Sqlite
        }

        async fn add_schedule(&self, _team: &str, _schedule: Schedule) -> oncall_schedules::Result<()> {
            Err(StoreError::Corrupt("disk on fire".into()))
        }

        async fn get_team(&self, _team: &str) -> oncall_schedules::Result<Option<Team>> {
            Err(StoreError::Corrupt("disk on fire".into()))
        }

        async fn get_current_oncall(
            &self,
            _team: &str,
            _at: DateTime<FixedOffset>,
        ) -> oncall_schedules::Result<Option<String>> {
            Err(StoreError::Corrupt("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_500_without_detail() {
        let (router, _) = app_with(std::sync::Arc::new(FailingStore));

        let (status, body) = send(&router, post_json("/schedule", &weekday_body())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");

        let (status, body) =
            send(&router, get("/schedule?team=ops&time=2025-04-28T10:00:00Z")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
    }
}
