use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, Utc, Weekday};
use oncall_core::config::StorageBackend;
use oncall_core::{Schedule, Team};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::rotation::{member_at, RotationState};
use crate::store::ScheduleStore;
use crate::window;

const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite-backed schedule store with a persisted rotation pointer per
/// schedule. Resolution returns whoever the pointer designates.
///
/// The store only keeps the database path. Every operation opens its own
/// connection on a blocking worker, so no in-process lock is held while
/// SQLite does I/O; atomicity comes from SQLite transactions.
#[derive(Debug, Clone)]
pub struct DurableStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl DurableStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent_dir(&path);
        let conn = connect(&path, busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_db(&conn)?;
        info!(path = %path.display(), "durable schedule store opened");
        Ok(Self { path, busy_timeout })
    }

    /// Advance the rotation of `team`/`schedule` by one member and return the
    /// new on-call handle. `None` when the team or schedule is unknown or the
    /// schedule has nobody to rotate through.
    pub async fn advance_rotation(
        &self,
        team: &str,
        schedule: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let team = team.to_string();
        let schedule = schedule.to_string();
        self.with_conn(move |conn| advance_rotation(conn, &team, &schedule, now))
            .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;
        tokio::task::spawn_blocking(move || {
            let mut conn = connect(&path, busy_timeout)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl ScheduleStore for DurableStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    async fn add_schedule(&self, team: &str, schedule: Schedule) -> Result<()> {
        let team = team.to_string();
        let name = schedule.name.clone();
        let log_team = team.clone();
        let schedule_id = self
            .with_conn(move |conn| insert_schedule(conn, &team, &schedule, Utc::now()))
            .await?;
        info!(team = %log_team, schedule = %name, schedule_id, "schedule added");
        Ok(())
    }

    async fn get_team(&self, team: &str) -> Result<Option<Team>> {
        let team = team.to_string();
        self.with_conn(move |conn| load_team(conn, &team)).await
    }

    async fn get_current_oncall(
        &self,
        team: &str,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<String>> {
        let team = team.to_string();
        self.with_conn(move |conn| current_oncall(conn, &team, &at))
            .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}

fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %e, "could not create database directory");
        }
    }
}

// ── writes ─────────────────────────────────────────────────────────────

/// Insert a schedule with its team, identities, memberships, days, ordered
/// rotation slots and initial rotation state in one transaction.
///
/// Any early return drops `tx`, which rolls the whole write back.
pub(crate) fn insert_schedule(
    conn: &mut Connection,
    team: &str,
    schedule: &Schedule,
    now: DateTime<Utc>,
) -> Result<i64> {
    let now_str = now.to_rfc3339();
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let team_id: i64 = tx.query_row(
        "INSERT INTO teams (name, created_at) VALUES (?1, ?2)
         ON CONFLICT (name) DO UPDATE SET name = excluded.name
         RETURNING id",
        params![team, now_str],
        |row| row.get(0),
    )?;

    let exists: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM schedules WHERE team_id = ?1 AND name = ?2)",
        params![team_id, schedule.name],
        |row| row.get(0),
    )?;
    if exists {
        return Err(StoreError::DuplicateSchedule {
            team: team.to_string(),
            name: schedule.name.clone(),
        });
    }

    let mut user_ids = Vec::with_capacity(schedule.members.len());
    for member in &schedule.members {
        let user_id: i64 = tx.query_row(
            "INSERT INTO users (handle, created_at) VALUES (?1, ?2)
             ON CONFLICT (handle) DO UPDATE SET handle = excluded.handle
             RETURNING id",
            params![member, now_str],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO team_members (team_id, user_id, role, joined_at)
             VALUES (?1, ?2, 'member', ?3)
             ON CONFLICT (team_id, user_id) DO NOTHING",
            params![team_id, user_id, now_str],
        )?;
        user_ids.push(user_id);
    }

    let schedule_id: i64 = tx.query_row(
        "INSERT INTO schedules (team_id, name, start_time, end_time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id",
        params![
            team_id,
            schedule.name,
            schedule.start.format(TIME_FORMAT).to_string(),
            schedule.end.format(TIME_FORMAT).to_string(),
            now_str,
        ],
        |row| row.get(0),
    )?;

    for day in &schedule.days {
        tx.execute(
            "INSERT OR IGNORE INTO schedule_days (schedule_id, day_of_week) VALUES (?1, ?2)",
            params![schedule_id, day.num_days_from_sunday()],
        )?;
    }

    for (position, user_id) in user_ids.iter().enumerate() {
        tx.execute(
            "INSERT INTO schedule_members (schedule_id, user_id, position) VALUES (?1, ?2, ?3)",
            params![schedule_id, user_id, position as i64],
        )?;
    }

    if let Some(state) = RotationState::initial(&schedule.members, now) {
        tx.execute(
            "INSERT INTO rotations
             (schedule_id, current_user_id, current_position, last_rotation_at, next_rotation_at)
             VALUES (?1, ?2, ?3, ?4, NULL)",
            params![
                schedule_id,
                user_ids[state.current_position],
                state.current_position as i64,
                state.last_rotation_at.to_rfc3339(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(schedule_id)
}

pub(crate) fn advance_rotation(
    conn: &mut Connection,
    team: &str,
    schedule: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let schedule_id: Option<i64> = tx
        .query_row(
            "SELECT s.id FROM schedules s
             JOIN teams t ON t.id = s.team_id
             WHERE t.name = ?1 AND s.name = ?2",
            params![team, schedule],
            |row| row.get(0),
        )
        .optional()?;
    let Some(schedule_id) = schedule_id else {
        return Ok(None);
    };

    let slots = load_member_slots(&tx, schedule_id)?;
    let handles: Vec<String> = slots.iter().map(|(_, handle)| handle.clone()).collect();
    let Some(mut state) = load_rotation(&tx, schedule_id)? else {
        warn!(%team, %schedule, "schedule has no rotation state");
        return Ok(None);
    };
    let Some(next) = state.advance(&handles, now).map(str::to_owned) else {
        return Ok(None);
    };
    let user_id = slots[state.current_position].0;

    tx.execute(
        "UPDATE rotations
         SET current_position = ?1, current_user_id = ?2, last_rotation_at = ?3
         WHERE schedule_id = ?4",
        params![
            state.current_position as i64,
            user_id,
            state.last_rotation_at.to_rfc3339(),
            schedule_id,
        ],
    )?;
    tx.commit()?;

    info!(%team, %schedule, oncall = %next, position = state.current_position, "rotation advanced");
    Ok(Some(next))
}

// ── reads ──────────────────────────────────────────────────────────────

struct StoredSchedule {
    id: i64,
    schedule: Schedule,
}

fn team_id(conn: &Connection, team: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM teams WHERE name = ?1", [team], |row| row.get(0))
        .optional()?;
    Ok(id)
}

pub(crate) fn load_team(conn: &mut Connection, team: &str) -> Result<Option<Team>> {
    // Read inside one transaction so every SELECT sees the same snapshot.
    let tx = conn.transaction()?;
    let Some(id) = team_id(&tx, team)? else {
        return Ok(None);
    };
    let schedules = load_schedules(&tx, id)?
        .into_iter()
        .map(|stored| stored.schedule)
        .collect();
    Ok(Some(Team {
        name: team.to_string(),
        schedules,
    }))
}

pub(crate) fn current_oncall(
    conn: &mut Connection,
    team: &str,
    at: &DateTime<FixedOffset>,
) -> Result<Option<String>> {
    let tx = conn.transaction()?;
    let Some(id) = team_id(&tx, team)? else {
        debug!(%team, "unknown team");
        return Ok(None);
    };

    let Some(stored) = load_schedules(&tx, id)?
        .into_iter()
        .find(|stored| window::matches(&stored.schedule, at))
    else {
        return Ok(None);
    };

    let rotation = load_rotation(&tx, stored.id)?;
    Ok(member_at(&stored.schedule.members, rotation.as_ref()).map(str::to_owned))
}

/// Schedules of a team in insertion order.
fn load_schedules(conn: &Connection, team_id: i64) -> Result<Vec<StoredSchedule>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, start_time, end_time
         FROM schedules WHERE team_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([team_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,    // id
                row.get::<_, String>(1)?, // name
                row.get::<_, String>(2)?, // start_time
                row.get::<_, String>(3)?, // end_time
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut schedules = Vec::with_capacity(rows.len());
    for (id, name, start, end) in rows {
        let members = load_member_slots(conn, id)?
            .into_iter()
            .map(|(_, handle)| handle)
            .collect();
        schedules.push(StoredSchedule {
            id,
            schedule: Schedule {
                name,
                members,
                days: load_days(conn, id)?,
                start: parse_time(&start)?,
                end: parse_time(&end)?,
            },
        });
    }
    Ok(schedules)
}

fn load_days(conn: &Connection, schedule_id: i64) -> Result<Vec<Weekday>> {
    let mut stmt = conn.prepare(
        "SELECT day_of_week FROM schedule_days WHERE schedule_id = ?1 ORDER BY day_of_week",
    )?;
    let raw = stmt
        .query_map([schedule_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raw.into_iter()
        .map(|n| {
            weekday_from_sunday(n)
                .ok_or_else(|| StoreError::Corrupt(format!("day_of_week out of range: {n}")))
        })
        .collect()
}

/// `(user_id, handle)` pairs in rotation order.
fn load_member_slots(conn: &Connection, schedule_id: i64) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.handle
         FROM schedule_members sm
         JOIN users u ON u.id = sm.user_id
         WHERE sm.schedule_id = ?1
         ORDER BY sm.position",
    )?;
    let slots = stmt
        .query_map([schedule_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(slots)
}

fn load_rotation(conn: &Connection, schedule_id: i64) -> Result<Option<RotationState>> {
    let row = conn
        .query_row(
            "SELECT r.current_position, u.handle, r.last_rotation_at, r.next_rotation_at
             FROM rotations r
             LEFT JOIN users u ON u.id = r.current_user_id
             WHERE r.schedule_id = ?1",
            [schedule_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((position, member, last, next)) = row else {
        return Ok(None);
    };
    let current_position = usize::try_from(position)
        .map_err(|_| StoreError::Corrupt(format!("negative rotation position: {position}")))?;
    Ok(Some(RotationState {
        current_position,
        current_member: member.unwrap_or_default(),
        last_rotation_at: parse_timestamp(&last)?,
        next_rotation_at: next.as_deref().map(parse_timestamp).transpose()?,
    }))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("bad clock time {s:?}: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {s:?}: {e}")))
}

fn weekday_from_sunday(n: i64) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
