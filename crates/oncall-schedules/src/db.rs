use rusqlite::{Connection, Result};

/// Initialise every table the durable store reads and writes. Safe to call on
/// every startup: CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_users_table(conn)?;
    create_teams_tables(conn)?;
    create_schedules_tables(conn)?;
    create_rotations_table(conn)?;
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<()> {
    // Identities are upserted by handle when a schedule names them.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            handle      TEXT    NOT NULL UNIQUE,
            created_at  TEXT    NOT NULL
        );",
    )
}

fn create_teams_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS teams (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL UNIQUE,
            created_at  TEXT    NOT NULL
        );

        CREATE TABLE IF NOT EXISTS team_members (
            team_id     INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            role        TEXT    NOT NULL DEFAULT 'member',
            joined_at   TEXT    NOT NULL,
            PRIMARY KEY (team_id, user_id)
        );",
    )
}

fn create_schedules_tables(conn: &Connection) -> Result<()> {
    // start_time / end_time are offset-naive 'HH:MM:SS' clock times.
    // day_of_week: 0 = Sunday … 6 = Saturday.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedules (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id     INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            name        TEXT    NOT NULL,
            start_time  TEXT    NOT NULL,
            end_time    TEXT    NOT NULL,
            created_at  TEXT    NOT NULL,
            UNIQUE (team_id, name)
        );

        CREATE TABLE IF NOT EXISTS schedule_days (
            schedule_id INTEGER NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
            day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            PRIMARY KEY (schedule_id, day_of_week)
        );

        CREATE TABLE IF NOT EXISTS schedule_members (
            schedule_id INTEGER NOT NULL REFERENCES schedules(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            position    INTEGER NOT NULL CHECK (position >= 0),
            PRIMARY KEY (schedule_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_schedules_team ON schedules (team_id);",
    )
}

fn create_rotations_table(conn: &Connection) -> Result<()> {
    // One row per schedule, written in the same transaction as the schedule.
    // next_rotation_at stays NULL until rotation is scheduled by time.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS rotations (
            schedule_id      INTEGER PRIMARY KEY REFERENCES schedules(id) ON DELETE CASCADE,
            current_user_id  INTEGER REFERENCES users(id),
            current_position INTEGER NOT NULL DEFAULT 0 CHECK (current_position >= 0),
            last_rotation_at TEXT    NOT NULL,
            next_rotation_at TEXT
        );",
    )
}
