use thiserror::Error;

/// Errors raised by a schedule store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The team already holds a schedule with this name.
    #[error("Schedule already exists: {team}/{name}")]
    DuplicateSchedule { team: String, name: String },

    /// A persisted row could not be turned back into a domain value.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// The blocking worker running a database call panicked or was cancelled.
    #[error("Store task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of an on-call lookup that did not produce an identity.
///
/// `NotFound` is a legitimate answer (unknown team, no matching window, or an
/// empty rotation); `Store` is a fault the caller should surface as such.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no oncall member found for team {team}")]
    NotFound { team: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}
