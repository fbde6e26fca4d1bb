use thiserror::Error;

/// A rejected schedule definition. Raised before any store interaction, so a
/// validation failure never leaves a partial schedule behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("team is required")]
    MissingTeam,

    #[error("name is required")]
    MissingName,

    #[error("at least one member is required")]
    NoMembers,

    #[error("member names must not be blank")]
    BlankMember,

    #[error("at least one day is required")]
    NoDays,

    #[error("start time is required")]
    MissingStart,

    #[error("end time is required")]
    MissingEnd,

    #[error("invalid day: {0}")]
    InvalidDay(String),

    #[error("invalid start time format, use '3:04PM' format")]
    InvalidStartTime,

    #[error("invalid end time format, use '3:04PM' format")]
    InvalidEndTime,

    /// Also covers windows that would wrap past midnight.
    #[error("start time must be before end time")]
    StartNotBeforeEnd,
}

#[derive(Debug, Error)]
pub enum OncallError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OncallError {
    /// Short, stable error code for logs and API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            OncallError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, OncallError>;
