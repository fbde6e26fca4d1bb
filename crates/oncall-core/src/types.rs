use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A named rotation for a team.
///
/// `members` order is the rotation order. `start` and `end` are offset-naive
/// clock times; they are projected into the offset of whatever instant is
/// being matched against them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    pub members: Vec<String>,
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Schedule {
    /// Check the creation invariants: non-blank name, at least one member and
    /// day, and a window that starts strictly before it ends on the same day.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.members.is_empty() {
            return Err(ValidationError::NoMembers);
        }
        if self.members.iter().any(|m| m.trim().is_empty()) {
            return Err(ValidationError::BlankMember);
        }
        if self.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        if self.start >= self.end {
            return Err(ValidationError::StartNotBeforeEnd);
        }
        Ok(())
    }

    /// Drop repeated weekdays (first occurrence wins) and truncate both window
    /// bounds to whole minutes.
    pub fn normalized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.days.len());
        for day in self.days {
            if !seen.contains(&day) {
                seen.push(day);
            }
        }
        self.days = seen;
        self.start = truncate_to_minute(self.start);
        self.end = truncate_to_minute(self.end);
        self
    }

    pub fn is_active_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

/// Drop seconds and sub-second precision from a clock time.
pub fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// All schedules registered under one team name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub schedules: Vec<Schedule>,
}
