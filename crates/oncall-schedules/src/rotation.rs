//! Rotation policies: who in a schedule's member list is on duty.
//!
//! The volatile store has no rotation pointer and uses [`first_member`]. The
//! durable store persists a [`RotationState`] per schedule and uses
//! [`member_at`]. The two diverge as soon as a rotation has been advanced.

use chrono::{DateTime, Utc};

/// Per-schedule rotation pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    /// Zero-based index into the schedule's member list.
    pub current_position: usize,
    /// Handle at `current_position`, denormalised for lookups.
    pub current_member: String,
    pub last_rotation_at: DateTime<Utc>,
    /// Reserved for time-based rotation; never set today.
    pub next_rotation_at: Option<DateTime<Utc>>,
}

impl RotationState {
    /// State for a freshly created schedule: position 0. `None` when there is
    /// nobody to rotate through.
    pub fn initial(members: &[String], now: DateTime<Utc>) -> Option<Self> {
        let first = members.first()?;
        Some(Self {
            current_position: 0,
            current_member: first.clone(),
            last_rotation_at: now,
            next_rotation_at: None,
        })
    }

    /// Move to the next member, wrapping at the end of the list, and return
    /// the new on-call handle. `None` (and no change) for an empty list.
    pub fn advance<'a>(&mut self, members: &'a [String], now: DateTime<Utc>) -> Option<&'a str> {
        if members.is_empty() {
            return None;
        }
        let next = (self.current_position + 1) % members.len();
        self.current_position = next;
        self.current_member = members[next].clone();
        self.last_rotation_at = now;
        Some(members[next].as_str())
    }
}

/// Stateless policy: always the head of the list.
pub fn first_member(members: &[String]) -> Option<&str> {
    members.first().map(String::as_str)
}

/// Stateful policy: the member designated by the persisted pointer.
///
/// A missing state or an out-of-range position yields `None` rather than a
/// panic.
pub fn member_at<'a>(members: &'a [String], state: Option<&RotationState>) -> Option<&'a str> {
    let state = state?;
    members.get(state.current_position).map(String::as_str)
}
