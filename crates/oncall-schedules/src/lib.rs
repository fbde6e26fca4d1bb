//! `oncall-schedules`: the on-call resolution engine.
//!
//! # Overview
//!
//! A team registers schedules (members, weekdays, daily window). Given a team
//! and an instant, the [`resolver::Resolver`] asks the configured
//! [`store::ScheduleStore`] which schedule is active and who is on duty.
//!
//! # Store variants
//!
//! | Variant    | Persistence    | Rotation policy                           |
//! |------------|----------------|-------------------------------------------|
//! | `Volatile` | process memory | always the first member                   |
//! | `Durable`  | SQLite file    | member at the persisted rotation position |
//!
//! Both variants share the closed-interval window check in [`window`].

pub mod db;
pub mod durable;
pub mod error;
pub mod resolver;
pub mod rotation;
pub mod store;
pub mod volatile;
pub mod window;

pub use durable::DurableStore;
pub use error::{ResolveError, Result, StoreError};
pub use resolver::Resolver;
pub use rotation::RotationState;
pub use store::{open_store, ScheduleStore};
pub use volatile::VolatileStore;
