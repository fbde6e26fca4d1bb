//! `oncall-core`: shared domain types, errors and configuration for the
//! on-call schedule service.

pub mod config;
pub mod error;
pub mod types;

pub use error::{OncallError, Result, ValidationError};
pub use types::{Schedule, Team};
