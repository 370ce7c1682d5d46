//! Shared types, errors, and constants for the daily briefing workspace.
//!
//! This crate has zero internal dependencies so it can be used by the
//! database layer, the external clients, and the worker alike.

pub mod clock;
pub mod error;
pub mod sources;
pub mod types;
