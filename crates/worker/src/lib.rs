//! `briefing-worker` library crate.
//!
//! Re-exports the configuration, orchestration, and scheduling modules for
//! integration testing. The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod orchestrator;
pub mod scheduler;
