//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&SqlitePool` as the first argument.

pub mod information_entry_repo;

pub use information_entry_repo::InformationEntryRepo;
