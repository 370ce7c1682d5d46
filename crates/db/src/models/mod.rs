//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` entity struct as seen by callers
//! - A `FromRow` row struct matching the database columns
//! - Insert and query DTOs

pub mod information_entry;
