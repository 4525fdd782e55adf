//! Task storage for the task tracker
//!
//! This crate provides a storage abstraction for tasks. The same contract is
//! satisfied by two backends: a whole-file JSON snapshot (authoritative set
//! in memory, explicit save/load) and a SQLite table (every operation
//! committed to storage as it happens).

mod config;
mod error;
mod snapshot;
mod sqlite;
mod traits;

pub use config::*;
pub use error::*;
pub use snapshot::*;
pub use sqlite::*;
pub use traits::*;
