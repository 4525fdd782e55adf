//! Core entity definitions for the task tracker.
//!
//! This crate defines the data types shared by every storage backend. It is
//! a leaf crate: pure data, no I/O.

mod task;

pub use task::*;
