//! `pm25-dash` library crate.
//!
//! The binary (`pm25`) is a thin wrapper around this library so that:
//!
//! - the aggregation components are testable without spawning processes
//! - the same session/view code can back other front-ends later
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod session;
