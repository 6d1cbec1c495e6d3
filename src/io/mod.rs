//! Input/output helpers.
//!
//! - view exports (JSON/CSV) (`export`)

pub mod export;

pub use export::*;
