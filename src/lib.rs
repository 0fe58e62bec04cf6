//! `fx-forecast` library crate.
//!
//! The binary (`fx`) is a thin wrapper around this library so that:
//!
//! - the series and forecast code is testable without spawning processes
//! - rate sources can be swapped for a deterministic sample in tests
//! - the TUI and the plain CLI share one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod report;
pub mod series;
pub mod tui;
