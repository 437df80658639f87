//! `poll-dash` library crate.
//!
//! The binary (`polls`) is a thin wrapper around this library so that:
//!
//! - the data pipeline is testable without a terminal
//! - the summary/export commands and the TUI share one set of data contracts

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod report;
pub mod transform;
pub mod tui;
