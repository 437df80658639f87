//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - categorical enums (`Methodology`, `Party`, `DerivedColumn`)
//! - the poll row and dataset (`PollRecord`, `PollDataset`)
//! - pipeline configuration (`DeriveConfig`, `DashboardConfig`)

pub mod types;

pub use types::*;
