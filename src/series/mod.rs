//! Series building.
//!
//! Responsibilities:
//!
//! - turn per-day rate lookups into a gap-free `RateSeries` (sequential or parallel)
//! - absorb per-day lookup failures as missing values
//! - join several targets into a `RateTable`

pub mod builder;
pub mod table;

pub use builder::*;
pub use table::*;
