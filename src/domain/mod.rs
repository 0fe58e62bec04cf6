//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - symbols and the rate source selector (`Symbol`, `RateDate`, `SourceKind`)
//! - daily series and their derived values (`RateSeries`, `SmoothedSeries`, `Forecast`)
//! - multi-target history (`RateTable`)
//! - run configuration and the saved run file (`ForecastConfig`, `ForecastFile`)

pub mod types;

pub use types::*;
