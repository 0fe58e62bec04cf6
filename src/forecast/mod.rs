//! Smoothing and forecast.
//!
//! Both stages are pure functions over a fully built series:
//!
//! - `compute_sma`: trailing simple moving average, no interpolation
//! - `project_forecast`: flat projection of the final SMA value

pub mod projection;
pub mod sma;

pub use projection::*;
pub use sma::*;
