//! Pure conversions from upstream responses to display records.
//!
//! Every function takes "now" explicitly so results are reproducible.

pub mod calendar;
pub mod transit;
pub mod weather;
