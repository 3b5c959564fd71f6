//! Skew analytics.
//!
//! Provides:
//! - Expiration index (selectable expirations and the default selection)
//! - Skew curve construction per expiration and option type

pub mod expirations;
pub mod skew;

pub use expirations::ExpirationIndex;
pub use skew::{SkewCurve, SkewCurveBuilder, SkewCurveSet, SkewPoint, TableRow};
