//! Validated ring model and ownership ranges.
//!
//! [`RingModel`] holds one datacenter's token entries, validated and sorted
//! ascending by token. [`RangeCalculator`] turns a model into the ordered
//! sequence of [`TokenRange`]s that exactly partitions the `2^64` key space:
//! each range `(previous, token]` belongs to the node at its right endpoint,
//! and the last range wraps from the highest token through the maximum value
//! back to the lowest.

mod error;
mod model;
mod ranges;

pub use error::RingError;
pub use model::{RingModel, RingWarning};
pub use ranges::{RangeCalculator, TokenRange, covers_ring};
