//! # Physio-Signal
//!
//! Per-frame signal conditioning for joint-angle measurements.
//!
//! Every filter here is incremental: one call per frame, O(1) state, and a
//! `reset()` that returns it to its freshly constructed condition. Filters
//! are owned by a single exercise session and never shared across
//! exercises.

pub mod filtering;
pub mod outlier;
pub mod stability;
pub mod tremor;

pub use filtering::*;
pub use outlier::*;
pub use stability::*;
pub use tremor::*;
