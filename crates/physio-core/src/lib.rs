//! # Physio-Core
//!
//! Core types and utilities for the physiotherapy exercise coach: body
//! landmarks delivered by the pose estimator, the 2D geometry used to turn
//! them into joint angles, and the shared error type.

pub mod error;
pub mod geometry;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
