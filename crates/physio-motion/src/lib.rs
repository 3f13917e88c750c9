//! # Physio-Motion
//!
//! Turns a stream of body landmarks into exercise feedback: which exercise is
//! being performed, how far the relevant joint is from its target range, how
//! long the patient has held it, and how many repetitions have been counted.
//!
//! ## Frame pipeline
//!
//! Each frame flows through:
//!
//! 1. **Extraction** - the exercise's measurement (joint angle or head
//!    offset) for the side the patient should be moving
//! 2. **Outlier rejection** - frame-to-frame jumps beyond a threshold are
//!    dropped
//! 3. **Smoothing** - a 1D Kalman filter denoises the accepted value
//! 4. **Rep/hold state machine** - rest, moving and holding phases, hold
//!    timing and repetition counting
//! 5. **Snapshot** - a read-only record for renderers and persistence
//!
//! All state for one exercise lives in an [`ExerciseSession`]. Frames are
//! processed strictly one at a time by the caller; nothing here blocks or
//! locks.

pub mod config;
pub mod exercise;
pub mod extractor;
pub mod machine;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod summary;

pub use config::*;
pub use exercise::*;
pub use extractor::*;
pub use machine::*;
pub use session::*;
pub use snapshot::*;
pub use state::*;
pub use summary::*;
