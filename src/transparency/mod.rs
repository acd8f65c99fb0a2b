//! Transparency module for glycorisk.
//!
//! Tracks what the tool has done (assessments, rejections, exports) so
//! users can audit it, without retaining any health data.

pub mod log;

pub use log::{LogError, TransparencyLog};
