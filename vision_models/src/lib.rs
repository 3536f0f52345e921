//! `vision_models` — Concrete detector and tracker implementations behind
//! the `tracker_core` contracts.
//!
//! # Module layout
//! - [`hough`]    — Gradient-voting Hough circle detector
//! - [`template`] — Windowed template-matching visual tracker
//! - [`blob`]     — HSV color-blob detector (uniformly colored targets)

pub mod blob;
pub mod hough;
pub mod template;

pub use blob::{BlobParams, ColorBlobDetector, HsvBand};
pub use hough::{detect_circles, HoughCircleDetector};
pub use template::{TemplateTracker, TemplateTrackerConfig};
