//! The circle-detector contract consumed by the reconciler.

use crate::types::{Circle, Frame};
use serde::{Deserialize, Serialize};

/// Parameters of a gradient-based circle detector: accumulator resolution,
/// minimum center separation, edge/center thresholds, radius bounds.
/// All values must be positive.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HoughParams {
    /// Inverse accumulator resolution (accumulator is `1/dp` of frame scale)
    pub dp: f64,
    /// Minimum distance between accepted circle centers (pixels)
    pub min_dist: f64,
    /// Edge threshold on gradient magnitude
    pub param1: f64,
    /// Accumulator vote threshold for a center candidate
    pub param2: f64,
    /// Smallest radius considered (pixels)
    pub min_radius: u32,
    /// Largest radius considered (pixels)
    pub max_radius: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            dp: 1.2,
            min_dist: 50.0,
            param1: 100.0,
            param2: 70.0,
            min_radius: 20,
            max_radius: 100,
        }
    }
}

/// A detector of circular targets in a single frame.
///
/// Assumed deterministic given identical pixel input and fixed
/// configuration. May return an empty set; the reconciler assumes no
/// ordering among candidates.
pub trait CircleDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Vec<Circle>;
}
