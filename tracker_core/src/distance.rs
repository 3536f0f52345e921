//! Range estimation from apparent size via the pinhole camera model.

use crate::types::Region;
use serde::{Deserialize, Serialize};

/// Physical camera and target parameters, supplied by external configuration.
/// All values are millimeters and must be positive for an estimate to exist.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Calibration {
    /// True diameter of the tracked object
    pub real_diameter_mm: f64,
    /// Lens focal length
    pub focal_length_mm: f64,
    /// Physical sensor width
    pub sensor_width_mm: f64,
    /// Physical sensor height
    pub sensor_height_mm: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        // 65 mm ball on a typical small-sensor camera module.
        Self {
            real_diameter_mm: 65.0,
            focal_length_mm: 3.6,
            sensor_width_mm: 3.68,
            sensor_height_mm: 2.76,
        }
    }
}

impl Calibration {
    /// True if every field is positive and usable for estimation.
    pub fn is_valid(&self) -> bool {
        self.real_diameter_mm > 0.0
            && self.focal_length_mm > 0.0
            && self.sensor_width_mm > 0.0
            && self.sensor_height_mm > 0.0
    }
}

/// Estimate the camera-to-target distance in millimeters.
///
/// The region's pixel extent is converted to an on-sensor size via the
/// per-axis pixel pitch, the width/height estimates are averaged into one
/// apparent diameter, and the pinhole relation
/// `distance = real_diameter * focal_length / apparent_diameter` is applied.
///
/// Returns `None` when the region has a non-positive extent or the
/// calibration is unusable — "unknown", never an error.
///
/// Caller guarantees `frame_width` and `frame_height` are positive.
pub fn estimate_distance(
    region: &Region,
    frame_width: u32,
    frame_height: u32,
    calibration: &Calibration,
) -> Option<f64> {
    if region.width == 0 || region.height == 0 || !calibration.is_valid() {
        return None;
    }
    debug_assert!(frame_width > 0 && frame_height > 0);

    let pixel_size_w = calibration.sensor_width_mm / frame_width as f64;
    let pixel_size_h = calibration.sensor_height_mm / frame_height as f64;

    let diameter_mm_w = region.width as f64 * pixel_size_w;
    let diameter_mm_h = region.height as f64 * pixel_size_h;
    let diameter_mm = (diameter_mm_w + diameter_mm_h) / 2.0;

    if diameter_mm > 0.0 {
        Some(calibration.real_diameter_mm * calibration.focal_length_mm / diameter_mm)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
