//! Fundamental types used across the entire workspace.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier types — newtype wrapper so IDs are never confused at compile time
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A 2D pixel-space center point, f64 for sub-pixel assignment math.
pub type Centroid = [f64; 2];

/// A candidate circle produced by a detector, in pixel coordinates.
/// Ephemeral — consumed within the same reconciliation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: u32,
    pub cy: u32,
    /// Radius in pixels, > 0
    pub radius: u32,
}

/// An axis-aligned box in pixel coordinates, width/height > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Center of the box, for identity assignment and rendering.
    pub fn center(&self) -> Centroid {
        [
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        ]
    }

    /// True if the box lies entirely inside a `width × height` frame.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x + self.width <= width
            && self.y + self.height <= height
    }
}

// ---------------------------------------------------------------------------
// Frame — one decoded video frame
// ---------------------------------------------------------------------------

/// A single video frame handed from acquisition to the tracking pipeline.
///
/// Ownership passes to the consumer for the duration of one processing call;
/// frames are not retained across calls.
#[derive(Clone, Debug)]
pub struct Frame {
    /// 3-channel pixel data
    pub image: RgbImage,
    /// Delivery index assigned by the frame producer (0 for standalone frames)
    pub seq: u64,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image, seq: 0 }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
