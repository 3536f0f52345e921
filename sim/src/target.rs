//! Ball trajectories for synthetic scenes.
//!
//! Each ball has a ground-truth center path, an optional visibility window
//! (for occlusion/dropout scenarios) and an optional radius growth (for
//! approach scenarios, where apparent size drives the range estimate).

use serde::{Deserialize, Serialize};

/// A simulated circular target with ground-truth motion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ball {
    /// Ground-truth target id (used for metrics)
    pub id: u64,
    /// Center at frame 0 (pixels)
    pub start: [f64; 2],
    /// Center velocity (pixels per frame)
    pub velocity: [f64; 2],
    /// Radius at frame 0 (pixels)
    pub radius_px: f64,
    /// Radius change per frame (positive = approaching the camera)
    pub radius_growth_px: f64,
    /// Ball is absent before this frame
    pub appear_at: Option<u64>,
    /// Ball is absent from this frame on
    pub disappear_at: Option<u64>,
}

impl Ball {
    /// A ball visible for the whole scenario at constant radius.
    pub fn steady(id: u64, start: [f64; 2], velocity: [f64; 2], radius_px: f64) -> Self {
        Self {
            id,
            start,
            velocity,
            radius_px,
            radius_growth_px: 0.0,
            appear_at: None,
            disappear_at: None,
        }
    }

    /// Ground-truth center at `frame_idx`.
    pub fn center_at(&self, frame_idx: u64) -> [f64; 2] {
        let t = frame_idx as f64;
        [
            self.start[0] + self.velocity[0] * t,
            self.start[1] + self.velocity[1] * t,
        ]
    }

    /// Ground-truth radius at `frame_idx`, floored at one pixel.
    pub fn radius_at(&self, frame_idx: u64) -> f64 {
        (self.radius_px + self.radius_growth_px * frame_idx as f64).max(1.0)
    }

    /// True if the ball is rendered at `frame_idx`.
    pub fn is_visible(&self, frame_idx: u64) -> bool {
        if let Some(appear) = self.appear_at {
            if frame_idx < appear {
                return false;
            }
        }
        if let Some(disappear) = self.disappear_at {
            if frame_idx >= disappear {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_moves_linearly() {
        let ball = Ball::steady(0, [10.0, 20.0], [2.0, -1.0], 15.0);
        assert_eq!(ball.center_at(0), [10.0, 20.0]);
        assert_eq!(ball.center_at(10), [30.0, 10.0]);
    }

    #[test]
    fn visibility_window_is_half_open() {
        let ball = Ball {
            appear_at: Some(5),
            disappear_at: Some(10),
            ..Ball::steady(0, [0.0, 0.0], [0.0, 0.0], 10.0)
        };
        assert!(!ball.is_visible(4));
        assert!(ball.is_visible(5));
        assert!(ball.is_visible(9));
        assert!(!ball.is_visible(10));
    }

    #[test]
    fn radius_grows_and_never_vanishes() {
        let ball = Ball {
            radius_growth_px: -3.0,
            ..Ball::steady(0, [0.0, 0.0], [0.0, 0.0], 10.0)
        };
        assert_eq!(ball.radius_at(0), 10.0);
        assert_eq!(ball.radius_at(2), 4.0);
        assert_eq!(ball.radius_at(20), 1.0, "Radius floors at one pixel");
    }
}
