//! Scenario definitions.
//!
//! Each scenario is a named configuration of balls, scene geometry and
//! detector tuning. Rendering and failure injection are deterministic given
//! the seed handed to the frame source.

use crate::replay::GroundTruthBall;
use crate::target::Ball;
use serde::{Deserialize, Serialize};
use tracker_core::HoughParams;

/// Which pre-defined scenario to load.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// One ball drifting across the scene
    SingleBall,
    /// Two balls on crossing paths — identity continuity stress
    Crossing,
    /// One ball growing in apparent size — range estimation sweep
    Approach,
    /// Ball vanishes mid-run and reads fail intermittently — reacquisition
    Dropout,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Scenario length in source frames (before sampling)
    pub n_frames: u64,
    pub balls: Vec<Ball>,
    /// Probability that a single read fails transiently
    pub read_failure_prob: f64,
    /// Detector tuning matched to the scene scale and contrast
    pub hough: HoughParams,
}

/// Detector tuning for the synthetic scenes: full-resolution accumulator and
/// thresholds sized for blurred moderate-contrast edges.
fn scene_hough() -> HoughParams {
    HoughParams {
        dp: 1.0,
        min_dist: 40.0,
        param1: 15.0,
        param2: 40.0,
        min_radius: 10,
        max_radius: 50,
    }
}

impl Scenario {
    /// Build the named scenario.
    pub fn build(kind: &ScenarioKind) -> Self {
        match kind {
            ScenarioKind::SingleBall => Self::single_ball(),
            ScenarioKind::Crossing => Self::crossing(),
            ScenarioKind::Approach => Self::approach(),
            ScenarioKind::Dropout => Self::dropout(),
        }
    }

    fn single_ball() -> Self {
        Self {
            name: "single_ball".into(),
            width: 320,
            height: 240,
            n_frames: 60,
            balls: vec![Ball::steady(0, [60.0, 120.0], [3.0, 0.0], 20.0)],
            read_failure_prob: 0.0,
            hough: scene_hough(),
        }
    }

    fn crossing() -> Self {
        Self {
            name: "crossing".into(),
            width: 320,
            height: 240,
            n_frames: 50,
            balls: vec![
                Ball::steady(0, [50.0, 70.0], [4.0, 2.0], 18.0),
                Ball::steady(1, [270.0, 170.0], [-4.0, -2.0], 18.0),
            ],
            read_failure_prob: 0.0,
            hough: scene_hough(),
        }
    }

    fn approach() -> Self {
        Self {
            name: "approach".into(),
            width: 320,
            height: 240,
            n_frames: 60,
            balls: vec![Ball {
                radius_growth_px: 0.4,
                ..Ball::steady(0, [160.0, 120.0], [0.0, 0.0], 12.0)
            }],
            read_failure_prob: 0.0,
            hough: scene_hough(),
        }
    }

    fn dropout() -> Self {
        Self {
            name: "dropout".into(),
            width: 320,
            height: 240,
            n_frames: 80,
            balls: vec![Ball {
                appear_at: None,
                disappear_at: Some(30),
                ..Ball::steady(0, [80.0, 120.0], [2.0, 0.0], 20.0)
            }, Ball {
                appear_at: Some(50),
                disappear_at: None,
                ..Ball::steady(1, [200.0, 100.0], [-2.0, 1.0], 20.0)
            }],
            read_failure_prob: 0.1,
            hough: scene_hough(),
        }
    }

    /// Ground truth for all balls visible at `frame_idx`.
    pub fn ground_truth(&self, frame_idx: u64) -> Vec<GroundTruthBall> {
        self.balls
            .iter()
            .filter(|b| b.is_visible(frame_idx))
            .map(|b| GroundTruthBall {
                id: b.id,
                center: b.center_at(frame_idx),
                radius: b.radius_at(frame_idx),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_builds_a_plausible_scene() {
        for kind in [
            ScenarioKind::SingleBall,
            ScenarioKind::Crossing,
            ScenarioKind::Approach,
            ScenarioKind::Dropout,
        ] {
            let s = Scenario::build(&kind);
            assert!(!s.balls.is_empty());
            assert!(s.n_frames > 0);
            assert!(s.width > 0 && s.height > 0);
        }
    }

    #[test]
    fn dropout_has_a_blind_window() {
        let s = Scenario::build(&ScenarioKind::Dropout);
        assert!(
            s.ground_truth(40).is_empty(),
            "No ball visible between disappearance and reappearance"
        );
        assert_eq!(s.ground_truth(10).len(), 1);
        assert_eq!(s.ground_truth(60).len(), 1);
    }
}
