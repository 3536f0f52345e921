//! Synthetic frame generation and a failure-injecting frame source.

use crate::scenarios::Scenario;
use capture::{FrameRead, FrameSource};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use tracker_core::Frame;

/// Scene background, dark enough to keep edge contrast high.
pub const BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);

/// Ball color: saturated red, bright in both hue and luma so the color-blob
/// and gradient detectors can both see it.
pub const BALL_COLOR: Rgb<u8> = Rgb([230, 60, 50]);

/// Render the scenario's ground truth at `frame_idx` into a frame.
pub fn render_frame(scenario: &Scenario, frame_idx: u64) -> RgbImage {
    let mut img = RgbImage::from_pixel(scenario.width, scenario.height, BACKGROUND);
    for ball in &scenario.balls {
        if !ball.is_visible(frame_idx) {
            continue;
        }
        let c = ball.center_at(frame_idx);
        draw_filled_circle_mut(
            &mut img,
            (c[0].round() as i32, c[1].round() as i32),
            ball.radius_at(frame_idx).round() as i32,
            BALL_COLOR,
        );
    }
    img
}

/// A [`FrameSource`] that renders a scenario on demand.
///
/// Each read attempt consumes one scenario frame; with probability
/// `read_failure_prob` the read fails transiently (the frame is lost, as a
/// dropped packet would lose it). Ends after `n_frames` attempts.
///
/// The source appends the scenario index of every *successful* read to a
/// shared log, so a consumer can map delivery order back to ground truth.
pub struct SceneSource {
    scenario: Scenario,
    frame_idx: u64,
    rng: ChaCha8Rng,
    read_log: Arc<Mutex<Vec<u64>>>,
}

impl SceneSource {
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            scenario,
            frame_idx: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            read_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared log of successfully read scenario frame indices, in read
    /// order. Clone before handing the source to a producer.
    pub fn read_log(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.read_log)
    }
}

impl FrameSource for SceneSource {
    fn read_frame(&mut self) -> FrameRead {
        if self.frame_idx >= self.scenario.n_frames {
            return FrameRead::End;
        }
        let idx = self.frame_idx;
        self.frame_idx += 1;

        if self.scenario.read_failure_prob > 0.0
            && self.rng.gen::<f64>() < self.scenario.read_failure_prob
        {
            return FrameRead::Skip;
        }

        if let Ok(mut log) = self.read_log.lock() {
            log.push(idx);
        }
        FrameRead::Frame(Frame::new(render_frame(&self.scenario, idx)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioKind;

    #[test]
    fn rendering_paints_the_ball_center() {
        let scenario = Scenario::build(&ScenarioKind::SingleBall);
        let img = render_frame(&scenario, 0);
        let c = scenario.balls[0].center_at(0);
        assert_eq!(*img.get_pixel(c[0] as u32, c[1] as u32), BALL_COLOR);
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn source_is_deterministic_per_seed() {
        let scenario = Scenario::build(&ScenarioKind::Dropout);
        let mut a = SceneSource::new(scenario.clone(), 7);
        let mut b = SceneSource::new(scenario, 7);
        loop {
            match (a.read_frame(), b.read_frame()) {
                (FrameRead::End, FrameRead::End) => break,
                (FrameRead::Skip, FrameRead::Skip) => continue,
                (FrameRead::Frame(fa), FrameRead::Frame(fb)) => {
                    assert_eq!(fa.image.as_raw(), fb.image.as_raw());
                }
                _ => panic!("Same seed must replay the same read sequence"),
            }
        }
    }

    #[test]
    fn source_ends_after_n_frames_attempts() {
        let scenario = Scenario::build(&ScenarioKind::SingleBall);
        let n = scenario.n_frames;
        let mut source = SceneSource::new(scenario, 1);
        let mut reads = 0u64;
        while !matches!(source.read_frame(), FrameRead::End) {
            reads += 1;
        }
        assert_eq!(reads, n);
    }

    #[test]
    fn read_log_matches_successful_reads() {
        let scenario = Scenario::build(&ScenarioKind::Dropout);
        let mut source = SceneSource::new(scenario, 42);
        let log = source.read_log();
        let mut delivered = 0usize;
        loop {
            match source.read_frame() {
                FrameRead::End => break,
                FrameRead::Skip => {}
                FrameRead::Frame(_) => delivered += 1,
            }
        }
        assert_eq!(log.lock().unwrap().len(), delivered);
    }
}
