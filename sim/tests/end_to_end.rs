//! End-to-end: synthetic scene → Hough detection → template tracking →
//! reconciliation, checked against scenario ground truth.

use capture::{FrameRead, FrameSource};
use sim::{Scenario, ScenarioKind, SceneSource};
use tracker_core::{metrics::AccuracyStats, Reconciler, ReconcilerConfig};
use vision_models::{HoughCircleDetector, TemplateTracker};

fn run_scenario(kind: ScenarioKind, seed: u64) -> (AccuracyStats, u64) {
    let scenario = Scenario::build(&kind);
    let mut source = SceneSource::new(scenario.clone(), seed);
    let config = ReconcilerConfig {
        assign_ids: true,
        ..Default::default()
    };
    let mut reconciler = Reconciler::new(
        config,
        HoughCircleDetector::new(scenario.hough),
        TemplateTracker::default(),
    );

    let mut accuracy = AccuracyStats::default();
    let mut frames = 0u64;
    let log = source.read_log();
    loop {
        match source.read_frame() {
            FrameRead::End => break,
            FrameRead::Skip => continue,
            FrameRead::Frame(frame) => {
                let out = reconciler.process_frame(&frame);
                let idx = *log.lock().unwrap().last().expect("read was logged");
                let truth: Vec<[f64; 2]> = scenario
                    .ground_truth(idx)
                    .iter()
                    .map(|g| g.center)
                    .collect();
                accuracy.evaluate_frame(&out.reports, &truth);
                frames += 1;
            }
        }
    }
    (accuracy, frames)
}

#[test]
fn single_ball_is_tracked_throughout() {
    let (accuracy, frames) = run_scenario(ScenarioKind::SingleBall, 3);
    assert!(frames > 0);
    assert!(
        accuracy.recall() > 0.9,
        "Ball should be reported on nearly every frame: {accuracy:?}"
    );
    assert!(
        accuracy.rmse_center() < 6.0,
        "Reported centers should sit on the ball: {accuracy:?}"
    );
}

#[test]
fn dropout_scene_reacquires_after_blind_window() {
    let (accuracy, _frames) = run_scenario(ScenarioKind::Dropout, 11);
    assert!(
        accuracy.n_matched > 20,
        "Both visibility windows should produce matched reports: {accuracy:?}"
    );
    assert!(
        accuracy.recall() > 0.6,
        "Reacquisition should recover most visible frames: {accuracy:?}"
    );
}
