//! Reconciler orchestrator: the full detection–tracking cycle for one frame.
//!
//! # Processing steps per frame
//! 1. Advance the visual tracker.
//! 2. On failure — or a "successful" update with zero regions, which carries
//!    no actionable information — run the circle detector.
//! 3. If detection found candidates: reset the tracker and reseed it from
//!    the circles' clipped inscribing squares. Rejected seeds are logged and
//!    skipped; accepted ones are emitted this same frame.
//! 4. If detection found nothing: emit nothing. This is an expected
//!    quiescent state, not an error; a later frame re-detects.
//! 5. Optionally assign stable ids to the surviving region centroids.
//! 6. Emit one `(region, distance)` report per region.
//!
//! There is no retry or backoff: each frame is an independent attempt, and
//! transient detector/tracker failures self-heal on the next frame.

use crate::{
    detect::CircleDetector,
    distance::{estimate_distance, Calibration},
    identity::{IdentityConfig, IdentityTracker},
    types::{Centroid, Frame, Region, TrackId},
    visual::{seed_region, VisualTracker},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the reconciliation loop.
#[derive(Clone, Debug, Default)]
pub struct ReconcilerConfig {
    /// Pinhole calibration used for every distance estimate
    pub calibration: Calibration,
    /// Assign stable ids to emitted regions via the identity tracker
    pub assign_ids: bool,
    /// Identity eviction policy (used only when `assign_ids` is set)
    pub identity: IdentityConfig,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One tracked target emitted for a frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TargetReport {
    pub region: Region,
    /// Estimated range in millimeters; `None` means unknown, not zero
    pub distance_mm: Option<f64>,
    /// Stable identity, when id assignment is enabled
    pub id: Option<TrackId>,
}

/// Everything produced by one reconciliation step.
#[derive(Clone, Debug, Default)]
pub struct ReconcileOutput {
    pub reports: Vec<TargetReport>,
    /// A detection pass ran this frame (tracker failed or was empty)
    pub redetected: bool,
    /// Circles returned by the detection pass
    pub detections: usize,
    /// Seeds the visual tracker refused
    pub seed_rejections: usize,
    /// Timings in microseconds
    pub timing_update_us: u64,
    pub timing_detect_us: u64,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Per-frame reconciliation between a circle detector and a visual tracker.
///
/// Depends only on the [`CircleDetector`] and [`VisualTracker`] contracts;
/// tests drive it with deterministic fakes. Invoked strictly sequentially,
/// once per delivered frame — it holds no frame state of its own.
pub struct Reconciler<D: CircleDetector, V: VisualTracker> {
    config: ReconcilerConfig,
    detector: D,
    visual: V,
    identity: Option<IdentityTracker>,
}

impl<D: CircleDetector, V: VisualTracker> Reconciler<D, V> {
    pub fn new(config: ReconcilerConfig, detector: D, visual: V) -> Self {
        let identity = config
            .assign_ids
            .then(|| IdentityTracker::new(config.identity.clone()));
        Self {
            config,
            detector,
            visual,
            identity,
        }
    }

    /// Discard all visual-tracker state; the next frame re-detects.
    pub fn reset(&mut self) {
        self.visual.reset();
    }

    /// Run one reconciliation step over `frame`.
    pub fn process_frame(&mut self, frame: &Frame) -> ReconcileOutput {
        let mut out = ReconcileOutput::default();

        let t0 = Instant::now();
        let (ok, mut regions) = self.visual.update(frame);
        out.timing_update_us = t0.elapsed().as_micros() as u64;

        if !ok || regions.is_empty() {
            let t1 = Instant::now();
            let circles = self.detector.detect(frame);
            out.timing_detect_us = t1.elapsed().as_micros() as u64;
            out.redetected = true;
            out.detections = circles.len();

            if circles.is_empty() {
                debug!(seq = frame.seq, "tracking lost, no detections; quiescent");
                regions = Vec::new();
            } else {
                self.visual.reset();
                let seeds: Vec<Region> = circles
                    .iter()
                    .map(|c| seed_region(c, frame.width(), frame.height()))
                    .collect();
                let accepted = self.visual.seed(frame, &seeds);
                regions = Vec::with_capacity(seeds.len());
                for (i, seed) in seeds.iter().enumerate() {
                    if accepted.get(i).copied().unwrap_or(false) {
                        regions.push(*seed);
                    } else {
                        out.seed_rejections += 1;
                        warn!(
                            seq = frame.seq,
                            cx = circles[i].cx,
                            cy = circles[i].cy,
                            radius = circles[i].radius,
                            "visual tracker rejected seed"
                        );
                    }
                }
                debug!(
                    seq = frame.seq,
                    detections = out.detections,
                    seeded = regions.len(),
                    "reacquired from detection"
                );
            }
        }

        let ids = self.assign_ids(&regions);

        out.reports = regions
            .iter()
            .zip(ids)
            .map(|(region, id)| TargetReport {
                region: *region,
                distance_mm: estimate_distance(
                    region,
                    frame.width(),
                    frame.height(),
                    &self.config.calibration,
                ),
                id,
            })
            .collect();
        out
    }

    /// Map region centroids through the identity tracker, at most once per
    /// frame. Returns one optional id per region, in region order.
    fn assign_ids(&mut self, regions: &[Region]) -> Vec<Option<TrackId>> {
        let Some(identity) = &mut self.identity else {
            return vec![None; regions.len()];
        };
        let centroids: Vec<Centroid> = regions.iter().map(Region::center).collect();
        let registry = identity.update(&centroids);

        // Every input centroid is now stored verbatim on exactly one track,
        // so an exact-match reverse lookup recovers its id. A consumed set
        // keeps duplicate centroids from sharing one.
        let mut consumed: HashSet<TrackId> = HashSet::new();
        centroids
            .iter()
            .map(|c| {
                let id = registry
                    .iter()
                    .find(|(id, stored)| !consumed.contains(*id) && *stored == c)
                    .map(|(&id, _)| id);
                if let Some(id) = id {
                    consumed.insert(id);
                }
                id
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
