//! Run statistics: frame-state counts and ground-truth accuracy.

use crate::reconciler::{ReconcileOutput, TargetReport};
use crate::types::Centroid;
use serde::{Deserialize, Serialize};

/// Accumulated counters over a reconciliation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// Frames processed
    pub n_frames: u64,
    /// Frames where the visual tracker's output was trusted
    pub n_tracking: u64,
    /// Frames where a detection pass ran
    pub n_redetect: u64,
    /// Detection frames that found nothing (quiescent state)
    pub n_quiescent: u64,
    /// Target reports emitted in total
    pub n_reports: u64,
    /// Seeds the visual tracker refused
    pub n_seed_rejections: u64,
}

impl ReconcileStats {
    /// Fold one frame's output into the counters.
    pub fn record(&mut self, out: &ReconcileOutput) {
        self.n_frames += 1;
        if out.redetected {
            self.n_redetect += 1;
            if out.detections == 0 {
                self.n_quiescent += 1;
            }
        } else {
            self.n_tracking += 1;
        }
        self.n_reports += out.reports.len() as u64;
        self.n_seed_rejections += out.seed_rejections as u64;
    }

    /// Fraction of frames where tracking was trusted without re-detection.
    pub fn tracking_ratio(&self) -> f64 {
        if self.n_frames == 0 {
            return 0.0;
        }
        self.n_tracking as f64 / self.n_frames as f64
    }
}

/// Ground-truth accuracy: greedy nearest matching of reports to true target
/// centers within a pixel gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccuracyStats {
    /// Match gate: a report farther than this from every true center is a
    /// false positive
    pub gate_px: f64,
    /// Matched (report, target) pairs
    pub n_matched: u64,
    /// Sum of squared center errors over matched pairs (for RMSE)
    pub sum_sq_center_err: f64,
    /// Reports with no true target inside the gate
    pub false_positives: u64,
    /// True targets with no report inside the gate
    pub false_negatives: u64,
}

impl Default for AccuracyStats {
    fn default() -> Self {
        Self {
            gate_px: 25.0,
            n_matched: 0,
            sum_sq_center_err: 0.0,
            false_positives: 0,
            false_negatives: 0,
        }
    }
}

impl AccuracyStats {
    /// Evaluate one frame: greedily pair the globally closest report/target
    /// until the gate is exceeded, then count the leftovers.
    pub fn evaluate_frame(&mut self, reports: &[TargetReport], truth: &[Centroid]) {
        let mut report_used = vec![false; reports.len()];
        let mut truth_used = vec![false; truth.len()];

        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for (ri, report) in reports.iter().enumerate() {
                if report_used[ri] {
                    continue;
                }
                let c = report.region.center();
                for (ti, t) in truth.iter().enumerate() {
                    if truth_used[ti] {
                        continue;
                    }
                    let dx = c[0] - t[0];
                    let dy = c[1] - t[1];
                    let d2 = dx * dx + dy * dy;
                    if best.map_or(true, |(_, _, bd2)| d2 < bd2) {
                        best = Some((ri, ti, d2));
                    }
                }
            }
            match best {
                Some((ri, ti, d2)) if d2.sqrt() <= self.gate_px => {
                    report_used[ri] = true;
                    truth_used[ti] = true;
                    self.n_matched += 1;
                    self.sum_sq_center_err += d2;
                }
                _ => break,
            }
        }

        self.false_positives += report_used.iter().filter(|&&u| !u).count() as u64;
        self.false_negatives += truth_used.iter().filter(|&&u| !u).count() as u64;
    }

    /// Root-mean-square center error over all matched pairs (pixels).
    pub fn rmse_center(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_center_err / self.n_matched as f64).sqrt()
    }

    /// Recall = matched / (matched + missed targets).
    pub fn recall(&self) -> f64 {
        let denom = self.n_matched + self.false_negatives;
        if denom == 0 {
            return 0.0;
        }
        self.n_matched as f64 / denom as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    fn report(x: u32, y: u32, size: u32) -> TargetReport {
        TargetReport {
            region: Region {
                x,
                y,
                width: size,
                height: size,
            },
            distance_mm: None,
            id: None,
        }
    }

    #[test]
    fn stats_classify_frame_states() {
        let mut stats = ReconcileStats::default();
        stats.record(&ReconcileOutput {
            reports: vec![report(0, 0, 10)],
            redetected: false,
            ..Default::default()
        });
        stats.record(&ReconcileOutput {
            redetected: true,
            detections: 0,
            ..Default::default()
        });
        stats.record(&ReconcileOutput {
            reports: vec![report(0, 0, 10)],
            redetected: true,
            detections: 1,
            ..Default::default()
        });

        assert_eq!(stats.n_frames, 3);
        assert_eq!(stats.n_tracking, 1);
        assert_eq!(stats.n_redetect, 2);
        assert_eq!(stats.n_quiescent, 1);
        assert_eq!(stats.n_reports, 2);
    }

    #[test]
    fn accuracy_matches_within_gate() {
        let mut acc = AccuracyStats::default();
        // Report center (45, 45); truth 5 px away plus one missed target.
        acc.evaluate_frame(&[report(40, 40, 10)], &[[48.0, 49.0], [300.0, 300.0]]);
        assert_eq!(acc.n_matched, 1);
        assert_eq!(acc.false_negatives, 1);
        assert_eq!(acc.false_positives, 0);
        assert!((acc.rmse_center() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn accuracy_counts_out_of_gate_report_as_false_positive() {
        let mut acc = AccuracyStats::default();
        acc.evaluate_frame(&[report(0, 0, 10)], &[[200.0, 200.0]]);
        assert_eq!(acc.n_matched, 0);
        assert_eq!(acc.false_positives, 1);
        assert_eq!(acc.false_negatives, 1);
        assert_eq!(acc.recall(), 0.0);
    }
}
