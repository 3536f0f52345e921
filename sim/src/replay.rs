//! Replay: serialize/deserialize run logs for offline metric evaluation.

use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracker_core::TargetReport;

/// A full recorded run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    pub seed: u64,
    pub skip_frames: u32,
    /// Per delivered frame, in delivery order
    pub frames: Vec<FrameRecord>,
}

/// Reports and matching ground truth for one delivered frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Producer delivery index
    pub seq: u64,
    pub reports: Vec<TargetReport>,
    pub ground_truth: Vec<GroundTruthBall>,
}

/// Ground-truth state of one ball at a given frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroundTruthBall {
    pub id: u64,
    pub center: [f64; 2],
    pub radius: f64,
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)?;
    Ok(log)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::{Region, TrackId};

    #[test]
    fn replay_round_trips_through_json() {
        let log = ReplayLog {
            scenario_name: "single_ball".into(),
            seed: 42,
            skip_frames: 2,
            frames: vec![FrameRecord {
                seq: 0,
                reports: vec![TargetReport {
                    region: Region {
                        x: 40,
                        y: 40,
                        width: 20,
                        height: 20,
                    },
                    distance_mm: Some(812.5),
                    id: Some(TrackId(1)),
                }],
                ground_truth: vec![GroundTruthBall {
                    id: 0,
                    center: [50.0, 50.0],
                    radius: 10.0,
                }],
            }],
        };

        let path = std::env::temp_dir().join("ptrack_replay_roundtrip.json");
        save_replay(&log, &path).expect("save");
        let loaded = load_replay(&path).expect("load");
        assert_eq!(loaded.scenario_name, log.scenario_name);
        assert_eq!(loaded.frames.len(), 1);
        assert_eq!(loaded.frames[0].reports[0].id, Some(TrackId(1)));
        let _ = std::fs::remove_file(&path);
    }
}
