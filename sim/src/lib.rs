//! `sim` — Scenario simulator: ball trajectories, synthetic frames, replay.

pub mod frame_sim;
pub mod replay;
pub mod scenarios;
pub mod target;

pub use frame_sim::{render_frame, SceneSource};
pub use replay::{load_replay, save_replay, FrameRecord, GroundTruthBall, ReplayLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use target::Ball;
