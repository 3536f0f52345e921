//! `capture` — Frame acquisition: sources, sampling, and the producer thread.
//!
//! # Module layout
//! - [`source`]   — FrameSource contract and the image-sequence source
//! - [`producer`] — Acquisition thread, skip policy, callback handoff

pub mod producer;
pub mod source;

pub use producer::{FrameCallback, FrameProducer, ProducerConfig};
pub use source::{FrameRead, FrameSequenceSource, FrameSource};
