//! Frame sources: the acquisition contract and a directory-of-images source.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracker_core::Frame;
use tracing::warn;

/// Outcome of one acquisition attempt.
pub enum FrameRead {
    /// A decoded frame
    Frame(Frame),
    /// Transient failure — retried on the next iteration, never counted
    Skip,
    /// The source is exhausted; acquisition stops
    End,
}

/// A video source read frame-by-frame from the acquisition thread.
///
/// Opening a source is fatal on failure (constructors return `Result`);
/// individual read failures are transient and reported as [`FrameRead::Skip`].
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> FrameRead;
}

/// Reads an ordered directory of encoded images as a frame stream.
pub struct FrameSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl FrameSequenceSource {
    /// List the decodable files under `dir`, sorted by name. Fails when the
    /// directory is unreadable or holds no frames.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to open frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
                )
            })
            .collect();
        paths.sort();
        if paths.is_empty() {
            bail!("no decodable frames in {}", dir.display());
        }
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for FrameSequenceSource {
    fn read_frame(&mut self) -> FrameRead {
        if self.next >= self.paths.len() {
            return FrameRead::End;
        }
        let path = self.paths[self.next].clone();
        self.next += 1;
        match image::open(&path) {
            Ok(img) => FrameRead::Frame(Frame::new(img.to_rgb8())),
            Err(err) => {
                warn!(path = %path.display(), %err, "frame decode failed; skipping");
                FrameRead::Skip
            }
        }
    }
}
