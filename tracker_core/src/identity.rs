//! Identity tracking: stable numeric identities for centroids across frames.
//!
//! # Assignment policy
//! - **Match**: greedy nearest-neighbor over the full pairwise Euclidean
//!   distance matrix. Rows (existing tracks) are processed in ascending
//!   order of their minimum distance; each row claims its arg-min column
//!   unless either side was already claimed.
//! - **Birth**: every unmatched input centroid registers a new track with a
//!   fresh, strictly increasing id.
//! - **Death**: a track unmatched for more than `max_disappeared`
//!   consecutive updates is removed. Ids are never reused.
//!
//! The update routine never blocks and has no I/O side effects; it mutates
//! only its own registry.

use crate::types::{Centroid, TrackId};
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Configuration for the identity eviction policy.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// Consecutive unmatched updates tolerated before a track is dropped
    pub max_disappeared: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { max_disappeared: 50 }
    }
}

/// One registered track: last known centroid plus its disappearance count.
#[derive(Clone, Debug)]
struct CentroidTrack {
    centroid: Centroid,
    disappeared: u32,
}

/// Assigns and retains stable ids for a set of 2D centroids across
/// successive `update` calls.
///
/// The registry is keyed by [`TrackId`]; since ids are allocated
/// monotonically, iteration in key order equals registration order, which
/// makes tie-breaks deterministic.
pub struct IdentityTracker {
    config: IdentityConfig,
    next_id: u64,
    tracks: BTreeMap<TrackId, CentroidTrack>,
}

impl IdentityTracker {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            next_id: 1,
            tracks: BTreeMap::new(),
        }
    }

    /// Number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn register(&mut self, centroid: Centroid) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        self.tracks.insert(
            id,
            CentroidTrack {
                centroid,
                disappeared: 0,
            },
        );
        id
    }

    fn mark_disappeared(&mut self, id: TrackId) {
        let evict = match self.tracks.get_mut(&id) {
            Some(track) => {
                track.disappeared += 1;
                track.disappeared > self.config.max_disappeared
            }
            None => false,
        };
        if evict {
            self.tracks.remove(&id);
        }
    }

    /// Reconcile the registry against one frame's worth of centroids.
    /// Returns the surviving id → centroid mapping.
    pub fn update(&mut self, input: &[Centroid]) -> BTreeMap<TrackId, Centroid> {
        if input.is_empty() {
            let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
            for id in ids {
                self.mark_disappeared(id);
            }
            return self.snapshot();
        }

        if self.tracks.is_empty() {
            for &c in input {
                self.register(c);
            }
            return self.snapshot();
        }

        // Full pairwise distance matrix: rows = existing tracks (id order),
        // columns = input centroids (caller order).
        let ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let existing: Vec<Centroid> = ids.iter().map(|id| self.tracks[id].centroid).collect();
        let dist = DMatrix::from_fn(existing.len(), input.len(), |r, c| {
            let dx = existing[r][0] - input[c][0];
            let dy = existing[r][1] - input[c][1];
            (dx * dx + dy * dy).sqrt()
        });

        // Rows in ascending order of their minimum distance. The sort is
        // stable, so ties fall back to registration order.
        let mut row_order: Vec<usize> = (0..existing.len()).collect();
        row_order.sort_by(|&a, &b| dist.row(a).min().total_cmp(&dist.row(b).min()));

        let mut row_used = vec![false; existing.len()];
        let mut col_used = vec![false; input.len()];

        for &row in &row_order {
            let col = (0..input.len())
                .min_by(|&a, &b| dist[(row, a)].total_cmp(&dist[(row, b)]))
                .unwrap_or(0);
            if row_used[row] || col_used[col] {
                continue;
            }
            row_used[row] = true;
            col_used[col] = true;
            if let Some(track) = self.tracks.get_mut(&ids[row]) {
                track.centroid = input[col];
                track.disappeared = 0;
            }
        }

        for (row, &used) in row_used.iter().enumerate() {
            if !used {
                self.mark_disappeared(ids[row]);
            }
        }
        for (col, &used) in col_used.iter().enumerate() {
            if !used {
                self.register(input[col]);
            }
        }

        self.snapshot()
    }

    fn snapshot(&self) -> BTreeMap<TrackId, Centroid> {
        self.tracks
            .iter()
            .map(|(&id, t)| (id, t.centroid))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
