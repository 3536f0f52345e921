//! The visual-tracker contract consumed by the reconciler.

use crate::types::{Circle, Frame, Region};

/// An appearance-based multi-region tracker, seeded externally and advanced
/// one frame at a time. Only the black-box contract matters here; the
/// tracking algorithm itself lives behind this trait.
pub trait VisualTracker: Send {
    /// Discard all tracked regions.
    fn reset(&mut self);

    /// Begin tracking each supplied region against `frame`. Returns one
    /// acceptance flag per region; an individual rejection (e.g. a region
    /// outside the frame) does not fail the others.
    fn seed(&mut self, frame: &Frame, regions: &[Region]) -> Vec<bool>;

    /// Advance all tracked regions by one frame. A `false` overall flag
    /// signals lost confidence at whatever granularity the tracker reports;
    /// callers treat a false or empty result identically.
    fn update(&mut self, frame: &Frame) -> (bool, Vec<Region>);
}

/// The seed region for a detected circle: its inscribing square, clipped to
/// the frame bounds.
pub fn seed_region(circle: &Circle, frame_width: u32, frame_height: u32) -> Region {
    let x0 = circle.cx.saturating_sub(circle.radius);
    let y0 = circle.cy.saturating_sub(circle.radius);
    let w0 = (2 * circle.radius).min(frame_width.saturating_sub(x0));
    let h0 = (2 * circle.radius).min(frame_height.saturating_sub(y0));
    Region {
        x: x0,
        y: y0,
        width: w0,
        height: h0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_circle_yields_full_square() {
        let r = seed_region(
            &Circle {
                cx: 50,
                cy: 50,
                radius: 10,
            },
            100,
            100,
        );
        assert_eq!(
            r,
            Region {
                x: 40,
                y: 40,
                width: 20,
                height: 20
            }
        );
    }

    #[test]
    fn circle_near_origin_clips_to_zero() {
        let r = seed_region(
            &Circle {
                cx: 5,
                cy: 3,
                radius: 10,
            },
            100,
            100,
        );
        assert_eq!(r.x, 0);
        assert_eq!(r.y, 0);
        assert_eq!(r.width, 20);
        assert_eq!(r.height, 20);
    }

    #[test]
    fn circle_near_far_edge_clips_extent() {
        let r = seed_region(
            &Circle {
                cx: 95,
                cy: 50,
                radius: 10,
            },
            100,
            100,
        );
        assert_eq!(r.x, 85);
        assert_eq!(r.width, 15, "Extent clipped to the right frame edge");
        assert_eq!(r.height, 20);
    }
}
