//! Template-correlation visual tracker.
//!
//! Each seeded region is remembered as a grayscale template. On update, the
//! template is matched (normalized sum of squared errors) inside a search
//! window around the region's last position. A residual above `max_error`
//! for any region reports overall loss — the caller re-detects and reseeds,
//! so partial results are never returned.

use image::GrayImage;
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};
use tracker_core::{Frame, Region, VisualTracker};
use tracing::debug;

/// Tuning for the windowed template search.
#[derive(Clone, Copy, Debug)]
pub struct TemplateTrackerConfig {
    /// Pixels added on every side of a region to form its search window
    pub search_margin: u32,
    /// Maximum normalized matching residual for a match to count.
    /// 0 is a perfect match; a uniform patch against a textured template
    /// lands well above 1.
    pub max_error: f32,
}

impl Default for TemplateTrackerConfig {
    fn default() -> Self {
        Self {
            search_margin: 24,
            max_error: 0.35,
        }
    }
}

struct Tracked {
    template: GrayImage,
    region: Region,
}

/// Concrete [`VisualTracker`] backed by windowed template matching.
pub struct TemplateTracker {
    config: TemplateTrackerConfig,
    tracked: Vec<Tracked>,
}

impl TemplateTracker {
    pub fn new(config: TemplateTrackerConfig) -> Self {
        Self {
            config,
            tracked: Vec::new(),
        }
    }
}

impl Default for TemplateTracker {
    fn default() -> Self {
        Self::new(TemplateTrackerConfig::default())
    }
}

impl VisualTracker for TemplateTracker {
    fn reset(&mut self) {
        self.tracked.clear();
    }

    fn seed(&mut self, frame: &Frame, regions: &[Region]) -> Vec<bool> {
        let gray = image::imageops::grayscale(&frame.image);
        regions
            .iter()
            .map(|region| {
                if !region.fits_in(frame.width(), frame.height()) {
                    return false;
                }
                let template = image::imageops::crop_imm(
                    &gray,
                    region.x,
                    region.y,
                    region.width,
                    region.height,
                )
                .to_image();
                self.tracked.push(Tracked {
                    template,
                    region: *region,
                });
                true
            })
            .collect()
    }

    fn update(&mut self, frame: &Frame) -> (bool, Vec<Region>) {
        if self.tracked.is_empty() {
            return (true, Vec::new());
        }
        let gray = image::imageops::grayscale(&frame.image);
        let (fw, fh) = gray.dimensions();
        let margin = self.config.search_margin;

        let mut regions = Vec::with_capacity(self.tracked.len());
        for t in &mut self.tracked {
            // Search window: last region inflated by the margin, clipped.
            let wx = t.region.x.saturating_sub(margin);
            let wy = t.region.y.saturating_sub(margin);
            let ww = (t.region.width + 2 * margin).min(fw.saturating_sub(wx));
            let wh = (t.region.height + 2 * margin).min(fh.saturating_sub(wy));
            if ww < t.region.width || wh < t.region.height {
                debug!("search window degenerate; reporting loss");
                return (false, Vec::new());
            }

            let window = image::imageops::crop_imm(&gray, wx, wy, ww, wh).to_image();
            let residuals = match_template(
                &window,
                &t.template,
                MatchTemplateMethod::SumOfSquaredErrorsNormalized,
            );
            let extremes = find_extremes(&residuals);
            if !extremes.min_value.is_finite() || extremes.min_value > self.config.max_error {
                debug!(residual = extremes.min_value, "match residual over threshold");
                return (false, Vec::new());
            }

            t.region = Region {
                x: wx + extremes.min_value_location.0,
                y: wy + extremes.min_value_location.1,
                width: t.region.width,
                height: t.region.height,
            };
            regions.push(t.region);
        }
        (true, regions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_circle_mut;

    fn frame_with_ball(cx: i32, cy: i32) -> Frame {
        let mut img = RgbImage::from_pixel(160, 120, Rgb([30, 30, 30]));
        draw_filled_circle_mut(&mut img, (cx, cy), 12, Rgb([230, 60, 50]));
        Frame::new(img)
    }

    fn ball_region(cx: u32, cy: u32) -> Region {
        Region {
            x: cx - 12,
            y: cy - 12,
            width: 24,
            height: 24,
        }
    }

    #[test]
    fn follows_small_translation() {
        let mut tracker = TemplateTracker::default();
        let seeded = tracker.seed(&frame_with_ball(60, 60), &[ball_region(60, 60)]);
        assert_eq!(seeded, vec![true]);

        let (ok, regions) = tracker.update(&frame_with_ball(66, 63));
        assert!(ok, "Shifted ball stays trackable");
        assert_eq!(regions.len(), 1);
        let c = regions[0].center();
        assert!(
            (c[0] - 66.0).abs() <= 2.0 && (c[1] - 63.0).abs() <= 2.0,
            "Tracked center off: {c:?}"
        );
    }

    #[test]
    fn rejects_out_of_bounds_seed() {
        let mut tracker = TemplateTracker::default();
        let off_frame = Region {
            x: 150,
            y: 110,
            width: 24,
            height: 24,
        };
        let flags = tracker.seed(&frame_with_ball(60, 60), &[ball_region(60, 60), off_frame]);
        assert_eq!(flags, vec![true, false], "Only the in-bounds seed sticks");

        let (ok, regions) = tracker.update(&frame_with_ball(60, 60));
        assert!(ok);
        assert_eq!(regions.len(), 1, "Rejected seed is not tracked");
    }

    #[test]
    fn vanished_target_reports_loss() {
        let mut tracker = TemplateTracker::default();
        tracker.seed(&frame_with_ball(60, 60), &[ball_region(60, 60)]);

        let empty = Frame::new(RgbImage::from_pixel(160, 120, Rgb([30, 30, 30])));
        let (ok, regions) = tracker.update(&empty);
        assert!(!ok, "Uniform frame cannot match the ball template");
        assert!(regions.is_empty());
    }

    #[test]
    fn empty_tracker_updates_successfully_with_no_regions() {
        let mut tracker = TemplateTracker::default();
        let (ok, regions) = tracker.update(&frame_with_ball(60, 60));
        assert!(ok);
        assert!(regions.is_empty());
    }
}
