//! Color-blob circle detector.
//!
//! HSV thresholding (OpenCV convention: H in [0,180), S and V in [0,255])
//! with two hue bands so the red wrap-around is covered, a 3×3 morphological
//! open/close to drop speckle, and connected-component labelling. The
//! largest blob above `min_area` becomes the single reported circle.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use imageproc::region_labelling::{connected_components, Connectivity};
use tracker_core::{Circle, CircleDetector, Frame};
use std::collections::HashMap;

/// One inclusive HSV band.
#[derive(Clone, Copy, Debug)]
pub struct HsvBand {
    pub h: (u8, u8),
    pub s: (u8, u8),
    pub v: (u8, u8),
}

impl HsvBand {
    fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        self.h.0 <= h && h <= self.h.1
            && self.s.0 <= s && s <= self.s.1
            && self.v.0 <= v && v <= self.v.1
    }
}

/// Configuration for color-blob detection. Defaults target a red ball.
#[derive(Clone, Debug)]
pub struct BlobParams {
    pub bands: Vec<HsvBand>,
    /// Smallest blob area (pixels) considered a target
    pub min_area: u32,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            // Red hue wraps around 0, so two bands.
            bands: vec![
                HsvBand {
                    h: (0, 10),
                    s: (120, 255),
                    v: (70, 255),
                },
                HsvBand {
                    h: (170, 180),
                    s: (120, 255),
                    v: (70, 255),
                },
            ],
            min_area: 500,
        }
    }
}

/// Concrete [`CircleDetector`] for uniformly colored targets.
pub struct ColorBlobDetector {
    params: BlobParams,
}

impl ColorBlobDetector {
    pub fn new(params: BlobParams) -> Self {
        Self { params }
    }
}

impl Default for ColorBlobDetector {
    fn default() -> Self {
        Self::new(BlobParams::default())
    }
}

impl CircleDetector for ColorBlobDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Circle> {
        detect_blobs(&frame.image, &self.params)
    }
}

/// Convert one RGB pixel to OpenCV-convention HSV.
fn rgb_to_hsv(p: &Rgb<u8>) -> (u8, u8, u8) {
    let r = p[0] as f32 / 255.0;
    let g = p[1] as f32 / 255.0;
    let b = p[2] as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };

    ((h_deg / 2.0).round() as u8, (s * 255.0).round() as u8, (max * 255.0).round() as u8)
}

/// Threshold, clean and label the image; return the largest qualifying blob.
pub fn detect_blobs(image: &RgbImage, params: &BlobParams) -> Vec<Circle> {
    let (w, h) = image.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, p) in image.enumerate_pixels() {
        let (hh, ss, vv) = rgb_to_hsv(p);
        if params.bands.iter().any(|b| b.contains(hh, ss, vv)) {
            mask.put_pixel(x, y, Luma([255u8]));
        }
    }

    // 3×3 open/close pair knocks out speckle without eating the blob.
    let mask = close(&open(&mask, Norm::LInf, 1), Norm::LInf, 1);

    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

    // Area and bounding box per label.
    struct Extent {
        area: u32,
        min_x: u32,
        min_y: u32,
        max_x: u32,
        max_y: u32,
    }
    let mut extents: HashMap<u32, Extent> = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        if label[0] == 0 {
            continue;
        }
        extents
            .entry(label[0])
            .and_modify(|e| {
                e.area += 1;
                e.min_x = e.min_x.min(x);
                e.min_y = e.min_y.min(y);
                e.max_x = e.max_x.max(x);
                e.max_y = e.max_y.max(y);
            })
            .or_insert(Extent {
                area: 1,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            });
    }

    extents
        .values()
        .filter(|e| e.area >= params.min_area)
        .max_by_key(|e| e.area)
        .map(|e| {
            let bw = e.max_x - e.min_x + 1;
            let bh = e.max_y - e.min_y + 1;
            Circle {
                cx: e.min_x + bw / 2,
                cy: e.min_y + bh / 2,
                radius: bw.max(bh) / 2,
            }
        })
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_circle_mut;

    const RED: Rgb<u8> = Rgb([230, 40, 40]);

    #[test]
    fn red_conversion_lands_in_low_band() {
        let (h, s, v) = rgb_to_hsv(&RED);
        assert!(h <= 10, "Red hue near zero, got {h}");
        assert!(s >= 120 && v >= 70, "Saturated and bright: s={s} v={v}");
    }

    #[test]
    fn finds_largest_red_blob() {
        let mut img = RgbImage::from_pixel(200, 150, Rgb([30, 30, 30]));
        draw_filled_circle_mut(&mut img, (60, 70), 20, RED);
        draw_filled_circle_mut(&mut img, (150, 50), 14, RED);

        let circles = detect_blobs(&img, &BlobParams::default());
        assert_eq!(circles.len(), 1, "Only the largest blob is reported");
        let c = circles[0];
        assert!((c.cx as i32 - 60).abs() <= 2 && (c.cy as i32 - 70).abs() <= 2);
        assert!((c.radius as i32 - 20).abs() <= 2);
    }

    #[test]
    fn small_speckle_is_ignored() {
        let mut img = RgbImage::from_pixel(200, 150, Rgb([30, 30, 30]));
        // ~28 px² of red, far under min_area.
        draw_filled_circle_mut(&mut img, (100, 75), 3, RED);
        assert!(detect_blobs(&img, &BlobParams::default()).is_empty());
    }

    #[test]
    fn green_target_is_invisible_to_red_bands() {
        let mut img = RgbImage::from_pixel(200, 150, Rgb([30, 30, 30]));
        draw_filled_circle_mut(&mut img, (100, 75), 20, Rgb([40, 220, 40]));
        assert!(detect_blobs(&img, &BlobParams::default()).is_empty());
    }
}
