//! Gradient-voting Hough circle detector.
//!
//! For each pixel with a strong gradient, votes are cast along the gradient
//! direction (both signs, so either edge polarity works) at distances in
//! `[min_radius, max_radius]`, into an accumulator scaled by `1/dp`. Circle
//! centers collect one vote per supporting edge ray; peaks above `param2`
//! survive a `min_dist` non-maximum suppression and get their radius from a
//! histogram of radially-aligned edge support.

use image::GrayImage;
use rayon::prelude::*;
use tracker_core::{Circle, CircleDetector, Frame, HoughParams};
use tracing::debug;

/// Scharr kernel weight sum; divides raw gradients back to intensity scale.
const SCHARR_NORM: f32 = 16.0;

/// Minimum cosine between an edge gradient and the center-to-edge direction
/// for the edge to count as radius support.
const RADIAL_ALIGNMENT: f32 = 0.6;

/// An edge pixel with its unit gradient direction.
struct Edge {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

/// Concrete [`CircleDetector`] backed by the gradient-voting transform.
pub struct HoughCircleDetector {
    params: HoughParams,
}

impl HoughCircleDetector {
    pub fn new(params: HoughParams) -> Self {
        Self { params }
    }
}

impl CircleDetector for HoughCircleDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Circle> {
        let gray = image::imageops::grayscale(&frame.image);
        let circles = detect_circles(&gray, &self.params);
        debug!(seq = frame.seq, circles = circles.len(), "hough pass");
        circles
    }
}

/// Run the full transform over a grayscale image.
pub fn detect_circles(gray: &GrayImage, params: &HoughParams) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 8 || h < 8 || params.min_radius == 0 || params.max_radius < params.min_radius {
        return Vec::new();
    }

    let blurred = imageproc::filter::gaussian_blur_f32(gray, 2.0);
    let edges = find_edges(&blurred, params.param1 as f32);
    if edges.is_empty() {
        return Vec::new();
    }

    // Accumulate center votes at 1/dp resolution. Stepping the ray by `dp`
    // lands at most one vote per cell per ray, so a center's count is the
    // number of supporting edge rays.
    let dp = params.dp as f32;
    let aw = (w as f32 / dp).ceil() as usize;
    let ah = (h as f32 / dp).ceil() as usize;
    let mut accum = vec![0.0f32; aw * ah];

    let r_min = params.min_radius as f32;
    let r_max = params.max_radius as f32;
    for e in &edges {
        for sign in [-1.0f32, 1.0] {
            let mut t = r_min;
            while t <= r_max {
                let cx = e.x + sign * e.dx * t;
                let cy = e.y + sign * e.dy * t;
                let ax = (cx / dp).round();
                let ay = (cy / dp).round();
                if ax >= 0.0 && ay >= 0.0 && (ax as usize) < aw && (ay as usize) < ah {
                    accum[ay as usize * aw + ax as usize] += 1.0;
                }
                t += dp;
            }
        }
    }

    // Peaks above threshold, strongest first, suppressed within min_dist.
    let mut peaks: Vec<(usize, usize, f32)> = Vec::new();
    for ay in 0..ah {
        for ax in 0..aw {
            let v = accum[ay * aw + ax];
            if v >= params.param2 as f32 {
                peaks.push((ax, ay, v));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.total_cmp(&a.2));

    let min_dist2 = (params.min_dist * params.min_dist) as f32;
    let mut centers: Vec<(f32, f32)> = Vec::new();
    for &(ax, ay, _) in &peaks {
        let cx = ax as f32 * dp;
        let cy = ay as f32 * dp;
        let close = centers
            .iter()
            .any(|&(px, py)| (px - cx).powi(2) + (py - cy).powi(2) < min_dist2);
        if !close {
            centers.push((cx, cy));
        }
    }

    // Radius from the modal distance of radially-aligned edge support.
    centers
        .par_iter()
        .filter_map(|&(cx, cy)| estimate_radius(&edges, cx, cy, params))
        .collect()
}

/// Collect pixels whose normalized Scharr gradient magnitude passes the edge
/// threshold, together with their unit gradient directions.
fn find_edges(gray: &GrayImage, threshold: f32) -> Vec<Edge> {
    let gx = imageproc::gradients::horizontal_scharr(gray);
    let gy = imageproc::gradients::vertical_scharr(gray);
    let (w, h) = gray.dimensions();

    let mut edges = Vec::new();
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let dx = gx.get_pixel(x, y)[0] as f32 / SCHARR_NORM;
            let dy = gy.get_pixel(x, y)[0] as f32 / SCHARR_NORM;
            let mag = (dx * dx + dy * dy).sqrt();
            if mag >= threshold {
                edges.push(Edge {
                    x: x as f32,
                    y: y as f32,
                    dx: dx / mag,
                    dy: dy / mag,
                });
            }
        }
    }
    edges
}

/// Histogram edge distances around a candidate center; the modal bin (with
/// its neighbors) must carry at least `param2` support to yield a circle.
fn estimate_radius(edges: &[Edge], cx: f32, cy: f32, params: &HoughParams) -> Option<Circle> {
    let r_min = params.min_radius as f32;
    let r_max = params.max_radius as f32;
    let bins = (params.max_radius - params.min_radius + 1) as usize;
    let mut hist = vec![0u32; bins];

    for e in edges {
        let vx = e.x - cx;
        let vy = e.y - cy;
        let d = (vx * vx + vy * vy).sqrt();
        if d < r_min || d > r_max || d < 1.0 {
            continue;
        }
        let cos = (vx * e.dx + vy * e.dy) / d;
        if cos.abs() < RADIAL_ALIGNMENT {
            continue;
        }
        let bin = (d - r_min).round() as usize;
        if bin < bins {
            hist[bin] += 1;
        }
    }

    let best = (0..bins).max_by_key(|&i| hist[i])?;
    let support: u32 = hist[best.saturating_sub(1)..(best + 2).min(bins)].iter().sum();
    if (support as f64) < params.param2 {
        return None;
    }

    Some(Circle {
        cx: cx.round().max(0.0) as u32,
        cy: cy.round().max(0.0) as u32,
        radius: params.min_radius + best as u32,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_circle_mut;

    /// Parameters tuned for small synthetic scenes: the normalized Scharr
    /// response of a blurred moderate-contrast edge sits well under the
    /// production default of 100.
    fn params() -> HoughParams {
        HoughParams {
            dp: 1.0,
            min_dist: 40.0,
            param1: 15.0,
            param2: 40.0,
            min_radius: 10,
            max_radius: 50,
        }
    }

    fn scene_with_circle(w: u32, h: u32, cx: i32, cy: i32, r: i32) -> GrayImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([30u8]));
        draw_filled_circle_mut(&mut img, (cx, cy), r, Luma([220u8]));
        img
    }

    #[test]
    fn finds_a_single_clean_circle() {
        let img = scene_with_circle(160, 120, 80, 60, 25);
        let circles = detect_circles(&img, &params());
        assert_eq!(circles.len(), 1, "One circle expected, got {circles:?}");
        let c = circles[0];
        assert!(
            (c.cx as i32 - 80).abs() <= 3 && (c.cy as i32 - 60).abs() <= 3,
            "Center off: {c:?}"
        );
        assert!((c.radius as i32 - 25).abs() <= 3, "Radius off: {c:?}");
    }

    #[test]
    fn separated_circles_both_found() {
        let mut img = scene_with_circle(240, 120, 60, 60, 20);
        draw_filled_circle_mut(&mut img, (180, 60), 20, Luma([220u8]));
        let circles = detect_circles(&img, &params());
        assert_eq!(circles.len(), 2, "Got {circles:?}");
    }

    #[test]
    fn blank_image_yields_nothing() {
        let img = GrayImage::from_pixel(160, 120, Luma([30u8]));
        assert!(detect_circles(&img, &params()).is_empty());
    }

    #[test]
    fn radius_bounds_exclude_small_circles() {
        let img = scene_with_circle(160, 120, 80, 60, 5);
        let mut p = params();
        p.min_radius = 15;
        assert!(
            detect_circles(&img, &p).is_empty(),
            "r=5 circle is under the radius floor"
        );
    }
}
