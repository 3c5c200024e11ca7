//! Hough gradient circle transform.
//!
//! Edge pixels (Canny, upper threshold `param1`, lower `param1 / 2`) vote along
//! their gradient direction, in both senses, for every distance in
//! `[min_radius, max_radius]`. Votes land in a centre accumulator that is `dp`
//! times coarser than the image. Accumulator peaks above `param2` become centre
//! candidates, strongest first; a candidate closer than `min_dist` to an
//! accepted centre is dropped. The radius of each surviving centre is the
//! distance band with the best edge support relative to its circumference.

use image::GrayImage;
use tracing::debug;

use crate::{
    error::Result,
    traits::CircleTransform,
    types::{Circle, DetectionParameters},
};

/// Edge pixel with its unit gradient direction
#[derive(Debug, Clone, Copy)]
struct EdgePoint {
    x: f32,
    y: f32,
    ux: f32,
    uy: f32,
}

/// Centre accumulator at `1 / dp` of the image resolution.
struct Accumulator {
    cols: usize,
    rows: usize,
    dp: f32,
    votes: Vec<u32>,
}

impl Accumulator {
    fn new(width: u32, height: u32, dp: f32) -> Self {
        let cols = ((width as f32 / dp).ceil() as usize).max(1);
        let rows = ((height as f32 / dp).ceil() as usize).max(1);
        Self {
            cols,
            rows,
            dp,
            votes: vec![0; cols * rows],
        }
    }

    /// Walk one pixel at a time along a ray, voting until it leaves the grid.
    fn cast_ray(&mut self, point: &EdgePoint, sign: f32, min_radius: f32, max_radius: f32) {
        let mut r = min_radius;
        while r <= max_radius {
            let ax = (point.x + sign * point.ux * r) / self.dp;
            let ay = (point.y + sign * point.uy * r) / self.dp;
            if ax < 0.0 || ay < 0.0 {
                break;
            }
            let (col, row) = (ax as usize, ay as usize);
            if col >= self.cols || row >= self.rows {
                break;
            }
            self.votes[row * self.cols + col] += 1;
            r += 1.0;
        }
    }

    /// Local maxima above `threshold`, strongest first.
    fn peaks(&self, threshold: f64) -> Vec<(usize, u32)> {
        let mut peaks = Vec::new();
        if self.cols < 3 || self.rows < 3 {
            return peaks;
        }

        for row in 1..self.rows - 1 {
            for col in 1..self.cols - 1 {
                let idx = row * self.cols + col;
                let v = self.votes[idx];
                if f64::from(v) <= threshold {
                    continue;
                }
                if v > self.votes[idx - 1]
                    && v >= self.votes[idx + 1]
                    && v > self.votes[idx - self.cols]
                    && v >= self.votes[idx + self.cols]
                {
                    peaks.push((idx, v));
                }
            }
        }

        // Stable sort keeps raster order among equal vote counts
        peaks.sort_by(|a, b| b.1.cmp(&a.1));
        peaks
    }

    fn cell_center(&self, idx: usize) -> (f32, f32) {
        let col = idx % self.cols;
        let row = idx / self.cols;
        ((col as f32 + 0.5) * self.dp, (row as f32 + 0.5) * self.dp)
    }
}

/// Classical gradient-based Hough circle transform
#[derive(Debug, Clone)]
pub struct HoughGradientTransform {
    /// Smoothing applied before estimating gradient directions
    pub gradient_sigma: f32,
}

impl Default for HoughGradientTransform {
    fn default() -> Self {
        // Same smoothing imageproc's canny applies internally
        Self { gradient_sigma: 1.4 }
    }
}

impl HoughGradientTransform {
    fn edge_points(&self, image: &GrayImage, params: &DetectionParameters) -> Vec<EdgePoint> {
        let high = params.param1 as f32;
        let edges = imageproc::edges::canny(image, high / 2.0, high);

        let smoothed = if self.gradient_sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(image, self.gradient_sigma)
        } else {
            image.clone()
        };
        let gx = imageproc::gradients::horizontal_sobel(&smoothed);
        let gy = imageproc::gradients::vertical_sobel(&smoothed);

        let mut points = Vec::new();
        for (x, y, pixel) in edges.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            let dx = f32::from(gx.get_pixel(x, y)[0]);
            let dy = f32::from(gy.get_pixel(x, y)[0]);
            let mag = (dx * dx + dy * dy).sqrt();
            if mag < f32::EPSILON {
                continue;
            }
            points.push(EdgePoint {
                x: x as f32,
                y: y as f32,
                ux: dx / mag,
                uy: dy / mag,
            });
        }
        points
    }
}

/// Pick the radius band with the best support.
///
/// `distances` must be sorted ascending. Bands are `width` wide; a band is
/// preferred when its count per unit radius is higher, so large faint rings do
/// not beat small complete ones. Returns `(radius, support)`.
fn best_radius(distances: &[f32], width: f32) -> Option<(f32, usize)> {
    let mut best: Option<(f32, usize)> = None;
    let mut hi = 0;

    for lo in 0..distances.len() {
        if hi < lo {
            hi = lo;
        }
        while hi < distances.len() && distances[hi] - distances[lo] <= width {
            hi += 1;
        }
        let count = hi - lo;
        let radius = distances[(lo + hi - 1) / 2];

        let better = match best {
            None => true,
            Some((best_r, best_count)) => {
                count as f32 * best_r > best_count as f32 * radius
                    || (count as f32 * best_r == best_count as f32 * radius && count > best_count)
            }
        };
        if better {
            best = Some((radius, count));
        }
    }
    best
}

impl CircleTransform for HoughGradientTransform {
    fn find_circles(&self, image: &GrayImage, params: &DetectionParameters) -> Result<Vec<Circle>> {
        params.validate()?;

        let (width, height) = image.dimensions();
        if width < 3 || height < 3 {
            return Ok(Vec::new());
        }

        // Finer than the image grid buys nothing
        let dp = params.dp.max(1.0) as f32;
        let min_radius = params.min_radius as f32;
        let max_radius = params.max_radius as f32;

        let points = self.edge_points(image, params);
        debug!(edge_points = points.len(), "collected edge points");
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let mut accumulator = Accumulator::new(width, height, dp);
        for point in &points {
            accumulator.cast_ray(point, 1.0, min_radius, max_radius);
            accumulator.cast_ray(point, -1.0, min_radius, max_radius);
        }

        let peaks = accumulator.peaks(params.param2);
        debug!(candidates = peaks.len(), "accumulator peaks");

        let min_dist_sq = (params.min_dist * params.min_dist) as f32;
        let (min_r_sq, max_r_sq) = (min_radius * min_radius, max_radius * max_radius);
        let band = 2.0 * dp;

        let mut accepted: Vec<(f32, f32, f32)> = Vec::new();
        let mut distances = Vec::with_capacity(points.len());

        for (idx, votes) in peaks {
            let (cx, cy) = accumulator.cell_center(idx);

            let too_close = accepted.iter().any(|&(ax, ay, _)| {
                let (dx, dy) = (ax - cx, ay - cy);
                dx * dx + dy * dy < min_dist_sq
            });
            if too_close {
                continue;
            }

            distances.clear();
            distances.extend(points.iter().filter_map(|p| {
                let (dx, dy) = (p.x - cx, p.y - cy);
                let d_sq = dx * dx + dy * dy;
                (min_r_sq..=max_r_sq).contains(&d_sq).then(|| d_sq.sqrt())
            }));
            if (distances.len() as f64) <= params.param2 {
                continue;
            }
            distances.sort_by(|a, b| a.total_cmp(b));

            if let Some((radius, support)) = best_radius(&distances, band) {
                if support as f64 > params.param2 {
                    debug!(cx, cy, radius, votes, support, "accepted circle");
                    accepted.push((cx, cy, radius));
                }
            }
        }

        Ok(accepted
            .into_iter()
            .map(|(x, y, r)| Circle::new(x.round() as i32, y.round() as i32, r.round() as u32))
            .collect())
    }
}
