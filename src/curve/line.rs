//! Vortex line geometry.
//!
//! A `VortexLine` is an ordered polyline through the singularity positions
//! a spatial trace collected, plus the identity metadata tracking attaches
//! to it. The point sequence is held by composition and only reachable
//! through accessors; geometric utilities (resampling, simplification,
//! extent queries) live here too.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One traced vortex polyline with its identity metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VortexLine {
    points: Vec<[f64; 3]>,
    /// Local vortex id within the frame (the trace component index).
    pub id: Option<u32>,
    /// Global sequence id, assigned by temporal tracking.
    pub gid: Option<u32>,
    /// Frame the line was traced in.
    pub frame: usize,
    /// Physical time of that frame.
    pub time: f64,
    /// Closed loop: the last point connects back to the first.
    pub is_loop: bool,
    pub color: [u8; 3],
}

impl VortexLine {
    pub fn new(frame: usize, time: f64) -> Self {
        VortexLine {
            points: Vec::new(),
            id: None,
            gid: None,
            frame,
            time,
            is_loop: false,
            color: [255, 0, 0],
        }
    }

    pub fn from_points(frame: usize, time: f64, points: Vec<[f64; 3]>) -> Self {
        let mut line = Self::new(frame, time);
        line.points = points;
        line
    }

    pub fn push(&mut self, p: [f64; 3]) {
        self.points.push(p);
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Arc length, including the closing segment for loops.
    pub fn length(&self) -> f64 {
        let mut total: f64 = self
            .points
            .iter()
            .tuple_windows()
            .map(|(a, b)| dist(*a, *b))
            .sum();
        if self.is_loop && self.points.len() > 2 {
            total += dist(self.points[self.points.len() - 1], self.points[0]);
        }
        total
    }

    /// Axis-aligned bounding box `(lo, hi)`; `None` for an empty line.
    pub fn bounding_box(&self) -> Option<([f64; 3], [f64; 3])> {
        let first = *self.points.first()?;
        let mut lo = first;
        let mut hi = first;
        for p in &self.points {
            for d in 0..3 {
                lo[d] = lo[d].min(p[d]);
                hi[d] = hi[d].max(p[d]);
            }
        }
        Some((lo, hi))
    }

    /// Largest bounding-box extent over the three axes.
    pub fn max_extent(&self) -> f64 {
        match self.bounding_box() {
            Some((lo, hi)) => (0..3).map(|d| hi[d] - lo[d]).fold(0.0, f64::max),
            None => 0.0,
        }
    }

    /// Drops points with NaN or infinite coordinates.
    pub fn retain_finite(&mut self) {
        self.points.retain(|p| p.iter().all(|v| v.is_finite()));
    }

    /// Point at normalized arc-length parameter `t` in `[0, 1]`, linearly
    /// interpolated. Loops are sampled over their closed circumference.
    pub fn sample_linear(&self, t: f64) -> Option<[f64; 3]> {
        let first = *self.points.first()?;
        if self.points.len() == 1 {
            return Some(first);
        }
        let total = self.length();
        if total <= 0.0 {
            return Some(first);
        }
        let mut target = t.clamp(0.0, 1.0) * total;
        let closing = if self.is_loop && self.points.len() > 2 {
            Some((self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        let segments = self
            .points
            .iter()
            .copied()
            .tuple_windows()
            .chain(closing);
        for (a, b) in segments {
            let seg = dist(a, b);
            if target <= seg || seg <= 0.0 {
                if seg <= 0.0 {
                    continue;
                }
                let s = target / seg;
                return Some([
                    a[0] + s * (b[0] - a[0]),
                    a[1] + s * (b[1] - a[1]),
                    a[2] + s * (b[2] - a[2]),
                ]);
            }
            target -= seg;
        }
        // accumulated rounding walked off the end
        Some(if self.is_loop { first } else { self.points[self.points.len() - 1] })
    }

    /// Resamples to `n` points, uniform in arc length. Metadata is kept.
    pub fn to_regular(&self, n: usize) -> VortexLine {
        let mut out = self.clone();
        if self.points.len() < 2 || n < 2 {
            return out;
        }
        let denom = if self.is_loop { n } else { n - 1 } as f64;
        out.points = (0..n)
            .filter_map(|i| self.sample_linear(i as f64 / denom))
            .collect();
        out
    }

    /// Douglas-Peucker simplification with absolute tolerance `tol`.
    /// Endpoints are always kept; loops keep their seam point.
    pub fn simplify(&mut self, tol: f64) {
        if self.points.len() < 3 {
            return;
        }
        let n = self.points.len();
        let mut keep = vec![false; n];
        keep[0] = true;
        keep[n - 1] = true;
        let mut stack = vec![(0usize, n - 1)];
        while let Some((lo, hi)) = stack.pop() {
            if hi <= lo + 1 {
                continue;
            }
            let (mut worst, mut worst_d) = (lo + 1, -1.0);
            for i in lo + 1..hi {
                let d = point_segment_distance(self.points[i], self.points[lo], self.points[hi]);
                if d > worst_d {
                    worst = i;
                    worst_d = d;
                }
            }
            if worst_d > tol {
                keep[worst] = true;
                stack.push((lo, worst));
                stack.push((worst, hi));
            }
        }
        let mut idx = 0;
        self.points.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
    }
}

fn dist(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Distance from `p` to the segment `a..b`.
fn point_segment_distance(p: [f64; 3], a: [f64; 3], b: [f64; 3]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let ap = [p[0] - a[0], p[1] - a[1], p[2] - a[2]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1] + ab[2] * ab[2];
    if len2 <= 0.0 {
        return dist(p, a);
    }
    let t = ((ap[0] * ab[0] + ap[1] * ab[1] + ap[2] * ab[2]) / len2).clamp(0.0, 1.0);
    let q = [a[0] + t * ab[0], a[1] + t * ab[1], a[2] + t * ab[2]];
    dist(p, q)
}
