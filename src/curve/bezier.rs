//! Piecewise cubic Bezier fitting for extracted vortex lines.
//!
//! Least-squares fit with Newton-Raphson reparameterization, splitting
//! recursively at the worst vertex until the tolerance holds.

use serde::{Deserialize, Serialize};

use crate::curve::line::VortexLine;

const MAX_NEWTON_PASSES: usize = 4;

/// A chain of cubic segments joined at shared endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierCurve {
    segments: Vec<[[f64; 3]; 4]>,
}

impl BezierCurve {
    /// Fits `points` so no vertex lies farther than `max_error` from the
    /// curve. Fewer than two points yield an empty curve.
    pub fn fit(points: &[[f64; 3]], max_error: f64) -> Self {
        let mut curve = BezierCurve::default();
        if points.len() < 2 {
            return curve;
        }
        let tan1 = normalize(sub(points[1], points[0]));
        let tan2 = normalize(sub(points[points.len() - 2], points[points.len() - 1]));
        fit_cubic(points, tan1, tan2, max_error * max_error, &mut curve.segments);
        curve
    }

    /// Fits a traced line; loops are closed by wrapping the first point.
    pub fn from_line(line: &VortexLine, max_error: f64) -> Self {
        let pts = line.points();
        if line.is_loop && pts.len() > 2 {
            let mut closed = pts.to_vec();
            closed.push(pts[0]);
            Self::fit(&closed, max_error)
        } else {
            Self::fit(pts, max_error)
        }
    }

    pub fn segments(&self) -> &[[[f64; 3]; 4]] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Evaluates the curve at `t` in `[0, 1]`, parameterized uniformly per
    /// segment rather than by arc length.
    pub fn sample(&self, t: f64) -> Option<[f64; 3]> {
        if self.segments.is_empty() {
            return None;
        }
        let n = self.segments.len();
        let scaled = t.clamp(0.0, 1.0) * n as f64;
        let idx = (scaled.floor() as usize).min(n - 1);
        let u = scaled - idx as f64;
        Some(weighted(&self.segments[idx], &bernstein(u)))
    }

    /// Expands back into a polyline with `per_segment` subdivisions per
    /// segment, deduplicating the shared joints. The returned line carries
    /// no identity metadata; callers re-attach frame and ids as needed.
    pub fn flatten(&self, per_segment: usize) -> VortexLine {
        let per = per_segment.max(1);
        let mut out = Vec::with_capacity(self.segments.len() * per + 1);
        for (i, seg) in self.segments.iter().enumerate() {
            let start = if i == 0 { 0 } else { 1 };
            for k in start..=per {
                out.push(weighted(seg, &bernstein(k as f64 / per as f64)));
            }
        }
        VortexLine::from_points(0, 0.0, out)
    }
}

fn fit_cubic(
    points: &[[f64; 3]],
    tan1: [f64; 3],
    tan2: [f64; 3],
    sq_error: f64,
    out: &mut Vec<[[f64; 3]; 4]>,
) {
    if points.len() == 2 {
        let d = dist(points[0], points[1]) / 3.0;
        out.push([
            points[0],
            add(points[0], scale(tan1, d)),
            add(points[1], scale(tan2, d)),
            points[1],
        ]);
        return;
    }

    let mut u = chord_length_parameterize(points);
    let mut bez = generate_bezier(points, &u, tan1, tan2);
    let (mut err, mut split) = max_sq_error(points, &bez, &u);
    if err <= sq_error {
        out.push(bez);
        return;
    }

    // a moderately bad fit is often rescued by reparameterization
    if err <= sq_error * 16.0 {
        for _ in 0..MAX_NEWTON_PASSES {
            reparameterize(points, &bez, &mut u);
            bez = generate_bezier(points, &u, tan1, tan2);
            let (e, s) = max_sq_error(points, &bez, &u);
            err = e;
            split = s;
            if err <= sq_error {
                out.push(bez);
                return;
            }
        }
    }

    let center = center_tangent(points, split);
    fit_cubic(&points[..=split], tan1, center, sq_error, out);
    fit_cubic(&points[split..], neg(center), tan2, sq_error, out);
}

/// Least-squares placement of the two inner control points given fixed unit
/// tangents at the ends.
fn generate_bezier(
    points: &[[f64; 3]],
    u: &[f64],
    tan1: [f64; 3],
    tan2: [f64; 3],
) -> [[f64; 3]; 4] {
    let first = points[0];
    let last = points[points.len() - 1];

    let mut c = [[0.0f64; 2]; 2];
    let mut x = [0.0f64; 2];
    for (&p, &ui) in points.iter().zip(u) {
        let b = bernstein(ui);
        let a0 = scale(tan1, b[1]);
        let a1 = scale(tan2, b[2]);
        c[0][0] += dot(a0, a0);
        c[0][1] += dot(a0, a1);
        c[1][1] += dot(a1, a1);
        let tmp = sub(
            p,
            add(scale(first, b[0] + b[1]), scale(last, b[2] + b[3])),
        );
        x[0] += dot(a0, tmp);
        x[1] += dot(a1, tmp);
    }
    c[1][0] = c[0][1];

    let det = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let (alpha_l, alpha_r) = if det.abs() > f64::EPSILON {
        (
            (x[0] * c[1][1] - x[1] * c[0][1]) / det,
            (c[0][0] * x[1] - c[1][0] * x[0]) / det,
        )
    } else {
        (0.0, 0.0)
    };

    // degenerate alphas: place the controls a third of the way instead
    let seg_length = dist(first, last);
    let eps = 1.0e-6 * seg_length;
    if alpha_l < eps || alpha_r < eps {
        let d = seg_length / 3.0;
        return [
            first,
            add(first, scale(tan1, d)),
            add(last, scale(tan2, d)),
            last,
        ];
    }
    [
        first,
        add(first, scale(tan1, alpha_l)),
        add(last, scale(tan2, alpha_r)),
        last,
    ]
}

fn chord_length_parameterize(points: &[[f64; 3]]) -> Vec<f64> {
    let mut u = vec![0.0; points.len()];
    let mut acc = 0.0;
    for (i, w) in points.windows(2).enumerate() {
        acc += dist(w[0], w[1]);
        u[i + 1] = acc;
    }
    if acc > 0.0 {
        for v in &mut u[1..] {
            *v /= acc;
        }
    }
    u
}

fn reparameterize(points: &[[f64; 3]], bez: &[[f64; 3]; 4], u: &mut [f64]) {
    for (p, ui) in points.iter().zip(u.iter_mut()) {
        *ui = newton_step(bez, *p, *ui);
    }
}

/// One Newton-Raphson step minimizing the squared distance from `p` to the
/// curve, starting at parameter `u`.
fn newton_step(bez: &[[f64; 3]; 4], p: [f64; 3], u: f64) -> f64 {
    let mut q1 = [[0.0; 3]; 3];
    for i in 0..3 {
        q1[i] = scale(sub(bez[i + 1], bez[i]), 3.0);
    }
    let mut q2 = [[0.0; 3]; 2];
    for i in 0..2 {
        q2[i] = scale(sub(q1[i + 1], q1[i]), 2.0);
    }

    let v = 1.0 - u;
    let q = weighted(bez, &bernstein(u));
    let qu1 = weighted(&q1, &[v * v, 2.0 * u * v, u * u]);
    let qu2 = weighted(&q2, &[v, u]);

    let diff = sub(q, p);
    let den = dot(qu1, qu1) + dot(diff, qu2);
    if den.abs() < f64::EPSILON {
        u
    } else {
        (u - dot(diff, qu1) / den).clamp(0.0, 1.0)
    }
}

fn max_sq_error(points: &[[f64; 3]], bez: &[[f64; 3]; 4], u: &[f64]) -> (f64, usize) {
    let mut worst = 0.0;
    let mut split = points.len() / 2;
    for i in 1..points.len() - 1 {
        let d = sub(weighted(bez, &bernstein(u[i])), points[i]);
        let sq = dot(d, d);
        if sq > worst {
            worst = sq;
            split = i;
        }
    }
    (worst, split)
}

fn center_tangent(points: &[[f64; 3]], center: usize) -> [f64; 3] {
    normalize(sub(points[center - 1], points[center + 1]))
}

fn bernstein(u: f64) -> [f64; 4] {
    let v = 1.0 - u;
    [v * v * v, 3.0 * u * v * v, 3.0 * u * u * v, u * u * u]
}

fn weighted(ctrl: &[[f64; 3]], w: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (c, &wi) in ctrl.iter().zip(w) {
        for (o, ck) in out.iter_mut().zip(c) {
            *o += wi * ck;
        }
    }
    out
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn neg(a: [f64; 3]) -> [f64; 3] {
    [-a[0], -a[1], -a[2]]
}

fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn dist(a: [f64; 3], b: [f64; 3]) -> f64 {
    dot(sub(a, b), sub(a, b)).sqrt()
}

fn normalize(a: [f64; 3]) -> [f64; 3] {
    let n = dot(a, a).sqrt();
    if n > 0.0 {
        scale(a, 1.0 / n)
    } else {
        a
    }
}
