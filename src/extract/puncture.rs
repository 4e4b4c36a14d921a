//! Phase-winding tests and singularity localization.
//!
//! The puncture test is pure arithmetic on a face's phase samples: wrap each
//! edge's phase difference into `(-pi, pi]`, subtract gauge contributions,
//! sum around the ring, and compare against half a turn. Zero localization
//! inverts the linear (triangle) or bilinear (space-time quad) interpolant
//! of the complex field.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::topology::chirality::Chirality;

/// Wraps an angle into `(-pi, pi]`.
pub fn wrap_angle(theta: f64) -> f64 {
    PI - (PI - theta).rem_euclid(TAU)
}

/// Gauge-invariant phase shift around a closed ring of samples.
///
/// `gauge[i]` is the gauge phase along the directed edge `i -> i+1`
/// (cyclic); pass zeros for field-free data.
pub fn phase_shift(phases: &[f64], gauge: &[f64]) -> f64 {
    debug_assert_eq!(phases.len(), gauge.len());
    let n = phases.len();
    let mut total = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        total += wrap_angle(phases[j] - phases[i] - gauge[i]);
    }
    total
}

/// Rounded winding number of a summed phase shift.
pub fn winding_number(shift: f64) -> i32 {
    (shift / TAU).round() as i32
}

/// Puncture criterion. Half a winding is inclusive: a summed shift of
/// exactly `pi` counts as punctured.
pub fn is_punctured(shift: f64) -> bool {
    (shift / TAU).abs() >= 0.5
}

const ZERO_EPS: f64 = 1e-9;

/// Zero of the linear interpolant of a complex field over a triangle.
///
/// `re`/`im` are corner values, `pos` the corner positions. Returns the
/// world-space zero if it lies inside the triangle (barycentric coordinates
/// in `[0, 1]`), `None` when the interpolant is degenerate or the zero
/// falls outside.
pub fn find_zero_triangle(re: [f64; 3], im: [f64; 3], pos: [[f64; 3]; 3]) -> Option<[f64; 3]> {
    let a00 = re[1] - re[0];
    let a01 = re[2] - re[0];
    let a10 = im[1] - im[0];
    let a11 = im[2] - im[0];
    let det = a00 * a11 - a01 * a10;
    if det.abs() < ZERO_EPS {
        return None;
    }
    let b0 = -re[0];
    let b1 = -im[0];
    let l1 = (b0 * a11 - b1 * a01) / det;
    let l2 = (a00 * b1 - a10 * b0) / det;
    let l0 = 1.0 - l1 - l2;
    for l in [l0, l1, l2] {
        if !(-ZERO_EPS..=1.0 + ZERO_EPS).contains(&l) {
            return None;
        }
    }
    let mut out = [0.0; 3];
    for d in 0..3 {
        out[d] = l0 * pos[0][d] + l1 * pos[1][d] + l2 * pos[2][d];
    }
    Some(out)
}

/// Coefficients of the bilinear interpolant `a*x*y + b*x + c*y + d` over
/// the unit square, from corner values in ring order
/// `[f(0,0), f(1,0), f(1,1), f(0,1)]`.
fn bilinear_coeffs(f: [f64; 4]) -> (f64, f64, f64, f64) {
    (f[0] - f[1] + f[2] - f[3], f[1] - f[0], f[3] - f[0], f[0])
}

/// Common zero of two bilinear interpolants over the unit square.
///
/// Corner order is the ring `[(0,0), (1,0), (1,1), (0,1)]`. Eliminating `y`
/// leaves a quadratic in `x`; each admissible root is back-substituted.
/// Returns the first zero with both coordinates in `[0, 1]`.
pub fn find_zero_unit_quad_bilinear(re: [f64; 4], im: [f64; 4]) -> Option<[f64; 2]> {
    let (a, b, c, d) = bilinear_coeffs(re);
    let (a2, b2, c2, d2) = bilinear_coeffs(im);

    let qa = a * b2 - a2 * b;
    let qb = b2 * c + a * d2 - b * c2 - a2 * d;
    let qc = c * d2 - c2 * d;

    let roots: [Option<f64>; 2] = if qa.abs() < ZERO_EPS {
        if qb.abs() < ZERO_EPS {
            return None;
        }
        [Some(-qc / qb), None]
    } else {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        [Some((-qb + sq) / (2.0 * qa)), Some((-qb - sq) / (2.0 * qa))]
    };

    for x in roots.into_iter().flatten() {
        if !(-ZERO_EPS..=1.0 + ZERO_EPS).contains(&x) {
            continue;
        }
        // y from whichever interpolant has a usable denominator at this x
        let y = if (a * x + c).abs() > ZERO_EPS {
            -(b * x + d) / (a * x + c)
        } else if (a2 * x + c2).abs() > ZERO_EPS {
            -(b2 * x + d2) / (a2 * x + c2)
        } else {
            continue;
        };
        if (-ZERO_EPS..=1.0 + ZERO_EPS).contains(&y) {
            return Some([x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)]);
        }
    }
    None
}

/// A face the phase winds around at one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuncturedFace {
    pub chirality: Chirality,
    /// World-space singularity position; `None` when the zero-solve failed
    /// (the face stays punctured, tracing treats it as a dead end).
    pub pos: Option<[f64; 3]>,
}

/// An edge the singularity sweeps past between two frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuncturedEdge {
    pub chirality: Chirality,
    /// Crossing time within the space-time prism, in `[0, 1]`.
    pub t: f64,
}

/// Per-cell (or per-prism) puncture incidence: one chirality slot per
/// bounding element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuncturedCell {
    slots: Vec<Option<Chirality>>,
}

impl PuncturedCell {
    pub fn new(nslots: usize) -> Self {
        PuncturedCell {
            slots: vec![None; nslots],
        }
    }

    pub fn set(&mut self, slot: usize, chirality: Chirality) {
        debug_assert!(slot < self.slots.len());
        self.slots[slot] = Some(chirality);
    }

    pub fn get(&self, slot: usize) -> Option<Chirality> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Chirality)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (i, c)))
    }

    /// Number of nonzero slots.
    pub fn degree(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// `(outgoing, incoming)` slot counts, i.e. how many slots carry `Pos`
    /// vs `Neg`.
    pub fn sign_counts(&self) -> (usize, usize) {
        let pos = self
            .slots
            .iter()
            .flatten()
            .filter(|&&c| c == Chirality::Pos)
            .count();
        (pos, self.degree() - pos)
    }

    pub fn is_punctured(&self) -> bool {
        self.degree() > 0
    }

    /// A cell crossed more than twice is ambiguous and ends ordinary
    /// chaining.
    pub fn is_special(&self) -> bool {
        self.degree() > 2
    }
}
