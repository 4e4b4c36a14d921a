//! Transition matrices between the vortices of consecutive frames.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::extract::space::SpaceTrace;
use crate::extract::time::Correspondence;

/// Counts of temporal correspondences between the `n0` vortices of the
/// earlier frame (rows) and the `n1` vortices of the later one (columns).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexTransitionMatrix {
    interval: (usize, usize),
    n0: usize,
    n1: usize,
    entries: Vec<u32>,
}

impl VortexTransitionMatrix {
    pub fn new(interval: (usize, usize), n0: usize, n1: usize) -> Self {
        VortexTransitionMatrix {
            interval,
            n0,
            n1,
            entries: vec![0; n0 * n1],
        }
    }

    /// Bins face-level correspondences into vortex-level counts using the
    /// component labels both traces assigned to their punctured faces.
    pub fn from_correspondences(
        interval: (usize, usize),
        trace0: &SpaceTrace,
        trace1: &SpaceTrace,
        correspondences: &[Correspondence],
    ) -> Self {
        let mut m = Self::new(interval, trace0.components, trace1.components);
        for c in correspondences {
            let (Some(&i), Some(&j)) = (
                trace0.face_components.get(&c.from),
                trace1.face_components.get(&c.to),
            ) else {
                // faces dropped by the tracer (dead ends) carry no label
                debug!("correspondence {} -> {} has no component", c.from, c.to);
                continue;
            };
            m.increment(i as usize, j as usize);
        }
        m
    }

    pub fn interval(&self) -> (usize, usize) {
        self.interval
    }

    pub fn n0(&self) -> usize {
        self.n0
    }

    pub fn n1(&self) -> usize {
        self.n1
    }

    pub fn entry(&self, i: usize, j: usize) -> u32 {
        self.entries[i * self.n1 + j]
    }

    pub fn set_entry(&mut self, i: usize, j: usize, v: u32) {
        self.entries[i * self.n1 + j] = v;
    }

    pub fn increment(&mut self, i: usize, j: usize) {
        self.entries[i * self.n1 + j] += 1;
    }

    /// Correspondence mass leaving row `i`.
    pub fn row_sum(&self, i: usize) -> u32 {
        (0..self.n1).map(|j| self.entry(i, j)).sum()
    }

    /// Correspondence mass entering column `j`.
    pub fn col_sum(&self, j: usize) -> u32 {
        (0..self.n0).map(|i| self.entry(i, j)).sum()
    }
}

impl fmt::Display for VortexTransitionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "interval {}..{}: {}x{}",
            self.interval.0, self.interval.1, self.n0, self.n1
        )?;
        for i in 0..self.n0 {
            for j in 0..self.n1 {
                write!(f, " {:2}", self.entry(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
