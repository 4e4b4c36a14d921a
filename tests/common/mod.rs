//! Shared fixtures for the integration tests: tetrahedralized lattices
//! carrying analytic order-parameter fields.
#![allow(dead_code)]

use glvortex::extract::dataset::{Complex, Dataset, TimeSlot};
use glvortex::topology::graph::MeshGraph;
use glvortex::topology::id::NodeId;
use glvortex::topology::regular::{tetrahedralize, RegularLattice};

/// Order parameter sampled at a position and a physical time.
pub type Field = fn([f64; 3], f64) -> Complex;

/// A tetrahedralized lattice with unit spacing and an analytic field.
pub struct SyntheticDataset {
    lattice: RegularLattice,
    graph: MeshGraph,
    name: &'static str,
    frames: (usize, usize),
    field: Field,
}

impl SyntheticDataset {
    pub fn new(name: &'static str, dims: [u32; 3], field: Field) -> Self {
        let lattice = RegularLattice::new(dims, [false; 3]);
        let graph = tetrahedralize(&lattice).expect("test lattices are non-degenerate");
        SyntheticDataset {
            lattice,
            graph,
            name,
            frames: (0, 1),
            field,
        }
    }

    pub fn at_frames(mut self, current: usize, next: usize) -> Self {
        self.frames = (current, next);
        self
    }

    pub fn lattice(&self) -> &RegularLattice {
        &self.lattice
    }
}

impl Dataset for SyntheticDataset {
    fn graph(&self) -> &MeshGraph {
        &self.graph
    }
    fn name(&self) -> &str {
        self.name
    }
    fn frame(&self, slot: TimeSlot) -> usize {
        match slot {
            TimeSlot::Current => self.frames.0,
            TimeSlot::Next => self.frames.1,
        }
    }
    fn position(&self, node: NodeId) -> [f64; 3] {
        let [x, y, z] = self.lattice.node_index(node);
        [f64::from(x), f64::from(y), f64::from(z)]
    }
    fn sample(&self, node: NodeId, slot: TimeSlot) -> Complex {
        (self.field)(self.position(node), self.time(slot))
    }
}

/// A straight unit vortex along z, pinned at `(0.3, 0.6)` for all time.
pub fn straight_vortex(pos: [f64; 3], _t: f64) -> Complex {
    Complex::new(pos[0] - 0.3, pos[1] - 0.6)
}

/// The same vortex drifting in `x` at 0.4 lattice units per frame.
pub fn drifting_vortex(pos: [f64; 3], t: f64) -> Complex {
    Complex::new(pos[0] - 0.3 - 0.4 * t, pos[1] - 0.6)
}

/// No singularity anywhere.
pub fn uniform_field(_pos: [f64; 3], _t: f64) -> Complex {
    Complex::new(1.0, 0.0)
}
