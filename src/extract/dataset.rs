//! Dataset abstraction over order-parameter fields.
//!
//! Extraction needs surprisingly little from a simulation snapshot: the mesh
//! graph it lives on, complex field samples at nodes for (up to) two
//! consecutive frames, node positions, and the gauge terms that enter the
//! phase-winding sums. `Dataset` captures exactly that, so synthetic fields
//! in tests and real simulation dumps plug into the same extractor.

use crate::topology::graph::MeshGraph;
use crate::topology::id::{FaceId, NodeId};

/// Which of the two loaded frames a sample refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    /// The frame currently being extracted.
    Current,
    /// The successor frame, loaded for temporal tracing.
    Next,
}

impl TimeSlot {
    pub const fn index(self) -> usize {
        match self {
            TimeSlot::Current => 0,
            TimeSlot::Next => 1,
        }
    }
}

/// Complex order-parameter value at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    pub fn from_polar(modulus: f64, phase: f64) -> Self {
        Complex {
            re: modulus * phase.cos(),
            im: modulus * phase.sin(),
        }
    }

    /// Argument in `(-pi, pi]`.
    pub fn phase(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn modulus(self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }
}

/// A snapshot (or pair of consecutive snapshots) of a complex field on a
/// mesh graph.
///
/// `Next`-slot methods are only called after the caller has loaded a
/// successor frame; single-frame datasets may make `Next` mirror `Current`.
pub trait Dataset {
    /// The graph extraction runs over.
    fn graph(&self) -> &MeshGraph;

    /// Short name used to derive cache file paths.
    fn name(&self) -> &str;

    /// Frame number held in `slot`.
    fn frame(&self, slot: TimeSlot) -> usize;

    /// Physical time of `slot`. Defaults to the frame number for datasets
    /// without timestamps.
    fn time(&self, slot: TimeSlot) -> f64 {
        self.frame(slot) as f64
    }

    /// Node position in world coordinates.
    fn position(&self, node: NodeId) -> [f64; 3];

    /// Order parameter at `node` in `slot`.
    fn sample(&self, node: NodeId, slot: TimeSlot) -> Complex;

    /// Gauge phase accumulated along the directed edge `n0 -> n1`, i.e. the
    /// line integral of the vector potential. Zero for field-free datasets.
    fn gauge_phase(&self, _n0: NodeId, _n1: NodeId, _slot: TimeSlot) -> f64 {
        0.0
    }

    /// Magnetic flux through `face`, entering the winding sum of the
    /// gauge-invariant phase. Zero for field-free datasets.
    fn face_flux(&self, _face: FaceId) -> f64 {
        0.0
    }
}
