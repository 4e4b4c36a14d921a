//! # glvortex
//!
//! glvortex extracts and tracks quantized vortices in time series of
//! Ginzburg-Landau order-parameter fields. It detects phase windings on the
//! faces of a tetrahedral mesh, chains them into vortex lines, and follows
//! each line's identity from frame to frame.
//!
//! ## Features
//! - Combinatorial dual graph (nodes, edges, faces, cells) with Kuhn
//!   tetrahedralization of regular lattices, periodic axes included
//! - Face puncture detection from the phase winding of the order parameter,
//!   gauge-invariant when a vector potential rides along
//! - Spatial tracing into polylines and loops, with event markers at the
//!   cells where line counts change
//! - Space-time prisms, temporal correspondences, transition matrices, and
//!   globally tracked vortex identities with lifetime events
//! - Binary caches for graphs and punctures, vortex line files with random
//!   frame access, and VTK export for viewers
//!
//! ## Determinism
//!
//! Parallel detection funnels into a single aggregator and every traversal
//! consumes its worklist in id order, so identical inputs produce identical
//! output bytes. Randomized coloring draws from an rng the caller seeds.

pub mod curve;
pub mod extract;
pub mod io;
pub mod topology;
pub mod track;
pub mod vortex_error;

pub use vortex_error::VortexError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::curve::bezier::BezierCurve;
    pub use crate::curve::line::VortexLine;
    pub use crate::extract::dataset::{Complex, Dataset, TimeSlot};
    pub use crate::extract::extractor::{PrismStats, VortexExtractor};
    pub use crate::extract::puncture::{PuncturedCell, PuncturedEdge, PuncturedFace};
    pub use crate::extract::space::{EventMarker, MarkerKind, SpaceTrace};
    pub use crate::extract::time::Correspondence;
    pub use crate::io::line_file::VortexFileReader;
    pub use crate::topology::chirality::Chirality;
    pub use crate::topology::graph::MeshGraph;
    pub use crate::topology::id::{CellId, EdgeId, FaceId, NodeId};
    pub use crate::topology::regular::{tetrahedralize, RegularLattice};
    pub use crate::track::matrix::VortexTransitionMatrix;
    pub use crate::track::transition::{EventKind, VortexEvent, VortexSequence, VortexTransition};
    pub use crate::vortex_error::VortexError;
}
