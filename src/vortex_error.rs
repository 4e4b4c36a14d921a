//! VortexError: unified error type for glvortex public APIs
//!
//! This error type is used throughout the library to provide robust,
//! non-panicking error handling for all public APIs. Data-quality issues
//! (e.g. a punctured face whose zero-solve fails) are *not* errors; they are
//! logged and carried as absent positions.

use thiserror::Error;

use crate::topology::id::{CellId, EdgeId, FaceId};

/// Unified error type for glvortex operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VortexError {
    /// A chirality value outside {-1, +1} was decoded or supplied.
    #[error("chirality must be -1 or +1, got {0}")]
    InvalidChirality(i32),
    /// An edge id that is not present in the mesh graph.
    #[error("topology error: edge {0} is not in the graph")]
    MissingEdge(EdgeId),
    /// A face id that is not present in the mesh graph.
    #[error("topology error: face {0} is not in the graph")]
    MissingFace(FaceId),
    /// A cell id that is not present in the mesh graph.
    #[error("topology error: cell {0} is not in the graph")]
    MissingCell(CellId),
    /// A cell id outside the range the builder was sized for.
    #[error("builder error: cell {cell} out of range (graph sized for {ncells} cells)")]
    CellOutOfRange { cell: CellId, ncells: usize },
    /// The same cell id was inserted twice.
    #[error("builder error: cell {0} inserted twice")]
    DuplicateCell(CellId),
    /// A lattice too small to carve into tetrahedra.
    #[error(
        "lattice dims {dims:?} are too small to tetrahedralize \
         (need >= 2 nodes per axis, >= 3 on periodic axes)"
    )]
    DegenerateLattice { dims: [u32; 3] },
    /// A face records an incidence its cell does not mirror.
    #[error("topology error: face {face} records cell {cell} at local index {local}, but the cell does not mirror it")]
    UnmirroredFaceUse {
        face: FaceId,
        cell: CellId,
        local: u8,
    },
    /// An edge records an incidence its face does not mirror.
    #[error("topology error: edge {edge} records face {face} at local index {local}, but the face does not mirror it")]
    UnmirroredEdgeUse {
        edge: EdgeId,
        face: FaceId,
        local: u8,
    },
    /// A cell's neighbor list is not aligned with its face list.
    #[error("topology error: cell {cell} has {faces} faces but {neighbors} neighbor slots")]
    NeighborAlignment {
        cell: CellId,
        faces: usize,
        neighbors: usize,
    },
    /// A face's bounding-edge ring does not match its node ring.
    #[error("topology error: face {face} has {nodes} nodes but {edges} bounding edges")]
    EdgeRingMismatch {
        face: FaceId,
        nodes: usize,
        edges: usize,
    },
    /// A face's bounding edge does not span the matching node-ring segment.
    #[error("topology error: face {face} edge slot {local} does not span its ring segment")]
    EdgeRingSegment { face: FaceId, local: u8 },
    /// Wire payload failed to parse (truncated or malformed).
    #[error("wire parse error: {0}")]
    WireParse(String),
    /// Wire payload magic bytes did not match.
    #[error("wire parse error: bad magic bytes (not a glvortex file)")]
    BadMagic,
    /// Wire payload version is not the one this build understands.
    #[error("wire parse error: version {found} (expected {expected})")]
    WireVersion { found: u16, expected: u16 },
    /// Wire payload kind tag does not match the requested decoder.
    #[error("wire parse error: payload kind {found} (expected {expected})")]
    WireKind { found: u16, expected: u16 },
    /// Random access to a frame past the end of a vortex-line file pair.
    #[error("frame {frame} out of range ({nframes} frames on file)")]
    FrameOutOfRange { frame: usize, nframes: usize },
    /// Sequence construction needs a matrix for every interval in the run.
    #[error("transition error: no matrix for interval [{t0}, {t1}]")]
    MissingInterval { t0: usize, t1: usize },
    /// Consecutive transition matrices disagree on a frame's vortex count.
    #[error("transition error: frame {frame} has {found} vortices, expected {expected}")]
    FrameCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    /// Underlying I/O failure (message-only so the error stays comparable).
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for VortexError {
    fn from(e: std::io::Error) -> Self {
        VortexError::Io(e.to_string())
    }
}
