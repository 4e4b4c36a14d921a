//! Top-level module for dual-graph mesh topology.
//!
//! This module provides the connectivity layer the vortex extractors run on:
//! - Typed ids and signed chirality for oriented incidences
//! - Canonical face/edge keys (orientation-insensitive lookup)
//! - The `MeshGraph` storage plus its incremental `TetGraphBuilder`
//! - Regular lattices with periodic axes and their 6-tet subdivision
//!
//! Most users will build a graph once (via `TetGraphBuilder` or
//! `tetrahedralize`) and hand it to a `Dataset` for extraction.

pub mod builder;
pub mod canon;
pub mod chirality;
pub mod graph;
pub mod id;
pub mod regular;

pub use builder::TetGraphBuilder;
pub use chirality::Chirality;
pub use graph::{CCell, CEdge, CFace, CellUse, FaceUse, MeshGraph};
pub use id::{CellId, EdgeId, FaceId, NodeId};
pub use regular::{tetrahedralize, RegularLattice};
