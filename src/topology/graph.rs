//! `MeshGraph`: immutable-after-build dual graph of a 3D mesh.
//!
//! Edges, faces and cells are stored exactly once each, with
//! chirality-tagged incidence records linking the levels:
//!
//! * an edge knows every face that contains it (and at which local edge
//!   index, with which orientation sign),
//! * a face knows its ordered node ring, its bounding edges, and every cell
//!   that contains it,
//! * a cell knows its nodes, its bounding faces, and its face-aligned
//!   neighbor cells (`None` across a domain boundary).
//!
//! Graphs are produced by [`crate::topology::builder::TetGraphBuilder`]
//! (which hands its dedup maps over as the lookup index) or decoded from the
//! wire format, and never mutated afterwards; a decoded graph builds its
//! index lazily on first lookup, and no invalidation path exists.

use once_cell::sync::OnceCell;

use hashbrown::HashMap as FastMap;

use crate::topology::canon::{self, EdgeKey, FaceKey};
use crate::topology::chirality::Chirality;
use crate::topology::id::{CellId, EdgeId, FaceId, NodeId};
use crate::vortex_error::VortexError;

/// One face's use of an edge: which face, with which orientation, and at
/// which position in the face's edge ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FaceUse {
    pub face: FaceId,
    pub chirality: Chirality,
    pub local_edge: u8,
}

/// One cell's use of a face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CellUse {
    pub cell: CellId,
    pub chirality: Chirality,
    pub local_face: u8,
}

/// A deduplicated edge. `node0 -> node1` is the canonical direction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CEdge {
    pub node0: NodeId,
    pub node1: NodeId,
    /// Every face containing this edge, in face-insertion order.
    pub faces: Vec<FaceUse>,
}

/// A deduplicated face. The node ring as first inserted is the canonical
/// orientation; `edges[k]` bounds the ring segment `nodes[k] -> nodes[k+1]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CFace {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<(EdgeId, Chirality)>,
    /// Every cell containing this face, in cell-insertion order.
    pub cells: Vec<CellUse>,
}

/// A volumetric cell. `neighbors[k]` is the cell across `faces[k]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CCell {
    pub nodes: Vec<NodeId>,
    pub faces: Vec<(FaceId, Chirality)>,
    pub neighbors: Vec<Option<CellId>>,
}

#[derive(Default)]
struct GraphIndex {
    faces: FastMap<FaceKey, FaceId>,
    edges: FastMap<EdgeKey, EdgeId>,
}

impl std::fmt::Debug for GraphIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphIndex")
            .field("faces", &self.faces.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

/// The mesh dual graph. See the module docs for the storage contract.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MeshGraph {
    edges: Vec<CEdge>,
    faces: Vec<CFace>,
    cells: Vec<CCell>,
    #[serde(skip)]
    index: OnceCell<GraphIndex>,
}

impl PartialEq for MeshGraph {
    fn eq(&self, other: &Self) -> bool {
        self.edges == other.edges && self.faces == other.faces && self.cells == other.cells
    }
}

impl MeshGraph {
    pub(crate) fn from_parts(edges: Vec<CEdge>, faces: Vec<CFace>, cells: Vec<CCell>) -> Self {
        MeshGraph {
            edges,
            faces,
            cells,
            index: OnceCell::new(),
        }
    }

    /// Adopts the builder's dedup maps as the lookup index, skipping the
    /// lazy rebuild for graphs that come out of a builder.
    pub(crate) fn seed_index(
        &self,
        faces: FastMap<FaceKey, FaceId>,
        edges: FastMap<EdgeKey, EdgeId>,
    ) {
        let _ = self.index.set(GraphIndex { faces, edges });
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Borrow an edge. Panics if the id is not from this graph.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &CEdge {
        &self.edges[id.index()]
    }

    /// Borrow a face. Panics if the id is not from this graph.
    #[inline]
    pub fn face(&self, id: FaceId) -> &CFace {
        &self.faces[id.index()]
    }

    /// Borrow a cell. Panics if the id is not from this graph.
    #[inline]
    pub fn cell(&self, id: CellId) -> &CCell {
        &self.cells[id.index()]
    }

    pub fn try_edge(&self, id: EdgeId) -> Result<&CEdge, VortexError> {
        self.edges
            .get(id.index())
            .ok_or(VortexError::MissingEdge(id))
    }

    pub fn try_face(&self, id: FaceId) -> Result<&CFace, VortexError> {
        self.faces
            .get(id.index())
            .ok_or(VortexError::MissingFace(id))
    }

    pub fn try_cell(&self, id: CellId) -> Result<&CCell, VortexError> {
        self.cells
            .get(id.index())
            .ok_or(VortexError::MissingCell(id))
    }

    /// All edges with their ids, in id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &CEdge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId::new(i as u32), e))
    }

    /// All faces with their ids, in id order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &CFace)> {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId::new(i as u32), f))
    }

    /// All cells with their ids, in id order.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &CCell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (CellId::new(i as u32), c))
    }

    /// Faces referenced by exactly one cell.
    pub fn boundary_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces()
            .filter(|(_, f)| f.cells.len() == 1)
            .map(|(id, _)| id)
    }

    /// Looks a face up by any of its 6 equivalent node orderings.
    ///
    /// The returned chirality is the query ordering's sign relative to the
    /// stored canonical one.
    pub fn find_face(&self, nodes: [NodeId; 3]) -> Option<(FaceId, Chirality)> {
        let id = *self.index().faces.get(&FaceKey::new(nodes))?;
        let stored = &self.faces[id.index()];
        let chirality = canon::face_chirality(
            nodes,
            [stored.nodes[0], stored.nodes[1], stored.nodes[2]],
        )?;
        Some((id, chirality))
    }

    /// Looks an edge up by either node ordering.
    pub fn find_edge(&self, a: NodeId, b: NodeId) -> Option<(EdgeId, Chirality)> {
        let id = *self.index().edges.get(&canon::edge_key(a, b))?;
        let stored = &self.edges[id.index()];
        let chirality = canon::edge_chirality((a, b), (stored.node0, stored.node1))?;
        Some((id, chirality))
    }

    fn index(&self) -> &GraphIndex {
        self.index.get_or_init(|| {
            let mut idx = GraphIndex::default();
            idx.edges.reserve(self.edges.len());
            for (id, e) in self.edges() {
                idx.edges.insert(canon::edge_key(e.node0, e.node1), id);
            }
            idx.faces.reserve(self.faces.len());
            for (id, f) in self.faces() {
                if f.nodes.len() == 3 {
                    idx.faces
                        .insert(FaceKey::new([f.nodes[0], f.nodes[1], f.nodes[2]]), id);
                }
            }
            idx
        })
    }

    /// Structural consistency check: every incidence record must be mirrored
    /// by the element it points at, rings must line up, neighbor lists must
    /// be face-aligned. Cheap enough to run on every freshly decoded graph.
    pub fn validate(&self) -> Result<(), VortexError> {
        for (eid, edge) in self.edges() {
            for fu in &edge.faces {
                let face = self.try_face(fu.face)?;
                let mirrored = face
                    .edges
                    .get(fu.local_edge as usize)
                    .is_some_and(|&(e, chi)| e == eid && chi == fu.chirality);
                if !mirrored {
                    return Err(VortexError::UnmirroredEdgeUse {
                        edge: eid,
                        face: fu.face,
                        local: fu.local_edge,
                    });
                }
            }
        }
        for (fid, face) in self.faces() {
            if face.nodes.len() != face.edges.len() {
                return Err(VortexError::EdgeRingMismatch {
                    face: fid,
                    nodes: face.nodes.len(),
                    edges: face.edges.len(),
                });
            }
            for (k, &(eid, chi)) in face.edges.iter().enumerate() {
                let edge = self.try_edge(eid)?;
                let a = face.nodes[k];
                let b = face.nodes[(k + 1) % face.nodes.len()];
                let spans = match chi {
                    Chirality::Pos => edge.node0 == a && edge.node1 == b,
                    Chirality::Neg => edge.node0 == b && edge.node1 == a,
                };
                if !spans {
                    return Err(VortexError::EdgeRingSegment {
                        face: fid,
                        local: k as u8,
                    });
                }
            }
            for cu in &face.cells {
                let cell = self.try_cell(cu.cell)?;
                let mirrored = cell
                    .faces
                    .get(cu.local_face as usize)
                    .is_some_and(|&(f, chi)| f == fid && chi == cu.chirality);
                if !mirrored {
                    return Err(VortexError::UnmirroredFaceUse {
                        face: fid,
                        cell: cu.cell,
                        local: cu.local_face,
                    });
                }
            }
        }
        for (cid, cell) in self.cells() {
            if cell.faces.len() != cell.neighbors.len() {
                return Err(VortexError::NeighborAlignment {
                    cell: cid,
                    faces: cell.faces.len(),
                    neighbors: cell.neighbors.len(),
                });
            }
            for &(fid, _) in &cell.faces {
                self.try_face(fid)?;
            }
            for n in cell.neighbors.iter().flatten() {
                self.try_cell(*n)?;
            }
        }
        Ok(())
    }

    /// Debug-build consistency assertion, in the spirit of
    /// `debug_assert!`: compiled out of release builds.
    pub(crate) fn debug_assert_consistent(&self) {
        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            panic!("inconsistent mesh graph: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(raw: u32) -> NodeId {
        NodeId::new(raw)
    }

    /// Two triangles sharing edge (1,2), one cell-less "mesh" assembled by
    /// hand so the accessors can be exercised without a builder.
    fn two_face_graph() -> MeshGraph {
        let edges = vec![
            CEdge {
                node0: n(1),
                node1: n(2),
                faces: vec![
                    FaceUse {
                        face: FaceId::new(0),
                        chirality: Chirality::Pos,
                        local_edge: 0,
                    },
                    FaceUse {
                        face: FaceId::new(1),
                        chirality: Chirality::Neg,
                        local_edge: 0,
                    },
                ],
            },
            CEdge {
                node0: n(2),
                node1: n(3),
                faces: vec![FaceUse {
                    face: FaceId::new(0),
                    chirality: Chirality::Pos,
                    local_edge: 1,
                }],
            },
            CEdge {
                node0: n(3),
                node1: n(1),
                faces: vec![FaceUse {
                    face: FaceId::new(0),
                    chirality: Chirality::Pos,
                    local_edge: 2,
                }],
            },
            CEdge {
                node0: n(1),
                node1: n(4),
                faces: vec![FaceUse {
                    face: FaceId::new(1),
                    chirality: Chirality::Pos,
                    local_edge: 1,
                }],
            },
            CEdge {
                node0: n(4),
                node1: n(2),
                faces: vec![FaceUse {
                    face: FaceId::new(1),
                    chirality: Chirality::Pos,
                    local_edge: 2,
                }],
            },
        ];
        let faces = vec![
            CFace {
                nodes: vec![n(1), n(2), n(3)],
                edges: vec![
                    (EdgeId::new(0), Chirality::Pos),
                    (EdgeId::new(1), Chirality::Pos),
                    (EdgeId::new(2), Chirality::Pos),
                ],
                cells: vec![],
            },
            CFace {
                nodes: vec![n(2), n(1), n(4)],
                edges: vec![
                    (EdgeId::new(0), Chirality::Neg),
                    (EdgeId::new(3), Chirality::Pos),
                    (EdgeId::new(4), Chirality::Pos),
                ],
                cells: vec![],
            },
        ];
        MeshGraph::from_parts(edges, faces, vec![])
    }

    #[test]
    fn counts_and_accessors() {
        let g = two_face_graph();
        assert_eq!(g.edge_count(), 5);
        assert_eq!(g.face_count(), 2);
        assert_eq!(g.cell_count(), 0);
        assert_eq!(g.edge(EdgeId::new(1)).node0, n(2));
        assert!(g.try_face(FaceId::new(2)).is_err());
    }

    #[test]
    fn find_face_all_orderings() {
        let g = two_face_graph();
        let (id, chi) = g.find_face([n(1), n(2), n(3)]).unwrap();
        assert_eq!(id, FaceId::new(0));
        assert_eq!(chi, Chirality::Pos);
        let (id, chi) = g.find_face([n(3), n(2), n(1)]).unwrap();
        assert_eq!(id, FaceId::new(0));
        assert_eq!(chi, Chirality::Neg);
        assert!(g.find_face([n(1), n(2), n(4)]).is_some());
        assert!(g.find_face([n(1), n(3), n(4)]).is_none());
    }

    #[test]
    fn find_edge_both_directions() {
        let g = two_face_graph();
        let (id, chi) = g.find_edge(n(1), n(2)).unwrap();
        assert_eq!(id, EdgeId::new(0));
        assert_eq!(chi, Chirality::Pos);
        let (_, chi) = g.find_edge(n(2), n(1)).unwrap();
        assert_eq!(chi, Chirality::Neg);
        assert!(g.find_edge(n(2), n(4)).is_some());
        assert!(g.find_edge(n(3), n(4)).is_none());
    }

    #[test]
    fn validate_ok_on_consistent_graph() {
        assert!(two_face_graph().validate().is_ok());
    }

    #[test]
    fn validate_catches_broken_mirror() {
        let mut g = two_face_graph();
        g.faces[1].edges[1] = (EdgeId::new(2), Chirality::Neg);
        assert!(matches!(
            g.validate(),
            Err(VortexError::UnmirroredEdgeUse { .. })
        ));
    }

    #[test]
    fn validate_catches_ring_drift() {
        // Swapping two ring nodes keeps every incidence mirror intact but
        // breaks the segment each bounding edge is supposed to span.
        let mut g = two_face_graph();
        g.faces[0].nodes.swap(1, 2);
        assert!(matches!(
            g.validate(),
            Err(VortexError::EdgeRingSegment { local: 0, .. })
        ));
    }
}
