//! `TetGraphBuilder`: incremental dual-graph construction from raw
//! tetrahedral connectivity.
//!
//! Cells arrive one at a time with their node list, their face-aligned
//! neighbor list, and their four triangular faces as ordered node triples.
//! Faces and edges are deduplicated across cells by canonical key
//! ([`crate::topology::canon`]); the first-inserted ordering of each becomes
//! its canonical orientation (chirality `Pos`), and every later reference
//! records its own ordering's sign relative to that.
//!
//! Construction is order-dependent only in which orientation ends up
//! "positive", never in connectivity.

use hashbrown::HashMap as FastMap;

use crate::topology::canon::{self, EdgeKey, FaceKey};
use crate::topology::chirality::Chirality;
use crate::topology::graph::{CCell, CEdge, CFace, CellUse, FaceUse, MeshGraph};
use crate::topology::id::{CellId, EdgeId, FaceId, NodeId};
use crate::vortex_error::VortexError;

/// Builder for tetrahedral meshes. Pre-sized to a fixed cell count so cell
/// ids can arrive in any order.
pub struct TetGraphBuilder {
    edges: Vec<CEdge>,
    faces: Vec<CFace>,
    cells: Vec<Option<CCell>>,
    edge_ids: FastMap<EdgeKey, EdgeId>,
    face_ids: FastMap<FaceKey, FaceId>,
}

impl TetGraphBuilder {
    pub fn new(ncells: usize) -> Self {
        TetGraphBuilder {
            edges: Vec::new(),
            faces: Vec::with_capacity(ncells * 2),
            cells: (0..ncells).map(|_| None).collect(),
            edge_ids: FastMap::new(),
            face_ids: FastMap::with_capacity(ncells * 2),
        }
    }

    pub fn cell_capacity(&self) -> usize {
        self.cells.len()
    }

    /// Registers one tetrahedron.
    ///
    /// `neighbors[k]` is the cell across `faces[k]` (`None` at the domain
    /// boundary); both arrays are aligned by local face index.
    pub fn add_cell(
        &mut self,
        cell: CellId,
        nodes: [NodeId; 4],
        neighbors: [Option<CellId>; 4],
        faces: [[NodeId; 3]; 4],
    ) -> Result<(), VortexError> {
        match self.cells.get(cell.index()) {
            None => {
                return Err(VortexError::CellOutOfRange {
                    cell,
                    ncells: self.cells.len(),
                });
            }
            Some(Some(_)) => return Err(VortexError::DuplicateCell(cell)),
            Some(None) => {}
        }
        let mut face_uses = Vec::with_capacity(4);
        for (local, face_nodes) in faces.into_iter().enumerate() {
            face_uses.push(self.add_face(face_nodes, cell, local as u8));
        }
        self.cells[cell.index()] = Some(CCell {
            nodes: nodes.to_vec(),
            faces: face_uses,
            neighbors: neighbors.to_vec(),
        });
        Ok(())
    }

    /// Find-or-create a face; always appends the caller's incidence.
    fn add_face(&mut self, nodes: [NodeId; 3], cell: CellId, local_face: u8) -> (FaceId, Chirality) {
        let key = FaceKey::new(nodes);
        let (fid, chirality) = match self.face_ids.get(&key) {
            Some(&fid) => {
                let stored = &self.faces[fid.index()];
                let stored_nodes = [stored.nodes[0], stored.nodes[1], stored.nodes[2]];
                let chirality = canon::face_chirality(nodes, stored_nodes)
                    .expect("face map hit implies orientation-equivalence");
                (fid, chirality)
            }
            None => {
                let fid = FaceId::new(self.faces.len() as u32);
                self.face_ids.insert(key, fid);
                self.faces.push(CFace {
                    nodes: nodes.to_vec(),
                    edges: Vec::with_capacity(3),
                    cells: Vec::new(),
                });
                for (k, pair) in [
                    (nodes[0], nodes[1]),
                    (nodes[1], nodes[2]),
                    (nodes[2], nodes[0]),
                ]
                .into_iter()
                .enumerate()
                {
                    let (eid, echirality) = self.add_edge(pair, fid, k as u8);
                    self.faces[fid.index()].edges.push((eid, echirality));
                }
                (fid, Chirality::Pos)
            }
        };
        self.faces[fid.index()].cells.push(CellUse {
            cell,
            chirality,
            local_face,
        });
        (fid, chirality)
    }

    /// Find-or-create an edge; always appends the calling face's incidence.
    fn add_edge(
        &mut self,
        (a, b): (NodeId, NodeId),
        face: FaceId,
        local_edge: u8,
    ) -> (EdgeId, Chirality) {
        let key = canon::edge_key(a, b);
        let (eid, chirality) = match self.edge_ids.get(&key) {
            Some(&eid) => {
                let stored = &self.edges[eid.index()];
                let chirality = canon::edge_chirality((a, b), (stored.node0, stored.node1))
                    .expect("edge map hit implies same node pair");
                (eid, chirality)
            }
            None => {
                let eid = EdgeId::new(self.edges.len() as u32);
                self.edge_ids.insert(key, eid);
                self.edges.push(CEdge {
                    node0: a,
                    node1: b,
                    faces: Vec::new(),
                });
                (eid, Chirality::Pos)
            }
        };
        self.edges[eid.index()].faces.push(FaceUse {
            face,
            chirality,
            local_edge,
        });
        (eid, chirality)
    }

    /// Finishes the graph. Every cell slot must have been filled; a gap
    /// means the caller dropped a cell, which the builder refuses to paper
    /// over.
    pub fn build(self) -> Result<MeshGraph, VortexError> {
        let TetGraphBuilder {
            edges,
            faces,
            cells,
            edge_ids,
            face_ids,
        } = self;
        let mut filled = Vec::with_capacity(cells.len());
        for (i, slot) in cells.into_iter().enumerate() {
            filled.push(slot.ok_or(VortexError::MissingCell(CellId::new(i as u32)))?);
        }
        let graph = MeshGraph::from_parts(edges, faces, filled);
        graph.seed_index(face_ids, edge_ids);
        graph.debug_assert_consistent();
        Ok(graph)
    }
}
