//! Structured 3D lattices with optional per-axis periodicity.
//!
//! A [`RegularLattice`] is the implicit hexahedral view of a regular grid:
//! nodes are addressed x-fastest, and every node owns up to 3 edges (one per
//! axis), 3 quad faces (one per coordinate plane) and 1 cube, giving dense
//! implicit ids without storing any connectivity. These implicit ids form
//! their own id space; they are unrelated to the ids of a [`MeshGraph`]
//! produced by [`tetrahedralize`].
//!
//! [`tetrahedralize`] carves every cube into 6 tetrahedra (Kuhn subdivision
//! along the main diagonal), which is conforming across translated cubes and
//! across periodic seams, and feeds the result through [`TetGraphBuilder`].

use hashbrown::HashMap as FastMap;

use crate::topology::builder::TetGraphBuilder;
use crate::topology::graph::MeshGraph;
use crate::topology::id::{CellId, EdgeId, FaceId, NodeId};
use crate::vortex_error::VortexError;

/// Lattice axis, doubling as the direction of a node's implicit edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit step along this axis.
    pub const fn unit(self) -> [i64; 3] {
        match self {
            Axis::X => [1, 0, 0],
            Axis::Y => [0, 1, 0],
            Axis::Z => [0, 0, 1],
        }
    }
}

/// Coordinate plane of a node's implicit quad faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceKind {
    Xy = 0,
    Yz = 1,
    Zx = 2,
}

impl FaceKind {
    pub const ALL: [FaceKind; 3] = [FaceKind::Xy, FaceKind::Yz, FaceKind::Zx];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The two axes the quad spans, in ring order.
    pub const fn spanned(self) -> [Axis; 2] {
        match self {
            FaceKind::Xy => [Axis::X, Axis::Y],
            FaceKind::Yz => [Axis::Y, Axis::Z],
            FaceKind::Zx => [Axis::Z, Axis::X],
        }
    }
}

/// One of the six axis-aligned planes bounding a non-periodic lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundarySide {
    XLow,
    XHigh,
    YLow,
    YHigh,
    ZLow,
    ZHigh,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 6] = [
        BoundarySide::XLow,
        BoundarySide::XHigh,
        BoundarySide::YLow,
        BoundarySide::YHigh,
        BoundarySide::ZLow,
        BoundarySide::ZHigh,
    ];

    pub const fn axis(self) -> Axis {
        match self {
            BoundarySide::XLow | BoundarySide::XHigh => Axis::X,
            BoundarySide::YLow | BoundarySide::YHigh => Axis::Y,
            BoundarySide::ZLow | BoundarySide::ZHigh => Axis::Z,
        }
    }

    pub const fn is_high(self) -> bool {
        matches!(
            self,
            BoundarySide::XHigh | BoundarySide::YHigh | BoundarySide::ZHigh
        )
    }
}

/// Regular `dims[0] x dims[1] x dims[2]` node lattice with per-axis periodic
/// boundary flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegularLattice {
    dims: [u32; 3],
    pbc: [bool; 3],
}

impl RegularLattice {
    pub const fn new(dims: [u32; 3], pbc: [bool; 3]) -> Self {
        RegularLattice { dims, pbc }
    }

    pub const fn dims(&self) -> [u32; 3] {
        self.dims
    }

    pub const fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    pub fn node_count(&self) -> usize {
        self.dims.iter().map(|&d| d as usize).product()
    }

    /// Resolves a (possibly out-of-range) index triple to a node id.
    /// Periodic axes wrap; open axes reject out-of-range coordinates.
    pub fn node_id(&self, idx: [i64; 3]) -> Option<NodeId> {
        let mut resolved = [0u32; 3];
        for a in 0..3 {
            let d = self.dims[a] as i64;
            let v = if self.pbc[a] {
                idx[a].rem_euclid(d)
            } else if (0..d).contains(&idx[a]) {
                idx[a]
            } else {
                return None;
            };
            resolved[a] = v as u32;
        }
        let raw = (resolved[2] * self.dims[1] + resolved[1]) * self.dims[0] + resolved[0];
        Some(NodeId::new(raw))
    }

    /// Inverse of [`node_id`](Self::node_id) for in-range ids.
    pub fn node_index(&self, node: NodeId) -> [u32; 3] {
        debug_assert!(node.index() < self.node_count());
        let raw = node.get();
        let x = raw % self.dims[0];
        let y = (raw / self.dims[0]) % self.dims[1];
        let z = raw / (self.dims[0] * self.dims[1]);
        [x, y, z]
    }

    /// Node displaced from `node` by `delta`, if it resolves.
    pub fn offset(&self, node: NodeId, delta: [i64; 3]) -> Option<NodeId> {
        let idx = self.node_index(node);
        self.node_id([
            idx[0] as i64 + delta[0],
            idx[1] as i64 + delta[1],
            idx[2] as i64 + delta[2],
        ])
    }

    /// Implicit id of the edge leaving `node` along `axis`, if its far end
    /// resolves.
    pub fn edge_id(&self, node: NodeId, axis: Axis) -> Option<EdgeId> {
        self.offset(node, axis.unit())?;
        Some(EdgeId::new(node.get() * 3 + axis.index() as u32))
    }

    /// Endpoints of the implicit edge at (`node`, `axis`).
    pub fn edge_nodes(&self, node: NodeId, axis: Axis) -> Option<(NodeId, NodeId)> {
        let far = self.offset(node, axis.unit())?;
        Some((node, far))
    }

    /// Implicit id of the quad face anchored at `node` in plane `kind`, if
    /// the face's far corners resolve.
    pub fn face_id(&self, node: NodeId, kind: FaceKind) -> Option<FaceId> {
        self.face_nodes(node, kind)?;
        Some(FaceId::new(node.get() * 3 + kind.index() as u32))
    }

    /// Corner ring of the quad at (`node`, `kind`), counter-clockwise as
    /// seen along the plane normal.
    pub fn face_nodes(&self, node: NodeId, kind: FaceKind) -> Option<[NodeId; 4]> {
        let [u, v] = kind.spanned();
        let du = u.unit();
        let dv = v.unit();
        let n1 = self.offset(node, du)?;
        let n2 = self.offset(node, [du[0] + dv[0], du[1] + dv[1], du[2] + dv[2]])?;
        let n3 = self.offset(node, dv)?;
        Some([node, n1, n2, n3])
    }

    /// Decodes an implicit face id back to its anchor node and plane.
    pub fn face_anchor(&self, face: FaceId) -> (NodeId, FaceKind) {
        let kind = match face.get() % 3 {
            0 => FaceKind::Xy,
            1 => FaceKind::Yz,
            _ => FaceKind::Zx,
        };
        (NodeId::new(face.get() / 3), kind)
    }

    /// Implicit id of the cube whose lowest corner is `node`, if the cube's
    /// far corner resolves.
    pub fn cube_id(&self, node: NodeId) -> Option<CellId> {
        self.offset(node, [1, 1, 1])?;
        Some(CellId::new(node.get()))
    }

    /// Number of cube origins, accounting for periodic wrap.
    pub fn cube_count(&self) -> usize {
        self.cube_span().iter().product()
    }

    fn cube_span(&self) -> [usize; 3] {
        let mut span = [0usize; 3];
        for a in 0..3 {
            span[a] = if self.pbc[a] {
                self.dims[a] as usize
            } else {
                (self.dims[a] as usize).saturating_sub(1)
            };
        }
        span
    }

    /// Implicit quad faces lying on one bounding plane of the lattice.
    /// Empty when that plane's axis is periodic (no boundary there).
    pub fn boundary_faces(&self, side: BoundarySide) -> Vec<FaceId> {
        let axis = side.axis();
        if self.pbc[axis.index()] {
            return Vec::new();
        }
        let kind = match axis {
            Axis::X => FaceKind::Yz,
            Axis::Y => FaceKind::Zx,
            Axis::Z => FaceKind::Xy,
        };
        let fixed = if side.is_high() {
            self.dims[axis.index()] as i64 - 1
        } else {
            0
        };
        let [u, v] = kind.spanned();
        let mut out = Vec::new();
        for j in 0..self.dims[v.index()] as i64 {
            for i in 0..self.dims[u.index()] as i64 {
                let mut idx = [0i64; 3];
                idx[axis.index()] = fixed;
                idx[u.index()] = i;
                idx[v.index()] = j;
                if let Some(node) = self.node_id(idx) {
                    if let Some(fid) = self.face_id(node, kind) {
                        out.push(fid);
                    }
                }
            }
        }
        out
    }
}

/// Axis orders of the six monotone lattice paths `(0,0,0) -> (1,1,1)`, with
/// the permutation's parity (odd permutations get their middle vertices
/// swapped to keep the tetrahedron positively oriented).
const KUHN_PATHS: [([usize; 3], bool); 6] = [
    ([0, 1, 2], false),
    ([0, 2, 1], true),
    ([1, 0, 2], true),
    ([1, 2, 0], false),
    ([2, 0, 1], false),
    ([2, 1, 0], true),
];

/// Carves every lattice cube into 6 tetrahedra and assembles the dual graph.
///
/// Cube `c` produces cells `6*c .. 6*c+6`. All cubes share the same main
/// diagonal, so triangles agree across cube boundaries and periodic seams,
/// and neighbor wiring reduces to matching sorted node triples.
pub fn tetrahedralize(lattice: &RegularLattice) -> Result<MeshGraph, VortexError> {
    // a periodic axis with 2 nodes folds distinct triangles onto one node
    // triple, which breaks the sorted-triple neighbor matching
    let degenerate = (0..3).any(|a| {
        let d = lattice.dims()[a];
        d < 2 || (lattice.pbc()[a] && d < 3)
    });
    if degenerate {
        return Err(VortexError::DegenerateLattice {
            dims: lattice.dims(),
        });
    }
    let span = lattice.cube_span();
    let ncells = lattice.cube_count() * 6;

    let mut cell_nodes: Vec<[NodeId; 4]> = Vec::with_capacity(ncells);
    let mut cell_faces: Vec<[[NodeId; 3]; 4]> = Vec::with_capacity(ncells);
    let mut uses: FastMap<[u32; 3], Vec<(u32, u8)>> = FastMap::with_capacity(ncells * 2);

    for z in 0..span[2] as i64 {
        for y in 0..span[1] as i64 {
            for x in 0..span[0] as i64 {
                let corner = |d: [i64; 3]| -> NodeId {
                    lattice
                        .node_id([x + d[0], y + d[1], z + d[2]])
                        .expect("cube corner resolves inside the cube span")
                };
                for &(path, odd) in KUHN_PATHS.iter() {
                    let mut offs = [[0i64; 3]; 4];
                    offs[1][path[0]] = 1;
                    offs[2] = offs[1];
                    offs[2][path[1]] = 1;
                    offs[3] = [1, 1, 1];
                    if odd {
                        offs.swap(1, 2);
                    }
                    let v = offs.map(corner);
                    // local face k sits opposite vertex k, wound outward
                    let faces = [
                        [v[1], v[2], v[3]],
                        [v[0], v[3], v[2]],
                        [v[0], v[1], v[3]],
                        [v[0], v[2], v[1]],
                    ];
                    let cell = cell_nodes.len() as u32;
                    for (local, f) in faces.iter().enumerate() {
                        let mut key = [f[0].get(), f[1].get(), f[2].get()];
                        key.sort_unstable();
                        uses.entry(key).or_default().push((cell, local as u8));
                    }
                    cell_nodes.push(v);
                    cell_faces.push(faces);
                }
            }
        }
    }

    let mut neighbors: Vec<[Option<CellId>; 4]> = vec![[None; 4]; ncells];
    for pair in uses.values() {
        debug_assert!(pair.len() <= 2, "triangle shared by more than two tets");
        if let [(c0, l0), (c1, l1)] = pair[..] {
            neighbors[c0 as usize][l0 as usize] = Some(CellId::new(c1));
            neighbors[c1 as usize][l1 as usize] = Some(CellId::new(c0));
        }
    }

    let mut builder = TetGraphBuilder::new(ncells);
    for cell in 0..ncells {
        builder.add_cell(
            CellId::new(cell as u32),
            cell_nodes[cell],
            neighbors[cell],
            cell_faces[cell],
        )?;
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_addressing_roundtrip() {
        let l = RegularLattice::new([4, 3, 5], [false, false, false]);
        assert_eq!(l.node_count(), 60);
        for z in 0..5i64 {
            for y in 0..3i64 {
                for x in 0..4i64 {
                    let id = l.node_id([x, y, z]).unwrap();
                    assert_eq!(l.node_index(id), [x as u32, y as u32, z as u32]);
                }
            }
        }
        assert_eq!(l.node_id([4, 0, 0]), None);
        assert_eq!(l.node_id([0, -1, 0]), None);
    }

    #[test]
    fn periodic_axes_wrap() {
        let l = RegularLattice::new([4, 3, 5], [true, false, true]);
        assert_eq!(l.node_id([-1, 0, 0]), l.node_id([3, 0, 0]));
        assert_eq!(l.node_id([4, 1, 0]), l.node_id([0, 1, 0]));
        assert_eq!(l.node_id([0, 0, -2]), l.node_id([0, 0, 3]));
        // the open axis still rejects
        assert_eq!(l.node_id([0, 3, 0]), None);
    }

    #[test]
    fn implicit_ids_are_disjoint_per_kind() {
        let l = RegularLattice::new([3, 3, 3], [false; 3]);
        let n = l.node_id([1, 1, 1]).unwrap();
        let mut seen = std::collections::HashSet::new();
        for kind in FaceKind::ALL {
            assert!(seen.insert(l.face_id(n, kind).unwrap()));
        }
        let mut seen = std::collections::HashSet::new();
        for axis in Axis::ALL {
            assert!(seen.insert(l.edge_id(n, axis).unwrap()));
        }
    }

    #[test]
    fn face_anchor_inverts_face_id() {
        let l = RegularLattice::new([3, 3, 3], [false; 3]);
        let n = l.node_id([0, 1, 2]).unwrap();
        for kind in [FaceKind::Xy, FaceKind::Yz] {
            if let Some(fid) = l.face_id(n, kind) {
                assert_eq!(l.face_anchor(fid), (n, kind));
            }
        }
    }

    #[test]
    fn edge_and_face_validity_near_open_boundary() {
        let l = RegularLattice::new([3, 3, 3], [false; 3]);
        let corner = l.node_id([2, 2, 2]).unwrap();
        // every implicit element anchored at the high corner dangles
        assert_eq!(l.edge_id(corner, Axis::X), None);
        assert_eq!(l.face_id(corner, FaceKind::Xy), None);
        assert_eq!(l.cube_id(corner), None);
        // wrap rescues them on a periodic lattice
        let p = RegularLattice::new([3, 3, 3], [true; 3]);
        assert!(p.edge_id(corner, Axis::X).is_some());
        assert!(p.cube_id(corner).is_some());
    }

    #[test]
    fn boundary_face_counts() {
        let l = RegularLattice::new([3, 3, 3], [false; 3]);
        for side in BoundarySide::ALL {
            // 2x2 quads per open bounding plane
            assert_eq!(l.boundary_faces(side).len(), 4, "{side:?}");
        }
        let p = RegularLattice::new([3, 3, 3], [true, false, false]);
        assert!(p.boundary_faces(BoundarySide::XLow).is_empty());
        assert!(p.boundary_faces(BoundarySide::XHigh).is_empty());
        assert_eq!(p.boundary_faces(BoundarySide::YLow).len(), 6);
    }

    #[test]
    fn single_cube_kuhn_counts() {
        let l = RegularLattice::new([2, 2, 2], [false; 3]);
        let g = tetrahedralize(&l).unwrap();
        assert_eq!(g.cell_count(), 6);
        // 12 boundary triangles + 6 interior ones
        assert_eq!(g.face_count(), 18);
        assert_eq!(g.boundary_faces().count(), 12);
        // 12 cube edges + 6 face diagonals + 1 main diagonal
        assert_eq!(g.edge_count(), 19);
        g.validate().unwrap();
    }

    #[test]
    fn multi_cube_cell_count_and_validity() {
        let l = RegularLattice::new([3, 2, 4], [false; 3]);
        let g = tetrahedralize(&l).unwrap();
        assert_eq!(g.cell_count(), 2 * 1 * 3 * 6);
        g.validate().unwrap();
    }

    #[test]
    fn periodic_tetrahedralization_closes_the_seam() {
        let open = tetrahedralize(&RegularLattice::new([3, 3, 4], [false; 3])).unwrap();
        let wrapped =
            tetrahedralize(&RegularLattice::new([3, 3, 4], [true, false, false])).unwrap();
        // wrap adds a column of cubes and removes the two x bounding planes
        assert_eq!(open.cell_count(), 2 * 2 * 3 * 6);
        assert_eq!(wrapped.cell_count(), 3 * 2 * 3 * 6);
        assert_eq!(open.boundary_faces().count(), 64);
        assert_eq!(wrapped.boundary_faces().count(), 60);
        wrapped.validate().unwrap();
    }

    #[test]
    fn degenerate_dims_rejected() {
        let l = RegularLattice::new([1, 4, 4], [true, false, false]);
        assert!(matches!(
            tetrahedralize(&l),
            Err(VortexError::DegenerateLattice { .. })
        ));
        // 2 nodes on an open axis are fine, on a periodic axis they fold
        let folded = RegularLattice::new([2, 4, 4], [true, false, false]);
        assert!(matches!(
            tetrahedralize(&folded),
            Err(VortexError::DegenerateLattice { .. })
        ));
        let open = RegularLattice::new([2, 4, 4], [false; 3]);
        assert!(tetrahedralize(&open).is_ok());
    }
}
