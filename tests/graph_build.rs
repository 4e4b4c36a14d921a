//! Structural checks on tetrahedralized lattices: face sharing, neighbor
//! wiring, boundary classification, and the Kuhn-cell geometry.

mod common;

use common::{uniform_field, SyntheticDataset};
use glvortex::extract::dataset::Dataset;
use glvortex::topology::regular::{tetrahedralize, RegularLattice};
use glvortex::VortexError;
use proptest::prelude::*;

#[test]
fn faces_bound_one_or_two_cells() {
    let graph = tetrahedralize(&RegularLattice::new([3, 3, 4], [false; 3])).unwrap();
    let mut single_use = 0;
    for (fid, face) in graph.faces() {
        match face.cells.len() {
            1 => single_use += 1,
            2 => {}
            n => panic!("face {fid} bounds {n} cells"),
        }
    }
    // Single-use faces are exactly the boundary of an open lattice.
    assert_eq!(single_use, 64);
    assert_eq!(graph.boundary_faces().count(), 64);
    graph.validate().unwrap();
}

#[test]
fn neighbor_links_are_mutual() {
    let graph = tetrahedralize(&RegularLattice::new([3, 3, 4], [true, false, false])).unwrap();
    assert_eq!(graph.cell_count(), 108);
    assert_eq!(graph.boundary_faces().count(), 60);

    for (cid, cell) in graph.cells() {
        assert_eq!(cell.faces.len(), 4);
        assert_eq!(cell.neighbors.len(), 4);
        for (k, neighbor) in cell.neighbors.iter().enumerate() {
            let Some(neighbor) = *neighbor else { continue };
            let fid = cell.faces[k].0;
            let other = graph.cell(neighbor);
            let back = other
                .faces
                .iter()
                .position(|&(f, _)| f == fid)
                .expect("neighbor lists the shared face");
            assert_eq!(other.neighbors[back], Some(cid), "link {cid} -> {neighbor}");
        }
    }
}

#[test]
fn fully_periodic_lattices_are_closed() {
    let graph = tetrahedralize(&RegularLattice::new([3, 3, 4], [true; 3])).unwrap();
    assert_eq!(graph.cell_count(), 3 * 3 * 4 * 6);
    assert_eq!(graph.boundary_faces().count(), 0);
    for (_, face) in graph.faces() {
        assert_eq!(face.cells.len(), 2);
    }
    graph.validate().unwrap();
}

#[test]
fn kuhn_cells_are_positively_oriented_unit_tetrahedra() {
    // On a unit-spacing open lattice every Kuhn tetrahedron spans volume 1/6,
    // so the edge-vector determinant is exactly +1.
    let data = SyntheticDataset::new("volumes", [3, 3, 4], uniform_field);
    for (cid, cell) in data.graph().cells() {
        let p: Vec<[f64; 3]> = cell.nodes.iter().map(|&n| data.position(n)).collect();
        let e = |i: usize, k: usize| p[i][k] - p[0][k];
        let det = e(1, 0) * (e(2, 1) * e(3, 2) - e(2, 2) * e(3, 1))
            - e(1, 1) * (e(2, 0) * e(3, 2) - e(2, 2) * e(3, 0))
            + e(1, 2) * (e(2, 0) * e(3, 1) - e(2, 1) * e(3, 0));
        assert!((det - 1.0).abs() < 1e-12, "cell {cid} has det {det}");
    }
}

proptest! {
    #[test]
    fn prop_lattice_graphs_are_consistent(
        dx in 2u32..=4,
        dy in 2u32..=4,
        dz in 2u32..=4,
        px in any::<bool>(),
        py in any::<bool>(),
        pz in any::<bool>(),
    ) {
        let dims = [dx, dy, dz];
        let pbc = [px, py, pz];
        let lattice = RegularLattice::new(dims, pbc);
        let folds = (0..3).any(|a| pbc[a] && dims[a] < 3);

        match tetrahedralize(&lattice) {
            Err(e) => {
                prop_assert!(folds, "unexpected failure on {dims:?}/{pbc:?}: {e}");
                prop_assert_eq!(e, VortexError::DegenerateLattice { dims });
            }
            Ok(graph) => {
                prop_assert!(!folds, "2-node periodic axis accepted: {dims:?}/{pbc:?}");
                prop_assert!(graph.validate().is_ok());
                prop_assert_eq!(graph.cell_count(), lattice.cube_count() * 6);
                for (_, face) in graph.faces() {
                    prop_assert_eq!(face.nodes.len(), 3);
                    prop_assert!(face.cells.len() <= 2);
                }
                // Every tetrahedron edge closes at least two of its faces.
                for (_, edge) in graph.edges() {
                    prop_assert!(edge.faces.len() >= 2);
                }
            }
        }
    }
}
