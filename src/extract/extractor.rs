//! Per-frame vortex extraction.
//!
//! `VortexExtractor` owns the punctured-element maps for (up to) two loaded
//! frames and the face prisms between them. Detection is pure per element
//! and runs data-parallel; workers send hits over a channel and a single
//! drain loop owns all map mutation, so no lock guards the incidence
//! bookkeeping.

use rayon::prelude::*;
use std::sync::mpsc;

use hashbrown::HashMap as FastMap;
use log::{debug, info, warn};

use crate::extract::dataset::{Dataset, TimeSlot};
use crate::extract::puncture::{
    find_zero_triangle, find_zero_unit_quad_bilinear, is_punctured, phase_shift, wrap_angle,
    winding_number, PuncturedCell, PuncturedEdge, PuncturedFace,
};
use crate::extract::space::{trace_over_space, SpaceTrace};
use crate::extract::time::{trace_over_time, Correspondence};
use crate::io::puncture_file::{
    edge_cache_path, face_cache_path, read_edge_cache, read_face_cache, write_edge_cache,
    write_face_cache,
};
use crate::topology::chirality::Chirality;
use crate::topology::id::{CellId, EdgeId, FaceId};
use crate::vortex_error::VortexError;

/// Classification of face prisms by their slot balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrismStats {
    /// Bottom and top face punctured with the same sign, no edge crossings.
    pub through: usize,
    /// Balanced prisms that route through at least one punctured edge.
    pub lateral: usize,
    /// Prisms whose slot signs do not cancel (an unresolved bounding
    /// element; temporal paths may dead-end here).
    pub open: usize,
}

/// Detects punctured faces/edges of a dataset and accumulates the incidence
/// maps that spatial and temporal tracing run on.
pub struct VortexExtractor<'a, D: Dataset + Sync> {
    dataset: &'a D,
    gauge: bool,
    punctured_faces: FastMap<FaceId, PuncturedFace>,
    punctured_faces_next: FastMap<FaceId, PuncturedFace>,
    punctured_edges: FastMap<EdgeId, PuncturedEdge>,
    punctured_cells: FastMap<CellId, PuncturedCell>,
    prism_cells: FastMap<FaceId, PuncturedCell>,
}

impl<'a, D: Dataset + Sync> VortexExtractor<'a, D> {
    pub fn new(dataset: &'a D) -> Self {
        VortexExtractor {
            dataset,
            gauge: false,
            punctured_faces: FastMap::new(),
            punctured_faces_next: FastMap::new(),
            punctured_edges: FastMap::new(),
            punctured_cells: FastMap::new(),
            prism_cells: FastMap::new(),
        }
    }

    /// Enables gauge correction: per-edge gauge phases and per-face flux
    /// terms enter the winding sums.
    pub fn set_gauge_transformation(&mut self, on: bool) {
        self.gauge = on;
    }

    pub fn dataset(&self) -> &D {
        self.dataset
    }

    pub fn punctured_faces(&self) -> &FastMap<FaceId, PuncturedFace> {
        &self.punctured_faces
    }

    pub fn punctured_faces_next(&self) -> &FastMap<FaceId, PuncturedFace> {
        &self.punctured_faces_next
    }

    pub fn punctured_edges(&self) -> &FastMap<EdgeId, PuncturedEdge> {
        &self.punctured_edges
    }

    pub fn punctured_cells(&self) -> &FastMap<CellId, PuncturedCell> {
        &self.punctured_cells
    }

    pub fn prism_cells(&self) -> &FastMap<FaceId, PuncturedCell> {
        &self.prism_cells
    }

    /// Winding test on one face. Pure: reads the dataset only, mutates
    /// nothing, safe to call from parallel workers.
    ///
    /// The winding sum works for any ring arity; singularity localization
    /// covers triangles (linear) and quads (bilinear), anything wider stays
    /// punctured without a position.
    pub fn detect_face(&self, face: FaceId, slot: TimeSlot) -> Option<PuncturedFace> {
        let graph = self.dataset.graph();
        let f = graph.face(face);
        let n = f.nodes.len();

        let mut phases = Vec::with_capacity(n);
        let mut moduli = Vec::with_capacity(n);
        for &node in &f.nodes {
            let c = self.dataset.sample(node, slot);
            phases.push(c.phase());
            moduli.push(c.modulus());
        }
        let mut gauge = vec![0.0; n];
        if self.gauge {
            for i in 0..n {
                gauge[i] = self
                    .dataset
                    .gauge_phase(f.nodes[i], f.nodes[(i + 1) % n], slot);
            }
        }

        let mut shift = phase_shift(&phases, &gauge);
        if self.gauge {
            shift += self.dataset.face_flux(face);
        }
        if !is_punctured(shift) {
            return None;
        }
        let winding = winding_number(shift);
        if winding.abs() > 1 {
            // multi-charge cores are not modeled; treat as a unit vortex
            warn!("face {face} carries winding {winding}, clamping to sign");
        }
        let chirality = if winding > 0 {
            Chirality::Pos
        } else {
            Chirality::Neg
        };

        // rebuild a branch-coherent phase sequence before interpolating
        let mut coherent = vec![phases[0]; n];
        for i in 1..n {
            coherent[i] =
                coherent[i - 1] + wrap_angle(phases[i] - phases[i - 1] - gauge[i - 1]);
        }
        let re: Vec<f64> = (0..n).map(|i| moduli[i] * coherent[i].cos()).collect();
        let im: Vec<f64> = (0..n).map(|i| moduli[i] * coherent[i].sin()).collect();

        let located = match n {
            3 => {
                let pos = [
                    self.dataset.position(f.nodes[0]),
                    self.dataset.position(f.nodes[1]),
                    self.dataset.position(f.nodes[2]),
                ];
                find_zero_triangle([re[0], re[1], re[2]], [im[0], im[1], im[2]], pos)
            }
            4 => find_zero_unit_quad_bilinear(
                [re[0], re[1], re[2], re[3]],
                [im[0], im[1], im[2], im[3]],
            )
            .map(|[u, v]| {
                let p: Vec<[f64; 3]> = f.nodes.iter().map(|&nd| self.dataset.position(nd)).collect();
                let mut out = [0.0; 3];
                for d in 0..3 {
                    out[d] = (1.0 - u) * (1.0 - v) * p[0][d]
                        + u * (1.0 - v) * p[1][d]
                        + u * v * p[2][d]
                        + (1.0 - u) * v * p[3][d];
                }
                out
            }),
            _ => {
                warn!("face {face} has {n} nodes, no localization for that arity");
                return Some(PuncturedFace {
                    chirality,
                    pos: None,
                });
            }
        };
        if located.is_none() {
            warn!("face {face} is punctured but the singularity was not located");
        }
        Some(PuncturedFace {
            chirality,
            pos: located,
        })
    }

    /// Winding test on the space-time quad an edge sweeps between the two
    /// loaded frames. Pure; both slots must be loaded.
    pub fn detect_edge(&self, edge: EdgeId) -> Option<PuncturedEdge> {
        let graph = self.dataset.graph();
        let e = graph.edge(edge);
        let (n0, n1) = (e.node0, e.node1);

        // quad ring (space, time): (n0,cur) (n1,cur) (n1,next) (n0,next)
        let corners = [
            (n0, TimeSlot::Current),
            (n1, TimeSlot::Current),
            (n1, TimeSlot::Next),
            (n0, TimeSlot::Next),
        ];
        let mut phases = [0.0; 4];
        let mut moduli = [0.0; 4];
        for (i, &(n, slot)) in corners.iter().enumerate() {
            let c = self.dataset.sample(n, slot);
            phases[i] = c.phase();
            moduli[i] = c.modulus();
        }
        // gauge terms on the two spatial edges; time edges carry none
        let mut gauge = [0.0; 4];
        if self.gauge {
            gauge[0] = self.dataset.gauge_phase(n0, n1, TimeSlot::Current);
            gauge[2] = self.dataset.gauge_phase(n1, n0, TimeSlot::Next);
        }

        let shift = phase_shift(&phases, &gauge);
        if !is_punctured(shift) {
            return None;
        }
        let winding = winding_number(shift);
        if winding.abs() > 1 {
            warn!("edge {edge} carries winding {winding}, clamping to sign");
        }
        let chirality = if winding > 0 {
            Chirality::Pos
        } else {
            Chirality::Neg
        };

        let mut coherent = [phases[0]; 4];
        for i in 1..4 {
            coherent[i] =
                coherent[i - 1] + wrap_angle(phases[i] - phases[i - 1] - gauge[i - 1]);
        }
        let mut re = [0.0; 4];
        let mut im = [0.0; 4];
        for i in 0..4 {
            re[i] = moduli[i] * coherent[i].cos();
            im[i] = moduli[i] * coherent[i].sin();
        }
        match find_zero_unit_quad_bilinear(re, im) {
            // the quad's y axis is time
            Some([_, t]) => Some(PuncturedEdge { chirality, t }),
            None => {
                warn!("edge {edge} is punctured but the crossing time was not located");
                None
            }
        }
    }

    /// Records a punctured face and propagates its chirality into every
    /// bounding cell's slot (current slot) or its own prism (both slots).
    pub fn add_punctured_face(&mut self, face: FaceId, slot: TimeSlot, pf: PuncturedFace) {
        let graph = self.dataset.graph();
        let f = graph.face(face);
        match slot {
            TimeSlot::Current => {
                for cu in &f.cells {
                    let nslots = graph.cell(cu.cell).faces.len();
                    self.punctured_cells
                        .entry(cu.cell)
                        .or_insert_with(|| PuncturedCell::new(nslots))
                        .set(cu.local_face as usize, pf.chirality * cu.chirality);
                }
                // prism bottom: outward orientation points backward in time
                self.prism_cells
                    .entry(face)
                    .or_insert_with(|| PuncturedCell::new(2 + f.edges.len()))
                    .set(0, -pf.chirality);
                self.punctured_faces.insert(face, pf);
            }
            TimeSlot::Next => {
                self.prism_cells
                    .entry(face)
                    .or_insert_with(|| PuncturedCell::new(2 + f.edges.len()))
                    .set(1, pf.chirality);
                self.punctured_faces_next.insert(face, pf);
            }
        }
    }

    /// Records a punctured edge and propagates its chirality into the prism
    /// of every face sharing it.
    pub fn add_punctured_edge(&mut self, edge: EdgeId, pe: PuncturedEdge) {
        let graph = self.dataset.graph();
        for fu in &graph.edge(edge).faces {
            let nslots = 2 + graph.face(fu.face).edges.len();
            self.prism_cells
                .entry(fu.face)
                .or_insert_with(|| PuncturedCell::new(nslots))
                .set(2 + fu.local_edge as usize, pe.chirality * fu.chirality);
        }
        self.punctured_edges.insert(edge, pe);
    }

    /// Runs the face winding test over the whole graph for one slot.
    /// Workers detect in parallel; this thread drains the channel and owns
    /// all map updates.
    pub fn extract_faces(&mut self, slot: TimeSlot) {
        let nfaces = self.dataset.graph().face_count() as u32;
        let (tx, rx) = mpsc::channel();
        (0..nfaces).into_par_iter().for_each_with(tx, |tx, raw| {
            let face = FaceId::new(raw);
            if let Some(pf) = self.detect_face(face, slot) {
                let _ = tx.send((face, pf));
            }
        });
        let mut count = 0usize;
        for (face, pf) in rx {
            self.add_punctured_face(face, slot, pf);
            count += 1;
        }
        info!(
            "frame {}: {count} punctured faces",
            self.dataset.frame(slot)
        );
    }

    /// Runs the space-time winding test over every edge. Both slots must be
    /// loaded.
    pub fn extract_edges(&mut self) {
        let nedges = self.dataset.graph().edge_count() as u32;
        let (tx, rx) = mpsc::channel();
        (0..nedges).into_par_iter().for_each_with(tx, |tx, raw| {
            let edge = EdgeId::new(raw);
            if let Some(pe) = self.detect_edge(edge) {
                let _ = tx.send((edge, pe));
            }
        });
        let mut count = 0usize;
        for (edge, pe) in rx {
            self.add_punctured_edge(edge, pe);
            count += 1;
        }
        info!(
            "interval [{}, {}]: {count} punctured edges",
            self.dataset.frame(TimeSlot::Current),
            self.dataset.frame(TimeSlot::Next)
        );
    }

    /// Advances the extractor one frame: the next slot's faces become the
    /// current slot's, and all per-interval state is rebuilt from them.
    pub fn rotate_time_step(&mut self) {
        let next: Vec<(FaceId, PuncturedFace)> = self.punctured_faces_next.drain().collect();
        self.punctured_faces.clear();
        self.punctured_cells.clear();
        self.punctured_edges.clear();
        self.prism_cells.clear();
        for (face, pf) in next {
            self.add_punctured_face(face, TimeSlot::Current, pf);
        }
        debug!(
            "rotated: {} faces carried into the new frame",
            self.punctured_faces.len()
        );
    }

    /// Chains the current slot's punctured cells into vortex lines.
    pub fn trace_space(&self) -> SpaceTrace {
        trace_over_space(
            self.dataset,
            &self.punctured_cells,
            &self.punctured_faces,
        )
    }

    /// Follows punctured faces through their prisms to the next frame.
    pub fn trace_time(&self) -> Vec<Correspondence> {
        trace_over_time(
            self.dataset.graph(),
            &self.punctured_faces,
            &self.punctured_faces_next,
            &self.punctured_edges,
            &self.prism_cells,
        )
    }

    /// Slot-balance census of the face prisms.
    pub fn prism_stats(&self) -> PrismStats {
        let mut stats = PrismStats::default();
        for pc in self.prism_cells.values() {
            if !pc.is_punctured() {
                continue;
            }
            let (pos, neg) = pc.sign_counts();
            let uses_edges = pc.occupied().any(|(slot, _)| slot >= 2);
            if pos != neg {
                stats.open += 1;
            } else if uses_edges {
                stats.lateral += 1;
            } else {
                stats.through += 1;
            }
        }
        info!(
            "prism census: {} through, {} lateral, {} open",
            stats.through, stats.lateral, stats.open
        );
        stats
    }

    /// Writes one slot's punctured faces to its cache file
    /// (`<name>.pf.<frame>`).
    pub fn save_punctured_faces(&self, slot: TimeSlot) -> Result<(), VortexError> {
        let path = face_cache_path(self.dataset.name(), self.dataset.frame(slot));
        let map = match slot {
            TimeSlot::Current => &self.punctured_faces,
            TimeSlot::Next => &self.punctured_faces_next,
        };
        write_face_cache(&path, map)
    }

    /// Loads one slot's punctured faces from cache, replaying each record
    /// through the incidence bookkeeping. Returns `false` (after a warning)
    /// when the cache is missing or unusable; the caller recomputes.
    pub fn load_punctured_faces(&mut self, slot: TimeSlot) -> bool {
        let path = face_cache_path(self.dataset.name(), self.dataset.frame(slot));
        match read_face_cache(&path) {
            Ok(records) => {
                let count = records.len();
                for (face, pf) in records {
                    self.add_punctured_face(face, slot, pf);
                }
                info!("loaded {count} punctured faces from {}", path.display());
                true
            }
            Err(e) => {
                warn!("no usable face cache at {}: {e}", path.display());
                false
            }
        }
    }

    /// Writes the interval's punctured edges to `<name>.pe.<t0>.<t1>`.
    pub fn save_punctured_edges(&self) -> Result<(), VortexError> {
        let path = edge_cache_path(
            self.dataset.name(),
            self.dataset.frame(TimeSlot::Current),
            self.dataset.frame(TimeSlot::Next),
        );
        write_edge_cache(&path, &self.punctured_edges)
    }

    /// Counterpart of [`load_punctured_faces`](Self::load_punctured_faces)
    /// for the interval's edges.
    pub fn load_punctured_edges(&mut self) -> bool {
        let path = edge_cache_path(
            self.dataset.name(),
            self.dataset.frame(TimeSlot::Current),
            self.dataset.frame(TimeSlot::Next),
        );
        match read_edge_cache(&path) {
            Ok(records) => {
                let count = records.len();
                for (edge, pe) in records {
                    self.add_punctured_edge(edge, pe);
                }
                info!("loaded {count} punctured edges from {}", path.display());
                true
            }
            Err(e) => {
                warn!("no usable edge cache at {}: {e}", path.display());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dataset::Complex;
    use crate::topology::graph::MeshGraph;
    use crate::topology::id::NodeId;
    use crate::topology::regular::{tetrahedralize, RegularLattice};

    /// A straight unit vortex along the z axis at (0.3, 0.6), constant in
    /// time, on a single tetrahedralized cube.
    struct StaticVortex {
        lattice: RegularLattice,
        graph: MeshGraph,
    }

    impl StaticVortex {
        fn new() -> Self {
            let lattice = RegularLattice::new([2, 2, 2], [false; 3]);
            let graph = tetrahedralize(&lattice).unwrap();
            StaticVortex { lattice, graph }
        }
    }

    impl Dataset for StaticVortex {
        fn graph(&self) -> &MeshGraph {
            &self.graph
        }
        fn name(&self) -> &str {
            "static-vortex"
        }
        fn frame(&self, slot: TimeSlot) -> usize {
            slot.index()
        }
        fn position(&self, node: NodeId) -> [f64; 3] {
            let [x, y, z] = self.lattice.node_index(node);
            [x as f64, y as f64, z as f64]
        }
        fn sample(&self, node: NodeId, _slot: TimeSlot) -> Complex {
            let [x, y, _] = self.position(node);
            Complex::new(x - 0.3, y - 0.6)
        }
    }

    #[test]
    fn straight_vortex_face_census() {
        let data = StaticVortex::new();
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Current);
        // entry triangle, the x=z and y=z interior crossings, exit triangle
        assert_eq!(ex.punctured_faces().len(), 4);
        assert_eq!(ex.punctured_cells().len(), 3);
        for pc in ex.punctured_cells().values() {
            assert_eq!(pc.sign_counts(), (1, 1));
            assert!(!pc.is_special());
        }
    }

    #[test]
    fn singularity_positions_are_exact_for_linear_fields() {
        let data = StaticVortex::new();
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Current);
        let mut zs: Vec<f64> = ex
            .punctured_faces()
            .values()
            .map(|pf| {
                let p = pf.pos.unwrap();
                assert!((p[0] - 0.3).abs() < 1e-9, "x at {p:?}");
                assert!((p[1] - 0.6).abs() < 1e-9, "y at {p:?}");
                p[2]
            })
            .collect();
        zs.sort_by(f64::total_cmp);
        for (z, want) in zs.iter().zip([0.0, 0.3, 0.6, 1.0]) {
            assert!((z - want).abs() < 1e-9, "z = {z}");
        }
    }

    #[test]
    fn static_field_has_no_punctured_edges() {
        let data = StaticVortex::new();
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Current);
        ex.extract_faces(TimeSlot::Next);
        ex.extract_edges();
        assert!(ex.punctured_edges().is_empty());
        // every prism closes straight through
        let stats = ex.prism_stats();
        assert_eq!(stats.through, 4);
        assert_eq!(stats.lateral, 0);
        assert_eq!(stats.open, 0);
    }

    #[test]
    fn rotation_carries_next_into_current() {
        let data = StaticVortex::new();
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Next);
        assert!(ex.punctured_faces().is_empty());
        assert!(ex.punctured_cells().is_empty());
        ex.rotate_time_step();
        assert_eq!(ex.punctured_faces().len(), 4);
        assert_eq!(ex.punctured_cells().len(), 3);
        assert!(ex.punctured_faces_next().is_empty());
    }

    #[test]
    fn quad_faces_get_bilinear_localization() {
        use crate::topology::graph::{CEdge, CFace, FaceUse};

        // a single unit quad in the z = 0 plane
        let edges = (0..4u32)
            .map(|k| CEdge {
                node0: NodeId::new(k),
                node1: NodeId::new((k + 1) % 4),
                faces: vec![FaceUse {
                    face: FaceId::new(0),
                    chirality: Chirality::Pos,
                    local_edge: k as u8,
                }],
            })
            .collect();
        let faces = vec![CFace {
            nodes: (0..4).map(NodeId::new).collect(),
            edges: (0..4).map(|k| (EdgeId::new(k), Chirality::Pos)).collect(),
            cells: vec![],
        }];

        struct QuadPlate {
            graph: MeshGraph,
        }
        impl Dataset for QuadPlate {
            fn graph(&self) -> &MeshGraph {
                &self.graph
            }
            fn name(&self) -> &str {
                "quad-plate"
            }
            fn frame(&self, slot: TimeSlot) -> usize {
                slot.index()
            }
            fn position(&self, node: NodeId) -> [f64; 3] {
                [
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [1.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                ][node.index()]
            }
            fn sample(&self, node: NodeId, _slot: TimeSlot) -> Complex {
                let [x, y, _] = self.position(node);
                Complex::new(x - 0.4, y - 0.6)
            }
        }

        let data = QuadPlate {
            graph: MeshGraph::from_parts(edges, faces, vec![]),
        };
        data.graph.validate().unwrap();
        let ex = VortexExtractor::new(&data);
        let pf = ex.detect_face(FaceId::new(0), TimeSlot::Current).unwrap();
        assert_eq!(pf.chirality, Chirality::Pos);
        let p = pf.pos.unwrap();
        assert!((p[0] - 0.4).abs() < 1e-9, "{p:?}");
        assert!((p[1] - 0.6).abs() < 1e-9, "{p:?}");
        assert_eq!(p[2], 0.0);
    }
}
