//! Spatial tracing: punctured cells into vortex lines.
//!
//! The punctured cells of one frame form a graph (two cells are adjacent
//! when they share a punctured face). Each connected component is one
//! vortex object; its ordinary cells chain into polylines by following the
//! outgoing (`Pos`) slot forward and the incoming (`Neg`) slot backward,
//! while special cells (more than two crossings) become event markers and
//! act as chain terminators.

use std::collections::{BTreeSet, VecDeque};

use hashbrown::HashMap as FastMap;
use log::{debug, info, warn};

use crate::curve::line::VortexLine;
use crate::extract::dataset::{Dataset, TimeSlot};
use crate::extract::puncture::{PuncturedCell, PuncturedFace};
use crate::topology::chirality::Chirality;
use crate::topology::graph::MeshGraph;
use crate::topology::id::{CellId, FaceId};

/// What a special cell's crossing pattern says about the local topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// Lines only leave this cell.
    Birth,
    /// Lines only arrive.
    Death,
    /// More lines leave than arrive.
    Split,
    /// More lines arrive than leave.
    Merge,
    /// As many arrive as leave.
    Recombination,
}

/// Classification of a special cell from its `(outgoing, incoming)` slot
/// counts. Total: every special cell gets a kind.
pub fn marker_kind(outgoing: usize, incoming: usize) -> MarkerKind {
    if incoming == 0 {
        MarkerKind::Birth
    } else if outgoing == 0 {
        MarkerKind::Death
    } else if outgoing > incoming {
        MarkerKind::Split
    } else if incoming > outgoing {
        MarkerKind::Merge
    } else {
        MarkerKind::Recombination
    }
}

/// A special cell reported instead of traced through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventMarker {
    pub cell: CellId,
    pub kind: MarkerKind,
    /// Centroid of the cell's nodes.
    pub pos: [f64; 3],
    pub outgoing: usize,
    pub incoming: usize,
    /// The vortex object (trace component) the cell belongs to.
    pub component: u32,
}

/// Everything one spatial trace pass produces.
#[derive(Clone, Debug, Default)]
pub struct SpaceTrace {
    pub lines: Vec<VortexLine>,
    pub markers: Vec<EventMarker>,
    /// Number of vortex objects (connected components); lines carry their
    /// component index as `id`.
    pub components: usize,
    /// Punctured face to component index, for transition matrices.
    pub face_components: FastMap<FaceId, u32>,
}

/// Partitions the punctured cells into components and chains each
/// component's ordinary cells into polylines.
pub fn trace_over_space<D: Dataset>(
    dataset: &D,
    cells: &FastMap<CellId, PuncturedCell>,
    faces: &FastMap<FaceId, PuncturedFace>,
) -> SpaceTrace {
    let graph = dataset.graph();
    let frame = dataset.frame(TimeSlot::Current);
    let time = dataset.time(TimeSlot::Current);

    let mut trace = SpaceTrace::default();
    // BTreeSet worklist keeps component and chain order deterministic
    let mut remaining: BTreeSet<CellId> = cells.keys().copied().collect();

    while let Some(&component_seed) = remaining.iter().next() {
        remaining.remove(&component_seed);
        let component_id = trace.components as u32;

        let mut members = vec![component_seed];
        let mut queue = VecDeque::from([component_seed]);
        while let Some(cell) = queue.pop_front() {
            let cc = graph.cell(cell);
            for (local, _) in cells[&cell].occupied() {
                let Some(nb) = cc.neighbors.get(local).copied().flatten() else {
                    continue;
                };
                // remaining only ever holds punctured cells
                if remaining.remove(&nb) {
                    members.push(nb);
                    queue.push_back(nb);
                }
            }
        }

        let mut ordinary: BTreeSet<CellId> = BTreeSet::new();
        for &cell in &members {
            let pc = &cells[&cell];
            if pc.is_special() {
                let (outgoing, incoming) = pc.sign_counts();
                trace.markers.push(EventMarker {
                    cell,
                    kind: marker_kind(outgoing, incoming),
                    pos: cell_centroid(dataset, cell),
                    outgoing,
                    incoming,
                    component: component_id,
                });
            } else {
                ordinary.insert(cell);
            }
        }

        let mut nlines = 0usize;
        while let Some(&chain_seed) = ordinary.iter().next() {
            ordinary.remove(&chain_seed);
            let (fwd, loop_closed) = walk_chain(
                graph,
                cells,
                faces,
                &mut ordinary,
                chain_seed,
                Chirality::Pos,
                component_id,
                &mut trace.face_components,
            );
            let mut points: Vec<[f64; 3]> = Vec::new();
            if !loop_closed {
                let (bwd, _) = walk_chain(
                    graph,
                    cells,
                    faces,
                    &mut ordinary,
                    chain_seed,
                    Chirality::Neg,
                    component_id,
                    &mut trace.face_components,
                );
                points.extend(bwd.into_iter().rev());
            }
            points.extend(fwd);
            if points.is_empty() {
                debug!("component {component_id}: chain at cell {chain_seed} yielded no points");
                continue;
            }
            let mut line = VortexLine::from_points(frame, time, points);
            line.id = Some(component_id);
            line.is_loop = loop_closed;
            trace.lines.push(line);
            nlines += 1;
        }

        debug!(
            "component {component_id}: {} cells, {} markers, {nlines} lines",
            members.len(),
            trace
                .markers
                .iter()
                .filter(|m| m.component == component_id)
                .count(),
        );
        trace.components += 1;
    }

    info!(
        "frame {frame}: {} vortex objects, {} lines, {} markers",
        trace.components,
        trace.lines.len(),
        trace.markers.len()
    );
    trace
}

/// Walks from `start` following slots of sign `dir`, consuming cells from
/// `ordinary` and collecting face singularity positions. Returns the points
/// in walk order and whether the walk closed back on `start`.
#[allow(clippy::too_many_arguments)]
fn walk_chain(
    graph: &MeshGraph,
    cells: &FastMap<CellId, PuncturedCell>,
    faces: &FastMap<FaceId, PuncturedFace>,
    ordinary: &mut BTreeSet<CellId>,
    start: CellId,
    dir: Chirality,
    component: u32,
    face_components: &mut FastMap<FaceId, u32>,
) -> (Vec<[f64; 3]>, bool) {
    let mut pts = Vec::new();
    let mut cur = start;
    let mut entered_via: Option<FaceId> = None;
    loop {
        let cc = graph.cell(cur);
        let pick = cells[&cur]
            .occupied()
            .map(|(local, c)| (local, c, cc.faces[local].0))
            .find(|&(_, c, f)| c == dir && Some(f) != entered_via);
        let Some((local, _, face)) = pick else {
            return (pts, false);
        };
        face_components.insert(face, component);
        let Some(pf) = faces.get(&face) else {
            warn!("cell {cur} slot names face {face} with no puncture record");
            return (pts, false);
        };
        let Some(p) = pf.pos else {
            // unlocated singularity: the chain dead-ends at this face
            return (pts, false);
        };
        pts.push(p);
        let Some(nb) = cc.neighbors[local] else {
            return (pts, false);
        };
        if nb == start {
            return (pts, true);
        }
        if !ordinary.remove(&nb) {
            // special or already consumed
            return (pts, false);
        }
        entered_via = Some(face);
        cur = nb;
    }
}

fn cell_centroid<D: Dataset>(dataset: &D, cell: CellId) -> [f64; 3] {
    let nodes = &dataset.graph().cell(cell).nodes;
    let mut c = [0.0; 3];
    for &n in nodes {
        let p = dataset.position(n);
        for d in 0..3 {
            c[d] += p[d];
        }
    }
    let k = nodes.len().max(1) as f64;
    [c[0] / k, c[1] / k, c[2] / k]
}
