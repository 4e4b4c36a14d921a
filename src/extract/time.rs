//! Temporal tracing: punctured faces through space-time prisms.
//!
//! Every punctured face of the current frame seeds a depth-first traversal
//! through the prisms between the two loaded frames. Within a prism the
//! singularity leaves through the slot carrying the same sign it arrived
//! with; leaving through the top means the seed corresponds to that face in
//! the next frame, leaving through a side quad crosses its edge (strictly
//! ascending in crossing time) into the neighboring faces' prisms.

use hashbrown::HashMap as FastMap;
use hashbrown::HashSet as FastSet;
use log::{debug, info};

use crate::extract::puncture::{PuncturedCell, PuncturedEdge, PuncturedFace};
use crate::topology::chirality::Chirality;
use crate::topology::graph::MeshGraph;
use crate::topology::id::{EdgeId, FaceId};

/// One temporal match: a current-frame face reached a next-frame face.
#[derive(Clone, Debug, PartialEq)]
pub struct Correspondence {
    pub from: FaceId,
    pub to: FaceId,
    /// Faces the path walked, seed first, matched face last.
    pub path: Vec<FaceId>,
    /// Edge crossings between consecutive path faces, in walk order, with
    /// their crossing times. One element shorter than `path`.
    pub steps: Vec<(EdgeId, f64)>,
}

/// Follows every current-slot punctured face to the next-slot faces it can
/// reach. The prisms drive the traversal; `edges` supplies crossing times.
pub fn trace_over_time(
    graph: &MeshGraph,
    faces: &FastMap<FaceId, PuncturedFace>,
    faces_next: &FastMap<FaceId, PuncturedFace>,
    edges: &FastMap<EdgeId, PuncturedEdge>,
    prisms: &FastMap<FaceId, PuncturedCell>,
) -> Vec<Correspondence> {
    let mut seeds: Vec<FaceId> = faces.keys().copied().collect();
    seeds.sort_unstable();

    let mut out = Vec::new();
    for seed in seeds {
        let chirality = faces[&seed].chirality;
        let mut visited_faces: FastSet<FaceId> = FastSet::from_iter([seed]);
        let mut visited_edges: FastSet<EdgeId> = FastSet::new();
        // LIFO worklist: (face, carried chirality, accumulated time, chain)
        let mut stack: Vec<(FaceId, Chirality, f64, Vec<FaceId>, Vec<(EdgeId, f64)>)> =
            vec![(seed, chirality, 0.0, vec![seed], Vec::new())];

        while let Some((face, carried, t, path, steps)) = stack.pop() {
            let Some(prism) = prisms.get(&face) else {
                continue;
            };
            for (slot, value) in prism.occupied() {
                if value != carried || slot == 0 {
                    // the bottom is always an inlet
                    continue;
                }
                if slot == 1 {
                    debug_assert!(faces_next.contains_key(&face));
                    debug!(
                        "correspondence {seed} -> {face} via {} prisms",
                        path.len()
                    );
                    out.push(Correspondence {
                        from: seed,
                        to: face,
                        path: path.clone(),
                        steps: steps.clone(),
                    });
                    continue;
                }
                let (eid, _) = graph.face(face).edges[slot - 2];
                let Some(pe) = edges.get(&eid) else {
                    continue;
                };
                if pe.t <= t || !visited_edges.insert(eid) {
                    continue;
                }
                for fu in &graph.edge(eid).faces {
                    if fu.face == face || !visited_faces.insert(fu.face) {
                        continue;
                    }
                    // the slot sign flips side: what leaves this prism
                    // enters the neighbor's
                    let next_carried = -(pe.chirality * fu.chirality);
                    let mut next_path = path.clone();
                    next_path.push(fu.face);
                    let mut next_steps = steps.clone();
                    next_steps.push((eid, pe.t));
                    stack.push((fu.face, next_carried, pe.t, next_path, next_steps));
                }
            }
        }
    }
    info!(
        "{} temporal correspondences from {} seeds",
        out.len(),
        faces.len()
    );
    out
}
