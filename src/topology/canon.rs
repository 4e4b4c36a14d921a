//! Canonical keys for orientation classes of edges and triangular faces.
//!
//! Two node tuples name the same face when one is a rotation or reflection
//! of the other (6 equivalent orderings for a triangle), and the same edge
//! when one is the reversal of the other. Rather than probing a map with
//! every equivalent ordering, each tuple is normalized to one canonical key
//! (the lexicographically smallest rotation over both reflections) and the
//! map is keyed by that alone.
//!
//! The key identifies the *class*; it does not fix the positive
//! orientation. That stays with whichever ordering was inserted first, and
//! [`face_chirality`]/[`edge_chirality`] recover a query's sign relative to
//! the stored ordering: rotation-equivalent tuples share a winding (`Pos`),
//! reflections oppose it (`Neg`).

use crate::topology::chirality::Chirality;
use crate::topology::id::NodeId;

/// Map key for an undirected edge: the node pair in ascending order.
pub type EdgeKey = (NodeId, NodeId);

/// Map key for a triangular face's rotation+reflection class.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FaceKey([NodeId; 3]);

/// Normalizes an edge's node pair.
#[inline]
pub fn edge_key(a: NodeId, b: NodeId) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// Chirality of the ordered pair `query` relative to the stored ordering.
///
/// Returns `None` if the pair is not the same edge at all; callers that
/// looked the edge up by key first can treat that as a corrupt map.
#[inline]
pub fn edge_chirality(query: (NodeId, NodeId), stored: (NodeId, NodeId)) -> Option<Chirality> {
    if query == stored {
        Some(Chirality::Pos)
    } else if (query.1, query.0) == stored {
        Some(Chirality::Neg)
    } else {
        None
    }
}

/// The lexicographically smallest of a triple's three rotations.
///
/// Rotation-invariant but *not* reflection-invariant: two triples get the
/// same result iff they wind the same way around the same nodes.
#[inline]
pub fn min_rotation(nodes: [NodeId; 3]) -> [NodeId; 3] {
    let [a, b, c] = nodes;
    let rots = [[a, b, c], [b, c, a], [c, a, b]];
    let mut best = rots[0];
    for r in &rots[1..] {
        if *r < best {
            best = *r;
        }
    }
    best
}

impl FaceKey {
    /// Normalizes a face tuple over all 6 equivalent orderings.
    #[inline]
    pub fn new(nodes: [NodeId; 3]) -> Self {
        let fwd = min_rotation(nodes);
        let rev = min_rotation([nodes[2], nodes[1], nodes[0]]);
        FaceKey(if fwd <= rev { fwd } else { rev })
    }
}

/// Chirality of `query` relative to the stored canonical ordering.
///
/// `Pos` if `query` is a rotation of `stored`, `Neg` if it is a rotation of
/// `stored` reversed, `None` if the tuples are not orientation-equivalent.
#[inline]
pub fn face_chirality(query: [NodeId; 3], stored: [NodeId; 3]) -> Option<Chirality> {
    let stored_min = min_rotation(stored);
    if min_rotation(query) == stored_min {
        Some(Chirality::Pos)
    } else if min_rotation([query[2], query[1], query[0]]) == stored_min {
        Some(Chirality::Neg)
    } else {
        None
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn n(raw: u32) -> NodeId {
        NodeId::new(raw)
    }

    proptest! {
        #[test]
        fn prop_face_key_is_orientation_invariant(
            a in 0u32..1000,
            b in 0u32..1000,
            c in 0u32..1000,
            rot in 0usize..3,
            reflect in any::<bool>(),
        ) {
            prop_assume!(a != b && b != c && a != c);
            let base = [n(a), n(b), n(c)];
            let mut query = if reflect { [n(c), n(b), n(a)] } else { base };
            query.rotate_left(rot);

            prop_assert_eq!(FaceKey::new(query), FaceKey::new(base));
            let expected = if reflect { Chirality::Neg } else { Chirality::Pos };
            prop_assert_eq!(face_chirality(query, base), Some(expected));
        }

        #[test]
        fn prop_edge_key_ignores_direction(a in 0u32..1000, b in 0u32..1000) {
            prop_assume!(a != b);
            prop_assert_eq!(edge_key(n(a), n(b)), edge_key(n(b), n(a)));
            prop_assert_eq!(
                edge_chirality((n(a), n(b)), (n(a), n(b))),
                Some(Chirality::Pos)
            );
            prop_assert_eq!(
                edge_chirality((n(b), n(a)), (n(a), n(b))),
                Some(Chirality::Neg)
            );
        }
    }
}
