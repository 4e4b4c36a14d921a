//! Strong, zero-cost handles for mesh entities
//!
//! Every element of the mesh dual graph (node, edge, face, cell) is referred
//! to by a dense index starting at 0. Wrapping the raw `u32` in a distinct
//! newtype per element kind keeps edge ids from being handed to face lookups
//! and vice versa, at zero runtime cost.
//!
//! Absence ("no neighbor across this face") is expressed as `Option<CellId>`
//! and friends; the on-disk formats map `None` to `u32::MAX`, but that
//! sentinel never leaks past `io::wire`.

use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Memory layout
        /// `repr(transparent)` over `u32`: same ABI and alignment as the raw
        /// index, so slices of ids can be cast cheaply for wire encoding.
        #[derive(
            Copy,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a handle from a raw dense index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Returns the raw index.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Returns the raw index widened for slice indexing.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(id: $name) -> u32 {
                id.get()
            }
        }
    };
}

define_id! {
    /// Handle for a mesh node (vertex).
    NodeId
}
define_id! {
    /// Handle for a deduplicated edge of the mesh dual graph.
    EdgeId
}
define_id! {
    /// Handle for a deduplicated face of the mesh dual graph.
    FaceId
}
define_id! {
    /// Handle for a volumetric cell.
    CellId
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_get() {
        let f = FaceId::new(42);
        assert_eq!(f.get(), 42);
        assert_eq!(f.index(), 42usize);
    }

    #[test]
    fn debug_and_display() {
        let c = CellId::new(7);
        assert_eq!(format!("{:?}", c), "CellId(7)");
        assert_eq!(format!("{}", c), "7");
    }

    #[test]
    fn ordering_and_hash() {
        use std::collections::HashSet;
        let a = EdgeId::new(1);
        let b = EdgeId::new(2);
        assert!(a < b);
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
    }
}
