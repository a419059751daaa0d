//! Typed element identifiers for the labelled half-edge graph.
//!
//! Provides `VertexId`, `HalfEdgeId` and `FaceId`, dense total-orderable
//! identifiers handed out by a `MerrellGraph`'s monotonic counters. All
//! cross-references between graph elements (twin, next, prev, face, vertex)
//! are stored as these ids and resolved through the owning graph's lookup,
//! never as borrowed references, so graphs stay trivially copyable; the
//! gluing operator relies on copy-and-offset semantics.
//!
//! # Determinism
//! - Id ordering is by the inner `u32`.
//! - Ids are never reused within one graph's lifetime: removal leaves a hole
//!   in id space. There is intentionally no free list.
//!
//! # Citations
//! - Half-edge / DCEL element addressing: Muller & Preparata, "Finding the
//!   intersection of two convex polyhedra" (1978)

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! graph_id {
    ($(#[$doc:meta])* $name:ident, $tag:literal) => {
        $(#[$doc])*
        ///
        /// A `#[repr(transparent)]` wrapper over `u32`; `Copy`, `Eq`, `Ord`,
        /// `Hash`. The inner value is an id allocated by the owning graph's
        /// monotonic counter; it is **not** guaranteed to be a live index
        /// into the element vector once removals have happened.
        #[repr(transparent)]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from a raw `u32`.
            ///
            /// The caller must ensure the value was allocated by the graph
            /// that will resolve it; prefer the graph's factory methods.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw `u32` value.
            #[inline]
            pub const fn as_u32(&self) -> u32 {
                self.0
            }

            /// Returns this id shifted by `offset` id slots.
            ///
            /// Used when one graph is appended into another: every id of the
            /// appended graph is shifted by the destination's counter so all
            /// internal cross-references stay consistent.
            #[inline]
            pub const fn offset(&self, offset: u32) -> Self {
                Self(self.0 + offset)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "{}"), self.0)
            }
        }
    };
}

graph_id!(
    /// Identifier of a vertex in a `MerrellGraph`.
    VertexId,
    "V"
);
graph_id!(
    /// Identifier of a directed half-edge in a `MerrellGraph`.
    HalfEdgeId,
    "HE"
);
graph_id!(
    /// Identifier of a face (polygonal region) in a `MerrellGraph`.
    FaceId,
    "F"
);
