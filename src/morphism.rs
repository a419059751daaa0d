//! Graph morphisms: structure-respecting maps between grammar graphs.
//!
//! A `GraphMorphism` maps element ids of one graph (the source) to element
//! ids of another (the target), with separate maps per element kind. Maps
//! are `BTreeMap`s so that iteration, serialization and debugging output
//! are deterministic.
//!
//! # Invariants
//! - Injectivity is required per kind: no two source vertices may share a
//!   target vertex, and likewise for half-edges and faces. Collisions
//!   *across* kinds are meaningless and not checked.
//! - A *total* morphism covers every element of its source graph.
//!
//! # Citations
//! - Graph morphisms in algebraic graph transformation: Ehrig, Ehrig,
//!   Prange & Taentzer, "Fundamentals of Algebraic Graph Transformation",
//!   Chapter 2 (2006)

use crate::arena::{FaceId, HalfEdgeId, VertexId};
use crate::graph::MerrellGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An element-wise map from one graph into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMorphism {
    /// Source vertex id → target vertex id.
    pub vertex_map: BTreeMap<VertexId, VertexId>,
    /// Source half-edge id → target half-edge id.
    pub half_edge_map: BTreeMap<HalfEdgeId, HalfEdgeId>,
    /// Source face id → target face id.
    pub face_map: BTreeMap<FaceId, FaceId>,
}

impl GraphMorphism {
    /// The empty morphism (out of the empty graph).
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every element of `source` appears as a key.
    pub fn is_total(&self, source: &MerrellGraph) -> bool {
        source
            .vertices
            .iter()
            .all(|v| self.vertex_map.contains_key(&v.id))
            && source
                .half_edges
                .iter()
                .all(|h| self.half_edge_map.contains_key(&h.id))
            && source.faces.iter().all(|f| self.face_map.contains_key(&f.id))
    }

    /// True when no two source elements of the same kind collide on one
    /// target element.
    pub fn is_injective(&self) -> bool {
        fn distinct<K, V: Ord + Copy>(map: &BTreeMap<K, V>) -> bool {
            let mut seen = BTreeSet::new();
            map.values().all(|v| seen.insert(*v))
        }
        distinct(&self.vertex_map) && distinct(&self.half_edge_map) && distinct(&self.face_map)
    }

    /// Total number of mapped elements across all kinds.
    pub fn len(&self) -> usize {
        self.vertex_map.len() + self.half_edge_map.len() + self.face_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn empty_morphism_is_total_only_on_empty_graph() {
        let m = GraphMorphism::new();
        let empty = MerrellGraph::new();
        assert!(m.is_total(&empty));
        assert!(m.is_injective());

        let mut g = MerrellGraph::new();
        g.add_vertex(Vec2::ZERO);
        assert!(!m.is_total(&g));
    }

    #[test]
    fn injectivity_is_per_kind() {
        let mut m = GraphMorphism::new();
        m.vertex_map.insert(VertexId::new(0), VertexId::new(5));
        m.vertex_map.insert(VertexId::new(1), VertexId::new(5));
        assert!(!m.is_injective());

        // Same raw value across kinds is not a collision.
        let mut m = GraphMorphism::new();
        m.vertex_map.insert(VertexId::new(0), VertexId::new(5));
        m.half_edge_map.insert(HalfEdgeId::new(0), HalfEdgeId::new(5));
        m.face_map.insert(FaceId::new(0), FaceId::new(5));
        assert!(m.is_injective());
    }

    #[test]
    fn totality_requires_every_kind_covered() {
        let mut g = MerrellGraph::new();
        let v0 = g.add_vertex(Vec2::ZERO);
        let v1 = g.add_vertex(Vec2::ONE);
        let he = g
            .add_half_edge_pair(
                v0,
                v1,
                crate::label::EdgeLabel::new(
                    crate::label::RegionLabel::Wildcard,
                    crate::label::RegionLabel::Open,
                    0.0,
                ),
            )
            .unwrap();
        let twin = g.half_edge(he).unwrap().twin.unwrap();

        let mut m = GraphMorphism::new();
        m.vertex_map.insert(v0, VertexId::new(10));
        m.vertex_map.insert(v1, VertexId::new(11));
        m.half_edge_map.insert(he, HalfEdgeId::new(20));
        assert!(!m.is_total(&g), "twin half-edge not covered yet");

        m.half_edge_map.insert(twin, HalfEdgeId::new(21));
        assert!(m.is_total(&g));
    }
}
