//! Double-pushout rewrite rules extracted from the hierarchy.
//!
//! A rule is three graphs and two injective morphisms:
//!
//! ```text
//!        φL          φR
//!     L ←── I ──→ R
//! ```
//!
//! `L` is the larger pattern, `R` the smaller replacement, `I` the shared
//! interface both morphisms embed. Extraction applies rules destructively
//! (`L → R`, shrinking an example); generation applies them constructively
//! (`R → L`, growing a new shape by gluing `L` in along `I`).
//!
//! Morphisms are stored as id maps, never element references, so rules can
//! be copied and serialised without invalidation.
//!
//! Rules know nothing about world positions; position solving is a separate
//! concern layered on top by the controller.
//!
//! # Citations
//! - Double pushout rewriting: Ehrig, Ehrig, Prange & Taentzer,
//!   "Fundamentals of Algebraic Graph Transformation", Chapter 3 (2006)
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 2, 5, 6 (2023)

use crate::boundary::BoundaryString;
use crate::graph::MerrellGraph;
use crate::morphism::GraphMorphism;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural role a rule plays in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    /// Base case: a complete graph rewrites from the empty graph; seeds
    /// generation.
    Starter,
    /// Two cut edges glued into an interior seam (`aā → ε`).
    LoopGlue,
    /// A branch subgraph attached to a single cut edge. Declared extension
    /// point; no extractor emits it yet.
    BranchGlue,
    /// One-half-edge graph used for pruning.
    Stub,
    /// Anything else the extractor emits.
    General,
}

/// One double-pushout rewrite rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DPORule {
    pub id: usize,
    /// Human-readable name, e.g. `"starter_HStraight"`.
    pub name: String,
    pub kind: RuleKind,

    /// Left graph: matched in an example during extraction, produced
    /// during generation.
    pub lhs: MerrellGraph,
    /// Right graph: the smaller side matched during generation.
    pub rhs: MerrellGraph,
    /// Interface graph shared by both sides.
    pub interface: MerrellGraph,

    /// `φL : I → L`.
    pub phi_l: GraphMorphism,
    /// `φR : I → R`.
    pub phi_r: GraphMorphism,

    /// Cached `∂L`, computed at extraction so generation never recomputes.
    pub boundary_l: BoundaryString,
    /// Cached `∂R`.
    pub boundary_r: BoundaryString,

    /// Hierarchy generation this rule was extracted at; 0 for starters.
    pub extracted_at_generation: u32,
    /// True when `R` (and `I`) are the empty graph.
    pub is_starter_rule: bool,
}

impl DPORule {
    /// A rule is valid iff `L` is non-empty and both morphisms are
    /// injective. (Totality of the morphisms over `I` is a declared
    /// extension point not yet required by callers.)
    pub fn is_valid(&self) -> bool {
        !self.lhs.is_empty() && self.phi_l.is_injective() && self.phi_r.is_injective()
    }
}

impl fmt::Display for DPORule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[DPORule {}] {:?} ({:?}) gen={} starter={}",
            self.id, self.name, self.kind, self.extracted_at_generation, self.is_starter_rule
        )?;
        write!(f, "  L: {}", self.lhs)?;
        write!(f, "  R: {}", self.rhs)?;
        write!(f, "  I: {}", self.interface)
    }
}

/// Result of searching for an occurrence of a rule's match side inside a
/// working graph during generation. The morphism maps `R` (or `L` during
/// destructive application) into the target graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: usize,
    pub valid: bool,
    pub morphism: GraphMorphism,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{HalfEdgeId, VertexId};
    use glam::Vec2;

    fn one_edge_graph() -> MerrellGraph {
        let mut g = MerrellGraph::new();
        let v0 = g.add_vertex(Vec2::ZERO);
        let v1 = g.add_vertex(Vec2::new(1.0, 0.0));
        g.add_half_edge_pair(
            v0,
            v1,
            crate::label::EdgeLabel::new(
                crate::label::RegionLabel::Wildcard,
                crate::label::RegionLabel::Open,
                0.0,
            ),
        )
        .unwrap();
        g
    }

    fn rule_with(lhs: MerrellGraph) -> DPORule {
        DPORule {
            id: 0,
            name: "test".into(),
            kind: RuleKind::General,
            lhs,
            rhs: MerrellGraph::new(),
            interface: MerrellGraph::new(),
            phi_l: GraphMorphism::new(),
            phi_r: GraphMorphism::new(),
            boundary_l: BoundaryString::default(),
            boundary_r: BoundaryString::default(),
            extracted_at_generation: 0,
            is_starter_rule: false,
        }
    }

    #[test]
    fn empty_left_graph_is_invalid() {
        let rule = rule_with(MerrellGraph::new());
        assert!(!rule.is_valid());
    }

    #[test]
    fn injectivity_failure_invalidates() {
        let mut rule = rule_with(one_edge_graph());
        assert!(rule.is_valid());

        rule.phi_l
            .vertex_map
            .insert(VertexId::new(0), VertexId::new(9));
        rule.phi_l
            .vertex_map
            .insert(VertexId::new(1), VertexId::new(9));
        assert!(!rule.is_valid());
    }

    #[test]
    fn serde_round_trip_preserves_rule() {
        let mut rule = rule_with(one_edge_graph());
        rule.phi_l
            .half_edge_map
            .insert(HalfEdgeId::new(0), HalfEdgeId::new(4));
        let json = serde_json::to_string(&rule).unwrap();
        let back: DPORule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
