//! Tessella: example-based shape-grammar induction and generation.
//!
//! This crate learns a reusable shape grammar from a small set of example
//! tile primitives, then grows new shapes that obey the same local
//! adjacency rules. It implements the double-pushout (DPO) graph-grammar
//! pipeline of Merrell 2023: disassemble example tiles into canonical
//! labelled half-edge graphs, build a hierarchy of larger graphs by gluing
//! pairs of smaller ones along compatible open edges, extract a minimal
//! rewrite-rule set from the hierarchy, and apply those rules to grow new
//! graphs procedurally.
//!
//! # Name Origin: "Tessella"
//!
//! A *tessella* is one small tile in a Roman mosaic. The crate starts from
//! individual tiles and learns how the mosaic wants to be laid.
//!
//! # Pipeline
//!
//! ```
//! use tessella::prelude::*;
//!
//! // Two single-socket caps that close into a domino.
//! let defs = vec![
//!     TileSocketDef { label: "CapE".into(), sockets: vec![IVec2::new(1, 0)] },
//!     TileSocketDef { label: "CapW".into(), sockets: vec![IVec2::new(-1, 0)] },
//! ];
//!
//! let mut grammar = MerrellGrammar::new();
//! grammar.load_from_tiles(&defs, &[]).unwrap();
//! grammar.extract_grammar(None).unwrap();
//! grammar.generate(None).unwrap();
//! assert!(grammar.result().success);
//! ```
//!
//! Everything is single-threaded and synchronous; the optional progress
//! callbacks exist for UI responsiveness only. Graphs are immutable once a
//! pipeline stage has produced them; later stages copy, they never mutate
//! in place.
//!
//! # References
//!
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42, 4, Article 1 (2023)
//! - Double-pushout rewriting: Ehrig, Ehrig, Prange, Taentzer,
//!   "Fundamentals of Algebraic Graph Transformation" (2006)
//! - Half-edge representation: Muller & Preparata (1978)

pub mod arena;
pub mod boundary;
pub mod extract;
pub mod generate;
pub mod glue;
pub mod grammar;
pub mod graph;
pub mod hierarchy;
pub mod label;
pub mod morphism;
pub mod persist;
pub mod rule;
pub mod tiles;

pub use crate::arena::{FaceId, HalfEdgeId, VertexId};
pub use crate::boundary::{BoundaryElement, BoundaryString, TurnType};
pub use crate::generate::{find_match, GenerateError, GenerationResult, PlacedFace};
pub use crate::glue::loop_glue;
pub use crate::grammar::{GrammarError, GrammarSettings, MerrellGrammar};
pub use crate::graph::{GraphError, MerrellGraph, MgFace, MgHalfEdge, MgVertex};
pub use crate::hierarchy::HierarchyNode;
pub use crate::label::{EdgeLabel, RegionLabel};
pub use crate::morphism::GraphMorphism;
pub use crate::rule::{DPORule, RuleKind, RuleMatch};
pub use crate::tiles::{TileInput, TileSocketDef};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::boundary::{BoundaryString, TurnType};
    pub use crate::generate::{GenerationResult, PlacedFace};
    pub use crate::grammar::{GrammarError, GrammarSettings, MerrellGrammar};
    pub use crate::graph::MerrellGraph;
    pub use crate::hierarchy::HierarchyNode;
    pub use crate::label::{EdgeLabel, RegionLabel};
    pub use crate::rule::{DPORule, RuleKind};
    pub use crate::tiles::{TileInput, TileSocketDef};
    pub use glam::{IVec2, Vec2};
}
