//! Hierarchy construction: generations of glued graphs with dedup.
//!
//! Generation 0 is one node per tile primitive. Generation N+1 is produced
//! by loop-gluing every ordered pair of generation-N nodes (self-pairs
//! included) along every complementary open-edge pair. A new node enters
//! the hierarchy only if its canonical boundary string has never been seen
//! anywhere in the hierarchy so far; boundary-equivalent shapes built two
//! different ways collapse to one node, which is what keeps the search from
//! exploding combinatorially.
//!
//! # Determinism
//! Pair order and open-edge order follow storage (insertion) order, so the
//! same vocabulary and settings reproduce the same hierarchy and node ids
//! run to run. Rule-id stability in the extractor depends on this.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 4.3 (hierarchy), Sec 5.7 (bounding)
//!   (2023)

use crate::boundary::BoundaryString;
use crate::glue::loop_glue;
use crate::grammar::GrammarSettings;
use crate::graph::MerrellGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One node of the gluing hierarchy.
///
/// Created once by the builder and never mutated afterwards, except for the
/// `pruned` flag the extractor sets in a later pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: usize,
    /// Number of gluings composed to build this graph; 0 for primitives.
    pub generation: u32,
    pub graph: MerrellGraph,
    /// Cached boundary string; the dedup key is its canonical form.
    pub boundary: BoundaryString,
    /// |total turn count| == 4.
    pub is_complete: bool,
    /// Set by the extractor when no complete shape is reachable from here.
    pub pruned: bool,
    /// The two nodes glued to produce this one; `None` for primitives.
    pub parent_ids: Option<[usize; 2]>,
}

/// Builds the full hierarchy from the disassembled primitives.
///
/// The progress callback is invoked once per generation with
/// `(step, total)`; it is purely cosmetic and must not mutate grammar
/// state.
pub fn build_hierarchy(
    primitives: &[MerrellGraph],
    settings: &GrammarSettings,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Vec<HierarchyNode> {
    let mut hierarchy: Vec<HierarchyNode> = Vec::new();

    // Gen 0: primitives. Their boundary is the single face's loop, which is
    // complete by construction.
    for prim in primitives {
        let boundary = match prim.faces.first() {
            Some(f) => prim.boundary_of(f.id),
            None => BoundaryString::default(),
        };
        hierarchy.push(HierarchyNode {
            id: hierarchy.len(),
            generation: 0,
            graph: prim.clone(),
            is_complete: boundary.is_complete(),
            boundary,
            pruned: false,
            parent_ids: None,
        });
    }

    let total = settings.max_hierarchy_gen as usize * primitives.len().max(1);
    let mut step = 0;

    for gen in 0..settings.max_hierarchy_gen {
        if let Some(cb) = progress.as_mut() {
            cb(step, total);
        }
        step += 1;

        try_loop_gluings(&mut hierarchy, gen, settings.max_rules);
        try_branch_gluings(&mut hierarchy, gen);

        let produced = hierarchy.iter().any(|n| n.generation == gen + 1);
        if !produced {
            break;
        }
    }

    // Late boundary fill for any node created without one.
    for node in &mut hierarchy {
        if node.boundary.is_empty() && !node.graph.is_empty() {
            node.boundary = node.graph.graph_boundary();
            node.is_complete = node.boundary.is_complete();
        }
    }

    debug!(
        nodes = hierarchy.len(),
        depth = hierarchy.iter().map(|n| n.generation).max().unwrap_or(0),
        "hierarchy built"
    );
    hierarchy
}

/// Tries every loop gluing between nodes of `generation`, appending
/// deduplicated results as generation `generation + 1`.
fn try_loop_gluings(hierarchy: &mut Vec<HierarchyNode>, generation: u32, max_new: usize) {
    let gen_nodes: Vec<usize> = (0..hierarchy.len())
        .filter(|&i| hierarchy[i].generation == generation)
        .collect();
    if gen_nodes.is_empty() {
        return;
    }

    // Canonical boundary strings of everything produced so far, across the
    // whole hierarchy, not just this generation.
    let mut seen: BTreeSet<String> = hierarchy
        .iter()
        .filter(|n| !n.boundary.is_empty())
        .map(|n| n.boundary.canonical())
        .collect();

    let mut new_nodes = 0;

    for &ai in &gen_nodes {
        for &bi in &gen_nodes {
            let open_a = hierarchy[ai].graph.open_half_edges();
            let open_b = hierarchy[bi].graph.open_half_edges();

            for &ha in &open_a {
                for &hb in &open_b {
                    if new_nodes >= max_new {
                        return;
                    }
                    // loop_glue re-checks compatibility; a failed pairing
                    // is simply skipped, never fatal.
                    let Some(result) = loop_glue(&hierarchy[ai].graph, &hierarchy[bi].graph, ha, hb)
                    else {
                        continue;
                    };

                    let boundary = result.graph_boundary();
                    if !seen.insert(boundary.canonical()) {
                        continue;
                    }

                    let node = HierarchyNode {
                        id: hierarchy.len(),
                        generation: generation + 1,
                        graph: result,
                        is_complete: boundary.is_complete(),
                        boundary,
                        pruned: false,
                        parent_ids: Some([ai, bi]),
                    };
                    debug!(
                        id = node.id,
                        generation = node.generation,
                        complete = node.is_complete,
                        boundary = %node.boundary,
                        "loop glue accepted"
                    );
                    hierarchy.push(node);
                    new_nodes += 1;
                }
            }
        }
    }
}

/// Branch gluing attaches a side subgraph to a single cut edge instead of
/// closing a loop between two. Declared extension point: nothing is
/// produced yet.
fn try_branch_gluings(_hierarchy: &mut [HierarchyNode], _generation: u32) {}
