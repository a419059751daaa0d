//! Grammar extraction (Algorithm 1): turning the hierarchy into rules.
//!
//! Two emission passes over the completed, generation-tagged hierarchy:
//!
//! 1. **Starter rules**: one per complete generation-0 node. `L` is the
//!    primitive graph, `R` and `I` are empty, both morphisms empty.
//! 2. **Expansion rules**: for every complete, non-pruned node `C` of
//!    generation ≥ 1 and each of its two recorded parents `P`, a rule with
//!    `L = C`, `R = P` and `I` a minimal two-vertex, one-edge-pair graph
//!    templated on one of `R`'s open half-edges. `φR` maps `I` onto that
//!    open edge; `φL` maps it onto the seam in `L`, the half-edge now
//!    labelled `glued` whose direction matches the chosen open edge.
//!
//! Rules are deduplicated by the `(∂R, ∂L)` canonical boundary pair; a
//! pair already registered (by a starter or an earlier expansion) is
//! skipped. Before emission, nodes from which no complete shape is
//! reachable are flagged `pruned`; they stay in the hierarchy for
//! inspection but contribute no rules and are not admissible match
//! targets.
//!
//! Emission order is part of the observable contract: starters first in
//! generation-0 index order, then expansions in hierarchy index order, then
//! by parent slot. Generation tie-breaks prefer earlier rules.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 5 (Algorithm 1) (2023)

use crate::graph::MerrellGraph;
use crate::hierarchy::HierarchyNode;
use crate::label::{wrap_angle, RegionLabel};
use crate::morphism::GraphMorphism;
use crate::rule::{DPORule, RuleKind};
use std::collections::BTreeSet;
use tracing::debug;

/// Angular tolerance when locating, in `L`, the glued seam corresponding
/// to the interface edge chosen in `R`. Looser than the gluing tolerance:
/// the seam went through a merge and a translation.
const SEAM_THETA_EPS: f32 = 1e-3;

fn thetas_close(t0: f32, t1: f32, eps: f32) -> bool {
    let d = wrap_angle(t0 - t1);
    d < eps || std::f32::consts::TAU - d < eps
}

/// True when `node` or any node reachable by following produced-a-child
/// edges forward is complete.
///
/// Children are found by rescanning the hierarchy each call; fine at
/// current scale (see the design ledger for the growth plan).
fn has_complete_descendant(hierarchy: &[HierarchyNode], node: usize) -> bool {
    let mut stack = vec![node];
    let mut visited = BTreeSet::new();
    while let Some(n) = stack.pop() {
        if !visited.insert(n) {
            continue;
        }
        if hierarchy[n].is_complete {
            return true;
        }
        for (i, candidate) in hierarchy.iter().enumerate() {
            if candidate
                .parent_ids
                .map_or(false, |parents| parents.contains(&n))
            {
                stack.push(i);
            }
        }
    }
    false
}

/// Flags every hierarchy node from which no complete shape is reachable.
///
/// This is the only mutation a hierarchy node sees after creation.
pub fn prune_hierarchy(hierarchy: &mut [HierarchyNode]) {
    for i in 0..hierarchy.len() {
        hierarchy[i].pruned = !has_complete_descendant(hierarchy, i);
    }
}

/// Builds the minimal interface graph for an expansion rule plus the two
/// morphisms, templated on the open half-edge `open_id` of `rhs` and its
/// glued counterpart in `lhs`. Returns `None` when `lhs` has no seam with
/// a matching direction.
fn build_interface(
    lhs: &MerrellGraph,
    rhs: &MerrellGraph,
    open_id: crate::arena::HalfEdgeId,
) -> Option<(MerrellGraph, GraphMorphism, GraphMorphism)> {
    let open = rhs.half_edge(open_id)?;
    let open_twin_id = open.twin?;
    let open_twin = rhs.half_edge(open_twin_id)?;
    let v_start = rhs.vertex(open.vertex)?;
    let v_end = rhs.vertex(open_twin.vertex)?;

    let mut interface = MerrellGraph::new();
    let iv0 = interface.add_vertex(v_start.pos);
    let iv1 = interface.add_vertex(v_end.pos);
    let ie = interface
        .add_half_edge_pair(iv0, iv1, open.label.clone())
        .expect("interface vertices just created");
    let ie_twin = interface.half_edge(ie)?.twin?;

    let mut phi_r = GraphMorphism::new();
    phi_r.vertex_map.insert(iv0, open.vertex);
    phi_r.vertex_map.insert(iv1, open_twin.vertex);
    phi_r.half_edge_map.insert(ie, open_id);
    phi_r.half_edge_map.insert(ie_twin, open_twin_id);

    // The seam this parent's gluing produced: a glued half-edge in L whose
    // direction matches the chosen open edge.
    let seam = lhs.half_edges.iter().find(|h| {
        h.label.r == RegionLabel::Glued
            && thetas_close(h.label.theta, open.label.theta, SEAM_THETA_EPS)
    })?;
    let seam_twin_id = seam.twin?;
    let seam_twin = lhs.half_edge(seam_twin_id)?;

    let mut phi_l = GraphMorphism::new();
    phi_l.vertex_map.insert(iv0, seam.vertex);
    phi_l.vertex_map.insert(iv1, seam_twin.vertex);
    phi_l.half_edge_map.insert(ie, seam.id);
    phi_l.half_edge_map.insert(ie_twin, seam_twin_id);

    Some((interface, phi_l, phi_r))
}

/// Runs both emission passes and pruning; returns the ordered rule list.
pub fn extract_rules(
    hierarchy: &mut [HierarchyNode],
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Vec<DPORule> {
    prune_hierarchy(hierarchy);

    let mut rules: Vec<DPORule> = Vec::new();
    let mut seen_pairs: BTreeSet<(String, String)> = BTreeSet::new();
    let total = hierarchy.len();

    // Pass 1: starter rules from complete generation-0 nodes.
    for node in hierarchy.iter() {
        if node.generation != 0 || !node.is_complete {
            continue;
        }
        let lhs = node.graph.clone();
        let boundary_l = lhs.graph_boundary();
        let name = lhs
            .faces
            .first()
            .map(|f| format!("starter_{}", f.label))
            .unwrap_or_else(|| format!("starter_{}", node.id));
        seen_pairs.insert((String::new(), boundary_l.canonical()));
        rules.push(DPORule {
            id: rules.len(),
            name,
            kind: RuleKind::Starter,
            lhs,
            rhs: MerrellGraph::new(),
            interface: MerrellGraph::new(),
            phi_l: GraphMorphism::new(),
            phi_r: GraphMorphism::new(),
            boundary_l,
            boundary_r: Default::default(),
            extracted_at_generation: 0,
            is_starter_rule: true,
        });
    }

    // Pass 2: expansion rules from complete, non-pruned glued nodes.
    for idx in 0..hierarchy.len() {
        if let Some(cb) = progress.as_mut() {
            cb(idx, total);
        }
        let node = &hierarchy[idx];
        if node.generation == 0 || !node.is_complete || node.pruned {
            continue;
        }
        let Some(parents) = node.parent_ids else {
            continue;
        };

        for parent in parents {
            let lhs = node.graph.clone();
            let rhs = hierarchy[parent].graph.clone();

            let Some(&open_id) = rhs.open_half_edges().first() else {
                debug!(node = node.id, parent, "parent has no open edge; skipped");
                continue;
            };
            let Some((interface, phi_l, phi_r)) = build_interface(&lhs, &rhs, open_id) else {
                debug!(node = node.id, parent, "no matching seam in child; skipped");
                continue;
            };

            let boundary_l = lhs.graph_boundary();
            let boundary_r = rhs.graph_boundary();
            if !seen_pairs.insert((boundary_r.canonical(), boundary_l.canonical())) {
                continue;
            }

            rules.push(DPORule {
                id: rules.len(),
                name: format!("expand_{}_from_{}", node.id, hierarchy[parent].id),
                kind: RuleKind::LoopGlue,
                lhs,
                rhs,
                interface,
                phi_l,
                phi_r,
                boundary_l,
                boundary_r,
                extracted_at_generation: node.generation,
                is_starter_rule: false,
            });
        }
    }

    debug!(rules = rules.len(), "grammar extracted");
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarSettings;
    use crate::hierarchy::build_hierarchy;
    use crate::tiles::fixtures::h_straight;
    use crate::tiles::{tile_primitive, TileSocketDef};
    use glam::IVec2;

    /// Two single-socket caps that close into a domino in one gluing.
    fn cap_vocabulary() -> Vec<MerrellGraph> {
        let cap_e = TileSocketDef {
            label: "CapE".into(),
            sockets: vec![IVec2::new(1, 0)],
        };
        let cap_w = TileSocketDef {
            label: "CapW".into(),
            sockets: vec![IVec2::new(-1, 0)],
        };
        vec![tile_primitive(&cap_e), tile_primitive(&cap_w)]
    }

    fn settings() -> GrammarSettings {
        GrammarSettings {
            max_hierarchy_gen: 2,
            ..GrammarSettings::default()
        }
    }

    #[test]
    fn starters_come_first_and_are_valid() {
        let prims = cap_vocabulary();
        let mut h = build_hierarchy(&prims, &settings(), None);
        let rules = extract_rules(&mut h, None);

        let starters: Vec<_> = rules.iter().filter(|r| r.is_starter_rule).collect();
        assert_eq!(starters.len(), 2);
        assert_eq!(rules[0].name, "starter_CapE");
        assert_eq!(rules[1].name, "starter_CapW");
        for s in starters {
            assert_eq!(s.kind, RuleKind::Starter);
            assert!(s.rhs.is_empty() && s.interface.is_empty());
            assert!(s.is_valid());
        }
    }

    #[test]
    fn starter_round_trip_reproduces_primitive_boundary() {
        let prims = cap_vocabulary();
        let mut h = build_hierarchy(&prims, &settings(), None);
        let rules = extract_rules(&mut h, None);

        let starter = &rules[0];
        let applied = starter.lhs.clone();
        let original = &prims[0];
        assert_eq!(
            applied.boundary_of(applied.faces[0].id).canonical(),
            original.boundary_of(original.faces[0].id).canonical()
        );
    }

    #[test]
    fn expansion_rules_carry_seam_morphisms() {
        let prims = cap_vocabulary();
        let mut h = build_hierarchy(&prims, &settings(), None);
        let rules = extract_rules(&mut h, None);

        let expansions: Vec<_> = rules.iter().filter(|r| !r.is_starter_rule).collect();
        // The domino is complete and has two recorded parents.
        assert_eq!(expansions.len(), 2);
        for rule in expansions {
            assert_eq!(rule.kind, RuleKind::LoopGlue);
            assert!(rule.is_valid());
            assert_eq!(rule.interface.vertex_count(), 2);
            assert_eq!(rule.interface.edge_count(), 1);
            assert_eq!(rule.phi_r.half_edge_map.len(), 2);
            assert_eq!(rule.phi_l.half_edge_map.len(), 2);
            assert!(rule.phi_l.is_injective() && rule.phi_r.is_injective());

            // φR lands on an open edge of R, φL on a glued seam of L.
            let (_, &r_target) = rule.phi_r.half_edge_map.iter().next().unwrap();
            assert_eq!(
                rule.rhs.half_edge(r_target).unwrap().label.r,
                RegionLabel::Open
            );
            let (_, &l_target) = rule.phi_l.half_edge_map.iter().next().unwrap();
            assert_eq!(
                rule.lhs.half_edge(l_target).unwrap().label.r,
                RegionLabel::Glued
            );
        }
    }

    #[test]
    fn boundary_pair_dedup_skips_repeats() {
        let prims = cap_vocabulary();
        let mut h = build_hierarchy(&prims, &settings(), None);
        let rules = extract_rules(&mut h, None);

        let mut pairs = BTreeSet::new();
        for r in &rules {
            assert!(
                pairs.insert((r.boundary_r.canonical(), r.boundary_l.canonical())),
                "rule {} repeats a boundary pair",
                r.name
            );
        }
    }

    #[test]
    fn dead_end_nodes_are_pruned_and_emit_nothing() {
        // A lone straight tile glues into ever-longer open chains; nothing
        // past generation 0 can ever close.
        let prims = vec![tile_primitive(&h_straight())];
        let mut h = build_hierarchy(
            &prims,
            &GrammarSettings {
                max_hierarchy_gen: 2,
                max_rules: 10,
                ..GrammarSettings::default()
            },
            None,
        );
        let rules = extract_rules(&mut h, None);

        assert!(h.iter().any(|n| n.generation > 0), "gluings happened");
        for node in h.iter().filter(|n| n.generation > 0) {
            assert!(node.pruned, "open-ended node {} must be pruned", node.id);
        }
        assert!(rules.iter().all(|r| r.is_starter_rule));
    }

    #[test]
    fn extraction_is_deterministic() {
        let prims = cap_vocabulary();
        let mut h1 = build_hierarchy(&prims, &settings(), None);
        let mut h2 = build_hierarchy(&prims, &settings(), None);
        let r1 = extract_rules(&mut h1, None);
        let r2 = extract_rules(&mut h2, None);
        assert_eq!(r1.len(), r2.len());
        for (a, b) in r1.iter().zip(&r2) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.name, b.name);
            assert_eq!(a.boundary_l.canonical(), b.boundary_l.canonical());
        }
    }
}
