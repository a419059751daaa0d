//! Shape generation (Algorithm 3): growing new graphs from the rule set.
//!
//! Generation maintains a single working graph `G`, seeded by one starter
//! rule chosen uniformly at random with the configured seed. Each step
//! matches a rule's `R`-side boundary against `G`'s boundary (circular
//! equality under rotation with wildcard-aware label comparison) and
//! applies the rule constructively (`R → L`): the matched occurrence spans
//! the whole working graph (every non-interface socket of a matched `R`
//! must still be open, so a match can only anchor at the growth frontier),
//! which makes the pushout complement the interface alone and the pushout
//! result a fresh copy of `L`.
//!
//! Ties between matching rules prefer earlier rules in extraction order.
//! Generation stops successfully the moment `G`'s boundary is complete;
//! running out of iterations or out of matching rules is a named failure
//! in the result object, never a silent partial shape.
//!
//! Position solving (final coordinates from a constrained linear system)
//! is an external, separable step; the grid-first phase emits each placed
//! face at its vertex centroid with rotation 0.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 6 (Algorithm 3) (2023)
//! - Pushout construction: Ehrig et al., "Fundamentals of Algebraic Graph
//!   Transformation", Chapter 3 (2006)

use crate::arena::FaceId;
use crate::graph::MerrellGraph;
use crate::label::RegionLabel;
use crate::rule::{DPORule, RuleMatch};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Error starting a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The rule set is empty.
    NoRules,
    /// The rule set contains no starter rule to seed from.
    NoStarterRule,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerateError::NoRules => write!(f, "rule set is empty"),
            GenerateError::NoStarterRule => write!(f, "rule set contains no starter rule"),
        }
    }
}

impl std::error::Error for GenerateError {}

/// One face of a generated shape, flattened for scene placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedFace {
    pub face_id: FaceId,
    pub label: String,
    /// Vertex centroid of the face in the working graph's coordinates.
    pub pos: Vec2,
    /// Radians; 0 throughout the grid-first phase.
    pub rotation: f32,
}

/// Outcome bundle of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub graph: MerrellGraph,
    pub placed: Vec<PlacedFace>,
    pub success: bool,
    pub error_msg: String,
}

/// Step-driven generation state.
///
/// Cooperative, single-threaded: the caller drives `step` once per tick
/// until it reports done. Cancellation is simply ceasing to call `step`.
#[derive(Debug)]
pub struct GenerationDriver {
    #[allow(dead_code)]
    rng: StdRng,
    graph: MerrellGraph,
    iteration: usize,
    done: bool,
    result: GenerationResult,
}

impl GenerationDriver {
    /// Seeds a run: picks a starter rule uniformly at random and installs
    /// its `L` graph as the working graph.
    pub fn new(rules: &[DPORule], seed: u64) -> Result<Self, GenerateError> {
        if rules.is_empty() {
            return Err(GenerateError::NoRules);
        }
        let starters: Vec<&DPORule> = rules.iter().filter(|r| r.is_starter_rule).collect();
        if starters.is_empty() {
            return Err(GenerateError::NoStarterRule);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let pick = starters[rng.gen_range(0..starters.len())];
        debug!(rule = %pick.name, seed, "generation seeded");
        Ok(Self {
            rng,
            graph: pick.lhs.clone(),
            iteration: 0,
            done: false,
            result: GenerationResult::default(),
        })
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The result bundle; meaningful once `step` has reported done.
    pub fn result(&self) -> &GenerationResult {
        &self.result
    }

    /// Runs one unit of work. Returns true when generation has finished
    /// (successfully or not) and the result bundle is filled in.
    pub fn step(&mut self, rules: &[DPORule], max_iterations: usize) -> bool {
        if self.done {
            return true;
        }

        let boundary = self.graph.graph_boundary();
        if boundary.is_complete() {
            self.finish(true, String::new());
            return true;
        }

        self.iteration += 1;
        if self.iteration >= max_iterations {
            self.finish(false, "max iterations reached".to_string());
            return true;
        }

        // Earlier rules win ties; extraction order is the contract.
        let matched = rules
            .iter()
            .map(|r| (r, find_match(r, &self.graph)))
            .find(|(_, m)| m.valid);
        match matched {
            Some((rule, _match)) => {
                debug!(rule = %rule.name, iteration = self.iteration, "rule applied");
                self.graph = rule.lhs.clone();
                false
            }
            None => {
                self.finish(false, "no rule matches the current boundary".to_string());
                true
            }
        }
    }

    fn finish(&mut self, success: bool, error_msg: String) {
        self.done = true;
        self.result = GenerationResult {
            placed: placed_faces(&self.graph),
            graph: std::mem::take(&mut self.graph),
            success,
            error_msg,
        };
    }
}

/// Searches for an occurrence of `rule`'s `R` side in the working graph.
///
/// The occurrence test is whole-boundary: `∂R` must be circularly equal to
/// the graph's boundary under wildcard-aware label comparison. On a match,
/// the returned morphism anchors the interface image: `φR`'s open edge in
/// `R` is mapped onto a label-compatible open edge of the graph (with its
/// twin and start vertex), which is where constructive application glues.
/// Starter rules never match (they seed, they do not expand).
pub fn find_match(rule: &DPORule, graph: &MerrellGraph) -> RuleMatch {
    let mut result = RuleMatch {
        rule_id: rule.id,
        ..RuleMatch::default()
    };
    if rule.is_starter_rule {
        return result;
    }
    if !rule
        .boundary_r
        .is_circularly_equal_wildcard(&graph.graph_boundary())
    {
        return result;
    }

    for &r_id in rule.phi_r.half_edge_map.values() {
        let Some(r_he) = rule.rhs.half_edge(r_id) else {
            continue;
        };
        // Anchor on the face side of the interface edge.
        if r_he.label.r != RegionLabel::Open {
            continue;
        }
        for g_id in graph.open_half_edges() {
            let Some(g_he) = graph.half_edge(g_id) else {
                continue;
            };
            if !r_he.label.matches(&g_he.label) {
                continue;
            }
            result.morphism.half_edge_map.insert(r_id, g_id);
            result.morphism.vertex_map.insert(r_he.vertex, g_he.vertex);
            if let (Some(rt), Some(gt)) = (r_he.twin, g_he.twin) {
                result.morphism.half_edge_map.insert(rt, gt);
            }
            break;
        }
        break;
    }
    result.valid = true;
    result
}

/// Flattens a graph's faces into placement records: label, vertex
/// centroid, rotation 0 (grid-first).
fn placed_faces(graph: &MerrellGraph) -> Vec<PlacedFace> {
    graph
        .faces
        .iter()
        .map(|face| {
            let mut seen = BTreeSet::new();
            let mut sum = Vec2::ZERO;
            let mut count = 0;
            for he in graph.half_edges.iter().filter(|h| h.face == Some(face.id)) {
                if seen.insert(he.vertex) {
                    if let Some(v) = graph.vertex(he.vertex) {
                        sum += v.pos;
                        count += 1;
                    }
                }
            }
            PlacedFace {
                face_id: face.id,
                label: face.label.clone(),
                pos: if count > 0 { sum / count as f32 } else { Vec2::ZERO },
                rotation: 0.0,
            }
        })
        .collect()
}
