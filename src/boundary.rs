//! Boundary strings: the circular edge/turn algebra over graph perimeters.
//!
//! A boundary string is an ordered, circular sequence alternating edge
//! elements and turn elements. It doubles as a geometric descriptor of a
//! perimeter and as the canonical signature used for deduplication and rule
//! matching: two strings are equal when one is a cyclic rotation of the
//! other with matching turn types and edge labels at every position. Edge
//! ids are deliberately excluded, so the same shape built two different
//! ways is recognised as equivalent.
//!
//! # Invariants
//! - `total_turn_count` sums +1 per positive and −1 per negative turn; a
//!   string is *complete* iff the absolute sum is 4 (a simple closed
//!   polygon in the 90°-turn world).
//! - Turn cancellation removes adjacent opposite-sign turn pairs, including
//!   across the wrap point, and is run to a fixpoint (the rewrite is
//!   confluent).
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 3.3 and 4.2 (2023)
//! - Turning number of closed polygons: Grünbaum & Shephard, "Rotation and
//!   winding numbers for planar polygons and curves" (1990)

use crate::arena::HalfEdgeId;
use crate::graph::{MerrellGraph, LOOP_WALK_CAP};
use crate::label::{direction_cross, EdgeLabel, RegionLabel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tolerance on the direction cross product below which two consecutive
/// boundary edges count as parallel (no turn element between them).
/// Floating rotations accumulate error across repeated gluing, so the test
/// is a banded sign test, never exact equality.
pub const CROSS_EPS: f32 = 1e-5;

/// Discrete deflection between two consecutive boundary edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnType {
    /// Left turn (counter-clockwise deflection), glyph `^`.
    Positive,
    /// Right turn (clockwise deflection), glyph `v`.
    Negative,
}

/// One element of a boundary string: an edge or a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryElement {
    /// A boundary edge, tagged with the half-edge's label. The id is kept
    /// for traceability but takes no part in equality or canonical form.
    Edge {
        edge_id: HalfEdgeId,
        edge_label: EdgeLabel,
    },
    /// A turn between the neighbouring edges.
    Turn { turn_type: TurnType },
}

impl BoundaryElement {
    fn equal(&self, other: &BoundaryElement, wildcard: bool) -> bool {
        match (self, other) {
            (BoundaryElement::Turn { turn_type: a }, BoundaryElement::Turn { turn_type: b }) => {
                a == b
            }
            (
                BoundaryElement::Edge { edge_label: a, .. },
                BoundaryElement::Edge { edge_label: b, .. },
            ) => {
                if wildcard {
                    a.matches(b)
                } else {
                    a.approx_eq(b)
                }
            }
            _ => false,
        }
    }
}

/// Circular sequence `a₁ ^/v a₂ ^/v … aₙ ^/v` describing a perimeter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryString {
    pub elements: Vec<BoundaryElement>,
}

impl BoundaryString {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// +1 per positive turn, −1 per negative turn.
    pub fn total_turn_count(&self) -> i32 {
        self.elements
            .iter()
            .map(|e| match e {
                BoundaryElement::Turn {
                    turn_type: TurnType::Positive,
                } => 1,
                BoundaryElement::Turn {
                    turn_type: TurnType::Negative,
                } => -1,
                BoundaryElement::Edge { .. } => 0,
            })
            .sum()
    }

    /// A complete string traces a simple closed polygon: |turn sum| == 4.
    pub fn is_complete(&self) -> bool {
        self.total_turn_count().abs() == 4
    }

    /// Collapses adjacent opposite-sign turn pairs (including across the
    /// wrap point) until none remain.
    pub fn cancel_turns(&mut self) {
        let opposite = |a: &BoundaryElement, b: &BoundaryElement| {
            matches!(
                (a, b),
                (
                    BoundaryElement::Turn { turn_type: ta },
                    BoundaryElement::Turn { turn_type: tb },
                ) if ta != tb
            )
        };
        let mut changed = true;
        while changed {
            changed = false;
            let mut i = 0;
            while i + 1 < self.elements.len() {
                if opposite(&self.elements[i], &self.elements[i + 1]) {
                    self.elements.drain(i..i + 2);
                    changed = true;
                    // Re-check the pair that just became adjacent at i.
                } else {
                    i += 1;
                }
            }
            if self.elements.len() >= 2 {
                let last = self.elements.len() - 1;
                if opposite(&self.elements[last], &self.elements[0]) {
                    self.elements.remove(last);
                    self.elements.remove(0);
                    changed = true;
                }
            }
        }
    }

    /// Returns a copy rotated to start at element `offset`.
    pub fn rotated(&self, offset: usize) -> BoundaryString {
        if self.elements.is_empty() {
            return BoundaryString::default();
        }
        let n = self.elements.len();
        BoundaryString {
            elements: (0..n)
                .map(|i| self.elements[(i + offset) % n].clone())
                .collect(),
        }
    }

    /// Circular equality: true iff some rotation of `self` matches `other`
    /// element-by-element (turn types and edge labels; never edge ids).
    ///
    /// O(n²), but boundary strings are short.
    pub fn is_circularly_equal(&self, other: &BoundaryString) -> bool {
        self.circular_match(other, false)
    }

    /// Circular equality under wildcard label comparison: empty labels
    /// match anything. Used when matching rule boundaries during
    /// generation.
    pub fn is_circularly_equal_wildcard(&self, other: &BoundaryString) -> bool {
        self.circular_match(other, true)
    }

    fn circular_match(&self, other: &BoundaryString, wildcard: bool) -> bool {
        if self.elements.len() != other.elements.len() {
            return false;
        }
        if self.elements.is_empty() {
            return true;
        }
        let n = self.elements.len();
        (0..n).any(|offset| {
            (0..n).all(|i| self.elements[(i + offset) % n].equal(&other.elements[i], wildcard))
        })
    }

    fn rendered_elements(&self) -> Vec<String> {
        self.elements
            .iter()
            .map(|e| match e {
                BoundaryElement::Turn {
                    turn_type: TurnType::Positive,
                } => "^".to_string(),
                BoundaryElement::Turn {
                    turn_type: TurnType::Negative,
                } => "v".to_string(),
                BoundaryElement::Edge { edge_label, .. } => edge_label.to_string(),
            })
            .collect()
    }

    /// Canonical textual form: turn glyphs `^`/`v` and label-tagged edges,
    /// read from the lexicographically smallest rotation.
    ///
    /// Used as the deduplication key across the hierarchy and for the rule
    /// extractor's boundary-pair registry; it is a function of labels and
    /// turns only (never of element ids) and rotation-invariant, so the
    /// same shape built two different ways collapses to one key.
    pub fn canonical(&self) -> String {
        let parts = self.rendered_elements();
        if parts.is_empty() {
            return String::new();
        }
        let n = parts.len();
        (0..n)
            .map(|offset| {
                let mut s = String::new();
                for i in 0..n {
                    s.push_str(&parts[(i + offset) % n]);
                }
                s
            })
            .min()
            .expect("non-empty rotations")
    }
}

impl fmt::Display for BoundaryString {
    /// Position-ordered rendering (no rotation normalisation) for logs and
    /// dumps.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in self.rendered_elements() {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// Turn element between travel directions `t0` and `t1`, or `None` when
/// they are parallel within [`CROSS_EPS`].
pub(crate) fn turn_between(t0: f32, t1: f32) -> Option<TurnType> {
    let cross = direction_cross(t0, t1);
    if cross.abs() > CROSS_EPS {
        Some(if cross > 0.0 {
            TurnType::Positive
        } else {
            TurnType::Negative
        })
    } else {
        None
    }
}

impl MerrellGraph {
    /// Boundary string of one face: its loop walked via `next`, with a turn
    /// element inserted wherever consecutive half-edges are not parallel.
    pub fn boundary_of(&self, face_id: crate::arena::FaceId) -> BoundaryString {
        let Some(start) = self.face(face_id).and_then(|f| f.start_he) else {
            return BoundaryString::default();
        };

        let mut loop_edges = Vec::new();
        let mut cur = start;
        let mut safety = 0;
        loop {
            let Some(he) = self.half_edge(cur) else { break };
            safety += 1;
            if safety > LOOP_WALK_CAP {
                break;
            }
            loop_edges.push(he);
            match he.next {
                Some(next) if next != start => cur = next,
                _ => break,
            }
        }
        if loop_edges.is_empty() {
            return BoundaryString::default();
        }

        let n = loop_edges.len();
        let mut bs = BoundaryString::default();
        for i in 0..n {
            bs.elements.push(BoundaryElement::Edge {
                edge_id: loop_edges[i].id,
                edge_label: loop_edges[i].label.clone(),
            });
            let t0 = loop_edges[i].label.theta;
            let t1 = loop_edges[(i + 1) % n].label.theta;
            if let Some(turn_type) = turn_between(t0, t1) {
                bs.elements.push(BoundaryElement::Turn { turn_type });
            }
        }
        bs
    }

    /// Perimeter of the whole graph, possibly spanning multiple faces.
    ///
    /// The boundary set is every half-edge that is either truly cut (no
    /// twin) or still marked open (not yet glued to anything). The walk
    /// steps from each boundary edge to its end vertex and selects, among
    /// boundary edges leaving that vertex, one that is not the
    /// just-traversed edge's twin and has not been visited; that resolves
    /// the ambiguity where two independent boundary edges meet at a vertex
    /// shared by two glued faces. A dead end returns the partial string.
    pub fn outer_boundary(&self) -> BoundaryString {
        let boundary_ids: Vec<HalfEdgeId> = self
            .half_edges
            .iter()
            .filter(|h| h.twin.is_none() || h.label.r == RegionLabel::Open)
            .map(|h| h.id)
            .collect();
        if boundary_ids.is_empty() {
            return BoundaryString::default();
        }

        let mut by_vertex: BTreeMap<crate::arena::VertexId, Vec<HalfEdgeId>> = BTreeMap::new();
        for &id in &boundary_ids {
            if let Some(he) = self.half_edge(id) {
                by_vertex.entry(he.vertex).or_default().push(id);
            }
        }

        let start = boundary_ids[0];
        let start_vertex = self.half_edge(start).map(|h| h.vertex);
        let mut visited: BTreeSet<HalfEdgeId> = BTreeSet::new();
        let mut bs = BoundaryString::default();
        let mut cur = start;
        let mut safety = 0;

        loop {
            let Some(he) = self.half_edge(cur) else { break };
            safety += 1;
            if safety > boundary_ids.len() + 2 {
                break;
            }
            bs.elements.push(BoundaryElement::Edge {
                edge_id: cur,
                edge_label: he.label.clone(),
            });
            visited.insert(cur);

            // End vertex of this edge = start vertex of its twin. A truly
            // cut edge has no twin and ends the walk with a partial string.
            let Some(twin) = he.twin else { break };
            let Some(end_vertex) = self.half_edge(twin).map(|t| t.vertex) else {
                break;
            };

            let next = by_vertex.get(&end_vertex).and_then(|cands| {
                cands
                    .iter()
                    .find(|&&c| c != twin && !visited.contains(&c))
                    .copied()
            });

            match next {
                Some(next) => {
                    let t1 = self.half_edge(next).map(|h| h.label.theta).unwrap_or(0.0);
                    if let Some(turn_type) = turn_between(he.label.theta, t1) {
                        bs.elements.push(BoundaryElement::Turn { turn_type });
                    }
                    cur = next;
                }
                None => {
                    // Loop closed if we are back at the start vertex; then
                    // the wrap turn between last and first edge belongs in
                    // the circular string.
                    if Some(end_vertex) == start_vertex {
                        let t1 = self.half_edge(start).map(|h| h.label.theta).unwrap_or(0.0);
                        if let Some(turn_type) = turn_between(he.label.theta, t1) {
                            bs.elements.push(BoundaryElement::Turn { turn_type });
                        }
                    }
                    break;
                }
            }
        }
        bs
    }

    /// The boundary used for dedup keys, rule caches and the generator's
    /// working graph: the outer boundary, falling back to the first face's
    /// loop when no open or cut edge remains (a fully glued shape).
    pub fn graph_boundary(&self) -> BoundaryString {
        let outer = self.outer_boundary();
        if !outer.is_empty() {
            return outer;
        }
        match self.faces.first() {
            Some(f) => self.boundary_of(f.id),
            None => BoundaryString::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::EdgeLabel;
    use glam::Vec2;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn edge(label: &EdgeLabel) -> BoundaryElement {
        BoundaryElement::Edge {
            edge_id: HalfEdgeId::new(0),
            edge_label: label.clone(),
        }
    }

    fn turn(turn_type: TurnType) -> BoundaryElement {
        BoundaryElement::Turn { turn_type }
    }

    fn lbl(theta: f32) -> EdgeLabel {
        EdgeLabel::new(RegionLabel::name("t"), RegionLabel::Exterior, theta)
    }

    #[test]
    fn turn_arithmetic_and_completeness() {
        let mut bs = BoundaryString::default();
        for i in 0..4 {
            bs.elements.push(edge(&lbl(i as f32 * FRAC_PI_2)));
            bs.elements.push(turn(TurnType::Positive));
        }
        assert_eq!(bs.total_turn_count(), 4);
        assert!(bs.is_complete());

        bs.elements.push(turn(TurnType::Negative));
        assert_eq!(bs.total_turn_count(), 3);
        assert!(!bs.is_complete());
    }

    #[test]
    fn cancel_turns_reaches_fixpoint() {
        // a ^ v ^ collapses to a ^.
        let mut bs = BoundaryString {
            elements: vec![
                edge(&lbl(0.0)),
                turn(TurnType::Positive),
                turn(TurnType::Negative),
                turn(TurnType::Positive),
            ],
        };
        bs.cancel_turns();
        assert_eq!(bs.elements.len(), 2);
        assert_eq!(bs.total_turn_count(), 1);
    }

    #[test]
    fn cancel_turns_across_wrap() {
        // ^ a v: the leading and trailing turns are adjacent circularly.
        let mut bs = BoundaryString {
            elements: vec![turn(TurnType::Positive), edge(&lbl(0.0)), turn(TurnType::Negative)],
        };
        bs.cancel_turns();
        assert_eq!(bs.elements.len(), 1);
        assert!(matches!(bs.elements[0], BoundaryElement::Edge { .. }));
    }

    #[test]
    fn circular_equality_ignores_rotation_and_ids() {
        let a = BoundaryString {
            elements: vec![
                edge(&lbl(0.0)),
                turn(TurnType::Positive),
                edge(&lbl(FRAC_PI_2)),
                turn(TurnType::Positive),
            ],
        };
        let mut b = a.rotated(2);
        // Change the ids on b's edges; equality must not care.
        for e in &mut b.elements {
            if let BoundaryElement::Edge { edge_id, .. } = e {
                *edge_id = HalfEdgeId::new(77);
            }
        }
        assert!(a.is_circularly_equal(&b));

        // A different turn sign at one position breaks it.
        let c = BoundaryString {
            elements: vec![
                edge(&lbl(0.0)),
                turn(TurnType::Negative),
                edge(&lbl(FRAC_PI_2)),
                turn(TurnType::Positive),
            ],
        };
        assert!(!a.is_circularly_equal(&c));
    }

    #[test]
    fn wildcard_labels_match_during_circular_comparison() {
        let concrete = BoundaryString {
            elements: vec![edge(&lbl(0.0))],
        };
        let wild = BoundaryString {
            elements: vec![edge(&EdgeLabel::new(
                RegionLabel::Wildcard,
                RegionLabel::Wildcard,
                0.0,
            ))],
        };
        assert!(wild.is_circularly_equal_wildcard(&concrete));
        assert!(!wild.is_circularly_equal(&concrete));
    }

    #[test]
    fn face_loop_boundary_of_square_is_complete() {
        let mut g = MerrellGraph::new();
        let v0 = g.add_vertex(Vec2::new(0.0, 1.0));
        let v1 = g.add_vertex(Vec2::new(1.0, 1.0));
        let v2 = g.add_vertex(Vec2::new(1.0, 0.0));
        let v3 = g.add_vertex(Vec2::new(0.0, 0.0));
        let f = g.add_face("sq");
        let mk = |theta: f32| EdgeLabel::new(RegionLabel::name("sq"), RegionLabel::Exterior, theta);
        let loop_edges = vec![
            g.add_half_edge_pair(v1, v0, mk(PI)).unwrap(),
            g.add_half_edge_pair(v0, v3, mk(3.0 * FRAC_PI_2)).unwrap(),
            g.add_half_edge_pair(v3, v2, mk(0.0)).unwrap(),
            g.add_half_edge_pair(v2, v1, mk(FRAC_PI_2)).unwrap(),
        ];
        g.link_face_loop(f, &loop_edges).unwrap();

        let bs = g.boundary_of(f);
        // Four edges, four turns, all the same sign.
        assert_eq!(bs.elements.len(), 8);
        assert_eq!(bs.total_turn_count().abs(), 4);
        assert!(bs.is_complete());
    }

    #[test]
    fn canonical_form_is_label_based() {
        let bs = BoundaryString {
            elements: vec![
                edge(&EdgeLabel::new(RegionLabel::name("t"), RegionLabel::Open, 0.0)),
                turn(TurnType::Positive),
            ],
        };
        assert_eq!(bs.canonical(), "[t|open|0.000]^");
        assert_eq!(bs.to_string(), bs.canonical());
    }
}
