//! The loop-gluing operator: combine two graphs along one open edge each.
//!
//! Gluing identifies one open half-edge of graph A with one of graph B,
//! producing a new graph in which that seam is an internal, two-sided edge.
//! Both inputs are read-only; the operator conses a fresh combined graph by
//! copy-and-offset, so a failed attempt leaves the inputs untouched.
//!
//! Seam structure after a successful glue:
//! - the two chosen half-edges are spliced out of their face loops and the
//!   neighbouring links are crossed, so each side's loop continues directly
//!   into the other's through the former seam position (the `aā → ε` shape
//!   of the rewrite: the seam edge leaves the boundary);
//! - the spliced pair is re-twinned with each other and relabelled `glued`:
//!   the internalised seam, its two half-edges still stamped with the two
//!   incident faces;
//! - the two stale exterior sides of the former open edges are re-twinned
//!   together and removed. Nothing at the seam claims to be graph boundary
//!   afterwards, which is what keeps `outer_boundary`'s
//!   boundary-vs-interior classification honest.
//!
//! # Invariants
//! - Conservation: gluing `(v₀, e₀)` with `(v₁, e₁)` yields exactly
//!   `v₀ + v₁ − 2` vertices and `e₀ + e₁ − 1` edge pairs.
//! - Twin symmetry holds on the result.
//! - Exactly one half-edge on each side of the seam carries `r = glued`.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 4.2 (gluing operations) (2023)

use crate::arena::HalfEdgeId;
use crate::graph::MerrellGraph;
use crate::label::{thetas_complementary, RegionLabel};
use tracing::trace;

impl MerrellGraph {
    /// All open half-edges (face-side, `r = open`) in storage order.
    ///
    /// Storage order is insertion order, which keeps gluing candidate
    /// enumeration reproducible run to run.
    pub fn open_half_edges(&self) -> Vec<HalfEdgeId> {
        self.half_edges
            .iter()
            .filter(|h| h.label.r == RegionLabel::Open)
            .map(|h| h.id)
            .collect()
    }
}

/// Glues `a` and `b` along the open half-edges `he_a` (in `a`) and `he_b`
/// (in `b`), whose travel directions must be complementary (differ by π).
///
/// Returns the combined graph, or `None` when either half-edge is not an
/// open edge of its graph, the directions are not complementary, or a
/// cross-reference fails to resolve after offsetting; the caller treats
/// the attempt as failed and moves to the next candidate pair.
pub fn loop_glue(
    a: &MerrellGraph,
    b: &MerrellGraph,
    he_a: HalfEdgeId,
    he_b: HalfEdgeId,
) -> Option<MerrellGraph> {
    let src_a = a.half_edge(he_a)?;
    let src_b = b.half_edge(he_b)?;
    if src_a.label.r != RegionLabel::Open || src_b.label.r != RegionLabel::Open {
        return None;
    }
    if !thetas_complementary(src_a.label.theta, src_b.label.theta) {
        return None;
    }

    // 1. Copy A at zero offset, then B shifted by A's id counters.
    let mut g = MerrellGraph::new();
    g.append_offset(a);
    let (voff, hoff, _) = g.append_offset(b);
    let he_b = he_b.offset(hoff);

    let (a_twin, a_next, a_prev, v0_a) = {
        let h = g.half_edge(he_a)?;
        (h.twin?, h.next?, h.prev?, h.vertex)
    };
    let (b_twin, b_next, b_prev, v0_b) = {
        let h = g.half_edge(he_b)?;
        (h.twin?, h.next?, h.prev?, h.vertex)
    };
    let v1_a = g.half_edge(a_twin)?.vertex;
    let v1_b = g.half_edge(b_twin)?.vertex;

    // 2. Rigid translation: B's seam start lands on A's seam end, keeping
    // the combined coordinates coherent.
    let delta = g.vertex(v1_a)?.pos - g.vertex(v0_b)?.pos;
    if delta != glam::Vec2::ZERO {
        for v in &mut g.vertices {
            if v.id.as_u32() >= voff {
                v.pos += delta;
            }
        }
    }

    // 3. Weld the coinciding endpoint pairs. The two seam edges run in
    // opposite directions along the shared boundary, so start meets end.
    g.merge_vertices(v0_b, v1_a);
    g.merge_vertices(v1_b, v0_a);

    // 4. Splice the seam half-edges out of their loops and cross-link, so
    // A's face loop continues into B's and vice versa.
    g.half_edge_mut(a_prev)?.next = Some(b_next);
    g.half_edge_mut(b_next)?.prev = Some(a_prev);
    g.half_edge_mut(b_prev)?.next = Some(a_next);
    g.half_edge_mut(a_next)?.prev = Some(b_prev);

    let a_face = {
        let h = g.half_edge_mut(he_a)?;
        h.next = None;
        h.prev = None;
        h.twin = Some(he_b);
        h.label.r = RegionLabel::Glued;
        h.face
    };
    let b_face = {
        let h = g.half_edge_mut(he_b)?;
        h.next = None;
        h.prev = None;
        h.twin = Some(he_a);
        h.label.r = RegionLabel::Glued;
        h.face
    };

    // Faces whose entry point was a seam edge re-enter through the loop.
    if let Some(fid) = a_face {
        if g.face(fid)?.start_he == Some(he_a) {
            g.face_mut(fid)?.start_he = Some(a_next);
        }
    }
    if let Some(fid) = b_face {
        if g.face(fid)?.start_he == Some(he_b) {
            g.face_mut(fid)?.start_he = Some(b_next);
        }
    }

    // 5. The stale exterior sides collapse into one pair and go away;
    // removal also recomputes face degrees and repairs vertex caches.
    g.half_edge_mut(a_twin)?.twin = Some(b_twin);
    g.half_edge_mut(b_twin)?.twin = Some(a_twin);
    g.remove_half_edge_pair(a_twin);

    // Keep outgoing caches off the unlinked seam pair.
    let seam = [he_a, he_b];
    let vertex_ids: Vec<_> = g.vertices.iter().map(|v| v.id).collect();
    for vid in vertex_ids {
        let cached = g.vertex(vid).and_then(|v| v.outgoing_he);
        if cached.map_or(false, |c| seam.contains(&c)) {
            let replacement = g
                .half_edges
                .iter()
                .find(|h| h.vertex == vid && !seam.contains(&h.id))
                .map(|h| h.id);
            if let Some(r) = replacement {
                g.vertex_mut(vid)?.outgoing_he = Some(r);
            }
        }
    }

    trace!(
        vertices = g.vertex_count(),
        edges = g.edge_count(),
        faces = g.face_count(),
        "loop glue"
    );
    Some(g)
}
