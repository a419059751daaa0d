//! The labelled half-edge graph at the centre of every grammar algorithm.
//!
//! A `MerrellGraph` owns flat, append-only, id-indexed collections of
//! vertices, half-edges and faces. Every cross-reference is a typed id
//! resolved through the owning graph (see `arena`); ids come from monotonic
//! counters and are never reused, so removals leave holes in id space and
//! lookups scan the live elements. Grammar graphs are small; a linear scan
//! is deliberate, not an oversight.
//!
//! Half-edges are always created in complementary pairs: the reverse
//! direction's label is derived (`l`/`r` swapped, `θ` rotated by π), never
//! supplied by the caller. A half-edge with a twin but no face is the
//! "outside" direction of an edge that is present in a face loop on the
//! twin's side; a half-edge with no twin is a disassembly-time cut and must
//! not survive once twins are resolved.
//!
//! # Invariants
//! - Twin symmetry: `twin(twin(h)) == h` for every half-edge with a twin,
//!   after every mutating operation.
//! - A vertex's cached `outgoing_he` always names a live half-edge leaving
//!   that vertex, or is `None`.
//! - `link_face_loop` assumes the supplied ids already form a geometrically
//!   closed loop; this is a documented caller obligation, not something the
//!   structure verifies.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 3 (2023)
//! - DCEL: Muller & Preparata (1978); de Berg et al., "Computational
//!   Geometry: Algorithms and Applications", Chapter 2 (2008)

use crate::arena::{FaceId, HalfEdgeId, VertexId};
use crate::label::EdgeLabel;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Safety cap for loop walks; face loops are tiny, so hitting this means a
/// corrupted `next` chain rather than a big graph.
pub(crate) const LOOP_WALK_CAP: usize = 1000;

/// Error raised by graph mutations with checked preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A referenced vertex id does not resolve.
    MissingVertex(VertexId),
    /// A referenced half-edge id does not resolve.
    MissingHalfEdge(HalfEdgeId),
    /// A referenced face id does not resolve.
    MissingFace(FaceId),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::MissingVertex(id) => write!(f, "vertex {} does not exist", id),
            GraphError::MissingHalfEdge(id) => write!(f, "half-edge {} does not exist", id),
            GraphError::MissingFace(id) => write!(f, "face {} does not exist", id),
        }
    }
}

impl std::error::Error for GraphError {}

/// A vertex: position plus one cached outgoing half-edge for fan traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgVertex {
    pub id: VertexId,
    /// 2D position. The grid-first phase stays planar.
    pub pos: Vec2,
    /// Any one live half-edge leaving this vertex, if one exists.
    pub outgoing_he: Option<HalfEdgeId>,
}

/// One directed traversal of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgHalfEdge {
    pub id: HalfEdgeId,
    /// Opposite half-edge. `None` only during disassembly.
    pub twin: Option<HalfEdgeId>,
    /// Next half-edge around the face loop.
    pub next: Option<HalfEdgeId>,
    /// Previous half-edge around the face loop.
    pub prev: Option<HalfEdgeId>,
    /// Start vertex of this directed edge.
    pub vertex: VertexId,
    /// Face to the left. `None` marks the exterior direction of an edge.
    pub face: Option<FaceId>,
    pub label: EdgeLabel,
}

/// One polygonal region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgFace {
    pub id: FaceId,
    /// Entry point into the face loop; walking `next` `degree` times from
    /// here recovers the full loop.
    pub start_he: Option<HalfEdgeId>,
    /// Region name; in the grid phase, the tile label.
    pub label: String,
    /// Edge count of the loop this face currently sits on.
    pub degree: usize,
}

/// Labelled half-edge graph with boundary-string algebra.
///
/// The graph is the sole owner of its elements; callers hold ids, never
/// references. Later pipeline stages never mutate earlier graphs in place;
/// they copy and cons new ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerrellGraph {
    pub vertices: Vec<MgVertex>,
    pub half_edges: Vec<MgHalfEdge>,
    pub faces: Vec<MgFace>,
    next_vertex_id: u32,
    next_half_edge_id: u32,
    next_face_id: u32,
}

impl MerrellGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all data and id counters.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.faces.clear();
        self.next_vertex_id = 0;
        self.next_half_edge_id = 0;
        self.next_face_id = 0;
    }

    // ---- Factory -----------------------------------------------------------

    /// Appends a vertex at `pos` and returns its id.
    pub fn add_vertex(&mut self, pos: Vec2) -> VertexId {
        let id = VertexId::new(self.next_vertex_id);
        self.next_vertex_id += 1;
        self.vertices.push(MgVertex {
            id,
            pos,
            outgoing_he: None,
        });
        id
    }

    /// Appends a face with `label` and returns its id.
    ///
    /// Wire its half-edges with [`MerrellGraph::link_face_loop`] once all
    /// edges exist.
    pub fn add_face(&mut self, label: impl Into<String>) -> FaceId {
        let id = FaceId::new(self.next_face_id);
        self.next_face_id += 1;
        self.faces.push(MgFace {
            id,
            start_he: None,
            label: label.into(),
            degree: 0,
        });
        id
    }

    /// Creates the twin half-edge pair `v0 → v1` and `v1 → v0` atomically.
    ///
    /// The reverse direction's label is derived from `label` (swap `l`/`r`,
    /// rotate `θ` by π). Returns the id of the forward (`v0 → v1`)
    /// half-edge, or an error if either vertex id does not resolve.
    pub fn add_half_edge_pair(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        label: EdgeLabel,
    ) -> Result<HalfEdgeId, GraphError> {
        if self.vertex(v0).is_none() {
            return Err(GraphError::MissingVertex(v0));
        }
        if self.vertex(v1).is_none() {
            return Err(GraphError::MissingVertex(v1));
        }

        let label = EdgeLabel::new(label.l, label.r, label.theta);
        let twin_label = label.twin();

        let he_id = HalfEdgeId::new(self.next_half_edge_id);
        let twin_id = HalfEdgeId::new(self.next_half_edge_id + 1);
        self.next_half_edge_id += 2;

        self.half_edges.push(MgHalfEdge {
            id: he_id,
            twin: Some(twin_id),
            next: None,
            prev: None,
            vertex: v0,
            face: None,
            label,
        });
        self.half_edges.push(MgHalfEdge {
            id: twin_id,
            twin: Some(he_id),
            next: None,
            prev: None,
            vertex: v1,
            face: None,
            label: twin_label,
        });
        Ok(he_id)
    }

    /// Wires `he_ids` into a circular face loop.
    ///
    /// Sets `next`, `prev` and `face` on each half-edge, `start_he` and
    /// `degree` on the face, and back-fills each incident vertex's
    /// `outgoing_he` if unset.
    ///
    /// The ids must already form a geometrically closed loop (each edge's
    /// end vertex is the next edge's start vertex); that is a caller
    /// obligation the structure does not verify.
    pub fn link_face_loop(
        &mut self,
        face_id: FaceId,
        he_ids: &[HalfEdgeId],
    ) -> Result<(), GraphError> {
        if he_ids.is_empty() {
            return Ok(());
        }
        if self.face(face_id).is_none() {
            return Err(GraphError::MissingFace(face_id));
        }
        for &id in he_ids {
            if self.half_edge(id).is_none() {
                return Err(GraphError::MissingHalfEdge(id));
            }
        }

        let n = he_ids.len();
        for (i, &id) in he_ids.iter().enumerate() {
            let next = he_ids[(i + 1) % n];
            let prev = he_ids[(i + n - 1) % n];
            let he = self.half_edge_mut(id).expect("checked above");
            he.next = Some(next);
            he.prev = Some(prev);
            he.face = Some(face_id);
        }

        let face = self.face_mut(face_id).expect("checked above");
        face.start_he = Some(he_ids[0]);
        face.degree = n;

        for &id in he_ids {
            let vertex = self.half_edge(id).expect("checked above").vertex;
            if let Some(v) = self.vertex_mut(vertex) {
                if v.outgoing_he.is_none() {
                    v.outgoing_he = Some(id);
                }
            }
        }
        Ok(())
    }

    // ---- Gluing helpers ----------------------------------------------------

    /// Identifies vertex `from` with `to`: every half-edge starting at
    /// `from` is repointed to `to`, then `from` is deleted.
    ///
    /// Irreversible; used only while welding two graphs along a seam.
    pub fn merge_vertices(&mut self, from: VertexId, to: VertexId) {
        if from == to {
            return;
        }
        debug_assert!(self.vertex(to).is_some(), "merge target must exist");
        for he in &mut self.half_edges {
            if he.vertex == from {
                he.vertex = to;
            }
        }
        self.vertices.retain(|v| v.id != from);
    }

    /// Removes a half-edge and its twin, patching surrounding `next`/`prev`
    /// links so each loop stays closed, retargeting any face whose
    /// `start_he` pointed at a removed edge, and repairing vertex
    /// `outgoing_he` caches.
    pub fn remove_half_edge_pair(&mut self, he_id: HalfEdgeId) {
        let Some(he) = self.half_edge(he_id) else {
            return;
        };
        let mut removed = vec![he_id];
        if let Some(twin) = he.twin {
            removed.push(twin);
        }

        // Resolve a link through any chain of removed edges to the first
        // survivor (or nothing).
        let follow = |start: Option<HalfEdgeId>, forward: bool, graph: &MerrellGraph| {
            let mut cur = start;
            let mut steps = 0;
            while let Some(id) = cur {
                if !removed.contains(&id) {
                    return Some(id);
                }
                steps += 1;
                if steps > LOOP_WALK_CAP {
                    return None;
                }
                cur = graph
                    .half_edge(id)
                    .and_then(|h| if forward { h.next } else { h.prev });
            }
            None
        };

        // Splice the removed edges out of every chain they participate in.
        let mut patches: Vec<(HalfEdgeId, Option<HalfEdgeId>, Option<HalfEdgeId>)> = Vec::new();
        for h in &self.half_edges {
            if removed.contains(&h.id) {
                continue;
            }
            let next = match h.next {
                Some(n) if removed.contains(&n) => Some(follow(Some(n), true, self)),
                _ => None,
            };
            let prev = match h.prev {
                Some(p) if removed.contains(&p) => Some(follow(Some(p), false, self)),
                _ => None,
            };
            if next.is_some() || prev.is_some() {
                patches.push((h.id, next.flatten(), prev.flatten()));
            }
        }
        for (id, next, prev) in &patches {
            let spliced_next = self
                .half_edge(*id)
                .map(|h| h.next.map_or(false, |n| removed.contains(&n)))
                .unwrap_or(false);
            let spliced_prev = self
                .half_edge(*id)
                .map(|h| h.prev.map_or(false, |p| removed.contains(&p)))
                .unwrap_or(false);
            let h = self.half_edge_mut(*id).expect("survivor exists");
            if spliced_next {
                h.next = *next;
            }
            if spliced_prev {
                h.prev = *prev;
            }
        }

        // Retarget faces whose start_he is going away.
        let face_ids: Vec<FaceId> = self.faces.iter().map(|f| f.id).collect();
        for fid in face_ids {
            let start = self.face(fid).and_then(|f| f.start_he);
            let Some(start) = start else { continue };
            if !removed.contains(&start) {
                continue;
            }
            let replacement = follow(Some(start), true, self).or_else(|| {
                self.half_edges
                    .iter()
                    .find(|h| h.face == Some(fid) && !removed.contains(&h.id))
                    .map(|h| h.id)
            });
            if let Some(f) = self.face_mut(fid) {
                f.start_he = replacement;
            }
        }

        self.half_edges.retain(|h| !removed.contains(&h.id));

        for fid in self.faces.iter().map(|f| f.id).collect::<Vec<_>>() {
            self.recompute_face_degree(fid);
        }
        self.repair_outgoing();
    }

    /// Appends a full copy of `src`, shifting every id by this graph's
    /// current id counters so all of `src`'s internal cross-references stay
    /// consistent. Returns the `(vertex, half_edge, face)` id offsets used.
    ///
    /// Offsets come from the counters, not the element counts: a graph
    /// that has seen removals has ids beyond its length, and length-based
    /// offsets would collide.
    pub fn append_offset(&mut self, src: &MerrellGraph) -> (u32, u32, u32) {
        let voff = self.next_vertex_id;
        let hoff = self.next_half_edge_id;
        let foff = self.next_face_id;

        for v in &src.vertices {
            self.vertices.push(MgVertex {
                id: v.id.offset(voff),
                pos: v.pos,
                outgoing_he: v.outgoing_he.map(|h| h.offset(hoff)),
            });
        }
        for h in &src.half_edges {
            self.half_edges.push(MgHalfEdge {
                id: h.id.offset(hoff),
                twin: h.twin.map(|t| t.offset(hoff)),
                next: h.next.map(|n| n.offset(hoff)),
                prev: h.prev.map(|p| p.offset(hoff)),
                vertex: h.vertex.offset(voff),
                face: h.face.map(|f| f.offset(foff)),
                label: h.label.clone(),
            });
        }
        for f in &src.faces {
            self.faces.push(MgFace {
                id: f.id.offset(foff),
                start_he: f.start_he.map(|h| h.offset(hoff)),
                label: f.label.clone(),
                degree: f.degree,
            });
        }

        self.next_vertex_id += src.next_vertex_id;
        self.next_half_edge_id += src.next_half_edge_id;
        self.next_face_id += src.next_face_id;
        (voff, hoff, foff)
    }

    /// Recomputes a face's `degree` by walking its loop.
    pub(crate) fn recompute_face_degree(&mut self, face_id: FaceId) {
        let start = self.face(face_id).and_then(|f| f.start_he);
        let degree = match start {
            Some(start) => {
                let mut count = 0;
                let mut cur = Some(start);
                while let Some(id) = cur {
                    count += 1;
                    if count > LOOP_WALK_CAP {
                        break;
                    }
                    cur = self.half_edge(id).and_then(|h| h.next);
                    if cur == Some(start) {
                        break;
                    }
                }
                count
            }
            None => 0,
        };
        if let Some(f) = self.face_mut(face_id) {
            f.degree = degree;
        }
    }

    /// Repairs every vertex's `outgoing_he` cache: a cache naming a dead
    /// half-edge (or one that no longer starts at the vertex) is repointed
    /// to a live outgoing half-edge, or cleared.
    pub(crate) fn repair_outgoing(&mut self) {
        let vertex_ids: Vec<VertexId> = self.vertices.iter().map(|v| v.id).collect();
        for vid in vertex_ids {
            let cached = self.vertex(vid).and_then(|v| v.outgoing_he);
            let ok = cached
                .and_then(|h| self.half_edge(h))
                .map_or(false, |h| h.vertex == vid);
            if ok {
                continue;
            }
            let replacement = self
                .half_edges
                .iter()
                .find(|h| h.vertex == vid)
                .map(|h| h.id);
            if let Some(v) = self.vertex_mut(vid) {
                v.outgoing_he = replacement;
            }
        }
    }

    // ---- Accessors (linear scan; fine for small grammar graphs) ------------

    pub fn vertex(&self, id: VertexId) -> Option<&MgVertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut MgVertex> {
        self.vertices.iter_mut().find(|v| v.id == id)
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> Option<&MgHalfEdge> {
        self.half_edges.iter().find(|h| h.id == id)
    }

    pub fn half_edge_mut(&mut self, id: HalfEdgeId) -> Option<&mut MgHalfEdge> {
        self.half_edges.iter_mut().find(|h| h.id == id)
    }

    pub fn face(&self, id: FaceId) -> Option<&MgFace> {
        self.faces.iter().find(|f| f.id == id)
    }

    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut MgFace> {
        self.faces.iter_mut().find(|f| f.id == id)
    }

    // ---- Queries -----------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of undirected edges (twin pairs).
    pub fn edge_count(&self) -> usize {
        self.half_edges.len() / 2
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl fmt::Display for MerrellGraph {
    /// Debug dump: counts, vertices, faces with their boundary strings, and
    /// the half-edge table in pair order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[MerrellGraph] {}v {}e {}f",
            self.vertex_count(),
            self.edge_count(),
            self.face_count()
        )?;
        for v in &self.vertices {
            writeln!(
                f,
                "  {} ({:.2},{:.2}) out={}",
                v.id,
                v.pos.x,
                v.pos.y,
                v.outgoing_he.map_or("-".to_string(), |h| h.to_string())
            )?;
        }
        for face in &self.faces {
            let bs = self.boundary_of(face.id);
            writeln!(
                f,
                "  {} {:?} deg={} bnd={} turns={} complete={}",
                face.id,
                face.label,
                face.degree,
                bs,
                bs.total_turn_count(),
                if bs.is_complete() { "Y" } else { "N" }
            )?;
        }
        for h in &self.half_edges {
            writeln!(
                f,
                "  {} {}->{} {} face={} twin={}",
                h.id,
                h.vertex,
                h.twin
                    .and_then(|t| self.half_edge(t))
                    .map_or("?".to_string(), |t| t.vertex.to_string()),
                h.label,
                h.face.map_or("-".to_string(), |x| x.to_string()),
                h.twin.map_or("-".to_string(), |x| x.to_string()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::RegionLabel;
    use glam::Vec2;
    use std::f32::consts::PI;

    fn label(theta: f32) -> EdgeLabel {
        EdgeLabel::new(RegionLabel::name("tile"), RegionLabel::Open, theta)
    }

    /// Twin symmetry must hold for every half-edge that has a twin.
    fn assert_twin_symmetry(g: &MerrellGraph) {
        for h in &g.half_edges {
            if let Some(t) = h.twin {
                let twin = g.half_edge(t).expect("twin resolves");
                assert_eq!(twin.twin, Some(h.id), "twin of {} must point back", h.id);
            }
        }
    }

    #[test]
    fn pair_creation_derives_twin_label() {
        let mut g = MerrellGraph::new();
        let a = g.add_vertex(Vec2::new(0.0, 0.0));
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let he = g.add_half_edge_pair(a, b, label(0.0)).unwrap();

        let forward = g.half_edge(he).unwrap();
        let twin = g.half_edge(forward.twin.unwrap()).unwrap();
        assert_eq!(forward.vertex, a);
        assert_eq!(twin.vertex, b);
        assert_eq!(twin.label.l, RegionLabel::Open);
        assert_eq!(twin.label.r, RegionLabel::name("tile"));
        assert!((twin.label.theta - PI).abs() < 1e-6);
        assert_twin_symmetry(&g);
    }

    #[test]
    fn pair_creation_checks_vertices() {
        let mut g = MerrellGraph::new();
        let a = g.add_vertex(Vec2::ZERO);
        let bogus = VertexId::new(99);
        assert_eq!(
            g.add_half_edge_pair(a, bogus, label(0.0)),
            Err(GraphError::MissingVertex(bogus))
        );
        // Nothing was appended on failure.
        assert!(g.half_edges.is_empty());
    }

    fn square(g: &mut MerrellGraph) -> (FaceId, Vec<HalfEdgeId>) {
        let v0 = g.add_vertex(Vec2::new(0.0, 1.0));
        let v1 = g.add_vertex(Vec2::new(1.0, 1.0));
        let v2 = g.add_vertex(Vec2::new(1.0, 0.0));
        let v3 = g.add_vertex(Vec2::new(0.0, 0.0));
        let f = g.add_face("sq");
        let loop_edges = vec![
            g.add_half_edge_pair(v1, v0, label(PI)).unwrap(),
            g.add_half_edge_pair(v0, v3, label(3.0 * PI / 2.0)).unwrap(),
            g.add_half_edge_pair(v3, v2, label(0.0)).unwrap(),
            g.add_half_edge_pair(v2, v1, label(PI / 2.0)).unwrap(),
        ];
        g.link_face_loop(f, &loop_edges).unwrap();
        (f, loop_edges)
    }

    #[test]
    fn face_loop_wiring_and_outgoing_backfill() {
        let mut g = MerrellGraph::new();
        let (f, loop_edges) = square(&mut g);

        let face = g.face(f).unwrap();
        assert_eq!(face.degree, 4);
        assert_eq!(face.start_he, Some(loop_edges[0]));

        // next is circular over the supplied order.
        for i in 0..4 {
            let he = g.half_edge(loop_edges[i]).unwrap();
            assert_eq!(he.next, Some(loop_edges[(i + 1) % 4]));
            assert_eq!(he.prev, Some(loop_edges[(i + 3) % 4]));
            assert_eq!(he.face, Some(f));
        }
        // Every vertex got an outgoing half-edge.
        for v in &g.vertices {
            assert!(v.outgoing_he.is_some(), "{} has no outgoing edge", v.id);
        }
        assert_twin_symmetry(&g);
    }

    #[test]
    fn merge_vertices_repoints_and_deletes() {
        let mut g = MerrellGraph::new();
        let a = g.add_vertex(Vec2::ZERO);
        let b = g.add_vertex(Vec2::new(1.0, 0.0));
        let c = g.add_vertex(Vec2::new(1.0, 0.0));
        g.add_half_edge_pair(a, c, label(0.0)).unwrap();

        g.merge_vertices(c, b);
        assert!(g.vertex(c).is_none());
        assert_eq!(g.vertex_count(), 2);
        // The twin half-edge started at c; it must now start at b.
        let moved = g.half_edges.iter().find(|h| h.vertex == b);
        assert!(moved.is_some());
        assert_twin_symmetry(&g);
    }

    #[test]
    fn remove_pair_splices_loop_closed() {
        let mut g = MerrellGraph::new();
        let (f, loop_edges) = square(&mut g);

        g.remove_half_edge_pair(loop_edges[1]);
        assert_eq!(g.edge_count(), 3);

        // Neighbours were cross-linked around the hole.
        let before = g.half_edge(loop_edges[0]).unwrap();
        assert_eq!(before.next, Some(loop_edges[2]));
        let after = g.half_edge(loop_edges[2]).unwrap();
        assert_eq!(after.prev, Some(loop_edges[0]));

        // Face still enters a live loop and its degree shrank.
        let face = g.face(f).unwrap();
        assert!(face.start_he.is_some());
        assert_eq!(face.degree, 3);

        // No vertex cache points at a dead edge.
        for v in &g.vertices {
            if let Some(out) = v.outgoing_he {
                assert!(g.half_edge(out).is_some());
            }
        }
        assert_twin_symmetry(&g);
    }

    #[test]
    fn remove_pair_retargets_face_start() {
        let mut g = MerrellGraph::new();
        let (f, loop_edges) = square(&mut g);
        // Remove the edge the face's start_he points at.
        g.remove_half_edge_pair(loop_edges[0]);
        let face = g.face(f).unwrap();
        assert_eq!(face.start_he, Some(loop_edges[1]));
    }

    #[test]
    fn append_offset_uses_counters_not_lengths() {
        let mut a = MerrellGraph::new();
        square(&mut a);
        // Punch a hole in id space so counters and lengths diverge.
        let first = a.half_edges[0].id;
        a.remove_half_edge_pair(first);
        assert_eq!(a.edge_count(), 3);

        let mut b = MerrellGraph::new();
        square(&mut b);

        let mut combined = MerrellGraph::new();
        combined.append_offset(&a);
        let (_, hoff, _) = combined.append_offset(&b);
        // The offset must clear a's counter (8 half-edge ids issued), not its
        // current length (6).
        assert_eq!(hoff, 8);

        // No id collisions: every id resolves to exactly one element.
        for h in &combined.half_edges {
            assert_eq!(
                combined.half_edges.iter().filter(|x| x.id == h.id).count(),
                1
            );
        }
        assert_twin_symmetry(&combined);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut g = MerrellGraph::new();
        let (_, loop_edges) = square(&mut g);
        g.remove_half_edge_pair(loop_edges[3]);
        let a = g.add_vertex(Vec2::ZERO);
        let b = g.add_vertex(Vec2::ONE);
        let fresh = g.add_half_edge_pair(a, b, label(0.0)).unwrap();
        // Ids 6 and 7 were removed; the new pair continues at 8.
        assert_eq!(fresh.as_u32(), 8);
    }
}
