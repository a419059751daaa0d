//! Grid-phase tile vocabulary and disassembly into canonical primitives.
//!
//! Disassembly builds one canonical `MerrellGraph` per unique tile label: a
//! unit-square face with four vertices and four half-edge pairs. Edges whose
//! outward grid direction carries a socket are labelled `open`; the rest are
//! `exterior`. Placed-instance data (cell, rotation) is accepted and
//! retained for later spatial extensions but takes no part in grid-phase
//! disassembly.
//!
//! Grid convention: y grows downward, so N = (0,−1). Travel angles are
//! standard CCW radians from east.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 4.1 (disassembly) (2023)

use crate::graph::MerrellGraph;
use crate::label::{EdgeLabel, RegionLabel};
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

/// Socket layout for one tile type: the grid directions on which this tile
/// expects a neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSocketDef {
    /// Tile type name, e.g. `"HStraight"`.
    pub label: String,
    /// Socket directions, e.g. `[(1,0), (-1,0)]`.
    pub sockets: Vec<IVec2>,
}

/// One placed tile instance in the example scene.
///
/// Only the label feeds grid-phase disassembly; cell and rotation are
/// reserved spatial context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInput {
    pub label: String,
    /// Grid position (col, row).
    pub cell: IVec2,
    /// Rotation in degrees clockwise, one of 0/90/180/270.
    pub rotation: i32,
}

/// Maps a unit grid direction to its travel angle in radians.
///
/// E = 0, N = π/2, W = π, S = 3π/2 (y grows downward, so N = (0,−1)).
/// Non-unit input maps to 0.
pub fn grid_dir_to_theta(dir: IVec2) -> f32 {
    match (dir.x, dir.y) {
        (1, 0) => 0.0,
        (0, -1) => FRAC_PI_2,
        (-1, 0) => PI,
        (0, 1) => 3.0 * FRAC_PI_2,
        _ => 0.0,
    }
}

/// Builds the canonical primitive graph for one tile type.
///
/// Unit square, corners TL(0,1) TR(1,1) BR(1,0) BL(0,0). The face loop is
/// created top → left → bottom → right with travel directions W, S, E, N;
/// each edge's face side is labelled `(tile, open|exterior, θ)`.
pub fn tile_primitive(def: &TileSocketDef) -> MerrellGraph {
    let mut g = MerrellGraph::new();
    let face = g.add_face(def.label.clone());

    let v0 = g.add_vertex(Vec2::new(0.0, 1.0)); // top-left
    let v1 = g.add_vertex(Vec2::new(1.0, 1.0)); // top-right
    let v2 = g.add_vertex(Vec2::new(1.0, 0.0)); // bottom-right
    let v3 = g.add_vertex(Vec2::new(0.0, 0.0)); // bottom-left

    let is_socket = |d: IVec2| def.sockets.iter().any(|s| *s == d);

    // (from, to, outward face direction, travel direction)
    let edges = [
        (v1, v0, IVec2::new(0, -1), IVec2::new(-1, 0)), // top: faces N, travels W
        (v0, v3, IVec2::new(-1, 0), IVec2::new(0, 1)),  // left: faces W, travels S
        (v3, v2, IVec2::new(0, 1), IVec2::new(1, 0)),   // bottom: faces S, travels E
        (v2, v1, IVec2::new(1, 0), IVec2::new(0, -1)),  // right: faces E, travels N
    ];

    let mut loop_edges = Vec::with_capacity(4);
    for (from, to, face_dir, travel_dir) in edges {
        let r = if is_socket(face_dir) {
            RegionLabel::Open
        } else {
            RegionLabel::Exterior
        };
        let label = EdgeLabel::new(RegionLabel::name(def.label.clone()), r, grid_dir_to_theta(travel_dir));
        let he = g
            .add_half_edge_pair(from, to, label)
            .expect("vertices created above");
        loop_edges.push(he);
    }
    g.link_face_loop(face, &loop_edges)
        .expect("face and edges created above");
    g
}


#[cfg(test)]
mod tests {
    use super::fixtures::{corner_br, h_straight};
    use super::*;
    use crate::label::RegionLabel;

    #[test]
    fn grid_directions_map_to_quadrant_angles() {
        assert_eq!(grid_dir_to_theta(IVec2::new(1, 0)), 0.0);
        assert_eq!(grid_dir_to_theta(IVec2::new(0, -1)), FRAC_PI_2);
        assert_eq!(grid_dir_to_theta(IVec2::new(-1, 0)), PI);
        assert_eq!(grid_dir_to_theta(IVec2::new(0, 1)), 3.0 * FRAC_PI_2);
    }

    #[test]
    fn primitive_has_four_vertices_and_four_pairs() {
        let g = tile_primitive(&h_straight());
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.face_count(), 1);
    }

    #[test]
    fn socket_count_determines_open_and_exterior_edges() {
        let g = tile_primitive(&h_straight());
        let open = g
            .half_edges
            .iter()
            .filter(|h| h.label.r == RegionLabel::Open)
            .count();
        let exterior = g
            .half_edges
            .iter()
            .filter(|h| h.label.r == RegionLabel::Exterior)
            .count();
        assert_eq!(open, 2);
        assert_eq!(exterior, 2);
    }

    #[test]
    fn straight_tile_outer_boundary_has_no_turns() {
        // Two antiparallel socket directions: no turn elements at all.
        let g = tile_primitive(&h_straight());
        let bs = g.outer_boundary();
        assert_eq!(bs.total_turn_count(), 0);
    }

    #[test]
    fn corner_tile_outer_boundary_turns_once_positive() {
        let g = tile_primitive(&corner_br());
        let bs = g.outer_boundary();
        assert_eq!(bs.total_turn_count(), 1);
    }

    #[test]
    fn face_loop_boundary_is_complete() {
        for def in [h_straight(), corner_br()] {
            let g = tile_primitive(&def);
            let bs = g.boundary_of(g.faces[0].id);
            assert!(bs.is_complete(), "{} face loop must close", def.label);
        }
    }
}
