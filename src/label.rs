//! Edge labels for the grammar graph.
//!
//! An abstract label `ã = (l, r, θ)` sits on every directed half-edge: `l`
//! names the region on the half-edge's face side, `r` the region on the
//! twin's side, and `θ` is the tangent direction of travel in radians.
//!
//! The region kinds the algorithms branch on (`open`, `exterior`, `glued`)
//! are a closed enum; user-defined tile names remain an open-ended string
//! vocabulary. The empty label is a wildcard that matches anything during
//! rule application.
//!
//! # Invariants
//! - A half-edge pair's reverse label is always derived via [`EdgeLabel::twin`]
//!   (swap `l`/`r`, rotate `θ` by π), never constructed independently.
//! - `θ` stays a continuous angle. The grid-first phase only ever produces
//!   multiples of π/2, but nothing here may assume that.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4), Sec 3.3 (2023)

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use std::fmt;

/// Tolerance for deciding that two tangent angles are equal.
///
/// Comparisons go through the cross product of the two directions rather
/// than raw angle subtraction; repeated gluing accumulates floating error,
/// so exact equality is never used.
pub const THETA_EPS: f32 = 1e-4;

/// Label of one region adjoining a half-edge.
///
/// `Open`, `Exterior` and `Glued` are the structural kinds the gluing and
/// extraction algorithms test for; `Name` carries a tile or region name;
/// `Wildcard` (the empty label) matches anything during rule matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionLabel {
    /// A socket edge not yet glued to a neighbour.
    Open,
    /// A sealed edge on the outside of a primitive.
    Exterior,
    /// A former socket that has been internalised by gluing.
    Glued,
    /// The empty label; matches anything during rule application.
    Wildcard,
    /// A tile or region name.
    Name(String),
}

impl RegionLabel {
    /// Creates a `Name` label.
    #[inline]
    pub fn name(s: impl Into<String>) -> Self {
        RegionLabel::Name(s.into())
    }

    /// Wildcard-aware comparison: `Wildcard` matches anything, everything
    /// else compares strictly.
    pub fn matches(&self, other: &RegionLabel) -> bool {
        matches!(self, RegionLabel::Wildcard)
            || matches!(other, RegionLabel::Wildcard)
            || self == other
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionLabel::Open => write!(f, "open"),
            RegionLabel::Exterior => write!(f, "exterior"),
            RegionLabel::Glued => write!(f, "glued"),
            RegionLabel::Wildcard => Ok(()),
            RegionLabel::Name(s) => write!(f, "{}", s),
        }
    }
}

/// Abstract label on a directed half-edge: `(l, r, θ)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLabel {
    /// Region label on this half-edge's face side.
    pub l: RegionLabel,
    /// Region label on the opposite (twin's) side.
    pub r: RegionLabel,
    /// Tangent direction of travel, radians in `[0, 2π)`.
    pub theta: f32,
}

impl EdgeLabel {
    /// Creates a label, normalising `theta` into `[0, 2π)`.
    pub fn new(l: RegionLabel, r: RegionLabel, theta: f32) -> Self {
        Self {
            l,
            r,
            theta: wrap_angle(theta),
        }
    }

    /// Derives the twin direction's label: `(r, l, θ + π)`.
    ///
    /// This is the only sanctioned way to obtain a reverse label.
    pub fn twin(&self) -> EdgeLabel {
        EdgeLabel {
            l: self.r.clone(),
            r: self.l.clone(),
            theta: wrap_angle(self.theta + PI),
        }
    }

    /// Strict structural equality with an angular tolerance on `θ`.
    pub fn approx_eq(&self, other: &EdgeLabel) -> bool {
        self.l == other.l && self.r == other.r && thetas_parallel(self.theta, other.theta)
    }

    /// Wildcard-aware equality used during rule matching: empty labels match
    /// anything, `θ` compares within tolerance.
    pub fn matches(&self, other: &EdgeLabel) -> bool {
        self.l.matches(&other.l) && self.r.matches(&other.r) && thetas_parallel(self.theta, other.theta)
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}|{:.3}]", self.l, self.r, self.theta)
    }
}

/// Normalises an angle into `[0, 2π)`.
pub fn wrap_angle(theta: f32) -> f32 {
    let t = theta.rem_euclid(TAU);
    // rem_euclid can return TAU itself for inputs a hair below zero.
    if t >= TAU {
        t - TAU
    } else {
        t
    }
}

/// 2D cross product of the unit directions at angles `t0` and `t1`.
///
/// Positive when `t1` is a left (counter-clockwise) deflection from `t0`.
#[inline]
pub fn direction_cross(t0: f32, t1: f32) -> f32 {
    t0.cos() * t1.sin() - t0.sin() * t1.cos()
}

/// True when two tangent angles describe the same direction of travel.
pub fn thetas_parallel(t0: f32, t1: f32) -> bool {
    let d = wrap_angle(t0 - t1);
    d < THETA_EPS || TAU - d < THETA_EPS
}

/// True when two tangent angles are complementary (differ by exactly π):
/// the compatibility test for two open edges meeting along a shared seam.
pub fn thetas_complementary(t0: f32, t1: f32) -> bool {
    let d = wrap_angle(t0 - t1);
    (d - PI).abs() < THETA_EPS
}
