//! # CSG Core
//!
//! Volumetric solids as closed sets of convex polygons, combined with BSP
//! trees. Both evaluation backends run their booleans through this module;
//! they differ only in how results are stored and re-extracted.
//!
//! ## Example
//!
//! ```rust
//! use tactile_mesh::primitives::cuboid;
//! use glam::DVec3;
//!
//! let block = cuboid(DVec3::ZERO, DVec3::splat(2.0)).unwrap();
//! let notch = cuboid(DVec3::splat(1.0), DVec3::splat(3.0)).unwrap();
//! let result = block.subtract(notch);
//! assert!((result.volume() - 7.0).abs() < 1e-9);
//! ```

mod bsp;
mod plane;
mod polygon;

pub use bsp::BspNode;
pub use plane::{Plane, Side};
pub use polygon::{Polygon, SplitBuckets};

use crate::mesh::Aabb;
use config::constants::PLANE_EPSILON;
use glam::DMat4;
use std::fmt;

// =============================================================================
// BOOLEAN OPERATION
// =============================================================================

/// Boolean operation between two solids.
///
/// `Union` is the ADD step of the pipeline. `Subtract` is not commutative:
/// the second operand is removed from the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// `a ∪ b`
    Union,
    /// `a − b`
    Subtract,
    /// `a ∩ b`
    Intersect,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
        };
        f.write_str(name)
    }
}

// =============================================================================
// SOLID
// =============================================================================

/// A closed volume bounded by outward-facing convex polygons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    polygons: Vec<Polygon>,
}

impl Solid {
    /// Creates an empty solid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a closed polygon set.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Boundary polygons.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Consumes the solid, returning its polygons.
    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    /// Returns `true` when the solid has no boundary.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Axis-aligned bounds, `None` when empty.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.polygons.iter().flat_map(|p| p.vertices().iter().copied()))
    }

    /// Returns `true` when every vertex is finite.
    pub fn is_finite(&self) -> bool {
        self.polygons
            .iter()
            .all(|p| p.vertices().iter().all(|v| v.is_finite()))
    }

    /// Applies an affine transform. Polygons collapsed by the transform are
    /// dropped.
    pub fn transform(self, matrix: &DMat4) -> Self {
        let mirrored = matrix.determinant() < 0.0;
        let polygons = self
            .polygons
            .iter()
            .filter_map(|p| p.transformed(matrix, mirrored))
            .collect();
        Self { polygons }
    }

    /// Enclosed volume by the divergence theorem.
    pub fn volume(&self) -> f64 {
        let mut six_volume = 0.0;
        for polygon in &self.polygons {
            let v = polygon.vertices();
            for i in 1..v.len().saturating_sub(1) {
                six_volume += v[0].dot(v[i].cross(v[i + 1]));
            }
        }
        six_volume / 6.0
    }

    /// Applies `op` with `other` as the second operand.
    pub fn apply(self, other: Solid, op: BooleanOp) -> Solid {
        match op {
            BooleanOp::Union => self.union(other),
            BooleanOp::Subtract => self.subtract(other),
            BooleanOp::Intersect => self.intersect(other),
        }
    }

    fn disjoint_from(&self, other: &Solid) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) => !a.overlaps(&b, PLANE_EPSILON),
            _ => true,
        }
    }

    /// Returns the space inside either solid.
    pub fn union(self, other: Solid) -> Solid {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        if self.disjoint_from(&other) {
            let mut polygons = self.polygons;
            polygons.extend(other.polygons);
            return Solid { polygons };
        }
        let mut a = BspNode::new(self.polygons);
        let mut b = BspNode::new(other.polygons);
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        Solid::from_polygons(a.all_polygons())
    }

    /// Returns the space inside `self` but not inside `other`.
    pub fn subtract(self, other: Solid) -> Solid {
        if self.is_empty() || other.is_empty() || self.disjoint_from(&other) {
            return self;
        }
        let mut a = BspNode::new(self.polygons);
        let mut b = BspNode::new(other.polygons);
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(b.all_polygons());
        a.invert();
        Solid::from_polygons(a.all_polygons())
    }

    /// Returns the space inside both solids.
    pub fn intersect(self, other: Solid) -> Solid {
        if self.is_empty() || other.is_empty() || self.disjoint_from(&other) {
            return Solid::new();
        }
        let mut a = BspNode::new(self.polygons);
        let mut b = BspNode::new(other.polygons);
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(b.all_polygons());
        a.invert();
        Solid::from_polygons(a.all_polygons())
    }

    /// Unions many solids by pairwise tree reduction.
    pub fn union_all(solids: Vec<Solid>) -> Solid {
        let mut level = solids;
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut iter = level.into_iter();
            while let Some(a) = iter.next() {
                next.push(match iter.next() {
                    Some(b) => a.union(b),
                    None => a,
                });
            }
            level = next;
        }
        level.pop().unwrap_or_default()
    }
}
