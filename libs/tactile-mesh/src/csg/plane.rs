//! # Splitting Planes
//!
//! Oriented planes used by the BSP tree, with point classification against
//! a slab of thickness [`PLANE_EPSILON`].

use config::constants::PLANE_EPSILON;
use glam::DVec3;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Side of a plane a point or polygon lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Within the plane slab.
    Coplanar,
    /// Positive side of the normal.
    Front,
    /// Negative side of the normal.
    Back,
    /// Polygon has vertices on both sides.
    Spanning,
}

impl Side {
    fn bits(self) -> u8 {
        match self {
            Side::Coplanar => 0,
            Side::Front => 1,
            Side::Back => 2,
            Side::Spanning => 3,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Side::Coplanar,
            1 => Side::Front,
            2 => Side::Back,
            _ => Side::Spanning,
        }
    }

    /// Combines the classification of two points into a polygon classification.
    pub fn merge(self, other: Side) -> Side {
        Side::from_bits(self.bits() | other.bits())
    }
}

// =============================================================================
// PLANE
// =============================================================================

/// A plane `normal · p = w` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: DVec3,
    w: f64,
}

impl Plane {
    /// Creates a plane from a unit normal and its offset from the origin.
    pub fn new(normal: DVec3, w: f64) -> Self {
        Self { normal, w }
    }

    /// Creates a plane through `a`, `b`, `c` (counter-clockwise seen from the
    /// front). Returns `None` for collinear points.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize()?;
        Some(Self {
            normal,
            w: normal.dot(a),
        })
    }

    /// Creates the best-fit plane of a polygon loop using Newell's method.
    ///
    /// Robust for loops containing collinear runs. Returns `None` when the
    /// loop encloses no area.
    pub fn from_loop(points: &[DVec3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut normal = DVec3::ZERO;
        let mut centroid = DVec3::ZERO;
        for (i, current) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            centroid += *current;
        }
        if normal.length() <= config::constants::EPSILON_TOLERANCE {
            return None;
        }
        let normal = normal.try_normalize()?;
        centroid /= points.len() as f64;
        Some(Self {
            normal,
            w: normal.dot(centroid),
        })
    }

    /// Unit normal.
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Offset along the normal.
    pub fn w(&self) -> f64 {
        self.w
    }

    /// Reverses the orientation of the plane.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance from the plane. Positive in front.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Classifies a point against the plane slab.
    pub fn classify(&self, point: DVec3) -> Side {
        let distance = self.signed_distance(point);
        if distance > PLANE_EPSILON {
            Side::Front
        } else if distance < -PLANE_EPSILON {
            Side::Back
        } else {
            Side::Coplanar
        }
    }
}
