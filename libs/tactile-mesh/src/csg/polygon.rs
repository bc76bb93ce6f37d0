//! # Convex Polygons
//!
//! The face type of a [`Solid`](super::Solid): a planar convex loop with a
//! cached plane. Splitting against a [`Plane`] is the only geometric
//! operation the BSP tree needs.

use super::plane::{Plane, Side};
use glam::{DMat4, DVec3};

/// A planar convex polygon with counter-clockwise winding seen from the
/// front (outside of the solid).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec3>,
    plane: Plane,
}

/// Output buckets for [`Polygon::split`].
#[derive(Debug, Default)]
pub struct SplitBuckets {
    /// Coplanar polygons facing the same way as the splitter.
    pub coplanar_front: Vec<Polygon>,
    /// Coplanar polygons facing away from the splitter.
    pub coplanar_back: Vec<Polygon>,
    /// Pieces in front of the splitter.
    pub front: Vec<Polygon>,
    /// Pieces behind the splitter.
    pub back: Vec<Polygon>,
}

impl Polygon {
    /// Creates a polygon from an ordered loop. Returns `None` when the loop
    /// has fewer than three points, encloses no area or contains NaN.
    pub fn new(vertices: Vec<DVec3>) -> Option<Self> {
        if vertices.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let plane = Plane::from_loop(&vertices)?;
        Some(Self { vertices, plane })
    }

    fn with_plane(vertices: Vec<DVec3>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    /// Vertex loop.
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Supporting plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Reverses winding and plane orientation.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Applies an affine transform. Mirroring transforms reverse the winding
    /// so the polygon keeps facing outward.
    pub fn transformed(&self, matrix: &DMat4, mirrored: bool) -> Option<Self> {
        let mut vertices: Vec<DVec3> = self
            .vertices
            .iter()
            .map(|v| matrix.transform_point3(*v))
            .collect();
        if mirrored {
            vertices.reverse();
        }
        Self::new(vertices)
    }

    /// Splits the polygon by `plane` into the matching buckets.
    ///
    /// Coplanar polygons go to `coplanar_front` or `coplanar_back` by the
    /// direction of their own normal. Spanning polygons are cut along the
    /// plane; new vertices are interpolated on the crossing edges.
    pub fn split(self, plane: &Plane, out: &mut SplitBuckets) {
        let sides: Vec<Side> = self.vertices.iter().map(|v| plane.classify(*v)).collect();
        let kind = sides.iter().fold(Side::Coplanar, |acc, s| acc.merge(*s));

        match kind {
            Side::Coplanar => {
                if plane.normal().dot(self.plane.normal()) > 0.0 {
                    out.coplanar_front.push(self);
                } else {
                    out.coplanar_back.push(self);
                }
            }
            Side::Front => out.front.push(self),
            Side::Back => out.back.push(self),
            Side::Spanning => {
                let count = self.vertices.len();
                let mut front = Vec::with_capacity(count + 1);
                let mut back = Vec::with_capacity(count + 1);
                for i in 0..count {
                    let j = (i + 1) % count;
                    let (si, sj) = (sides[i], sides[j]);
                    let (vi, vj) = (self.vertices[i], self.vertices[j]);
                    if si != Side::Back {
                        front.push(vi);
                    }
                    if si != Side::Front {
                        back.push(vi);
                    }
                    if si.merge(sj) == Side::Spanning {
                        let di = plane.signed_distance(vi);
                        let dj = plane.signed_distance(vj);
                        let t = di / (di - dj);
                        let v = vi.lerp(vj, t);
                        front.push(v);
                        back.push(v);
                    }
                }
                if front.len() >= 3 {
                    out.front.push(Self::with_plane(front, self.plane));
                }
                if back.len() >= 3 {
                    out.back.push(Self::with_plane(back, self.plane));
                }
            }
        }
    }

    /// Twice the polygon area.
    pub fn doubled_area(&self) -> f64 {
        let origin = self.vertices[0];
        self.vertices
            .windows(2)
            .skip(1)
            .map(|w| (w[0] - origin).cross(w[1] - origin))
            .sum::<DVec3>()
            .length()
    }
}
