//! # Mesh Data Structure
//!
//! Indexed triangle mesh used for backend results and export, plus the
//! conversions between meshes and CSG [`Solid`]s.
//!
//! All geometry uses `f64`. Conversion to `f32` happens only in the STL
//! writer.

mod extract;
mod seal;
mod weld;

pub use extract::{extract, ExtractOptions};
pub use seal::{seal_triangles, SealReport};
pub use weld::VertexWelder;

use crate::csg::{Polygon, Solid};
use glam::{DMat4, DVec3};
use std::collections::HashMap;

// =============================================================================
// BOUNDS
// =============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// Creates a box from two corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a point set, `None` when empty.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Edge lengths.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Centre point.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns `true` when the boxes, grown by `margin`, share any point.
    pub fn overlaps(&self, other: &Aabb, margin: f64) -> bool {
        self.min.x <= other.max.x + margin
            && other.min.x <= self.max.x + margin
            && self.min.y <= other.max.y + margin
            && other.min.y <= self.max.y + margin
            && self.min.z <= other.max.z + margin
            && other.min.z <= self.max.z + margin
    }

    /// Returns `true` when `other` lies inside this box grown by `margin`.
    pub fn contains(&self, other: &Aabb, margin: f64) -> bool {
        other.min.cmpge(self.min - DVec3::splat(margin)).all()
            && other.max.cmple(self.max + DVec3::splat(margin)).all()
    }
}

// =============================================================================
// MESH
// =============================================================================

/// A triangle mesh with shared vertices.
///
/// # Example
///
/// ```rust
/// use tactile_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// let a = mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// let b = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// let c = mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle(a, b, c);
/// assert_eq!(mesh.triangle_count(), 1);
/// assert!(!mesh.is_watertight());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.triangles.push([v0, v1, v2]);
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Triangle indices.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Iterates triangles as position triples.
    pub fn triangle_positions(&self) -> impl Iterator<Item = [DVec3; 3]> + '_ {
        self.triangles.iter().map(|t| {
            [
                self.vertices[t[0] as usize],
                self.vertices[t[1] as usize],
                self.vertices[t[2] as usize],
            ]
        })
    }

    /// Bounds of the referenced vertices, `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.triangle_positions().flatten())
    }

    /// Applies an affine transform in place. Mirroring transforms flip the
    /// winding so faces keep pointing outward.
    pub fn transform(&mut self, matrix: &DMat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
        if matrix.determinant() < 0.0 {
            for t in &mut self.triangles {
                t.swap(1, 2);
            }
        }
    }

    /// Appends another mesh.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles
            .extend(other.triangles.iter().map(|t| t.map(|i| i + offset)));
    }

    /// Signed enclosed volume. Positive for outward-facing closed meshes.
    pub fn volume(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| a.dot(b.cross(c)))
            .sum::<f64>()
            / 6.0
    }

    /// Number of directed edges without exactly one opposite partner.
    ///
    /// Zero means every edge is shared by exactly two triangles with
    /// opposite orientation: the mesh is closed and consistently wound.
    pub fn open_edge_count(&self) -> usize {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.triangles.len() * 3);
        for t in &self.triangles {
            for k in 0..3 {
                *edges.entry((t[k], t[(k + 1) % 3])).or_default() += 1;
            }
        }
        edges
            .iter()
            .filter(|&(&(a, b), &count)| count != 1 || edges.get(&(b, a)) != Some(&1))
            .count()
    }

    /// Returns `true` when the mesh is closed and consistently wound.
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count() == 0
    }

    /// Converts triangles into a CSG solid. Degenerate triangles are dropped.
    pub fn to_solid(&self) -> Solid {
        let polygons = self
            .triangle_positions()
            .filter_map(|tri| Polygon::new(tri.to_vec()))
            .collect();
        Solid::from_polygons(polygons)
    }

    /// Builds a mesh from a solid by welding shared vertices.
    pub fn from_solid(solid: &Solid, options: &ExtractOptions) -> Self {
        extract(solid.polygons(), options)
    }

    pub(crate) fn from_parts(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
        }
    }
}

#[cfg(test)]
mod tests;
