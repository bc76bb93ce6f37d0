//! # Polygon Extraction
//!
//! Converts a CSG polygon set into an indexed triangle mesh.
//!
//! ## Steps
//!
//! 1. Weld vertices within tolerance.
//! 2. Drop loops that collapse to a line.
//! 3. Optionally split edges at vertices lying on them (T-junctions), so
//!    that every edge is shared by exactly two triangles.
//! 4. Triangulate each convex loop: a plain fan, or a fan around the loop
//!    centroid when the loop has straight corners.
//! 5. Optionally seal whatever cracks remain (see [`seal_triangles`]).

use super::seal::seal_triangles;
use super::{Mesh, VertexWelder};
use crate::csg::Polygon;
use config::constants::WELD_TOLERANCE;
use glam::DVec3;
use std::collections::{HashMap, HashSet};

/// Controls how a polygon set becomes a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Distance below which vertices are merged.
    pub weld_tolerance: f64,
    /// Insert vertices lying on other loops' edges.
    pub resolve_t_junctions: bool,
    /// Close the boundary cycles left after triangulation.
    pub seal_cracks: bool,
}

impl ExtractOptions {
    /// Options producing a closed mesh: T-junctions resolved and cracks
    /// sealed.
    pub fn closed(weld_tolerance: f64) -> Self {
        Self {
            weld_tolerance,
            resolve_t_junctions: true,
            seal_cracks: true,
        }
    }

    /// Options that only weld.
    pub fn weld_only(weld_tolerance: f64) -> Self {
        Self {
            weld_tolerance,
            resolve_t_junctions: false,
            seal_cracks: false,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::closed(WELD_TOLERANCE)
    }
}

/// Extracts an indexed mesh from convex polygons.
pub fn extract(polygons: &[Polygon], options: &ExtractOptions) -> Mesh {
    let tolerance = options.weld_tolerance;
    let mut welder = VertexWelder::new(tolerance);
    let mut loops: Vec<Vec<u32>> = Vec::with_capacity(polygons.len());

    for polygon in polygons {
        let mut indices: Vec<u32> = Vec::with_capacity(polygon.vertices().len());
        for v in polygon.vertices() {
            let i = welder.insert(*v);
            if indices.last() != Some(&i) {
                indices.push(i);
            }
        }
        while indices.len() > 1 && indices.first() == indices.last() {
            indices.pop();
        }
        if indices.len() >= 3 {
            loops.push(indices);
        }
    }

    let mut vertices = welder.into_positions();
    loops.retain(|l| !is_sliver(&vertices, l, tolerance));

    if options.resolve_t_junctions {
        loops = split_t_junctions(&vertices, loops, tolerance);
        loops.retain(|l| is_simple(l));
    }

    let mut triangles = Vec::with_capacity(loops.iter().map(|l| l.len()).sum());
    for l in &loops {
        triangulate_loop(&mut vertices, &mut triangles, l, tolerance);
    }
    if options.seal_cracks {
        seal_triangles(&mut triangles);
    }
    compact(vertices, triangles)
}

// =============================================================================
// LOOP CHECKS
// =============================================================================

fn newell(vertices: &[DVec3], indices: &[u32]) -> DVec3 {
    let mut n = DVec3::ZERO;
    for (k, &i) in indices.iter().enumerate() {
        let a = vertices[i as usize];
        let b = vertices[indices[(k + 1) % indices.len()] as usize];
        n += a.cross(b);
    }
    n
}

/// A loop whose width is below tolerance everywhere.
fn is_sliver(vertices: &[DVec3], indices: &[u32], tolerance: f64) -> bool {
    let longest = indices
        .iter()
        .enumerate()
        .map(|(k, &i)| {
            let j = indices[(k + 1) % indices.len()];
            vertices[i as usize].distance(vertices[j as usize])
        })
        .fold(0.0_f64, f64::max);
    newell(vertices, indices).length() <= tolerance * longest
}

fn is_simple(indices: &[u32]) -> bool {
    let mut seen = HashSet::with_capacity(indices.len());
    indices.iter().all(|i| seen.insert(*i))
}

fn is_straight_corner(prev: DVec3, cur: DVec3, next: DVec3, tolerance: f64) -> bool {
    let base = next - prev;
    let len = base.length();
    if len <= tolerance {
        return true;
    }
    (cur - prev).cross(base).length() / len <= tolerance
}

// =============================================================================
// T-JUNCTIONS
// =============================================================================

struct PointGrid {
    cell: f64,
    cells: HashMap<[i64; 3], Vec<u32>>,
}

impl PointGrid {
    fn new(vertices: &[DVec3], tolerance: f64) -> Self {
        let extent = super::Aabb::from_points(vertices.iter().copied())
            .map(|b| b.size().max_element())
            .unwrap_or(1.0);
        let per_axis = (vertices.len().max(1) as f64).cbrt();
        let cell = (extent / per_axis).max(tolerance * 4.0);
        let mut grid = Self {
            cell,
            cells: HashMap::new(),
        };
        for (i, v) in vertices.iter().enumerate() {
            let key = grid.cell_of(*v);
            grid.cells.entry(key).or_default().push(i as u32);
        }
        grid
    }

    fn cell_of(&self, p: DVec3) -> [i64; 3] {
        let q = (p / self.cell).floor();
        [q.x as i64, q.y as i64, q.z as i64]
    }

    /// Vertices in the cells around the segment `a`..`b`.
    fn near_segment(&self, a: DVec3, b: DVec3) -> Vec<u32> {
        let steps = ((a.distance(b) / self.cell).ceil() as usize).max(1);
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        for s in 0..=steps {
            let [cx, cy, cz] = self.cell_of(a.lerp(b, s as f64 / steps as f64));
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let key = [cx + dx, cy + dy, cz + dz];
                        if !visited.insert(key) {
                            continue;
                        }
                        if let Some(bucket) = self.cells.get(&key) {
                            out.extend_from_slice(bucket);
                        }
                    }
                }
            }
        }
        out
    }
}

/// Vertices strictly inside segment `a`..`b`, ordered from `a`.
fn vertices_on_edge(
    vertices: &[DVec3],
    grid: &PointGrid,
    a: u32,
    b: u32,
    tolerance: f64,
) -> Vec<u32> {
    let pa = vertices[a as usize];
    let pb = vertices[b as usize];
    let dir = pb - pa;
    let len_sq = dir.length_squared();
    if len_sq <= tolerance * tolerance {
        return Vec::new();
    }
    let len = len_sq.sqrt();

    let mut hits: Vec<(f64, u32)> = grid
        .near_segment(pa, pb)
        .into_iter()
        .filter(|&i| i != a && i != b)
        .filter_map(|i| {
            let p = vertices[i as usize];
            let t = (p - pa).dot(dir) / len_sq;
            let along = t * len;
            if along <= tolerance || along >= len - tolerance {
                return None;
            }
            if (pa + dir * t).distance(p) <= tolerance {
                Some((t, i))
            } else {
                None
            }
        })
        .collect();
    hits.sort_by(|x, y| x.0.total_cmp(&y.0));
    hits.dedup_by_key(|h| h.1);
    hits.into_iter().map(|(_, i)| i).collect()
}

fn split_t_junctions(vertices: &[DVec3], loops: Vec<Vec<u32>>, tolerance: f64) -> Vec<Vec<u32>> {
    let grid = PointGrid::new(vertices, tolerance);
    let mut cache: HashMap<(u32, u32), Vec<u32>> = HashMap::new();

    loops
        .into_iter()
        .map(|l| {
            let mut out = Vec::with_capacity(l.len());
            for (k, &a) in l.iter().enumerate() {
                let b = l[(k + 1) % l.len()];
                out.push(a);
                let key = (a.min(b), a.max(b));
                let inner = cache
                    .entry(key)
                    .or_insert_with(|| vertices_on_edge(vertices, &grid, key.0, key.1, tolerance));
                if a < b {
                    out.extend(inner.iter().copied());
                } else {
                    out.extend(inner.iter().rev().copied());
                }
            }
            out
        })
        .collect()
}

// =============================================================================
// TRIANGULATION
// =============================================================================

fn triangulate_loop(
    vertices: &mut Vec<DVec3>,
    triangles: &mut Vec<[u32; 3]>,
    indices: &[u32],
    tolerance: f64,
) {
    let n = indices.len();
    if n == 3 {
        triangles.push([indices[0], indices[1], indices[2]]);
        return;
    }

    let straight = (0..n).any(|k| {
        let prev = vertices[indices[(k + n - 1) % n] as usize];
        let cur = vertices[indices[k] as usize];
        let next = vertices[indices[(k + 1) % n] as usize];
        is_straight_corner(prev, cur, next, tolerance)
    });

    if straight {
        let centroid = indices
            .iter()
            .map(|&i| vertices[i as usize])
            .sum::<DVec3>()
            / n as f64;
        let c = vertices.len() as u32;
        vertices.push(centroid);
        for k in 0..n {
            triangles.push([c, indices[k], indices[(k + 1) % n]]);
        }
    } else {
        for k in 1..n - 1 {
            triangles.push([indices[0], indices[k], indices[k + 1]]);
        }
    }
}

/// Drops unreferenced vertices and renumbers triangles.
fn compact(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> Mesh {
    let mut remap = vec![u32::MAX; vertices.len()];
    let mut kept = Vec::with_capacity(vertices.len());
    let triangles = triangles
        .into_iter()
        .map(|t| {
            t.map(|i| {
                let slot = &mut remap[i as usize];
                if *slot == u32::MAX {
                    *slot = kept.len() as u32;
                    kept.push(vertices[i as usize]);
                }
                *slot
            })
        })
        .collect();
    Mesh::from_parts(kept, triangles)
}
