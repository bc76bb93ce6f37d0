//! # Vertex Welding
//!
//! Spatial hash that merges positions closer than a tolerance into one
//! shared vertex index.

use glam::DVec3;
use std::collections::HashMap;

/// Merges nearly-identical positions into shared indices.
///
/// Positions are bucketed into cubic cells with an edge of one tolerance;
/// a lookup scans the 27 cells around the query so matches across a cell
/// boundary are found.
///
/// # Example
///
/// ```rust
/// use tactile_mesh::mesh::VertexWelder;
/// use glam::DVec3;
///
/// let mut welder = VertexWelder::new(1e-5);
/// let a = welder.insert(DVec3::new(1.0, 2.0, 3.0));
/// let b = welder.insert(DVec3::new(1.0, 2.0, 3.0 + 1e-7));
/// assert_eq!(a, b);
/// assert_eq!(welder.len(), 1);
/// ```
#[derive(Debug)]
pub struct VertexWelder {
    tolerance: f64,
    cells: HashMap<[i64; 3], Vec<u32>>,
    positions: Vec<DVec3>,
}

impl VertexWelder {
    /// Creates a welder merging points within `tolerance`.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(f64::MIN_POSITIVE),
            cells: HashMap::new(),
            positions: Vec::new(),
        }
    }

    fn cell_of(&self, p: DVec3) -> [i64; 3] {
        let q = (p / self.tolerance).floor();
        [q.x as i64, q.y as i64, q.z as i64]
    }

    /// Returns the index of an existing vertex within tolerance of `p`, if any.
    pub fn find(&self, p: DVec3) -> Option<u32> {
        let [cx, cy, cz] = self.cell_of(p);
        let limit = self.tolerance * self.tolerance;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&[cx + dx, cy + dy, cz + dz]) else {
                        continue;
                    };
                    if let Some(&i) = bucket
                        .iter()
                        .find(|&&i| self.positions[i as usize].distance_squared(p) <= limit)
                    {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    /// Inserts `p`, reusing a nearby vertex when one exists.
    pub fn insert(&mut self, p: DVec3) -> u32 {
        if let Some(i) = self.find(p) {
            return i;
        }
        let index = self.positions.len() as u32;
        self.positions.push(p);
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
        index
    }

    /// Number of distinct vertices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` when nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Consumes the welder, returning the distinct positions.
    pub fn into_positions(self) -> Vec<DVec3> {
        self.positions
    }
}
