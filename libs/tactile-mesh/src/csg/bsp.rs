//! # BSP Tree
//!
//! Binary space partitioning tree over convex polygons, after the csg.js
//! algorithm by Evan Wallace.
//!
//! ## Operations
//!
//! - `build`: insert polygons, splitting them by existing node planes
//! - `clip_to`: remove the parts of this tree inside another tree
//! - `invert`: swap solid and empty space
//! - `all_polygons`: collect every polygon in the tree
//!
//! ## Stack Safety
//!
//! Tree depth follows the number of distinct planes, which reaches the
//! thousands for cylinders carrying many dots. Every recursive walk runs
//! under `stacker::maybe_grow`, and `Drop` is iterative.

use super::plane::Plane;
use super::polygon::{Polygon, SplitBuckets};
use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};

/// A node in the BSP tree.
#[derive(Debug, Default)]
pub struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<Polygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

fn grow<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, f)
}

impl BspNode {
    /// Builds a tree from polygons.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Inserts polygons into the tree. The first polygon reaching an empty
    /// node supplies its splitting plane.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = *self.plane.get_or_insert(*polygons[0].plane());

        let mut buckets = SplitBuckets::default();
        for polygon in polygons {
            polygon.split(&plane, &mut buckets);
        }
        self.polygons.append(&mut buckets.coplanar_front);
        self.polygons.append(&mut buckets.coplanar_back);

        if !buckets.front.is_empty() {
            let front = self.front.get_or_insert_with(Box::default);
            grow(|| front.build(buckets.front));
        }
        if !buckets.back.is_empty() {
            let back = self.back.get_or_insert_with(Box::default);
            grow(|| back.build(buckets.back));
        }
    }

    /// Converts solid space to empty space and back.
    pub fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = self.plane.as_mut() {
            plane.flip();
        }
        if let Some(front) = self.front.as_mut() {
            grow(|| front.invert());
        }
        if let Some(back) = self.back.as_mut() {
            grow(|| back.invert());
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes every part of `polygons` that lies inside this tree.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };

        let mut buckets = SplitBuckets::default();
        for polygon in polygons {
            polygon.split(&plane, &mut buckets);
        }
        let mut front = buckets.front;
        front.append(&mut buckets.coplanar_front);
        let mut back = buckets.back;
        back.append(&mut buckets.coplanar_back);

        let mut front = match &self.front {
            Some(node) => grow(|| node.clip_polygons(front)),
            None => front,
        };
        let back = match &self.back {
            Some(node) => grow(|| node.clip_polygons(back)),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Removes every polygon of this tree that lies inside `other`.
    pub fn clip_to(&mut self, other: &BspNode) {
        let polygons = std::mem::take(&mut self.polygons);
        self.polygons = other.clip_polygons(polygons);
        if let Some(front) = self.front.as_mut() {
            grow(|| front.clip_to(other));
        }
        if let Some(back) = self.back.as_mut() {
            grow(|| back.clip_to(other));
        }
    }

    /// Collects all polygons in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.extend(node.polygons.iter().cloned());
            if let Some(front) = &node.front {
                stack.push(front);
            }
            if let Some(back) = &node.back {
                stack.push(back);
            }
        }
        out
    }
}

impl Drop for BspNode {
    fn drop(&mut self) {
        let mut stack: Vec<Box<BspNode>> = Vec::new();
        stack.extend(self.front.take());
        stack.extend(self.back.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.front.take());
            stack.extend(node.back.take());
        }
    }
}
