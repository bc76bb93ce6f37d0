//! # Crack Sealing
//!
//! Closes the hairline gaps that tolerance-based welding leaves between BSP
//! fragments.
//!
//! Every triangle is a closed loop of directed edges, so in/out degrees
//! balance at every vertex. Edges left without an opposite partner keep
//! that balance and always chain into closed boundary cycles. Each cycle is
//! fanned shut with triangles running the other way. Cracks are thin, so
//! the added triangles have next to no area.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// What [`seal_triangles`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SealReport {
    /// Degenerate, duplicate or mutually cancelling triangles removed.
    pub removed: usize,
    /// Boundary cycles closed.
    pub cycles: usize,
    /// Triangles added to close them.
    pub added: usize,
}

impl SealReport {
    /// Returns `true` when nothing had to change.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Rotation of `t` starting at its smallest index. Keeps the winding.
fn canonical(t: [u32; 3]) -> [u32; 3] {
    let [a, b, c] = t;
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= a && b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

/// Drops repeated triangles and pairs of the same triangle wound both ways.
fn drop_coincident(triangles: &mut Vec<[u32; 3]>) {
    let mut kept: HashMap<[u32; 3], Vec<usize>> = HashMap::with_capacity(triangles.len());
    let mut remove = vec![false; triangles.len()];
    for (i, t) in triangles.iter().enumerate() {
        let key = canonical(*t);
        if kept.get(&key).is_some_and(|same| !same.is_empty()) {
            remove[i] = true;
            continue;
        }
        let flipped = canonical([t[0], t[2], t[1]]);
        if let Some(j) = kept.get_mut(&flipped).and_then(Vec::pop) {
            remove[i] = true;
            remove[j] = true;
            continue;
        }
        kept.entry(key).or_default().push(i);
    }
    let mut flags = remove.into_iter();
    triangles.retain(|_| !flags.next().unwrap_or(false));
}

/// Closed vertex cycles along which triangles are missing, each listed in
/// the winding the filling triangles need.
fn boundary_cycles(triangles: &[[u32; 3]]) -> Vec<Vec<u32>> {
    // Net count per undirected edge: + for low→high, − for high→low.
    let mut net: HashMap<(u32, u32), i64> = HashMap::with_capacity(triangles.len() * 3 / 2);
    for t in triangles {
        for k in 0..3 {
            let (a, b) = (t[k], t[(k + 1) % 3]);
            if a < b {
                *net.entry((a, b)).or_default() += 1;
            } else {
                *net.entry((b, a)).or_default() -= 1;
            }
        }
    }
    let mut unmatched: Vec<((u32, u32), i64)> = net.into_iter().filter(|(_, n)| *n != 0).collect();
    if unmatched.is_empty() {
        return Vec::new();
    }
    unmatched.sort_unstable();

    let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for ((lo, hi), n) in unmatched {
        let (from, to) = if n > 0 { (hi, lo) } else { (lo, hi) };
        for _ in 0..n.unsigned_abs() {
            outgoing.entry(from).or_default().push(to);
        }
    }

    let mut cycles = Vec::new();
    let starts: Vec<u32> = outgoing.keys().copied().collect();
    for start in starts {
        let mut path = vec![start];
        let mut on_path: HashMap<u32, usize> = HashMap::from([(start, 0)]);
        let mut current = start;
        while let Some(next) = outgoing.get_mut(&current).and_then(Vec::pop) {
            match on_path.get(&next) {
                Some(&i) => {
                    let cycle = path.split_off(i);
                    for v in &cycle[1..] {
                        on_path.remove(v);
                    }
                    path.push(next);
                    if cycle.len() >= 3 {
                        cycles.push(cycle);
                    }
                }
                None => {
                    on_path.insert(next, path.len());
                    path.push(next);
                }
            }
            current = next;
        }
    }
    cycles
}

fn undirected(a: u32, b: u32) -> (u32, u32) {
    (a.min(b), a.max(b))
}

/// Position in `cycle` to fan from so that no diagonal repeats an edge the
/// mesh already has. Falls back to the first vertex.
fn fan_apex(cycle: &[u32], edges: &HashSet<(u32, u32)>) -> usize {
    let n = cycle.len();
    (0..n)
        .find(|&apex| {
            (2..n - 1).all(|k| !edges.contains(&undirected(cycle[apex], cycle[(apex + k) % n])))
        })
        .unwrap_or(0)
}

/// Makes a welded triangle list closed.
///
/// Triangles with a repeated index, repeated triangles and triangles
/// present in both windings are removed, then every boundary cycle is
/// fanned shut.
pub fn seal_triangles(triangles: &mut Vec<[u32; 3]>) -> SealReport {
    let before = triangles.len();
    triangles.retain(|&[a, b, c]| a != b && b != c && a != c);
    drop_coincident(triangles);
    let mut report = SealReport {
        removed: before - triangles.len(),
        ..SealReport::default()
    };

    let cycles = boundary_cycles(triangles);
    let mut edges: HashSet<(u32, u32)> = HashSet::new();
    if cycles.iter().any(|c| c.len() > 3) {
        edges.extend(triangles.iter().flat_map(|t| {
            (0..3).map(move |k| undirected(t[k], t[(k + 1) % 3]))
        }));
    }
    for cycle in cycles {
        report.cycles += 1;
        let n = cycle.len();
        let apex = fan_apex(&cycle, &edges);
        for k in 1..n - 1 {
            let t = [
                cycle[apex],
                cycle[(apex + k) % n],
                cycle[(apex + k + 1) % n],
            ];
            edges.extend([undirected(t[0], t[1]), undirected(t[0], t[2])]);
            triangles.push(t);
            report.added += 1;
        }
    }
    if !report.is_clean() {
        debug!(
            removed = report.removed,
            cycles = report.cycles,
            added = report.added,
            "sealed cracks"
        );
    }
    report
}
