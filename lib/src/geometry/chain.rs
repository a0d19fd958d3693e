//! Nearest-neighbour chaining of points.
//!
//! Used to give sets of islands a reproducible, spatially local order.

use super::Point;

/// Order `points` by greedy nearest-neighbour chaining.
///
/// The chain starts at index 0 and repeatedly moves to the closest point not
/// yet visited. Ties go to the lowest input index. Returns the visiting order
/// as a permutation of `0..points.len()`.
pub fn chained_path(points: &[Point]) -> Vec<usize> {
    if points.is_empty() {
        return vec![];
    }

    let mut order = Vec::with_capacity(points.len());
    let mut visited = vec![false; points.len()];
    let mut current = 0;

    order.push(current);
    visited[current] = true;

    for _ in 1..points.len() {
        let current_pos = points[current];
        let mut best: Option<(usize, i128)> = None;

        for (idx, &is_visited) in visited.iter().enumerate() {
            if is_visited {
                continue;
            }
            let dist_sq = current_pos.distance_squared(&points[idx]);
            // Strict comparison keeps the lowest index on ties
            if best.map_or(true, |(_, best_dist)| dist_sq < best_dist) {
                best = Some((idx, dist_sq));
            }
        }

        if let Some((idx, _)) = best {
            order.push(idx);
            visited[idx] = true;
            current = idx;
        }
    }

    order
}
