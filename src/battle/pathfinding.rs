//! A* pathfinding over the battle board
//!
//! Movement cost is 1 per hex; the heuristic is hex distance. Occupied
//! hexes are impassable except for the start and the (ignored) combat
//! target's hex. The engine only ever takes the first step of a path and
//! re-plans next tick, so routes adapt when occupancy changes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashMap;

use crate::battle::grid::HexGrid;
use crate::battle::hex::HexCoord;
use crate::core::types::UnitId;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    coord: HexCoord,
    f_cost: u32,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.coord == other.coord
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; tie-break on coordinates for
        // deterministic expansion order.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| (other.coord.q, other.coord.r).cmp(&(self.coord.q, self.coord.r)))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the shortest path from `start` to `goal`.
///
/// When the goal hex is occupied by the ignored unit (the combat target),
/// the path is re-aimed at the walkable hex adjacent to the goal that is
/// closest to `start`. Returns None when no path exists.
pub fn find_path(
    grid: &HexGrid,
    start: HexCoord,
    goal: HexCoord,
    ignore: Option<UnitId>,
) -> Option<Vec<HexCoord>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let goal = resolve_goal(grid, start, goal, ignore)?;
    if start == goal {
        return Some(vec![start]);
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<HexCoord, HexCoord> = AHashMap::new();
    let mut g_scores: AHashMap<HexCoord, u32> = AHashMap::new();

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        f_cost: start.distance(&goal),
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return Some(reconstruct_path(&came_from, current.coord));
        }

        let current_g = *g_scores.get(&current.coord).unwrap_or(&u32::MAX);

        for neighbor in grid.walkable_neighbors(current.coord, ignore) {
            let tentative_g = current_g + 1;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.coord);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    coord: neighbor,
                    f_cost: tentative_g + neighbor.distance(&goal),
                });
            }
        }
    }

    None
}

/// If the goal is occupied by a unit other than `ignore`, aim at the
/// walkable neighbor of the goal closest to `start` instead.
fn resolve_goal(
    grid: &HexGrid,
    start: HexCoord,
    goal: HexCoord,
    ignore: Option<UnitId>,
) -> Option<HexCoord> {
    match grid.occupant(goal) {
        None => Some(goal),
        Some(id) if Some(id) == ignore => Some(goal),
        Some(_) => {
            let mut candidates: Vec<HexCoord> = goal
                .neighbors()
                .into_iter()
                .filter(|n| *n == start || grid.is_walkable(*n))
                .collect();
            candidates.sort_by_key(|pos| (start.distance(pos), pos.q, pos.r));
            candidates.into_iter().next()
        }
    }
}

fn reconstruct_path(came_from: &AHashMap<HexCoord, HexCoord>, mut current: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Next hex on the path toward `goal`, or None when already there or boxed
/// in. The engine calls this once per moving unit per tick.
pub fn next_step(
    grid: &HexGrid,
    start: HexCoord,
    goal: HexCoord,
    ignore: Option<UnitId>,
) -> Option<HexCoord> {
    let path = find_path(grid, start, goal, ignore)?;
    if path.len() < 2 {
        return None;
    }
    Some(path[1])
}
