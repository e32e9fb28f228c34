use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geometry::{HexGrid, HexIndex};

// =============================================================================
// A* PATHFINDING ON THE HEX GRID
// =============================================================================

/// One pathfinding query. Built per call and dropped afterwards.
///
/// ```ignore
/// let path = PathRequest::new(0, 15, |i| walls.contains(&i))
///     .with_height(6)
///     .find(&grid);
/// ```
pub struct PathRequest<F>
where
    F: Fn(HexIndex) -> bool,
{
    pub start: HexIndex,
    pub dest: HexIndex,
    /// Grid height in rows. Without it no upper index bound is enforced and
    /// `is_blocked` must reject cells past the map.
    pub height: Option<u32>,
    /// Maximum number of expanded nodes before giving up.
    pub max_iterations: Option<usize>,
    pub is_blocked: F,
}

impl<F> PathRequest<F>
where
    F: Fn(HexIndex) -> bool,
{
    pub fn new(start: HexIndex, dest: HexIndex, is_blocked: F) -> Self {
        Self { start, dest, height: None, max_iterations: None, is_blocked }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Run the search. See [`find_path`].
    pub fn find(&self, grid: &HexGrid) -> Option<Vec<HexIndex>> {
        if self.start == self.dest {
            return Some(Vec::new());
        }

        let max_index = self.height.map(|h| h as i64 * grid.width() as i64 - 1);

        let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut in_open: HashMap<HexIndex, u64> = HashMap::new();
        let mut closed: HashSet<HexIndex> = HashSet::new();
        let mut came_from: HashMap<HexIndex, HexIndex> = HashMap::new();
        let mut g_score: HashMap<HexIndex, f64> = HashMap::new();

        let mut next_seq = 0u64;
        g_score.insert(self.start, 0.0);
        open.push(OpenEntry {
            f: grid.heuristic_distance(self.start, self.dest),
            seq: next_seq,
            node: self.start,
        });
        in_open.insert(self.start, next_seq);
        next_seq += 1;

        let mut iterations = 0usize;

        while let Some(OpenEntry { node: current, .. }) = open.pop() {
            // Superseded entry of a node that was already expanded.
            if closed.contains(&current) {
                continue;
            }

            iterations += 1;
            if self.max_iterations.is_some_and(|max| iterations > max) {
                log::debug!("pathfinding: gave up after {max} expansions", max = iterations - 1);
                return None;
            }

            // Reached goal, reconstruct path
            if current == self.dest {
                return Some(reconstruct_path(&came_from, self.start, self.dest));
            }

            in_open.remove(&current);
            closed.insert(current);

            let current_g = g_score[&current];

            for neighbor in grid.adjacent(current) {
                if neighbor < 0 {
                    continue;
                }
                if max_index.is_some_and(|max| neighbor > max) {
                    continue;
                }
                if closed.contains(&neighbor) {
                    continue;
                }
                if (self.is_blocked)(neighbor) {
                    closed.insert(neighbor);
                    continue;
                }

                // Edge cost is the screen distance between the two hexes, not
                // a unit step. Existing paths depend on the resulting choices.
                let tentative_g = current_g + grid.heuristic_distance(current, neighbor);
                if g_score.get(&neighbor).is_some_and(|&existing| tentative_g >= existing) {
                    continue;
                }

                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                let f = tentative_g + grid.heuristic_distance(neighbor, self.dest);

                // Ties are broken by when a node first entered the open set, so
                // a re-scored node keeps its original place in line.
                let seq = *in_open.entry(neighbor).or_insert_with(|| {
                    next_seq += 1;
                    next_seq
                });
                open.push(OpenEntry { f, seq, node: neighbor });
            }
        }

        None // No path found
    }
}

/// A* over the hex grid from `start` to `dest`.
///
/// Returns the cells to walk through, excluding `start` and including `dest`;
/// an empty Vec when `start == dest`; `None` if `dest` cannot be reached.
///
/// # Arguments
/// * `grid` - Grid geometry (width must match the map)
/// * `height` - Grid height in rows, enables the upper bounds check
/// * `is_blocked` - Returns true for cells that cannot be entered
pub fn find_path(
    start: HexIndex,
    dest: HexIndex,
    grid: &HexGrid,
    height: Option<u32>,
    is_blocked: impl Fn(HexIndex) -> bool,
) -> Option<Vec<HexIndex>> {
    let mut request = PathRequest::new(start, dest, is_blocked);
    request.height = height;
    request.find(grid)
}

/// First cell to step into on the way to `dest`.
///
/// Returns None if already at `dest` or no path exists.
pub fn next_step(
    start: HexIndex,
    dest: HexIndex,
    grid: &HexGrid,
    height: Option<u32>,
    is_blocked: impl Fn(HexIndex) -> bool,
) -> Option<HexIndex> {
    find_path(start, dest, grid, height, is_blocked)?.first().copied()
}

/// Reconstruct path from came_from map, dropping `start`.
fn reconstruct_path(
    came_from: &HashMap<HexIndex, HexIndex>,
    start: HexIndex,
    dest: HexIndex,
) -> Vec<HexIndex> {
    let mut path = vec![dest];
    let mut current = dest;

    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

// ── Open set entry ───────────────────────────────────────────────────────────

/// Min-heap entry ordered by f-score, then by open-set arrival order.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f64,
    seq: u64,
    node: HexIndex,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other.f.total_cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}
