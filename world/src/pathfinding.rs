//! Grid search over per-tile node kinds and directional movement masks.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, VecDeque},
};

use tracing::trace;
use warren_core::{
    Heading, HeadingMask, NodeKind, NodeKindSet, PathOptions, PathRequestId, TileCoord, Vec2,
};

const ORTHOGONAL_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Path search waiting for the next tick.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingSearch {
    pub(crate) request: PathRequestId,
    pub(crate) start: Vec2,
    pub(crate) end: Vec2,
    pub(crate) options: PathOptions,
}

#[derive(Clone, Debug)]
pub(crate) struct PathfindingGrid {
    columns: u32,
    rows: u32,
    nodes: Vec<NodeKind>,
    masks: Vec<HeadingMask>,
    pending: VecDeque<PendingSearch>,
}

impl PathfindingGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let mut grid = Self {
            columns: 0,
            rows: 0,
            nodes: Vec::new(),
            masks: Vec::new(),
            pending: VecDeque::new(),
        };
        grid.resize(columns, rows);
        grid
    }

    /// Replaces every node with an open, unmasked node. Queued searches survive.
    pub(crate) fn resize(&mut self, columns: u32, rows: u32) {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        self.columns = columns;
        self.rows = rows;
        self.nodes = vec![NodeKind::Open; capacity];
        self.masks = vec![HeadingMask::EMPTY; capacity];
    }

    pub(crate) fn set_node(&mut self, tile: TileCoord, kind: NodeKind) {
        if let Some(index) = self.index(tile) {
            self.nodes[index] = kind;
        }
    }

    pub(crate) fn node(&self, tile: TileCoord) -> NodeKind {
        self.index(tile)
            .map_or(NodeKind::Closed, |index| self.nodes[index])
    }

    /// Replaces the set of headings that may not be taken out of `tile`.
    pub(crate) fn disable_edges(&mut self, tile: TileCoord, headings: HeadingMask) {
        if let Some(index) = self.index(tile) {
            self.masks[index] = headings;
        }
    }

    pub(crate) fn disabled_edges(&self, tile: TileCoord) -> HeadingMask {
        self.index(tile)
            .map_or(HeadingMask::EMPTY, |index| self.masks[index])
    }

    pub(crate) fn submit(&mut self, search: PendingSearch) {
        self.pending.push_back(search);
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drains queued searches in submission order.
    ///
    /// At most `budget` searches run the solver; requests whose endpoints
    /// fall off the map or onto a disallowed node resolve immediately and do
    /// not count. Requests beyond the budget stay queued for the next call.
    pub(crate) fn resolve_pending(
        &mut self,
        budget: usize,
    ) -> Vec<(PendingSearch, Option<Vec<TileCoord>>)> {
        let mut resolved = Vec::new();
        let mut searched = 0;

        while let Some(search) = self.pending.pop_front() {
            let Some((start, end)) = self.endpoints(&search) else {
                trace!(request = ?search.request, "path request short-circuited");
                resolved.push((search, None));
                continue;
            };
            if searched == budget {
                self.pending.push_front(search);
                break;
            }
            searched += 1;
            let tiles = self.search(start, end, search.options.allowed);
            resolved.push((search, tiles));
        }

        resolved
    }

    fn endpoints(&self, search: &PendingSearch) -> Option<(TileCoord, TileCoord)> {
        let start = self.tile_at(search.start)?;
        let end = self.tile_at(search.end)?;
        let allowed = search.options.allowed;
        (allowed.contains(self.node(start)) && allowed.contains(self.node(end)))
            .then_some((start, end))
    }

    /// Eight-directional A* between two tiles standing only on `allowed` nodes.
    ///
    /// Diagonal steps require both flanking tiles to be allowed as well, and
    /// no step may take a heading masked out of its origin tile.
    pub(crate) fn search(
        &self,
        start: TileCoord,
        end: TileCoord,
        allowed: NodeKindSet,
    ) -> Option<Vec<TileCoord>> {
        let start_index = self.index(start)?;
        let end_index = self.index(end)?;
        if !allowed.contains(self.nodes[start_index]) || !allowed.contains(self.nodes[end_index]) {
            return None;
        }
        if start_index == end_index {
            return Some(vec![start]);
        }

        let mut best = vec![u32::MAX; self.nodes.len()];
        let mut came_from: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut closed = vec![false; self.nodes.len()];
        let mut open = BinaryHeap::new();

        best[start_index] = 0;
        let h = octile(start, end);
        open.push(Reverse((h, h, start_index)));

        let mut expanded = 0_usize;
        while let Some(Reverse((_, _, current_index))) = open.pop() {
            if closed[current_index] {
                continue;
            }
            closed[current_index] = true;
            expanded += 1;

            if current_index == end_index {
                trace!(expanded, "path found");
                return Some(self.reconstruct(&came_from, end_index));
            }

            let current = self.tile_of(current_index);
            for (next, cost) in self.neighbours(current, allowed) {
                let Some(next_index) = self.index(next) else {
                    continue;
                };
                if closed[next_index] {
                    continue;
                }
                let tentative = best[current_index] + cost;
                if tentative < best[next_index] {
                    best[next_index] = tentative;
                    came_from[next_index] = Some(current_index);
                    let h = octile(next, end);
                    open.push(Reverse((tentative + h, h, next_index)));
                }
            }
        }

        trace!(expanded, "no path");
        None
    }

    fn neighbours(
        &self,
        tile: TileCoord,
        allowed: NodeKindSet,
    ) -> impl Iterator<Item = (TileCoord, u32)> + '_ {
        let mask = self.disabled_edges(tile);
        Heading::ALL.into_iter().filter_map(move |heading| {
            if mask.contains(heading) {
                return None;
            }
            let next = tile.step(heading).filter(|next| self.accepts(*next, allowed))?;
            if let Some((vertical, horizontal)) = heading.flanking_sides() {
                let upright = tile.step(vertical.heading())?;
                let beside = tile.step(horizontal.heading())?;
                if !self.accepts(upright, allowed) || !self.accepts(beside, allowed) {
                    return None;
                }
                return Some((next, DIAGONAL_COST));
            }
            Some((next, ORTHOGONAL_COST))
        })
    }

    fn accepts(&self, tile: TileCoord, allowed: NodeKindSet) -> bool {
        self.index(tile)
            .map_or(false, |index| allowed.contains(self.nodes[index]))
    }

    fn reconstruct(&self, came_from: &[Option<usize>], end_index: usize) -> Vec<TileCoord> {
        let mut path = vec![self.tile_of(end_index)];
        let mut cursor = end_index;
        while let Some(previous) = came_from[cursor] {
            path.push(self.tile_of(previous));
            cursor = previous;
        }
        path.reverse();
        path
    }

    fn tile_at(&self, position: Vec2) -> Option<TileCoord> {
        TileCoord::containing(position).filter(|tile| self.index(*tile).is_some())
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() >= self.columns || tile.row() >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(tile.row()).ok()?;
        let column = usize::try_from(tile.column()).ok()?;
        Some(row * width + column)
    }

    fn tile_of(&self, index: usize) -> TileCoord {
        let width = self.columns.max(1) as usize;
        TileCoord::new((index % width) as u32, (index / width) as u32)
    }
}

fn octile(from: TileCoord, to: TileCoord) -> u32 {
    let dx = from.column().abs_diff(to.column());
    let dy = from.row().abs_diff(to.row());
    ORTHOGONAL_COST * dx.max(dy) + (DIAGONAL_COST - ORTHOGONAL_COST) * dx.min(dy)
}

/// Greedy string-pulling: drops every waypoint a straight walkable segment can skip.
///
/// The first and last waypoints are always kept and the result is a
/// subsequence of `path`. Paths with fewer than three waypoints are returned
/// unchanged.
pub fn optimise_path<F>(path: &[Vec2], mut is_walkable: F) -> Vec<Vec2>
where
    F: FnMut(Vec2, Vec2) -> bool,
{
    if path.len() < 3 {
        return path.to_vec();
    }

    let mut optimised = vec![path[0]];
    let mut anchor = path[0];
    for window in path.windows(2).skip(1) {
        let (candidate, next) = (window[0], window[1]);
        if !is_walkable(anchor, next) {
            optimised.push(candidate);
            anchor = candidate;
        }
    }
    optimised.push(path[path.len() - 1]);
    optimised
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::MoverId;

    fn open_grid(columns: u32, rows: u32) -> PathfindingGrid {
        PathfindingGrid::new(columns, rows)
    }

    fn pending(sequence: u32, start: TileCoord, end: TileCoord) -> PendingSearch {
        PendingSearch {
            request: PathRequestId::new(MoverId::new(1), sequence),
            start: start.center(),
            end: end.center(),
            options: PathOptions::default(),
        }
    }

    #[test]
    fn straight_search_walks_the_row() {
        let grid = open_grid(5, 1);
        let path = grid
            .search(TileCoord::new(0, 0), TileCoord::new(4, 0), NodeKindSet::OPEN)
            .expect("path");
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&TileCoord::new(0, 0)));
        assert_eq!(path.last(), Some(&TileCoord::new(4, 0)));
    }

    #[test]
    fn same_tile_search_returns_single_node() {
        let grid = open_grid(3, 3);
        assert_eq!(
            grid.search(TileCoord::new(1, 1), TileCoord::new(1, 1), NodeKindSet::OPEN),
            Some(vec![TileCoord::new(1, 1)])
        );
    }

    #[test]
    fn diagonal_search_prefers_diagonal_steps() {
        let grid = open_grid(4, 4);
        let path = grid
            .search(TileCoord::new(0, 0), TileCoord::new(3, 3), NodeKindSet::OPEN)
            .expect("path");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn diagonal_steps_do_not_cut_corners() {
        let mut grid = open_grid(2, 2);
        grid.set_node(TileCoord::new(1, 0), NodeKind::Closed);
        let path = grid
            .search(TileCoord::new(0, 0), TileCoord::new(1, 1), NodeKindSet::OPEN)
            .expect("path");
        assert_eq!(
            path,
            vec![TileCoord::new(0, 0), TileCoord::new(0, 1), TileCoord::new(1, 1)]
        );
    }

    #[test]
    fn masked_headings_are_not_taken() {
        let mut grid = open_grid(2, 1);
        grid.disable_edges(TileCoord::new(0, 0), HeadingMask::EMPTY.with(Heading::East));
        assert_eq!(
            grid.search(TileCoord::new(0, 0), TileCoord::new(1, 0), NodeKindSet::OPEN),
            None
        );
    }

    #[test]
    fn path_kind_only_searches_stay_on_walkways() {
        let mut grid = open_grid(3, 2);
        for column in 0..3 {
            grid.set_node(TileCoord::new(column, 1), NodeKind::Path);
        }
        let allowed = NodeKindSet::OPEN.with(NodeKind::Path);
        assert!(grid
            .search(TileCoord::new(0, 1), TileCoord::new(2, 1), allowed)
            .is_some());
        assert_eq!(
            grid.search(TileCoord::new(0, 1), TileCoord::new(2, 1), NodeKindSet::OPEN),
            None
        );
    }

    #[test]
    fn short_circuits_do_not_spend_the_budget() {
        let mut grid = open_grid(3, 3);
        grid.set_node(TileCoord::new(2, 2), NodeKind::Closed);
        grid.submit(pending(1, TileCoord::new(0, 0), TileCoord::new(2, 2)));
        grid.submit(pending(2, TileCoord::new(0, 0), TileCoord::new(9, 9)));
        grid.submit(pending(3, TileCoord::new(0, 0), TileCoord::new(1, 1)));
        grid.submit(pending(4, TileCoord::new(0, 0), TileCoord::new(2, 0)));

        let resolved = grid.resolve_pending(1);
        let sequences: Vec<u32> = resolved
            .iter()
            .map(|(search, _)| search.request.sequence())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(resolved[0].1.is_none());
        assert!(resolved[1].1.is_none());
        assert!(resolved[2].1.is_some());
        assert_eq!(grid.pending_len(), 1);

        let rest = grid.resolve_pending(1);
        assert_eq!(rest.len(), 1);
        assert_eq!(grid.pending_len(), 0);
    }

    #[test]
    fn optimise_keeps_short_paths() {
        let path = vec![Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5)];
        assert_eq!(optimise_path(&path, |_, _| false), path);
    }

    #[test]
    fn optimise_collapses_fully_walkable_paths() {
        let path: Vec<Vec2> = (0..5).map(|x| Vec2::new(x as f32 + 0.5, 0.5)).collect();
        assert_eq!(optimise_path(&path, |_, _| true), vec![path[0], path[4]]);
    }

    #[test]
    fn optimise_keeps_corners_the_line_cannot_skip() {
        let path = vec![
            Vec2::new(0.5, 0.5),
            Vec2::new(1.5, 0.5),
            Vec2::new(2.5, 0.5),
            Vec2::new(2.5, 1.5),
            Vec2::new(2.5, 2.5),
        ];
        // Only segments sharing a row or column are walkable.
        let result = optimise_path(&path, |a, b| a.x == b.x || a.y == b.y);
        assert_eq!(result, vec![path[0], path[2], path[4]]);
    }
}
