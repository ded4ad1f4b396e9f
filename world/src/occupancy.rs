//! Per-tile solidity bookkeeping and straight-line walkability tests.

use warren_core::{CornerCoord, Heading, NodeKind, Side, TileCoord, Vec2, WallSlotCoord};

/// Obstructions living on tile edges rather than on tiles.
pub(crate) trait EdgeObstacles {
    /// Reports whether a wall blocks crossing the given edge.
    fn blocks_edge(&self, slot: WallSlotCoord) -> bool;

    /// Reports whether anything standing on the corner blocks passing through it.
    fn blocks_corner(&self, corner: CornerCoord) -> bool;
}

#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    columns: u32,
    rows: u32,
    solid: Vec<bool>,
    paved: Vec<bool>,
}

impl OccupancyGrid {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            solid: vec![false; capacity],
            paved: vec![false; capacity],
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub(crate) fn contains(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    pub(crate) fn is_position_in_map(&self, position: Vec2) -> bool {
        self.tile_at(position).is_some()
    }

    pub(crate) fn tile_at(&self, position: Vec2) -> Option<TileCoord> {
        TileCoord::containing(position).filter(|tile| self.contains(*tile))
    }

    pub(crate) fn is_tile_free(&self, tile: TileCoord) -> bool {
        self.index(tile)
            .and_then(|index| self.solid.get(index).copied())
            .map_or(false, |solid| !solid)
    }

    /// Updates solidity, returning whether anything changed.
    pub(crate) fn set_solid(&mut self, tile: TileCoord, solid: bool) -> bool {
        let Some(slot) = self.index(tile).and_then(|index| self.solid.get_mut(index)) else {
            return false;
        };
        if *slot == solid {
            return false;
        }
        *slot = solid;
        true
    }

    /// Updates the walkway tag, returning whether anything changed.
    pub(crate) fn set_paved(&mut self, tile: TileCoord, paved: bool) -> bool {
        let Some(slot) = self.index(tile).and_then(|index| self.paved.get_mut(index)) else {
            return false;
        };
        if *slot == paved {
            return false;
        }
        *slot = paved;
        true
    }

    /// Pathfinding node kind implied by the tile's solidity and surface.
    pub(crate) fn node_kind(&self, tile: TileCoord) -> NodeKind {
        let Some(index) = self.index(tile) else {
            return NodeKind::Closed;
        };
        if self.solid[index] {
            NodeKind::Closed
        } else if self.paved[index] {
            NodeKind::Path
        } else {
            NodeKind::Open
        }
    }

    pub(crate) fn solid_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles_where(&self.solid)
    }

    pub(crate) fn paved_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles_where(&self.paved)
    }

    /// Walks consecutive waypoint pairs, failing on the first blocked segment.
    pub(crate) fn check_path<E: EdgeObstacles>(&self, waypoints: &[Vec2], edges: &E) -> bool {
        waypoints
            .windows(2)
            .all(|pair| self.is_line_walkable(pair[0], pair[1], edges))
    }

    /// Rasterises the segment tile by tile and checks every crossing.
    ///
    /// Uses the integer supercover traversal between the tiles holding the
    /// endpoints: each step crosses exactly one tile edge, or passes exactly
    /// through a tile corner when the error term is zero. A corner crossing
    /// requires both flanking tiles to be free and nothing standing on the
    /// corner, mirroring the search's ban on corner cutting.
    pub(crate) fn is_line_walkable<E: EdgeObstacles>(
        &self,
        from: Vec2,
        to: Vec2,
        edges: &E,
    ) -> bool {
        let (Some(start), Some(end)) = (self.tile_at(from), self.tile_at(to)) else {
            return false;
        };
        if !self.is_tile_free(start) {
            return false;
        }

        let dx = i64::from(start.column().abs_diff(end.column()));
        let dy = i64::from(start.row().abs_diff(end.row()));
        let horizontal = if end.column() > start.column() {
            Side::East
        } else {
            Side::West
        };
        let vertical = if end.row() > start.row() {
            Side::South
        } else {
            Side::North
        };

        let mut error = dx - dy;
        let mut tile = start;
        let mut remaining = dx + dy;

        while tile != end && remaining > 0 {
            let next = if error > 0 {
                error -= 2 * dy;
                remaining -= 1;
                self.cross_edge(tile, horizontal, edges)
            } else if error < 0 {
                error += 2 * dx;
                remaining -= 1;
                self.cross_edge(tile, vertical, edges)
            } else {
                error += 2 * dx - 2 * dy;
                remaining -= 2;
                self.cross_corner(tile, horizontal, vertical, edges)
            };

            let Some(next) = next else {
                return false;
            };
            if !self.is_tile_free(next) {
                return false;
            }
            tile = next;
        }

        tile == end
    }

    fn cross_edge<E: EdgeObstacles>(
        &self,
        tile: TileCoord,
        side: Side,
        edges: &E,
    ) -> Option<TileCoord> {
        if edges.blocks_edge(WallSlotCoord::for_tile_side(tile, side)) {
            return None;
        }
        tile.step(side.heading()).filter(|next| self.contains(*next))
    }

    fn cross_corner<E: EdgeObstacles>(
        &self,
        tile: TileCoord,
        horizontal: Side,
        vertical: Side,
        edges: &E,
    ) -> Option<TileCoord> {
        if edges.blocks_corner(tile_corner(tile, horizontal, vertical)) {
            return None;
        }
        let beside = tile.step(horizontal.heading())?;
        let above = tile.step(vertical.heading())?;
        if !self.is_tile_free(beside) || !self.is_tile_free(above) {
            return None;
        }
        beside
            .step(vertical.heading())
            .filter(|next| self.contains(*next))
    }

    fn tiles_where<'a>(&'a self, flags: &'a [bool]) -> impl Iterator<Item = TileCoord> + 'a {
        let columns = self.columns.max(1);
        flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(TileCoord::new(index % columns, index / columns))
            })
    }

    pub(crate) fn index(&self, tile: TileCoord) -> Option<usize> {
        if self.contains(tile) {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Lattice corner of `tile` lying between the given horizontal and vertical sides.
pub(crate) fn tile_corner(tile: TileCoord, horizontal: Side, vertical: Side) -> CornerCoord {
    let column = tile.column() + u32::from(horizontal == Side::East);
    let row = tile.row() + u32::from(vertical == Side::South);
    CornerCoord::from_grid(column, row)
}

/// Lattice corner a diagonal heading passes through when leaving `tile`.
pub(crate) fn diagonal_corner(tile: TileCoord, heading: Heading) -> Option<CornerCoord> {
    let (vertical, horizontal) = heading.flanking_sides()?;
    Some(tile_corner(tile, horizontal, vertical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct Walls {
        edges: BTreeSet<WallSlotCoord>,
    }

    impl EdgeObstacles for Walls {
        fn blocks_edge(&self, slot: WallSlotCoord) -> bool {
            self.edges.contains(&slot)
        }

        fn blocks_corner(&self, corner: CornerCoord) -> bool {
            corner.slots().any(|slot| self.edges.contains(&slot))
        }
    }

    #[test]
    fn tile_free_requires_bounds_and_clear_tile() {
        let mut grid = OccupancyGrid::new(3, 2);
        assert!(grid.is_tile_free(TileCoord::new(2, 1)));
        assert!(!grid.is_tile_free(TileCoord::new(3, 1)));
        assert!(grid.set_solid(TileCoord::new(2, 1), true));
        assert!(!grid.set_solid(TileCoord::new(2, 1), true));
        assert!(!grid.is_tile_free(TileCoord::new(2, 1)));
        assert!(!OccupancyGrid::new(0, 0).is_tile_free(TileCoord::new(0, 0)));
    }

    #[test]
    fn node_kind_prefers_solidity_over_surface() {
        let mut grid = OccupancyGrid::new(2, 2);
        let tile = TileCoord::new(1, 0);
        assert!(grid.set_paved(tile, true));
        assert_eq!(grid.node_kind(tile), NodeKind::Path);
        assert!(grid.set_solid(tile, true));
        assert_eq!(grid.node_kind(tile), NodeKind::Closed);
        assert!(grid.set_solid(tile, false));
        assert_eq!(grid.node_kind(tile), NodeKind::Path);
    }

    #[test]
    fn straight_line_stops_at_solid_tile() {
        let mut grid = OccupancyGrid::new(5, 1);
        let walls = Walls::default();
        let from = TileCoord::new(0, 0).center();
        let to = TileCoord::new(4, 0).center();
        assert!(grid.is_line_walkable(from, to, &walls));
        assert!(grid.set_solid(TileCoord::new(2, 0), true));
        assert!(!grid.is_line_walkable(from, to, &walls));
    }

    #[test]
    fn straight_line_stops_at_wall_edge() {
        let grid = OccupancyGrid::new(3, 3);
        let mut walls = Walls::default();
        let _ = walls
            .edges
            .insert(WallSlotCoord::for_tile_side(TileCoord::new(1, 1), Side::South));
        let from = TileCoord::new(1, 0).center();
        let to = TileCoord::new(1, 2).center();
        assert!(!grid.is_line_walkable(from, to, &walls));
        assert!(grid.is_line_walkable(from, TileCoord::new(1, 1).center(), &walls));
    }

    #[test]
    fn diagonal_through_corner_requires_free_flanks() {
        let mut grid = OccupancyGrid::new(2, 2);
        let walls = Walls::default();
        let from = TileCoord::new(0, 0).center();
        let to = TileCoord::new(1, 1).center();
        assert!(grid.is_line_walkable(from, to, &walls));
        assert!(grid.set_solid(TileCoord::new(1, 0), true));
        assert!(!grid.is_line_walkable(from, to, &walls));
    }

    #[test]
    fn shallow_line_visits_every_crossed_tile() {
        let mut grid = OccupancyGrid::new(4, 2);
        let walls = Walls::default();
        let from = TileCoord::new(0, 0).center();
        let to = TileCoord::new(3, 1).center();
        assert!(grid.is_line_walkable(from, to, &walls));
        assert!(grid.set_solid(TileCoord::new(1, 0), true));
        assert!(!grid.is_line_walkable(from, to, &walls));
    }

    #[test]
    fn check_path_fails_when_any_segment_fails() {
        let mut grid = OccupancyGrid::new(3, 3);
        let walls = Walls::default();
        let waypoints = [
            TileCoord::new(0, 0).center(),
            TileCoord::new(2, 0).center(),
            TileCoord::new(2, 2).center(),
        ];
        assert!(grid.check_path(&waypoints, &walls));
        assert!(grid.set_solid(TileCoord::new(2, 1), true));
        assert!(!grid.check_path(&waypoints, &walls));
    }

    #[test]
    fn solid_tiles_lists_marked_tiles() {
        let mut grid = OccupancyGrid::new(3, 2);
        assert!(grid.set_solid(TileCoord::new(2, 1), true));
        assert!(grid.set_solid(TileCoord::new(0, 0), true));
        let solid: Vec<_> = grid.solid_tiles().collect();
        assert_eq!(solid, vec![TileCoord::new(0, 0), TileCoord::new(2, 1)]);
    }
}
