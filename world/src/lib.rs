#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Warren tile model.
//!
//! The world owns the occupancy grid, the pathfinding grid, the wall lattice
//! and the area partition. Every mutation arrives as a [`Command`] through
//! [`apply`], which reports what happened as [`Event`] values; systems read
//! the state back through [`query`].

mod areas;
mod config;
mod layout;
mod occupancy;
mod partition;
mod pathfinding;
mod walls;

use tracing::{debug, trace};
use warren_core::{
    Command, Event, HeadingMask, PathOptions, PathRequestId, Side, TileCoord, Vec2,
    WallEditRejection, WallSlotCoord, WallSpec,
};

pub use areas::Area;
pub use config::{WorldConfig, MAX_GRID_DIMENSION};
pub use layout::LayoutError;
pub use pathfinding::optimise_path;
pub use walls::WallSlot;

use areas::AreaSet;
use occupancy::OccupancyGrid;
use pathfinding::{PathfindingGrid, PendingSearch};
use walls::WallLattice;

/// Represents the authoritative Warren world state.
#[derive(Clone, Debug)]
pub struct World {
    config: WorldConfig,
    occupancy: OccupancyGrid,
    pathfinding: PathfindingGrid,
    walls: WallLattice,
    areas: AreaSet,
    tick_index: u64,
}

impl World {
    /// Creates a world using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world laid out according to `config`.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let WorldConfig { columns, rows, .. } = config;
        Self {
            config,
            occupancy: OccupancyGrid::new(columns, rows),
            pathfinding: PathfindingGrid::new(columns, rows),
            walls: WallLattice::new(columns, rows),
            areas: AreaSet::new(columns, rows),
            tick_index: 0,
        }
    }

    fn configure(&mut self, columns: u32, rows: u32) {
        self.config = self.config.with_dimensions(columns, rows);
        self.occupancy = OccupancyGrid::new(columns, rows);
        self.pathfinding.resize(columns, rows);
        self.walls = WallLattice::new(columns, rows);
        self.areas = AreaSet::new(columns, rows);
    }

    /// Marks `tile` solid or clear, returning whether anything changed.
    ///
    /// Becoming solid also announces [`Event::SolidPlaced`] so in-flight
    /// paths can be re-checked.
    pub fn set_tile_solid(
        &mut self,
        tile: TileCoord,
        solid: bool,
        out_events: &mut Vec<Event>,
    ) -> bool {
        if !self.occupancy.set_solid(tile, solid) {
            return false;
        }
        self.pathfinding.set_node(tile, self.occupancy.node_kind(tile));
        trace!(column = tile.column(), row = tile.row(), solid, "tile solidity changed");

        out_events.push(Event::TileSolidityChanged { tile, solid });
        if solid {
            out_events.push(Event::SolidPlaced {
                position: tile.center(),
            });
        }
        true
    }

    /// Tags `tile` as part of a preferred walkway, returning whether anything changed.
    ///
    /// Solid tiles keep the tag and expose it again once cleared.
    pub fn set_tile_surface(&mut self, tile: TileCoord, paved: bool) -> bool {
        if !self.occupancy.set_paved(tile, paved) {
            return false;
        }
        self.pathfinding.set_node(tile, self.occupancy.node_kind(tile));
        true
    }

    /// Replaces the headings that may not be taken out of `tile`.
    pub fn set_tile_access(&mut self, tile: TileCoord, blocked: HeadingMask) {
        self.pathfinding.disable_edges(tile, blocked);
    }

    /// Places a wall or door on `side` of `tile`.
    ///
    /// Returns `None` when the tile is off the map or the edge is already
    /// occupied. A wall that closes a loop splits the enclosing area.
    pub fn place_wall_at_tile(
        &mut self,
        tile: TileCoord,
        side: Side,
        spec: WallSpec,
        door: bool,
        out_events: &mut Vec<Event>,
    ) -> Option<WallSlot> {
        let Some(slot) = self.walls.slot_for(tile, side) else {
            reject(tile, side, WallEditRejection::OutOfBounds, out_events);
            return None;
        };
        let wall = WallSlot::new(slot, spec, door);
        if !self.walls.insert(wall.clone()) {
            reject(tile, side, WallEditRejection::Occupied, out_events);
            return None;
        }

        self.refresh_access(slot);
        out_events.push(Event::WallPlaced { slot, door });
        out_events.push(Event::SolidPlaced {
            position: slot.world_position(),
        });

        if self.walls.should_check_for_loop(slot) && self.walls.check_for_loop(slot) {
            if let Some((parent, created)) = partition::split(&mut self.areas, &self.walls, slot) {
                out_events.push(Event::AreaSplit { parent, created });
            }
        }
        if door {
            self.refresh_door_links(slot);
        }

        Some(wall)
    }

    /// Removes the wall on `side` of `tile`.
    ///
    /// Returns `None` when the tile is off the map or no wall exists there.
    /// Opening an edge between two areas merges them.
    pub fn delete_wall_at_tile(
        &mut self,
        tile: TileCoord,
        side: Side,
        out_events: &mut Vec<Event>,
    ) -> Option<WallSlot> {
        let Some(slot) = self.walls.slot_for(tile, side) else {
            reject(tile, side, WallEditRejection::OutOfBounds, out_events);
            return None;
        };
        let Some(wall) = self.walls.remove(slot) else {
            reject(tile, side, WallEditRejection::Missing, out_events);
            return None;
        };

        self.refresh_access(slot);
        out_events.push(Event::WallRemoved { slot });

        if let Some((survivor, absorbed)) = partition::merge(&mut self.areas, &self.walls, slot) {
            out_events.push(Event::AreaMerged { survivor, absorbed });
        }
        if wall.is_door() {
            self.refresh_door_links(slot);
        }

        Some(wall)
    }

    fn refresh_access(&mut self, slot: WallSlotCoord) {
        for tile in self.walls.tiles_around(slot) {
            let blocked = self.walls.blocked_headings(tile);
            self.set_tile_access(tile, blocked);
        }
    }

    fn refresh_door_links(&mut self, slot: WallSlotCoord) {
        let (before, after) = slot.adjacent_tiles();
        let mut affected: Vec<_> = before
            .into_iter()
            .chain([after])
            .filter_map(|tile| self.areas.area_at(tile))
            .collect();
        affected.dedup();
        self.areas.rebuild_connections(&affected, &self.walls);
    }

    fn request_path(
        &mut self,
        request: PathRequestId,
        start: Vec2,
        end: Vec2,
        options: PathOptions,
    ) {
        self.pathfinding.submit(PendingSearch {
            request,
            start,
            end,
            options,
        });
    }

    fn resolve_paths(&mut self, out_events: &mut Vec<Event>) {
        let resolved = self.pathfinding.resolve_pending(self.config.search_budget());
        for (search, tiles) in resolved {
            let waypoints = tiles.map(|tiles| self.waypoints(&tiles, search.options));
            debug!(
                request = ?search.request,
                found = waypoints.is_some(),
                "path resolved"
            );
            out_events.push(Event::PathResolved {
                request: search.request,
                waypoints,
            });
        }
    }

    fn waypoints(&self, tiles: &[TileCoord], options: PathOptions) -> Vec<Vec2> {
        let centres: Vec<Vec2> = tiles.iter().map(|tile| tile.center()).collect();
        if options.optimise {
            optimise_path(&centres, |from, to| {
                self.occupancy.is_line_walkable(from, to, &self.walls)
            })
        } else {
            centres
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(tile: TileCoord, side: Side, reason: WallEditRejection, out_events: &mut Vec<Event>) {
    debug!(
        column = tile.column(),
        row = tile.row(),
        ?side,
        ?reason,
        "wall edit rejected"
    );
    out_events.push(Event::WallEditRejected { tile, side, reason });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureMap { columns, rows } => {
            world.configure(columns, rows);
            out_events.push(Event::MapConfigured {
                columns,
                rows,
                root: world.areas.root(),
            });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.resolve_paths(out_events);
        }
        Command::SetTileSolid { tile, solid } => {
            let _ = world.set_tile_solid(tile, solid, out_events);
        }
        Command::SetTileSurface { tile, paved } => {
            let _ = world.set_tile_surface(tile, paved);
        }
        Command::PlaceWall {
            tile,
            side,
            spec,
            door,
        } => {
            let _ = world.place_wall_at_tile(tile, side, spec, door, out_events);
        }
        Command::DeleteWall { tile, side } => {
            let _ = world.delete_wall_at_tile(tile, side, out_events);
        }
        Command::RequestPath {
            request,
            start,
            end,
            options,
        } => world.request_path(request, start, end, options),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use warren_core::{
        AreaId, HeadingMask, NodeKind, PathOptions, Side, TileCoord, Vec2, WallSlotCoord,
    };

    use super::{Area, WallSlot, World};

    /// Number of tile columns and rows in the map.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        world.occupancy.dimensions()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether `tile` lies on the map and is not solid.
    #[must_use]
    pub fn is_tile_free(world: &World, tile: TileCoord) -> bool {
        world.occupancy.is_tile_free(tile)
    }

    /// Reports whether a world-space position lies on the map.
    #[must_use]
    pub fn is_position_in_map(world: &World, position: Vec2) -> bool {
        world.occupancy.is_position_in_map(position)
    }

    /// Tile containing a world-space position, if it lies on the map.
    #[must_use]
    pub fn tile_at(world: &World, position: Vec2) -> Option<TileCoord> {
        world.occupancy.tile_at(position)
    }

    /// Pathfinding node kind of `tile`; off-map tiles read as closed.
    #[must_use]
    pub fn node_kind(world: &World, tile: TileCoord) -> NodeKind {
        world.pathfinding.node(tile)
    }

    /// Headings a search may not take out of `tile`.
    #[must_use]
    pub fn blocked_headings(world: &World, tile: TileCoord) -> HeadingMask {
        world.pathfinding.disabled_edges(tile)
    }

    /// Reports whether a mover can walk a straight line between two positions.
    #[must_use]
    pub fn is_line_walkable(world: &World, from: Vec2, to: Vec2) -> bool {
        world.occupancy.is_line_walkable(from, to, &world.walls)
    }

    /// Reports whether every consecutive pair of waypoints is walkable.
    #[must_use]
    pub fn check_path(world: &World, waypoints: &[Vec2]) -> bool {
        world.occupancy.check_path(waypoints, &world.walls)
    }

    /// Runs a grid search immediately, bypassing the per-tick request queue.
    #[must_use]
    pub fn find_path(
        world: &World,
        start: Vec2,
        end: Vec2,
        options: PathOptions,
    ) -> Option<Vec<Vec2>> {
        let start = world.occupancy.tile_at(start)?;
        let end = world.occupancy.tile_at(end)?;
        let tiles = world.pathfinding.search(start, end, options.allowed)?;
        Some(world.waypoints(&tiles, options))
    }

    /// Number of path requests waiting for a tick.
    #[must_use]
    pub fn pending_path_requests(world: &World) -> usize {
        world.pathfinding.pending_len()
    }

    /// Area containing a world-space position.
    #[must_use]
    pub fn area_at(world: &World, position: Vec2) -> Option<&Area> {
        let tile = world.occupancy.tile_at(position)?;
        world.areas.area_at(tile).and_then(|id| world.areas.area(id))
    }

    /// Identifier of the area containing `tile`.
    #[must_use]
    pub fn area_at_tile(world: &World, tile: TileCoord) -> Option<AreaId> {
        world.areas.area_at(tile)
    }

    /// Looks up a live area by identifier.
    #[must_use]
    pub fn area(world: &World, id: AreaId) -> Option<&Area> {
        world.areas.area(id)
    }

    /// Iterator over every live area in ascending id order.
    pub fn areas(world: &World) -> impl Iterator<Item = &Area> + '_ {
        world.areas.iter()
    }

    /// Number of live areas.
    #[must_use]
    pub fn area_count(world: &World) -> usize {
        world.areas.len()
    }

    /// Fewest-hops sequence of areas joining `from` to `to` through doors.
    #[must_use]
    pub fn area_route(world: &World, from: AreaId, to: AreaId) -> Option<Vec<AreaId>> {
        world.areas.route(from, to)
    }

    /// Reports whether every tile belongs to exactly one live area.
    #[must_use]
    pub fn partition_holds(world: &World) -> bool {
        world.areas.partition_holds()
    }

    /// Wall occupying `side` of `tile`, if any.
    #[must_use]
    pub fn wall_at_tile(world: &World, tile: TileCoord, side: Side) -> Option<&WallSlot> {
        world.walls.wall_at_tile(tile, side)
    }

    /// Wall stored at a lattice address, if any.
    #[must_use]
    pub fn wall_at(world: &World, slot: WallSlotCoord) -> Option<&WallSlot> {
        world.walls.get(slot)
    }

    /// Iterator over every wall in lattice order.
    pub fn walls(world: &World) -> impl Iterator<Item = &WallSlot> + '_ {
        world.walls.iter()
    }

    /// Sides of `tile` closed by a wall that is not a door.
    #[must_use]
    pub fn walled_sides(world: &World, tile: TileCoord) -> Vec<Side> {
        world.walls.walled_sides(tile)
    }

    /// Walls sharing an endpoint corner with `slot`.
    #[must_use]
    pub fn adjacent_walls(world: &World, slot: WallSlotCoord) -> Vec<&WallSlot> {
        world.walls.adjacent_walls(slot)
    }

    /// Walls whose midpoint lies within `radius` of `position`.
    #[must_use]
    pub fn walls_in_radius(world: &World, position: Vec2, radius: f32) -> Vec<&WallSlot> {
        world.walls.walls_in_radius(position, radius)
    }
}
