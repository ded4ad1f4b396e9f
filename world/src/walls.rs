//! Sparse storage of wall slots on the doubled-resolution lattice.

use std::collections::{BTreeMap, BTreeSet};

use warren_core::{
    CornerCoord, Heading, HeadingMask, Side, TileCoord, Vec2, WallOrientation, WallRecord,
    WallSlotCoord, WallSpec,
};

use crate::occupancy::{diagonal_corner, EdgeObstacles};

/// A wall or door occupying one tile edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallSlot {
    coord: WallSlotCoord,
    spec: WallSpec,
    door: bool,
}

impl WallSlot {
    pub(crate) fn new(coord: WallSlotCoord, spec: WallSpec, door: bool) -> Self {
        Self { coord, spec, door }
    }

    /// Lattice address of the slot.
    #[must_use]
    pub fn coord(&self) -> WallSlotCoord {
        self.coord
    }

    /// Asset reference the wall is drawn with.
    #[must_use]
    pub fn spec(&self) -> &WallSpec {
        &self.spec
    }

    /// Reports whether movers may pass through the slot.
    #[must_use]
    pub fn is_door(&self) -> bool {
        self.door
    }

    /// Axis along which the slot runs.
    #[must_use]
    pub fn orientation(&self) -> WallOrientation {
        self.coord.orientation()
    }

    /// World-space midpoint of the slot.
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        self.coord.world_position()
    }

    pub(crate) fn record(&self) -> WallRecord {
        WallRecord {
            slot: self.coord,
            spec: self.spec.clone(),
            door: self.door,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct WallLattice {
    columns: u32,
    rows: u32,
    slots: BTreeMap<WallSlotCoord, WallSlot>,
}

impl WallLattice {
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            slots: BTreeMap::new(),
        }
    }

    /// Lattice address of a tile side, provided the tile lies on the map.
    pub(crate) fn slot_for(&self, tile: TileCoord, side: Side) -> Option<WallSlotCoord> {
        (tile.column() < self.columns && tile.row() < self.rows)
            .then(|| WallSlotCoord::for_tile_side(tile, side))
    }

    pub(crate) fn get(&self, slot: WallSlotCoord) -> Option<&WallSlot> {
        self.slots.get(&slot)
    }

    pub(crate) fn wall_at_tile(&self, tile: TileCoord, side: Side) -> Option<&WallSlot> {
        self.slot_for(tile, side).and_then(|slot| self.get(slot))
    }

    pub(crate) fn has_slot(&self, slot: WallSlotCoord) -> bool {
        self.slots.contains_key(&slot)
    }

    pub(crate) fn is_door(&self, slot: WallSlotCoord) -> bool {
        self.get(slot).map_or(false, WallSlot::is_door)
    }

    /// Stores the slot unless its edge is already occupied.
    pub(crate) fn insert(&mut self, wall: WallSlot) -> bool {
        if self.slots.contains_key(&wall.coord) {
            return false;
        }
        let _ = self.slots.insert(wall.coord, wall);
        true
    }

    pub(crate) fn remove(&mut self, slot: WallSlotCoord) -> Option<WallSlot> {
        self.slots.remove(&slot)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WallSlot> + '_ {
        self.slots.values()
    }

    /// Sides of `tile` closed by a wall that is not a door.
    pub(crate) fn walled_sides(&self, tile: TileCoord) -> Vec<Side> {
        Side::ALL
            .into_iter()
            .filter(|side| {
                self.wall_at_tile(tile, *side)
                    .map_or(false, |wall| !wall.door)
            })
            .collect()
    }

    /// Headings that may not be taken out of `tile`.
    ///
    /// An orthogonal heading is blocked by a wall on that side; doors stay
    /// passable. A diagonal heading is blocked by any slot, door or not,
    /// meeting the corner it passes through.
    pub(crate) fn blocked_headings(&self, tile: TileCoord) -> HeadingMask {
        Heading::ALL
            .into_iter()
            .filter(|heading| match heading.flanking_sides() {
                None => {
                    let side = orthogonal_side(*heading);
                    self.blocks_edge(WallSlotCoord::for_tile_side(tile, side))
                }
                Some(_) => diagonal_corner(tile, *heading)
                    .map_or(false, |corner| self.blocks_corner(corner)),
            })
            .collect()
    }

    /// On-map tiles touching either endpoint corner of the slot.
    pub(crate) fn tiles_around(&self, slot: WallSlotCoord) -> BTreeSet<TileCoord> {
        slot.endpoints()
            .iter()
            .flat_map(CornerCoord::touching_tiles)
            .filter(|tile| tile.column() < self.columns && tile.row() < self.rows)
            .collect()
    }

    /// Existing slots sharing an endpoint corner with `slot`.
    pub(crate) fn adjacent_walls(&self, slot: WallSlotCoord) -> Vec<&WallSlot> {
        let neighbours: BTreeSet<WallSlotCoord> = slot
            .endpoints()
            .iter()
            .flat_map(CornerCoord::slots)
            .filter(|candidate| *candidate != slot)
            .collect();
        neighbours
            .into_iter()
            .filter_map(|candidate| self.get(candidate))
            .collect()
    }

    /// Slots whose midpoint lies within `radius` of `position`.
    pub(crate) fn walls_in_radius(&self, position: Vec2, radius: f32) -> Vec<&WallSlot> {
        self.slots
            .values()
            .filter(|wall| wall.world_position().distance(position) <= radius)
            .collect()
    }

    pub(crate) fn is_border(&self, corner: CornerCoord) -> bool {
        corner.column() == 0
            || corner.row() == 0
            || corner.column() == self.columns * 2
            || corner.row() == self.rows * 2
    }

    /// Cheap prefilter: a new slot can only close a loop when both of its
    /// endpoint corners already touch another slot or the map border.
    pub(crate) fn should_check_for_loop(&self, slot: WallSlotCoord) -> bool {
        slot.endpoints().iter().all(|corner| {
            self.is_border(*corner)
                || corner
                    .slots()
                    .any(|other| other != slot && self.has_slot(other))
        })
    }

    /// Reports whether `slot` closes a cycle of walls.
    ///
    /// Walks the corner graph formed by every other slot. The map border
    /// acts as one continuous wall joining all border corners.
    pub(crate) fn check_for_loop(&self, slot: WallSlotCoord) -> bool {
        let [first, second] = slot.endpoints();
        let on_border = |corner: CornerCoord| self.is_border(corner);
        match (self.is_border(first), self.is_border(second)) {
            (true, true) => true,
            (true, false) => self.reaches(slot, second, on_border),
            (false, true) => self.reaches(slot, first, on_border),
            (false, false) => {
                self.reaches(slot, first, |corner| corner == second)
                    || (self.reaches(slot, first, on_border)
                        && self.reaches(slot, second, on_border))
            }
        }
    }

    fn reaches<F>(&self, excluded: WallSlotCoord, from: CornerCoord, mut is_goal: F) -> bool
    where
        F: FnMut(CornerCoord) -> bool,
    {
        let mut visited = BTreeSet::from([from]);
        let mut stack = vec![from];

        while let Some(corner) = stack.pop() {
            if is_goal(corner) {
                return true;
            }
            for slot in corner.slots() {
                if slot == excluded || !self.has_slot(slot) {
                    continue;
                }
                let next = corner.across(slot);
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        false
    }
}

impl EdgeObstacles for WallLattice {
    fn blocks_edge(&self, slot: WallSlotCoord) -> bool {
        self.get(slot).map_or(false, |wall| !wall.door)
    }

    fn blocks_corner(&self, corner: CornerCoord) -> bool {
        corner.slots().any(|slot| self.has_slot(slot))
    }
}

fn orthogonal_side(heading: Heading) -> Side {
    match heading {
        Heading::North => Side::North,
        Heading::East => Side::East,
        Heading::South => Side::South,
        _ => Side::West,
    }
}
