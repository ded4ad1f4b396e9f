//! Arena of areas partitioning the map's tiles.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use warren_core::{AreaColor, AreaId, Side, TileCoord, WallSlotCoord};

use crate::walls::WallLattice;

const ROOT_AREA_NAME: &str = "Outside";

const AREA_PALETTE: [AreaColor; 8] = [
    AreaColor::from_rgb(0x6b, 0x8e, 0x23),
    AreaColor::from_rgb(0xcd, 0x85, 0x3f),
    AreaColor::from_rgb(0x46, 0x82, 0xb4),
    AreaColor::from_rgb(0xb2, 0x22, 0x22),
    AreaColor::from_rgb(0xda, 0xa5, 0x20),
    AreaColor::from_rgb(0x6a, 0x5a, 0xcd),
    AreaColor::from_rgb(0x2e, 0x8b, 0x57),
    AreaColor::from_rgb(0xd2, 0x69, 0x1e),
];

/// Named region of tiles bounded by closed wall loops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Area {
    id: AreaId,
    name: String,
    color: AreaColor,
    member_tiles: BTreeSet<TileCoord>,
    connected: BTreeMap<AreaId, Vec<WallSlotCoord>>,
}

impl Area {
    fn new(id: AreaId, name: String, member_tiles: BTreeSet<TileCoord>) -> Self {
        let color = AREA_PALETTE[id.get() as usize % AREA_PALETTE.len()];
        Self {
            id,
            name,
            color,
            member_tiles,
            connected: BTreeMap::new(),
        }
    }

    /// Identifier of the area.
    #[must_use]
    pub fn id(&self) -> AreaId {
        self.id
    }

    /// Display name of the area.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cosmetic colour of the area.
    #[must_use]
    pub fn color(&self) -> AreaColor {
        self.color
    }

    /// Tiles belonging to the area.
    #[must_use]
    pub fn member_tiles(&self) -> &BTreeSet<TileCoord> {
        &self.member_tiles
    }

    /// Reports whether `tile` belongs to the area.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        self.member_tiles.contains(&tile)
    }

    /// Number of member tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.member_tiles.len()
    }

    /// Areas reachable through at least one door, in ascending id order.
    pub fn connected_areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.connected.keys().copied()
    }

    /// Door slots leading into `other`; empty when the areas do not touch.
    #[must_use]
    pub fn doors_to(&self, other: AreaId) -> &[WallSlotCoord] {
        self.connected.get(&other).map_or(&[], Vec::as_slice)
    }

    fn link(&mut self, other: AreaId, door: WallSlotCoord) {
        let doors = self.connected.entry(other).or_default();
        if !doors.contains(&door) {
            doors.push(door);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct AreaSet {
    columns: u32,
    rows: u32,
    live: BTreeMap<AreaId, Area>,
    next_id: u32,
    tile_areas: Vec<AreaId>,
}

impl AreaSet {
    /// Creates the set with a single root area covering every tile.
    pub(crate) fn new(columns: u32, rows: u32) -> Self {
        let root = AreaId::new(0);
        let tiles: BTreeSet<TileCoord> = (0..rows)
            .flat_map(|row| (0..columns).map(move |column| TileCoord::new(column, row)))
            .collect();
        let tile_areas = vec![root; tiles.len()];
        Self {
            columns,
            rows,
            live: BTreeMap::from([(root, Area::new(root, ROOT_AREA_NAME.to_owned(), tiles))]),
            next_id: root.get() + 1,
            tile_areas,
        }
    }

    pub(crate) fn root(&self) -> AreaId {
        AreaId::new(0)
    }

    pub(crate) fn area_at(&self, tile: TileCoord) -> Option<AreaId> {
        self.index(tile).map(|index| self.tile_areas[index])
    }

    pub(crate) fn area(&self, id: AreaId) -> Option<&Area> {
        self.live.get(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Area> + '_ {
        self.live.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.live.len()
    }

    /// Reports whether `tile` sits in the outermost ring of the map.
    pub(crate) fn on_map_edge(&self, tile: TileCoord) -> bool {
        tile.column() == 0
            || tile.row() == 0
            || tile.column() + 1 == self.columns
            || tile.row() + 1 == self.rows
    }

    /// Moves `tiles` out of `parent` into a freshly allocated area.
    pub(crate) fn carve(&mut self, parent: AreaId, tiles: BTreeSet<TileCoord>) -> AreaId {
        let id = AreaId::new(self.next_id);
        self.next_id += 1;
        for tile in &tiles {
            if let Some(index) = self.index(*tile) {
                self.tile_areas[index] = id;
            }
        }
        if let Some(parent) = self.area_mut(parent) {
            parent.member_tiles.retain(|tile| !tiles.contains(tile));
        }
        let _ = self
            .live
            .insert(id, Area::new(id, format!("Room {}", id.get()), tiles));
        id
    }

    /// Folds every tile of `absorbed` into `survivor` and drops the absorbed area.
    pub(crate) fn absorb(&mut self, survivor: AreaId, absorbed: AreaId) {
        let Some(taken) = self.live.remove(&absorbed) else {
            return;
        };
        for tile in &taken.member_tiles {
            if let Some(index) = self.index(*tile) {
                self.tile_areas[index] = survivor;
            }
        }
        if let Some(survivor) = self.area_mut(survivor) {
            survivor.member_tiles.extend(taken.member_tiles);
        }
    }

    /// Recomputes door adjacency for `affected` from the current walls.
    ///
    /// Entries pointing at the affected areas are first dropped from every
    /// live area, then rebuilt by scanning the affected members' sides for
    /// doors.
    pub(crate) fn rebuild_connections(&mut self, affected: &[AreaId], walls: &WallLattice) {
        for area in self.live.values_mut() {
            if affected.contains(&area.id) {
                area.connected.clear();
            } else {
                area.connected.retain(|other, _| !affected.contains(other));
            }
        }

        let mut links = Vec::new();
        for id in affected {
            let Some(area) = self.area(*id) else {
                continue;
            };
            for tile in &area.member_tiles {
                for side in Side::ALL {
                    let slot = WallSlotCoord::for_tile_side(*tile, side);
                    if !walls.is_door(slot) {
                        continue;
                    }
                    let (before, after) = slot.adjacent_tiles();
                    let (Some(first), Some(second)) =
                        (before.and_then(|tile| self.area_at(tile)), self.area_at(after))
                    else {
                        continue;
                    };
                    if first != second {
                        links.push((first, second, slot));
                    }
                }
            }
        }

        for (first, second, door) in links {
            if let Some(area) = self.area_mut(first) {
                area.link(second, door);
            }
            if let Some(area) = self.area_mut(second) {
                area.link(first, door);
            }
        }
    }

    /// Fewest-hops sequence of areas from `from` to `to` through doors.
    ///
    /// Neighbours are visited in ascending id order, so ties resolve the same
    /// way every time.
    pub(crate) fn route(&self, from: AreaId, to: AreaId) -> Option<Vec<AreaId>> {
        let _ = self.area(from)?;
        let _ = self.area(to)?;

        let mut previous: BTreeMap<AreaId, AreaId> = BTreeMap::new();
        let mut visited = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut route = vec![to];
                let mut cursor = to;
                while let Some(prior) = previous.get(&cursor) {
                    route.push(*prior);
                    cursor = *prior;
                }
                route.reverse();
                return Some(route);
            }
            let Some(area) = self.area(current) else {
                continue;
            };
            for next in area.connected_areas() {
                if visited.insert(next) {
                    let _ = previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Every tile maps to a live area that lists it, and no area lists extra tiles.
    pub(crate) fn partition_holds(&self) -> bool {
        let mapped = self
            .tile_areas
            .iter()
            .enumerate()
            .all(|(index, id)| {
                let tile = self.tile_of(index);
                self.area(*id).map_or(false, |area| area.contains(tile))
            });
        let listed: usize = self.iter().map(Area::tile_count).sum();
        mapped && listed == self.tile_areas.len()
    }

    fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.live.get_mut(&id)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        (tile.column() < self.columns && tile.row() < self.rows)
            .then(|| tile.row() as usize * self.columns as usize + tile.column() as usize)
    }

    fn tile_of(&self, index: usize) -> TileCoord {
        let width = self.columns.max(1) as usize;
        TileCoord::new((index % width) as u32, (index / width) as u32)
    }
}
