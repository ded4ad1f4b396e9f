//! Splits and merges areas as wall loops close and open.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;
use warren_core::{AreaId, Side, TileCoord, WallSlotCoord};

use crate::{areas::AreaSet, walls::WallLattice};

/// Carves a new area out of the one `trigger` runs through, if the slot
/// disconnected it.
///
/// Returns the parent and the created area. The side enclosed by the loop
/// becomes the new area: the side cut off from the map border, or, inside a
/// walled area, the side that does not hold the parent's first tile in row
/// order. When both sides touch the border the smaller one is carved, with
/// ties carving the north/west side.
pub(crate) fn split(
    areas: &mut AreaSet,
    walls: &WallLattice,
    trigger: WallSlotCoord,
) -> Option<(AreaId, AreaId)> {
    let (before, after) = trigger.adjacent_tiles();
    let before = before?;
    let parent = areas.area_at(before)?;
    if areas.area_at(after)? != parent {
        return None;
    }

    let component = flood_fill(areas, walls, before);
    if component.contains(&after) {
        return None;
    }

    let parent_tiles = areas.area(parent)?.member_tiles();
    let rest: BTreeSet<TileCoord> = parent_tiles.difference(&component).copied().collect();
    let touches_border =
        |tiles: &BTreeSet<TileCoord>| tiles.iter().any(|tile| areas.on_map_edge(*tile));
    let carve_component = match (touches_border(&component), touches_border(&rest)) {
        (false, true) => true,
        (true, false) => false,
        (false, false) => parent_tiles
            .iter()
            .min_by_key(|tile| (tile.row(), tile.column()))
            .map_or(true, |first| !component.contains(first)),
        (true, true) => component.len() * 2 <= parent_tiles.len(),
    };
    let carved = if carve_component { component } else { rest };

    let created = areas.carve(parent, carved);
    areas.rebuild_connections(&[parent, created], walls);
    debug_assert!(areas.partition_holds(), "split broke the tile partition");
    debug!(
        parent = parent.get(),
        created = created.get(),
        slot = ?trigger,
        "area split"
    );
    Some((parent, created))
}

/// Joins the two areas on either side of the freshly opened `trigger` slot.
///
/// The area with more tiles survives; ties keep the lower id. Returns the
/// survivor and the absorbed area.
pub(crate) fn merge(
    areas: &mut AreaSet,
    walls: &WallLattice,
    trigger: WallSlotCoord,
) -> Option<(AreaId, AreaId)> {
    let (before, after) = trigger.adjacent_tiles();
    let first = areas.area_at(before?)?;
    let second = areas.area_at(after)?;
    if first == second {
        return None;
    }

    let size = |id: AreaId| areas.area(id).map_or(0, |area| area.tile_count());
    let (first_size, second_size) = (size(first), size(second));
    let (survivor, absorbed) = if first_size > second_size
        || (first_size == second_size && first < second)
    {
        (first, second)
    } else {
        (second, first)
    };

    areas.absorb(survivor, absorbed);
    areas.rebuild_connections(&[survivor, absorbed], walls);
    debug_assert!(areas.partition_holds(), "merge broke the tile partition");
    debug!(
        survivor = survivor.get(),
        absorbed = absorbed.get(),
        slot = ?trigger,
        "areas merged"
    );
    Some((survivor, absorbed))
}

/// Tiles reachable from `seed` without crossing any slot, doors included.
pub(crate) fn flood_fill(
    areas: &AreaSet,
    walls: &WallLattice,
    seed: TileCoord,
) -> BTreeSet<TileCoord> {
    let mut visited = BTreeSet::from([seed]);
    let mut queue = VecDeque::from([seed]);

    while let Some(tile) = queue.pop_front() {
        for side in Side::ALL {
            if walls.has_slot(WallSlotCoord::for_tile_side(tile, side)) {
                continue;
            }
            let Some(next) = tile.step(side.heading()) else {
                continue;
            };
            if areas.area_at(next).is_none() {
                continue;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited
}
