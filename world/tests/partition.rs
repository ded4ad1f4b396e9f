use std::collections::{BTreeMap, BTreeSet, VecDeque};

use proptest::prelude::*;
use warren_core::{AreaId, Command, Event, Side, TileCoord, WallSpec};
use warren_world::{self as world, query, World};

fn configured(columns: u32, rows: u32) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureMap { columns, rows }, &mut events);
    world
}

fn place(world: &mut World, tile: TileCoord, side: Side, door: bool) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::PlaceWall {
            tile,
            side,
            spec: WallSpec::new("walls/brick"),
            door,
        },
        &mut events,
    );
    events
}

fn delete(world: &mut World, tile: TileCoord, side: Side) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::DeleteWall { tile, side }, &mut events);
    events
}

fn enclosure_walls() -> Vec<(TileCoord, Side)> {
    vec![
        (TileCoord::new(2, 2), Side::North),
        (TileCoord::new(3, 2), Side::North),
        (TileCoord::new(3, 2), Side::East),
        (TileCoord::new(3, 3), Side::East),
        (TileCoord::new(3, 3), Side::South),
        (TileCoord::new(2, 3), Side::South),
        (TileCoord::new(2, 3), Side::West),
        (TileCoord::new(2, 2), Side::West),
    ]
}

fn enclosed_tiles() -> BTreeSet<TileCoord> {
    BTreeSet::from([
        TileCoord::new(2, 2),
        TileCoord::new(3, 2),
        TileCoord::new(2, 3),
        TileCoord::new(3, 3),
    ])
}

/// Groups tiles into regions separated by any wall slot, doors included.
fn wall_components(world: &World) -> Vec<BTreeSet<TileCoord>> {
    let (columns, rows) = query::dimensions(world);
    let mut seen = BTreeSet::new();
    let mut components = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            let seed = TileCoord::new(column, row);
            if !seen.insert(seed) {
                continue;
            }
            let mut component = BTreeSet::from([seed]);
            let mut queue = VecDeque::from([seed]);
            while let Some(tile) = queue.pop_front() {
                for side in Side::ALL {
                    if query::wall_at_tile(world, tile, side).is_some() {
                        continue;
                    }
                    let Some(next) = tile.step(side.heading()) else {
                        continue;
                    };
                    if next.column() >= columns || next.row() >= rows {
                        continue;
                    }
                    if seen.insert(next) {
                        let _ = component.insert(next);
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
    }
    components
}

#[test]
fn enclosing_a_block_carves_exactly_one_area() {
    let mut world = configured(6, 6);
    let mut split_events = Vec::new();

    for (tile, side) in enclosure_walls() {
        let events = place(&mut world, tile, side, false);
        split_events.extend(
            events
                .into_iter()
                .filter(|event| matches!(event, Event::AreaSplit { .. })),
        );
    }

    assert_eq!(split_events.len(), 1, "expected a single split");
    assert_eq!(query::area_count(&world), 2);

    let room = query::area_at_tile(&world, TileCoord::new(2, 2)).expect("room");
    assert_ne!(room, AreaId::new(0));
    let members = query::area(&world, room).expect("room area").member_tiles();
    assert_eq!(members, &enclosed_tiles());
    assert!(query::partition_holds(&world));
}

#[test]
fn opening_any_enclosure_wall_merges_back() {
    for (tile, side) in enclosure_walls() {
        let mut world = configured(6, 6);
        for (wall_tile, wall_side) in enclosure_walls() {
            let _ = place(&mut world, wall_tile, wall_side, false);
        }
        let parent = query::area_at_tile(&world, TileCoord::new(0, 0)).expect("outside");

        let events = delete(&mut world, tile, side);

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::AreaMerged { survivor, .. } if *survivor == parent)));
        assert_eq!(query::area_count(&world), 1);
        for enclosed in enclosed_tiles() {
            assert_eq!(query::area_at_tile(&world, enclosed), Some(parent));
        }
        assert!(query::partition_holds(&world));
    }
}

#[test]
fn enclosure_larger_than_the_outside_becomes_the_new_area() {
    let mut world = configured(7, 7);
    for step in 1..=5 {
        let _ = place(&mut world, TileCoord::new(step, 1), Side::North, false);
        let _ = place(&mut world, TileCoord::new(step, 5), Side::South, false);
        let _ = place(&mut world, TileCoord::new(1, step), Side::West, false);
        let _ = place(&mut world, TileCoord::new(5, step), Side::East, false);
    }

    assert_eq!(query::area_count(&world), 2);
    assert_eq!(
        query::area_at_tile(&world, TileCoord::new(0, 0)),
        Some(AreaId::new(0))
    );
    let outside = query::area(&world, AreaId::new(0)).expect("outside");
    assert_eq!(outside.name(), "Outside");
    assert_eq!(outside.tile_count(), 24);

    let room = query::area_at_tile(&world, TileCoord::new(3, 3)).expect("room");
    assert_ne!(room, AreaId::new(0));
    assert_eq!(query::area(&world, room).expect("room").tile_count(), 25);
    assert!(query::partition_holds(&world));
}

#[test]
fn doors_bound_areas_and_connect_them() {
    let mut world = configured(6, 6);
    let walls = enclosure_walls();
    for (index, (tile, side)) in walls.iter().enumerate() {
        let _ = place(&mut world, *tile, *side, index == 0);
    }

    let outside = query::area_at_tile(&world, TileCoord::new(0, 0)).expect("outside");
    let room = query::area_at_tile(&world, TileCoord::new(2, 2)).expect("room");
    assert_ne!(outside, room);

    let door = walls[0];
    let outside_area = query::area(&world, outside).expect("outside area");
    assert_eq!(outside_area.doors_to(room).len(), 1);
    assert_eq!(
        outside_area.doors_to(room)[0],
        warren_core::WallSlotCoord::for_tile_side(door.0, door.1)
    );
    assert_eq!(query::area_route(&world, outside, room), Some(vec![outside, room]));
}

#[test]
fn border_to_border_wall_splits_the_map() {
    let mut world = configured(4, 3);
    let mut splits = 0;
    for row in 0..3 {
        let events = place(&mut world, TileCoord::new(1, row), Side::East, false);
        splits += events
            .iter()
            .filter(|event| matches!(event, Event::AreaSplit { .. }))
            .count();
    }

    assert_eq!(splits, 1);
    let west = query::area_at_tile(&world, TileCoord::new(0, 0)).expect("west");
    let east = query::area_at_tile(&world, TileCoord::new(3, 2)).expect("east");
    assert_ne!(west, east);
    assert_eq!(query::area(&world, west).expect("west").tile_count(), 6);
    assert_eq!(query::area(&world, east).expect("east").tile_count(), 6);
}

#[test]
fn walls_on_the_map_border_never_split() {
    let mut world = configured(3, 3);
    for column in 0..3 {
        let events = place(&mut world, TileCoord::new(column, 0), Side::North, false);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::AreaSplit { .. })));
    }
    assert_eq!(query::area_count(&world), 1);
}

#[derive(Clone, Debug)]
enum Edit {
    Place {
        column: u32,
        row: u32,
        side: usize,
        door: bool,
    },
    Delete {
        column: u32,
        row: u32,
        side: usize,
    },
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (0u32..5, 0u32..5, 0usize..4, any::<bool>()).prop_map(|(column, row, side, door)| {
            Edit::Place {
                column,
                row,
                side,
                door,
            }
        }),
        1 => (0u32..5, 0u32..5, 0usize..4)
            .prop_map(|(column, row, side)| Edit::Delete { column, row, side }),
    ]
}

proptest! {
    #[test]
    fn random_edits_keep_areas_equal_to_wall_regions(
        edits in prop::collection::vec(arb_edit(), 1..80),
    ) {
        let mut world = configured(5, 5);
        for edit in edits {
            match edit {
                Edit::Place { column, row, side, door } => {
                    let _ = place(&mut world, TileCoord::new(column, row), Side::ALL[side], door);
                }
                Edit::Delete { column, row, side } => {
                    let _ = delete(&mut world, TileCoord::new(column, row), Side::ALL[side]);
                }
            }

            prop_assert!(query::partition_holds(&world));

            let components = wall_components(&world);
            prop_assert_eq!(components.len(), query::area_count(&world));
            for component in &components {
                let ids: BTreeSet<_> = component
                    .iter()
                    .filter_map(|tile| query::area_at_tile(&world, *tile))
                    .collect();
                prop_assert_eq!(ids.len(), 1);
            }

            let mut expected: BTreeMap<(AreaId, AreaId), usize> = BTreeMap::new();
            for wall in query::walls(&world).filter(|wall| wall.is_door()) {
                let (before, after) = wall.coord().adjacent_tiles();
                let first = before.and_then(|tile| query::area_at_tile(&world, tile));
                let second = query::area_at_tile(&world, after);
                if let (Some(first), Some(second)) = (first, second) {
                    if first != second {
                        *expected.entry((first, second)).or_default() += 1;
                        *expected.entry((second, first)).or_default() += 1;
                    }
                }
            }
            for area in query::areas(&world) {
                for other in area.connected_areas() {
                    prop_assert_eq!(
                        Some(&area.doors_to(other).len()),
                        expected.get(&(area.id(), other))
                    );
                }
            }
            let listed: usize = query::areas(&world)
                .map(|area| area.connected_areas().count())
                .sum();
            prop_assert_eq!(listed, expected.len());
        }
    }
}
