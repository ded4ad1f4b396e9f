//! Rebuilding a world from its persisted layout.

use std::collections::BTreeSet;

use thiserror::Error;
use warren_core::{MapLayout, TileCoord, WallSlotCoord};

use crate::{
    config::{WorldConfig, MAX_GRID_DIMENSION},
    World,
};

/// Reasons a [`MapLayout`] cannot be loaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout declares more columns or rows than a world may hold.
    #[error(
        "{columns}x{rows} map exceeds the {max} tile limit per side",
        max = MAX_GRID_DIMENSION
    )]
    TooLarge {
        /// Layout column count.
        columns: u32,
        /// Layout row count.
        rows: u32,
    },
    /// A solid or paved tile lies outside the layout's dimensions.
    #[error("tile ({}, {}) lies outside the {columns}x{rows} map", .tile.column(), .tile.row())]
    TileOutOfBounds {
        /// Offending tile.
        tile: TileCoord,
        /// Layout column count.
        columns: u32,
        /// Layout row count.
        rows: u32,
    },
    /// A wall record addresses a lattice point that is not a tile edge of the map.
    #[error("wall slot ({}, {}) is not an edge of the map", .slot.column(), .slot.row())]
    SlotOutOfBounds {
        /// Offending slot.
        slot: WallSlotCoord,
    },
    /// Two wall records address the same slot.
    #[error("wall slot ({}, {}) appears more than once", .slot.column(), .slot.row())]
    DuplicateSlot {
        /// Repeated slot.
        slot: WallSlotCoord,
    },
}

impl World {
    /// Builds a world from a persisted layout.
    ///
    /// Areas are not stored in the layout; they are recomputed by replaying
    /// every wall placement, so the tile partition holds as soon as this
    /// returns. The layout's dimensions override those in `config`.
    pub fn from_layout(config: WorldConfig, layout: &MapLayout) -> Result<Self, LayoutError> {
        validate(layout)?;

        let mut world = World::with_config(config.with_dimensions(layout.columns, layout.rows));
        let mut discarded = Vec::new();

        for tile in &layout.paved {
            let _ = world.set_tile_surface(*tile, true);
        }
        for tile in &layout.solid {
            let _ = world.set_tile_solid(*tile, true, &mut discarded);
        }
        for record in &layout.walls {
            let Some((tile, side)) = record.slot.owner(layout.columns, layout.rows) else {
                return Err(LayoutError::SlotOutOfBounds { slot: record.slot });
            };
            let _ = world.place_wall_at_tile(
                tile,
                side,
                record.spec.clone(),
                record.door,
                &mut discarded,
            );
        }

        Ok(world)
    }

    /// Captures the persisted shape of the world.
    #[must_use]
    pub fn layout(&self) -> MapLayout {
        let (columns, rows) = self.occupancy.dimensions();
        MapLayout {
            columns,
            rows,
            solid: self.occupancy.solid_tiles().collect(),
            paved: self.occupancy.paved_tiles().collect(),
            walls: self.walls.iter().map(|wall| wall.record()).collect(),
        }
    }
}

fn validate(layout: &MapLayout) -> Result<(), LayoutError> {
    if layout.columns > MAX_GRID_DIMENSION || layout.rows > MAX_GRID_DIMENSION {
        return Err(LayoutError::TooLarge {
            columns: layout.columns,
            rows: layout.rows,
        });
    }

    let in_bounds = |tile: &TileCoord| tile.column() < layout.columns && tile.row() < layout.rows;
    if let Some(tile) = layout
        .solid
        .iter()
        .chain(&layout.paved)
        .find(|tile| !in_bounds(tile))
    {
        return Err(LayoutError::TileOutOfBounds {
            tile: *tile,
            columns: layout.columns,
            rows: layout.rows,
        });
    }

    let mut seen = BTreeSet::new();
    for record in &layout.walls {
        if record.slot.owner(layout.columns, layout.rows).is_none() {
            return Err(LayoutError::SlotOutOfBounds { slot: record.slot });
        }
        if !seen.insert(record.slot) {
            return Err(LayoutError::DuplicateSlot { slot: record.slot });
        }
    }

    Ok(())
}
