#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warren world model.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query the world
//! read-only, and respond exclusively with new command batches.

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the map with an empty grid of the provided dimensions.
    ConfigureMap {
        /// Number of tile columns laid out in the grid.
        columns: u32,
        /// Number of tile rows laid out in the grid.
        rows: u32,
    },
    /// Advances the simulation clock and resolves queued path searches.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Marks a tile as solid or clears it.
    SetTileSolid {
        /// Tile whose solidity changes.
        tile: TileCoord,
        /// Desired solidity.
        solid: bool,
    },
    /// Tags a tile as part of a preferred walkway surface.
    SetTileSurface {
        /// Tile receiving or losing the surface.
        tile: TileCoord,
        /// Whether the tile carries the walkway surface.
        paved: bool,
    },
    /// Places a wall or door on one side of a tile.
    PlaceWall {
        /// Tile whose side receives the wall.
        tile: TileCoord,
        /// Side of the tile that the wall occupies.
        side: Side,
        /// Opaque asset reference describing the wall's appearance.
        spec: WallSpec,
        /// Whether the wall is a passable door.
        door: bool,
    },
    /// Removes the wall on one side of a tile.
    DeleteWall {
        /// Tile whose side is cleared.
        tile: TileCoord,
        /// Side of the tile to clear.
        side: Side,
    },
    /// Queues a grid path search; the answer arrives as [`Event::PathResolved`].
    RequestPath {
        /// Identifier echoed back in the resolution event.
        request: PathRequestId,
        /// World-space start position.
        start: Vec2,
        /// World-space destination position.
        end: Vec2,
        /// Search and post-processing options.
        options: PathOptions,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the map was replaced by an empty grid.
    MapConfigured {
        /// Number of tile columns in the new grid.
        columns: u32,
        /// Number of tile rows in the new grid.
        rows: u32,
        /// Root area covering every tile.
        root: AreaId,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that a tile changed solidity.
    TileSolidityChanged {
        /// Tile whose solidity changed.
        tile: TileCoord,
        /// Solidity after the change.
        solid: bool,
    },
    /// Something solid appeared; in-flight paths near it may be stale.
    SolidPlaced {
        /// World-space centre of the new obstruction.
        position: Vec2,
    },
    /// Confirms that a wall slot now exists.
    WallPlaced {
        /// Lattice address of the new slot.
        slot: WallSlotCoord,
        /// Whether the slot is a door.
        door: bool,
    },
    /// Confirms that a wall slot was cleared.
    WallRemoved {
        /// Lattice address of the cleared slot.
        slot: WallSlotCoord,
    },
    /// Reports that a wall edit was ignored.
    WallEditRejected {
        /// Tile named by the request.
        tile: TileCoord,
        /// Side named by the request.
        side: Side,
        /// Reason the edit was ignored.
        reason: WallEditRejection,
    },
    /// A closed wall loop carved a new area out of an existing one.
    AreaSplit {
        /// Area that lost tiles.
        parent: AreaId,
        /// Area created from the enclosed tiles.
        created: AreaId,
    },
    /// An opened wall loop joined two areas.
    AreaMerged {
        /// Area that absorbed the other.
        survivor: AreaId,
        /// Area that no longer exists.
        absorbed: AreaId,
    },
    /// Delivers the result of a [`Command::RequestPath`].
    PathResolved {
        /// Identifier supplied with the request.
        request: PathRequestId,
        /// Waypoints at tile centres, or `None` when unreachable.
        waypoints: Option<Vec<Vec2>>,
    },
}

/// Reasons a wall edit is ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallEditRejection {
    /// The tile lies outside the configured grid.
    OutOfBounds,
    /// A wall already occupies the requested slot.
    Occupied,
    /// No wall exists at the requested slot.
    Missing,
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Tile containing the provided world position, if it is not negative.
    #[must_use]
    pub fn containing(position: Vec2) -> Option<Self> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return None;
        }
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        Some(Self::new(position.x.floor() as u32, position.y.floor() as u32))
    }

    /// World-space centre of the tile.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }

    /// Neighbouring tile one step along `heading`, if it does not underflow.
    ///
    /// The caller is responsible for the upper bound of the grid.
    #[must_use]
    pub fn step(self, heading: Heading) -> Option<Self> {
        let (dx, dy) = heading.offset();
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        Some(Self::new(column, row))
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Cardinal sides of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Edge toward decreasing row indices.
    North,
    /// Edge toward increasing column indices.
    East,
    /// Edge toward increasing row indices.
    South,
    /// Edge toward decreasing column indices.
    West,
}

impl Side {
    /// Every side in clockwise order starting at north.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Side facing the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Heading that crosses this side.
    #[must_use]
    pub const fn heading(self) -> Heading {
        match self {
            Self::North => Heading::North,
            Self::East => Heading::East,
            Self::South => Heading::South,
            Self::West => Heading::West,
        }
    }
}

/// One of the eight headings a mover may take between neighbouring tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Heading {
    /// Toward decreasing rows.
    North,
    /// Toward decreasing rows and increasing columns.
    NorthEast,
    /// Toward increasing columns.
    East,
    /// Toward increasing rows and columns.
    SouthEast,
    /// Toward increasing rows.
    South,
    /// Toward increasing rows and decreasing columns.
    SouthWest,
    /// Toward decreasing columns.
    West,
    /// Toward decreasing rows and columns.
    NorthWest,
}

impl Heading {
    /// Every heading in clockwise order starting at north.
    pub const ALL: [Heading; 8] = [
        Heading::North,
        Heading::NorthEast,
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
    ];

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::East => (1, 0),
            Self::SouthEast => (1, 1),
            Self::South => (0, 1),
            Self::SouthWest => (-1, 1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Reports whether the heading moves along both axes.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }

    /// The two sides a diagonal heading passes between.
    #[must_use]
    pub const fn flanking_sides(self) -> Option<(Side, Side)> {
        match self {
            Self::NorthEast => Some((Side::North, Side::East)),
            Self::SouthEast => Some((Side::South, Side::East)),
            Self::SouthWest => Some((Side::South, Side::West)),
            Self::NorthWest => Some((Side::North, Side::West)),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of headings that may not be taken out of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeadingMask(u8);

impl HeadingMask {
    /// Mask that blocks nothing.
    pub const EMPTY: HeadingMask = HeadingMask(0);

    /// Returns a copy of the mask with `heading` blocked.
    #[must_use]
    pub const fn with(self, heading: Heading) -> Self {
        Self(self.0 | heading.bit())
    }

    /// Reports whether `heading` is blocked.
    #[must_use]
    pub const fn contains(self, heading: Heading) -> bool {
        self.0 & heading.bit() != 0
    }

    /// Reports whether no heading is blocked.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterator over the blocked headings.
    pub fn iter(self) -> impl Iterator<Item = Heading> {
        Heading::ALL
            .into_iter()
            .filter(move |heading| self.contains(*heading))
    }
}

impl FromIterator<Heading> for HeadingMask {
    fn from_iter<I: IntoIterator<Item = Heading>>(iter: I) -> Self {
        iter.into_iter()
            .fold(HeadingMask::EMPTY, |mask, heading| mask.with(heading))
    }
}

/// Axis along which a wall slot runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallOrientation {
    /// Runs along a column boundary, separating west from east.
    Vertical,
    /// Runs along a row boundary, separating north from south.
    Horizontal,
}

/// Address of a tile edge on the doubled-resolution wall lattice.
///
/// Lattice points whose coordinates are both even are tile corners, points
/// with exactly one odd coordinate are tile edges, and points with both
/// coordinates odd are tile centres. Every tile edge maps to exactly one
/// lattice address, so the east side of `(3, 4)` and the west side of
/// `(4, 4)` resolve to the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallSlotCoord {
    column: u32,
    row: u32,
}

impl WallSlotCoord {
    /// Lattice address of the provided tile side.
    #[must_use]
    pub const fn for_tile_side(tile: TileCoord, side: Side) -> Self {
        let column = tile.column() * 2;
        let row = tile.row() * 2;
        match side {
            Side::North => Self::at(column + 1, row),
            Side::East => Self::at(column + 2, row + 1),
            Side::South => Self::at(column + 1, row + 2),
            Side::West => Self::at(column, row + 1),
        }
    }

    const fn at(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Lattice column.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Lattice row.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Orientation of the slot.
    #[must_use]
    pub const fn orientation(&self) -> WallOrientation {
        if self.column % 2 == 0 {
            WallOrientation::Vertical
        } else {
            WallOrientation::Horizontal
        }
    }

    /// World-space midpoint of the edge.
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        Vec2::new(self.column as f32 * 0.5, self.row as f32 * 0.5)
    }

    /// The two lattice corners the slot connects.
    #[must_use]
    pub const fn endpoints(&self) -> [CornerCoord; 2] {
        match self.orientation() {
            WallOrientation::Horizontal => [
                CornerCoord::at(self.column - 1, self.row),
                CornerCoord::at(self.column + 1, self.row),
            ],
            WallOrientation::Vertical => [
                CornerCoord::at(self.column, self.row - 1),
                CornerCoord::at(self.column, self.row + 1),
            ],
        }
    }

    /// Tiles on either side of the slot, north/west first.
    ///
    /// The first entry is `None` when the slot lies on the top or left map
    /// border; callers check the second entry against the grid size.
    #[must_use]
    pub fn adjacent_tiles(&self) -> (Option<TileCoord>, TileCoord) {
        match self.orientation() {
            WallOrientation::Horizontal => {
                let column = self.column / 2;
                let below = TileCoord::new(column, self.row / 2);
                let above = (self.row / 2)
                    .checked_sub(1)
                    .map(|row| TileCoord::new(column, row));
                (above, below)
            }
            WallOrientation::Vertical => {
                let row = self.row / 2;
                let right = TileCoord::new(self.column / 2, row);
                let left = (self.column / 2)
                    .checked_sub(1)
                    .map(|column| TileCoord::new(column, row));
                (left, right)
            }
        }
    }

    /// Canonical tile and side owning the slot within a grid of the given size.
    ///
    /// Slots on the bottom or right border are owned by the tile inside the
    /// map through its south or east side.
    #[must_use]
    pub fn owner(&self, columns: u32, rows: u32) -> Option<(TileCoord, Side)> {
        if self.column % 2 == self.row % 2 {
            return None;
        }
        let (before, after) = self.adjacent_tiles();
        if after.column() < columns && after.row() < rows {
            let side = match self.orientation() {
                WallOrientation::Horizontal => Side::North,
                WallOrientation::Vertical => Side::West,
            };
            return Some((after, side));
        }
        let before = before?;
        if before.column() < columns && before.row() < rows {
            let side = match self.orientation() {
                WallOrientation::Horizontal => Side::South,
                WallOrientation::Vertical => Side::East,
            };
            return Some((before, side));
        }
        None
    }
}

/// Tile corner on the doubled-resolution wall lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CornerCoord {
    column: u32,
    row: u32,
}

impl CornerCoord {
    /// Corner at the provided (even) lattice coordinates.
    #[must_use]
    pub const fn at(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Corner at the given tile-grid intersection.
    #[must_use]
    pub const fn from_grid(column: u32, row: u32) -> Self {
        Self::at(column * 2, row * 2)
    }

    /// Lattice column.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Lattice row.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Slots meeting at this corner, in north, east, south, west order.
    ///
    /// Slots that would underflow the lattice are omitted; the caller bounds
    /// the upper end.
    pub fn slots(&self) -> impl Iterator<Item = WallSlotCoord> {
        let column = self.column;
        let row = self.row;
        [
            row.checked_sub(1).map(|row| WallSlotCoord::at(column, row)),
            Some(WallSlotCoord::at(column + 1, row)),
            Some(WallSlotCoord::at(column, row + 1)),
            column.checked_sub(1).map(|column| WallSlotCoord::at(column, row)),
        ]
        .into_iter()
        .flatten()
    }

    /// Corner at the far end of a slot that touches this corner.
    #[must_use]
    pub fn across(&self, slot: WallSlotCoord) -> CornerCoord {
        let [first, second] = slot.endpoints();
        if first == *self {
            second
        } else {
            first
        }
    }

    /// Tiles sharing this corner, clipped to the lattice origin.
    pub fn touching_tiles(&self) -> impl Iterator<Item = TileCoord> {
        let column = self.column / 2;
        let row = self.row / 2;
        let west = column.checked_sub(1);
        let north = row.checked_sub(1);
        [
            west.zip(north).map(|(c, r)| TileCoord::new(c, r)),
            north.map(|r| TileCoord::new(column, r)),
            west.map(|c| TileCoord::new(c, row)),
            Some(TileCoord::new(column, row)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Per-tile pathfinding state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Free tile without a preferred surface.
    Open,
    /// Solid tile.
    Closed,
    /// Free tile tagged as part of a preferred walkway.
    Path,
}

impl NodeKind {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of node kinds a search may stand on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKindSet(u8);

impl NodeKindSet {
    /// Only plain open tiles.
    pub const OPEN: NodeKindSet = NodeKindSet(1 << NodeKind::Open as u8);

    /// Any non-solid tile.
    pub const WALKABLE: NodeKindSet =
        NodeKindSet((1 << NodeKind::Open as u8) | (1 << NodeKind::Path as u8));

    /// Returns a copy of the set that also accepts `kind`.
    #[must_use]
    pub const fn with(self, kind: NodeKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Reports whether `kind` belongs to the set.
    #[must_use]
    pub const fn contains(self, kind: NodeKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl Default for NodeKindSet {
    fn default() -> Self {
        Self::OPEN
    }
}

/// Options attached to a path request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathOptions {
    /// Remove waypoints that a straight walkable segment can skip.
    pub optimise: bool,
    /// Node kinds the route may stand on.
    pub allowed: NodeKindSet,
}

impl PathOptions {
    /// Options accepting any non-solid tile with string-pulling enabled.
    #[must_use]
    pub const fn walkable_optimised() -> Self {
        Self {
            optimise: true,
            allowed: NodeKindSet::WALKABLE,
        }
    }
}

/// Unique identifier assigned to an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(u32);

impl AreaId {
    /// Creates a new area identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a mover following paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoverId(u32);

impl MoverId {
    /// Creates a new mover identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifies one path request issued by a mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathRequestId {
    mover: MoverId,
    sequence: u32,
}

impl PathRequestId {
    /// Creates a request identifier for the mover's `sequence`-th request.
    #[must_use]
    pub const fn new(mover: MoverId, sequence: u32) -> Self {
        Self { mover, sequence }
    }

    /// Mover that issued the request.
    #[must_use]
    pub const fn mover(&self) -> MoverId {
        self.mover
    }

    /// Per-mover sequence number of the request.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

/// Cosmetic colour assigned to an area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AreaColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl AreaColor {
    /// Creates a new area colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Opaque reference to the asset a wall is drawn with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallSpec(String);

impl WallSpec {
    /// Wraps an asset path.
    #[must_use]
    pub fn new(asset: impl Into<String>) -> Self {
        Self(asset.into())
    }

    /// Asset path of the wall.
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.0
    }
}

/// Persisted shape of a map: everything needed to rebuild the world model.
///
/// Areas are not stored; they are recomputed from the walls on load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Tiles that are solid.
    pub solid: Vec<TileCoord>,
    /// Tiles tagged with the walkway surface.
    pub paved: Vec<TileCoord>,
    /// Existing wall slots in lattice order.
    pub walls: Vec<WallRecord>,
}

/// Persisted description of a single wall slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallRecord {
    /// Lattice address of the slot.
    pub slot: WallSlotCoord,
    /// Asset reference of the wall.
    pub spec: WallSpec,
    /// Whether the slot is a door.
    pub door: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn shared_edges_resolve_to_one_slot() {
        let left = TileCoord::new(3, 4);
        let right = TileCoord::new(4, 4);
        assert_eq!(
            WallSlotCoord::for_tile_side(left, Side::East),
            WallSlotCoord::for_tile_side(right, Side::West)
        );

        let upper = TileCoord::new(2, 1);
        let lower = TileCoord::new(2, 2);
        assert_eq!(
            WallSlotCoord::for_tile_side(upper, Side::South),
            WallSlotCoord::for_tile_side(lower, Side::North)
        );
    }

    #[test]
    fn slot_orientation_follows_lattice_parity() {
        let tile = TileCoord::new(1, 1);
        assert_eq!(
            WallSlotCoord::for_tile_side(tile, Side::North).orientation(),
            WallOrientation::Horizontal
        );
        assert_eq!(
            WallSlotCoord::for_tile_side(tile, Side::West).orientation(),
            WallOrientation::Vertical
        );
    }

    #[test]
    fn adjacent_tiles_straddle_the_slot() {
        let slot = WallSlotCoord::for_tile_side(TileCoord::new(2, 3), Side::North);
        assert_eq!(
            slot.adjacent_tiles(),
            (Some(TileCoord::new(2, 2)), TileCoord::new(2, 3))
        );

        let border = WallSlotCoord::for_tile_side(TileCoord::new(0, 5), Side::West);
        assert_eq!(border.adjacent_tiles(), (None, TileCoord::new(0, 5)));
    }

    #[test]
    fn owner_mirrors_border_slots_to_the_inside_tile() {
        let bottom = WallSlotCoord::for_tile_side(TileCoord::new(1, 2), Side::South);
        assert_eq!(bottom.owner(4, 3), Some((TileCoord::new(1, 2), Side::South)));

        let interior = WallSlotCoord::for_tile_side(TileCoord::new(1, 1), Side::East);
        assert_eq!(interior.owner(4, 3), Some((TileCoord::new(2, 1), Side::West)));

        assert_eq!(bottom.owner(1, 1), None);
    }

    #[test]
    fn corners_connect_their_slots() {
        let slot = WallSlotCoord::for_tile_side(TileCoord::new(0, 0), Side::East);
        let [top, bottom] = slot.endpoints();
        assert_eq!(top, CornerCoord::from_grid(1, 0));
        assert_eq!(bottom, CornerCoord::from_grid(1, 1));
        assert_eq!(top.across(slot), bottom);
        assert!(top.slots().any(|candidate| candidate == slot));
        assert_eq!(top.slots().count(), 3);
        assert_eq!(CornerCoord::from_grid(1, 1).touching_tiles().count(), 4);
    }

    #[test]
    fn heading_mask_tracks_blocked_headings() {
        let mask: HeadingMask = [Heading::North, Heading::NorthEast].into_iter().collect();
        assert!(mask.contains(Heading::North));
        assert!(mask.contains(Heading::NorthEast));
        assert!(!mask.contains(Heading::East));
        assert_eq!(mask.iter().count(), 2);
        assert!(HeadingMask::EMPTY.is_empty());
    }

    #[test]
    fn tile_containing_rejects_negative_positions() {
        assert_eq!(
            TileCoord::containing(Vec2::new(2.7, 0.1)),
            Some(TileCoord::new(2, 0))
        );
        assert_eq!(TileCoord::containing(Vec2::new(-0.5, 1.0)), None);
        assert_eq!(TileCoord::new(2, 0).center(), Vec2::new(2.5, 0.5));
    }

    #[test]
    fn node_kind_sets_default_to_open() {
        let set = NodeKindSet::default();
        assert!(set.contains(NodeKind::Open));
        assert!(!set.contains(NodeKind::Path));
        assert!(set.with(NodeKind::Path).contains(NodeKind::Path));
        assert!(!NodeKindSet::WALKABLE.contains(NodeKind::Closed));
    }

    #[test]
    fn map_layout_round_trips_through_bincode() {
        let layout = MapLayout {
            columns: 4,
            rows: 3,
            solid: vec![TileCoord::new(1, 1)],
            paved: Vec::new(),
            walls: vec![WallRecord {
                slot: WallSlotCoord::for_tile_side(TileCoord::new(0, 0), Side::East),
                spec: WallSpec::new("walls/brick"),
                door: true,
            }],
        };
        assert_round_trip(&layout);
    }

    #[test]
    fn area_id_round_trips_through_bincode() {
        assert_round_trip(&AreaId::new(42));
    }
}
