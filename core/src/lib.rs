#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Siegeline decision core.
//!
//! This crate defines the message surface that connects the host game engine
//! with the pure decision systems. Systems read an immutable
//! [`BoardSnapshot`] captured at the start of a turn and respond exclusively
//! with [`Command`] values, which an [`Engine`] applies synchronously before
//! reporting the result as [`Event`] values. Coordinates exchanged with the
//! engine are absolute; systems reason in logical coordinates and convert at
//! the boundary through a [`Normalizer`].

mod setup;
mod snapshot;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use setup::{MatchSetup, SetupError, UnitCosts, UnitStats};
pub use snapshot::{BoardSnapshot, PlayerResources};

/// Side length of the arena used by the standard ruleset.
pub const STANDARD_BOARD_SIZE: i32 = 28;

/// Location of a single arena cell expressed as column and row coordinates.
///
/// Coordinates are signed so that formations anchored relative to another row
/// can be computed first and bounds-checked afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the point displaced by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance between two points.
    #[must_use]
    pub const fn distance_squared(self, other: Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// Stationary units that occupy a cell until destroyed or removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing nearby.
    Support,
    /// Structure that attacks opposing mobile units in range.
    Turret,
}

/// Mobile units that spawn on an edge and path toward the opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MobileKind {
    /// Fast, fragile unit suited to scoring.
    Scout,
    /// Slow long-range unit that attacks structures.
    Demolisher,
    /// Unit that hunts opposing mobile units.
    Interceptor,
}

/// Any unit that can be requested from the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// A stationary unit.
    Structure(StructureKind),
    /// A mobile unit.
    Mobile(MobileKind),
}

impl From<StructureKind> for UnitKind {
    fn from(kind: StructureKind) -> Self {
        Self::Structure(kind)
    }
}

impl From<MobileKind> for UnitKind {
    fn from(kind: MobileKind) -> Self {
        Self::Mobile(kind)
    }
}

/// Identifies one of the two players of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Player {
    /// The player this decision core plays for.
    Me,
    /// The opposing player.
    Opponent,
}

/// The two independent resource currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pool {
    /// Structure points fund stationary placements and upgrades.
    Structure,
    /// Mobile points fund mobile unit spawns.
    Mobile,
}

/// State of a stationary unit occupying a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationaryUnit {
    /// Player that owns the unit.
    pub owner: Player,
    /// Kind of structure.
    pub kind: StructureKind,
    /// Indicates whether the one-time upgrade was applied.
    pub upgraded: bool,
}

impl StationaryUnit {
    /// Creates an unupgraded unit owned by the provided player.
    #[must_use]
    pub const fn new(owner: Player, kind: StructureKind) -> Self {
        Self {
            owner,
            kind,
            upgraded: false,
        }
    }

    /// Returns the same unit marked as upgraded.
    #[must_use]
    pub const fn upgraded(self) -> Self {
        Self {
            owner: self.owner,
            kind: self.kind,
            upgraded: true,
        }
    }
}

/// Commands that express every mutation the decision core may request.
///
/// Commands are fire-and-forget: each one independently succeeds or fails and
/// the engine reports the result through [`Event`] values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Requests one or more units of the provided kind at an absolute location.
    ///
    /// Structures ignore `count`. For mobile units a count larger than the
    /// player can afford is clamped by the engine to everything affordable.
    Spawn {
        /// Kind of unit to spawn.
        kind: UnitKind,
        /// Absolute cell receiving the units.
        at: Point,
        /// Number of units requested.
        count: u32,
    },
    /// Requests the one-time upgrade of an owned structure.
    Upgrade {
        /// Absolute cell of the structure.
        at: Point,
    },
    /// Requests removal of an owned structure for a partial refund.
    Remove {
        /// Absolute cell of the structure.
        at: Point,
    },
}

/// Events reported by the engine after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that a structure was placed.
    StructurePlaced {
        /// Kind of structure placed.
        kind: StructureKind,
        /// Absolute cell of the structure.
        at: Point,
    },
    /// Confirms that mobile units were spawned.
    MobileSpawned {
        /// Kind of unit spawned.
        kind: MobileKind,
        /// Absolute spawn cell.
        at: Point,
        /// Number of units actually spawned after clamping.
        count: u32,
    },
    /// Confirms that a structure was upgraded.
    StructureUpgraded {
        /// Absolute cell of the structure.
        at: Point,
    },
    /// Confirms that a structure is scheduled for removal at the end of the turn.
    RemovalScheduled {
        /// Absolute cell of the structure.
        at: Point,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Kind of unit requested.
        kind: UnitKind,
        /// Absolute cell provided in the request.
        at: Point,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that an upgrade request was rejected.
    UpgradeRejected {
        /// Absolute cell provided in the request.
        at: Point,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Reports that a removal request was rejected.
    RemovalRejected {
        /// Absolute cell provided in the request.
        at: Point,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
}

/// Reasons a spawn request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The requested cell lies outside the arena.
    OutOfBounds,
    /// Structures may only be placed on the player's own half.
    OutsideTerritory,
    /// Mobile units may only be spawned on the player's own edges.
    NotOnEdge,
    /// The cell already holds a stationary unit.
    Occupied,
    /// The player cannot afford a single unit.
    InsufficientResources,
}

/// Reasons an upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The requested cell lies outside the arena.
    OutOfBounds,
    /// No structure occupies the cell.
    Vacant,
    /// The structure belongs to the opponent.
    NotOwned,
    /// The structure was already upgraded.
    AlreadyUpgraded,
    /// The player cannot afford the upgrade.
    InsufficientResources,
}

/// Reasons a removal request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The requested cell lies outside the arena.
    OutOfBounds,
    /// No structure occupies the cell.
    Vacant,
    /// The structure belongs to the opponent.
    NotOwned,
    /// The structure is already scheduled for removal this turn.
    AlreadyScheduled,
}

/// Errors raised when a board location is read outside the arena.
///
/// Reading outside the arena indicates a misconfigured blueprint or guard and
/// is never silently absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BoardError {
    /// The logical point maps outside the arena.
    #[error("point {point:?} lies outside the arena")]
    OutOfBounds {
        /// Offending logical point.
        point: Point,
    },
}

/// Read-only path queries answered by the engine.
pub trait PathOracle {
    /// Path a mobile unit spawned at `from` would follow to the far edge.
    ///
    /// Returns `None` when the location cannot produce a path.
    fn path_to_edge(&self, from: Point) -> Option<Vec<Point>>;

    /// Number of structures owned by the opponent of `player` able to attack `at`.
    fn attackers(&self, at: Point, player: Player) -> u32;
}

/// Command sink exposed by the host engine.
///
/// Implementations apply each command synchronously and push exactly one
/// event describing its result, so later commands observe the resource
/// consumption of earlier ones.
pub trait Engine: PathOracle {
    /// Applies the command, reporting the result through `out`.
    fn apply(&mut self, command: Command, out: &mut Vec<Event>);

    /// Current occupant of an absolute cell, reflecting commands applied this turn.
    fn stationary_unit_at(&self, at: Point) -> Option<StationaryUnit>;
}

/// Shape of the diamond arena.
///
/// The lower half of the board belongs to the bottom player. Each half is a
/// triangle whose widest row borders the centre line, so not every cell of the
/// bounding square is part of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardGeometry {
    width: i32,
    height: i32,
}

impl BoardGeometry {
    /// Creates a geometry with the provided bounding dimensions.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Geometry used by the standard ruleset.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(STANDARD_BOARD_SIZE, STANDARD_BOARD_SIZE)
    }

    /// Width of the bounding square.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the bounding square.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// First row belonging to the top half.
    #[must_use]
    pub const fn half(&self) -> i32 {
        self.height / 2
    }

    /// Inclusive column range of the provided row, or `None` for rows off the board.
    #[must_use]
    pub const fn row_span(&self, y: i32) -> Option<(i32, i32)> {
        if y < 0 || y >= self.height {
            return None;
        }

        let centre = self.width / 2;
        let depth = if y < self.half() {
            y
        } else {
            self.height - 1 - y
        };
        Some((centre - 1 - depth, centre + depth))
    }

    /// Reports whether the point lies inside the arena.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        match self.row_span(point.y()) {
            Some((start, end)) => point.x() >= start && point.x() <= end,
            None => false,
        }
    }

    /// Reports whether the point lies on the bottom player's half.
    #[must_use]
    pub const fn in_own_half(&self, point: Point) -> bool {
        self.contains(point) && point.y() < self.half()
    }

    /// Reports whether mobile units may be spawned at the point.
    #[must_use]
    pub const fn is_own_edge(&self, point: Point) -> bool {
        if !self.in_own_half(point) {
            return false;
        }

        match self.row_span(point.y()) {
            Some((start, end)) => point.x() == start || point.x() == end,
            None => false,
        }
    }

    /// Iterates every arena cell in row-major order starting at the bottom row.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.height).flat_map(move |y| {
            let (start, end) = self.row_span(y).unwrap_or((0, -1));
            (start..=end).map(move |x| Point::new(x, y))
        })
    }
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mirrors `point` horizontally across a board of `width` columns when `inverted`.
#[must_use]
pub const fn normalize(point: Point, inverted: bool, width: i32) -> Point {
    if inverted {
        Point::new(width - 1 - point.x(), point.y())
    } else {
        point
    }
}

/// Converts between logical coordinates and absolute engine coordinates.
///
/// Mirroring is its own inverse, so the same conversion is used in both
/// directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Normalizer {
    width: i32,
    inverted: bool,
}

impl Normalizer {
    /// Creates a normalizer for a board of `width` columns.
    #[must_use]
    pub const fn new(width: i32, inverted: bool) -> Self {
        Self { width, inverted }
    }

    /// Width of the board the normalizer mirrors across.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Indicates whether coordinates are mirrored.
    #[must_use]
    pub const fn inverted(&self) -> bool {
        self.inverted
    }

    /// Converts a point between logical and absolute coordinates.
    #[must_use]
    pub const fn normalize(&self, point: Point) -> Point {
        normalize(point, self.inverted, self.width)
    }
}
