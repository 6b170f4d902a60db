//! Immutable per-turn view of the arena.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BoardGeometry, Player, Point, Pool, StationaryUnit};

/// Resource pools held by a single player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerResources {
    /// Available structure points.
    pub structure: f64,
    /// Available mobile points.
    pub mobile: f64,
}

impl PlayerResources {
    /// Creates a resource pair.
    #[must_use]
    pub const fn new(structure: f64, mobile: f64) -> Self {
        Self { structure, mobile }
    }

    /// Amount held in the provided pool.
    #[must_use]
    pub const fn get(&self, pool: Pool) -> f64 {
        match pool {
            Pool::Structure => self.structure,
            Pool::Mobile => self.mobile,
        }
    }

    fn set(&mut self, pool: Pool, amount: f64) {
        match pool {
            Pool::Structure => self.structure = amount,
            Pool::Mobile => self.mobile = amount,
        }
    }
}

/// Read-only snapshot of the board captured at the start of a turn.
///
/// All coordinates are absolute. The snapshot is assembled once from
/// engine-provided state through the consuming `with_*` methods and is never
/// mutated afterwards; the next turn supersedes it with a fresh snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    turn: u32,
    geometry: BoardGeometry,
    units: BTreeMap<Point, StationaryUnit>,
    mine: PlayerResources,
    opponent: PlayerResources,
    projections: BTreeMap<(Player, Pool, u32), f64>,
}

impl BoardSnapshot {
    /// Creates an empty snapshot for the provided turn.
    #[must_use]
    pub fn new(turn: u32, geometry: BoardGeometry) -> Self {
        Self {
            turn,
            geometry,
            units: BTreeMap::new(),
            mine: PlayerResources::default(),
            opponent: PlayerResources::default(),
            projections: BTreeMap::new(),
        }
    }

    /// Adds a stationary unit at an absolute cell, replacing any previous occupant.
    #[must_use]
    pub fn with_unit(mut self, at: Point, unit: StationaryUnit) -> Self {
        let _ = self.units.insert(at, unit);
        self
    }

    /// Sets the amount a player holds in a pool.
    #[must_use]
    pub fn with_resource(mut self, player: Player, pool: Pool, amount: f64) -> Self {
        match player {
            Player::Me => self.mine.set(pool, amount),
            Player::Opponent => self.opponent.set(pool, amount),
        }
        self
    }

    /// Records the engine's projection of a pool `lookahead` turns ahead.
    #[must_use]
    pub fn with_projection(mut self, player: Player, pool: Pool, lookahead: u32, amount: f64) -> Self {
        let _ = self.projections.insert((player, pool, lookahead), amount);
        self
    }

    /// Turn number the snapshot was captured on.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Shape of the arena.
    #[must_use]
    pub const fn geometry(&self) -> BoardGeometry {
        self.geometry
    }

    /// Stationary unit occupying an absolute cell, if any.
    #[must_use]
    pub fn unit_at(&self, at: Point) -> Option<&StationaryUnit> {
        self.units.get(&at)
    }

    /// Iterator over every occupied cell in deterministic order.
    pub fn units(&self) -> impl Iterator<Item = (Point, &StationaryUnit)> {
        self.units.iter().map(|(point, unit)| (*point, unit))
    }

    /// Resources held by a player.
    #[must_use]
    pub const fn resources(&self, player: Player) -> PlayerResources {
        match player {
            Player::Me => self.mine,
            Player::Opponent => self.opponent,
        }
    }

    /// Engine projection of a pool `lookahead` turns ahead, if one was supplied.
    #[must_use]
    pub fn projection(&self, player: Player, pool: Pool, lookahead: u32) -> Option<f64> {
        self.projections.get(&(player, pool, lookahead)).copied()
    }
}
