#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reference placement ledger for Siegeline.
//!
//! [`Arena`] implements the [`Engine`] boundary for the bottom player with
//! the placement rules of the host game: territory and edge restrictions,
//! occupancy, costs, one-time upgrades and end-of-turn removals with a partial
//! refund. It deliberately models nothing else; there is no combat, unit
//! movement or resource accrual. Paths are scripted per spawn point.

use std::collections::BTreeMap;

use siegeline_core::{
    BoardGeometry, BoardSnapshot, Command, Engine, Event, MatchSetup, MobileKind, PathOracle,
    Player, PlayerResources, Point, Pool, RemovalError, SpawnError, StationaryUnit, StructureKind,
    UnitCosts, UnitKind, UpgradeError,
};
use tracing::trace;

/// Share of the spent structure points returned when a structure is removed.
const DEFAULT_REFUND_RATIO: f64 = 0.75;

/// Mobile units spawned during the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    /// Kind of unit spawned.
    pub kind: MobileKind,
    /// Absolute spawn cell.
    pub at: Point,
    /// Number of units spawned.
    pub count: u32,
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    unit: StationaryUnit,
    pending_removal: bool,
}

/// Authoritative placement state for a single match.
#[derive(Debug)]
pub struct Arena {
    turn: u32,
    geometry: BoardGeometry,
    costs: UnitCosts,
    refund_ratio: f64,
    cells: BTreeMap<Point, Cell>,
    mine: PlayerResources,
    opponent: PlayerResources,
    projections: BTreeMap<(Player, Pool, u32), f64>,
    paths: BTreeMap<Point, Vec<Point>>,
    pending_refund: f64,
    deployments: Vec<Deployment>,
}

impl Arena {
    /// Creates an empty arena using the provided match configuration.
    #[must_use]
    pub fn new(setup: &MatchSetup) -> Self {
        Self {
            turn: 0,
            geometry: setup.geometry,
            costs: setup.costs.clone(),
            refund_ratio: DEFAULT_REFUND_RATIO,
            cells: BTreeMap::new(),
            mine: PlayerResources::default(),
            opponent: PlayerResources::default(),
            projections: BTreeMap::new(),
            paths: BTreeMap::new(),
            pending_refund: 0.0,
            deployments: Vec::new(),
        }
    }

    /// Overrides the share of structure points refunded on removal.
    #[must_use]
    pub fn with_refund_ratio(mut self, refund_ratio: f64) -> Self {
        self.refund_ratio = refund_ratio;
        self
    }

    /// Sets the current turn number.
    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    /// Sets the amount a player holds in a pool.
    pub fn set_resource(&mut self, player: Player, pool: Pool, amount: f64) {
        let resources = self.resources_mut(player);
        match pool {
            Pool::Structure => resources.structure = amount,
            Pool::Mobile => resources.mobile = amount,
        }
    }

    /// Records the projection reported for a pool `lookahead` turns ahead.
    pub fn set_projection(&mut self, player: Player, pool: Pool, lookahead: u32, amount: f64) {
        let _ = self.projections.insert((player, pool, lookahead), amount);
    }

    /// Places a unit without validation or payment, replacing any occupant.
    ///
    /// Used to lay out opposing structures and pre-built defenses.
    pub fn seed(&mut self, at: Point, unit: StationaryUnit) {
        let _ = self.cells.insert(
            at,
            Cell {
                unit,
                pending_removal: false,
            },
        );
    }

    /// Scripts the path reported for units spawned at `from`.
    pub fn set_path(&mut self, from: Point, path: Vec<Point>) {
        let _ = self.paths.insert(from, path);
    }

    /// Captures an immutable snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut snapshot = BoardSnapshot::new(self.turn, self.geometry)
            .with_resource(Player::Me, Pool::Structure, self.mine.structure)
            .with_resource(Player::Me, Pool::Mobile, self.mine.mobile)
            .with_resource(Player::Opponent, Pool::Structure, self.opponent.structure)
            .with_resource(Player::Opponent, Pool::Mobile, self.opponent.mobile);
        for (at, cell) in &self.cells {
            snapshot = snapshot.with_unit(*at, cell.unit);
        }
        for (&(player, pool, lookahead), amount) in &self.projections {
            snapshot = snapshot.with_projection(player, pool, lookahead, *amount);
        }
        snapshot
    }

    /// Resolves scheduled removals, credits their refund and advances the turn.
    pub fn end_turn(&mut self) {
        self.cells.retain(|_, cell| !cell.pending_removal);
        self.mine.structure += self.pending_refund;
        self.pending_refund = 0.0;
        self.deployments.clear();
        self.turn = self.turn.saturating_add(1);
    }

    fn resources_mut(&mut self, player: Player) -> &mut PlayerResources {
        match player {
            Player::Me => &mut self.mine,
            Player::Opponent => &mut self.opponent,
        }
    }

    fn spawn_structure(&mut self, kind: StructureKind, at: Point) -> Result<(), SpawnError> {
        if !self.geometry.contains(at) {
            return Err(SpawnError::OutOfBounds);
        }
        if !self.geometry.in_own_half(at) {
            return Err(SpawnError::OutsideTerritory);
        }
        if self.cells.contains_key(&at) {
            return Err(SpawnError::Occupied);
        }

        let cost = self.costs.structure_cost(kind);
        if cost > self.mine.structure {
            return Err(SpawnError::InsufficientResources);
        }

        self.mine.structure -= cost;
        self.seed(at, StationaryUnit::new(Player::Me, kind));
        Ok(())
    }

    fn spawn_mobile(&mut self, kind: MobileKind, at: Point, count: u32) -> Result<u32, SpawnError> {
        if !self.geometry.contains(at) {
            return Err(SpawnError::OutOfBounds);
        }
        if !self.geometry.is_own_edge(at) {
            return Err(SpawnError::NotOnEdge);
        }
        if self.cells.contains_key(&at) {
            return Err(SpawnError::Occupied);
        }

        let cost = self.costs.mobile_cost(kind);
        let spawned = if cost > 0.0 {
            let affordable = (self.mine.mobile / cost).floor();
            if affordable < f64::from(count) {
                affordable as u32
            } else {
                count
            }
        } else {
            count
        };
        if spawned == 0 {
            return Err(SpawnError::InsufficientResources);
        }

        self.mine.mobile -= cost * f64::from(spawned);
        self.deployments.push(Deployment {
            kind,
            at,
            count: spawned,
        });
        Ok(spawned)
    }

    fn upgrade(&mut self, at: Point) -> Result<(), UpgradeError> {
        if !self.geometry.contains(at) {
            return Err(UpgradeError::OutOfBounds);
        }

        let available = self.mine.structure;
        let cell = self.cells.get_mut(&at).ok_or(UpgradeError::Vacant)?;
        if cell.unit.owner != Player::Me {
            return Err(UpgradeError::NotOwned);
        }
        if cell.unit.upgraded {
            return Err(UpgradeError::AlreadyUpgraded);
        }

        let cost = self.costs.upgrade_cost(cell.unit.kind);
        if cost > available {
            return Err(UpgradeError::InsufficientResources);
        }

        cell.unit = cell.unit.upgraded();
        self.mine.structure -= cost;
        Ok(())
    }

    fn schedule_removal(&mut self, at: Point) -> Result<(), RemovalError> {
        if !self.geometry.contains(at) {
            return Err(RemovalError::OutOfBounds);
        }

        let cell = self.cells.get_mut(&at).ok_or(RemovalError::Vacant)?;
        if cell.unit.owner != Player::Me {
            return Err(RemovalError::NotOwned);
        }
        if cell.pending_removal {
            return Err(RemovalError::AlreadyScheduled);
        }

        cell.pending_removal = true;
        let mut spent = self.costs.structure_cost(cell.unit.kind);
        if cell.unit.upgraded {
            spent += self.costs.upgrade_cost(cell.unit.kind);
        }
        self.pending_refund += spent * self.refund_ratio;
        Ok(())
    }
}

/// Applies the provided command on behalf of the bottom player.
pub fn apply(arena: &mut Arena, command: Command, out_events: &mut Vec<Event>) {
    let event = match command {
        Command::Spawn {
            kind: UnitKind::Structure(structure),
            at,
            ..
        } => match arena.spawn_structure(structure, at) {
            Ok(()) => Event::StructurePlaced {
                kind: structure,
                at,
            },
            Err(reason) => Event::SpawnRejected {
                kind: UnitKind::Structure(structure),
                at,
                reason,
            },
        },
        Command::Spawn {
            kind: UnitKind::Mobile(mobile),
            at,
            count,
        } => match arena.spawn_mobile(mobile, at, count) {
            Ok(count) => Event::MobileSpawned {
                kind: mobile,
                at,
                count,
            },
            Err(reason) => Event::SpawnRejected {
                kind: UnitKind::Mobile(mobile),
                at,
                reason,
            },
        },
        Command::Upgrade { at } => match arena.upgrade(at) {
            Ok(()) => Event::StructureUpgraded { at },
            Err(reason) => Event::UpgradeRejected { at, reason },
        },
        Command::Remove { at } => match arena.schedule_removal(at) {
            Ok(()) => Event::RemovalScheduled { at },
            Err(reason) => Event::RemovalRejected { at, reason },
        },
    };

    trace!(?command, ?event, "arena applied command");
    out_events.push(event);
}

impl Engine for Arena {
    fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        apply(self, command, out);
    }

    fn stationary_unit_at(&self, at: Point) -> Option<StationaryUnit> {
        query::stationary_unit_at(self, at)
    }
}

impl PathOracle for Arena {
    fn path_to_edge(&self, from: Point) -> Option<Vec<Point>> {
        self.paths.get(&from).cloned()
    }

    fn attackers(&self, at: Point, player: Player) -> u32 {
        let range = self.costs.turret.range;
        let reach = range * range;
        let count = self
            .cells
            .iter()
            .filter(|(_, cell)| {
                cell.unit.owner != player && cell.unit.kind == StructureKind::Turret
            })
            .filter(|(point, _)| point.distance_squared(at) as f64 <= reach)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Query functions that provide read-only access to the arena state.
pub mod query {
    use super::{Arena, Deployment};
    use siegeline_core::{Player, PlayerResources, Point, StationaryUnit};

    /// Current turn number.
    #[must_use]
    pub fn turn(arena: &Arena) -> u32 {
        arena.turn
    }

    /// Unit occupying an absolute cell, including units scheduled for removal.
    #[must_use]
    pub fn stationary_unit_at(arena: &Arena, at: Point) -> Option<StationaryUnit> {
        arena.cells.get(&at).map(|cell| cell.unit)
    }

    /// Reports whether the structure at `at` is scheduled for removal.
    #[must_use]
    pub fn removal_scheduled(arena: &Arena, at: Point) -> bool {
        arena.cells.get(&at).is_some_and(|cell| cell.pending_removal)
    }

    /// Resources currently held by a player.
    #[must_use]
    pub fn resources(arena: &Arena, player: Player) -> PlayerResources {
        match player {
            Player::Me => arena.mine,
            Player::Opponent => arena.opponent,
        }
    }

    /// Number of structures owned by a player.
    #[must_use]
    pub fn structure_count(arena: &Arena, player: Player) -> usize {
        arena
            .cells
            .values()
            .filter(|cell| cell.unit.owner == player)
            .count()
    }

    /// Mobile units spawned during the current turn.
    #[must_use]
    pub fn deployments(arena: &Arena) -> &[Deployment] {
        &arena.deployments
    }
}
