//! Per-turn command sink shared by every code path that spends resources.

use siegeline_core::{
    BoardGeometry, Command, Engine, Event, MatchSetup, MobileKind, Normalizer, Player,
    PlayerResources, Point, Pool, RemovalError, SpawnError, StationaryUnit, StructureKind,
    UnitCosts, UnitKind, UpgradeError,
};
use tracing::trace;

/// Turn-scoped handle through which all commands reach the engine.
///
/// `Orders` accepts logical points, converts them to absolute cells exactly
/// once and keeps its own ledger of the structure and mobile points left this
/// turn. Structures and upgrades the ledger cannot fund are rejected without
/// contacting the engine, so the combined spend of every caller never exceeds
/// the pools the turn started with. Refunds from removals only arrive once the
/// turn ends and are never credited to the ledger.
pub struct Orders<'a> {
    engine: &'a mut dyn Engine,
    normalizer: Normalizer,
    geometry: BoardGeometry,
    costs: UnitCosts,
    ledger: PlayerResources,
    commands: Vec<Command>,
    events: Vec<Event>,
}

impl std::fmt::Debug for Orders<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orders")
            .field("normalizer", &self.normalizer)
            .field("ledger", &self.ledger)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Orders<'a> {
    /// Opens a ledger funded with `resources` for the current turn.
    pub fn new(engine: &'a mut dyn Engine, setup: &MatchSetup, resources: PlayerResources) -> Self {
        Self {
            engine,
            normalizer: setup.normalizer(),
            geometry: setup.geometry,
            costs: setup.costs.clone(),
            ledger: resources,
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Normalizer applied to every outgoing point.
    #[must_use]
    pub const fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    /// Cost table used by the ledger.
    #[must_use]
    pub const fn costs(&self) -> &UnitCosts {
        &self.costs
    }

    /// Read access to the engine for path and attacker queries.
    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        &*self.engine
    }

    /// Amount still available in a pool this turn.
    #[must_use]
    pub const fn remaining(&self, pool: Pool) -> f64 {
        self.ledger.get(pool)
    }

    /// Number of commands issued so far this turn.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.commands.len()
    }

    /// Commands issued so far, in absolute coordinates.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Reports whether a logical point lies inside the arena.
    #[must_use]
    pub fn contains(&self, at: Point) -> bool {
        self.geometry.contains(self.normalizer.normalize(at))
    }

    /// Live occupant of a logical point, reflecting commands already applied.
    ///
    /// Points outside the arena have no occupant.
    #[must_use]
    pub fn occupant(&self, at: Point) -> Option<StationaryUnit> {
        let absolute = self.normalizer.normalize(at);
        if !self.geometry.contains(absolute) {
            return None;
        }
        self.engine.stationary_unit_at(absolute)
    }

    /// Places a structure at a logical point.
    pub fn spawn_structure(&mut self, kind: StructureKind, at: Point) -> Result<(), SpawnError> {
        let absolute = self.normalizer.normalize(at);
        if !self.geometry.contains(absolute) {
            return Err(SpawnError::OutOfBounds);
        }
        let cost = self.costs.structure_cost(kind);
        if cost > self.ledger.structure {
            return Err(SpawnError::InsufficientResources);
        }

        let command = Command::Spawn {
            kind: UnitKind::Structure(kind),
            at: absolute,
            count: 1,
        };
        match self.submit(command) {
            Some(Event::StructurePlaced { .. }) => {
                self.ledger.structure -= cost;
                Ok(())
            }
            Some(Event::SpawnRejected { reason, .. }) => Err(reason),
            _ => Err(SpawnError::Occupied),
        }
    }

    /// Requests `count` mobile units at a logical point.
    ///
    /// Oversized counts are forwarded unchanged; the engine clamps them to
    /// what is affordable. Returns the number of units actually spawned.
    pub fn spawn_mobile(
        &mut self,
        kind: MobileKind,
        at: Point,
        count: u32,
    ) -> Result<u32, SpawnError> {
        let absolute = self.normalizer.normalize(at);
        if !self.geometry.contains(absolute) {
            return Err(SpawnError::OutOfBounds);
        }
        let cost = self.costs.mobile_cost(kind);
        if count == 0 || cost > self.ledger.mobile {
            return Err(SpawnError::InsufficientResources);
        }

        let command = Command::Spawn {
            kind: UnitKind::Mobile(kind),
            at: absolute,
            count,
        };
        match self.submit(command) {
            Some(Event::MobileSpawned { count, .. }) => {
                self.ledger.mobile = (self.ledger.mobile - cost * f64::from(count)).max(0.0);
                Ok(count)
            }
            Some(Event::SpawnRejected { reason, .. }) => Err(reason),
            _ => Err(SpawnError::Occupied),
        }
    }

    /// Upgrades the own structure at a logical point.
    pub fn upgrade(&mut self, at: Point) -> Result<(), UpgradeError> {
        let absolute = self.normalizer.normalize(at);
        if !self.geometry.contains(absolute) {
            return Err(UpgradeError::OutOfBounds);
        }
        let unit = self
            .engine
            .stationary_unit_at(absolute)
            .ok_or(UpgradeError::Vacant)?;
        if unit.owner != Player::Me {
            return Err(UpgradeError::NotOwned);
        }
        if unit.upgraded {
            return Err(UpgradeError::AlreadyUpgraded);
        }
        let cost = self.costs.upgrade_cost(unit.kind);
        if cost > self.ledger.structure {
            return Err(UpgradeError::InsufficientResources);
        }

        match self.submit(Command::Upgrade { at: absolute }) {
            Some(Event::StructureUpgraded { .. }) => {
                self.ledger.structure -= cost;
                Ok(())
            }
            Some(Event::UpgradeRejected { reason, .. }) => Err(reason),
            _ => Err(UpgradeError::Vacant),
        }
    }

    /// Schedules removal of the own structure at a logical point.
    pub fn remove(&mut self, at: Point) -> Result<(), RemovalError> {
        let absolute = self.normalizer.normalize(at);
        if !self.geometry.contains(absolute) {
            return Err(RemovalError::OutOfBounds);
        }

        match self.submit(Command::Remove { at: absolute }) {
            Some(Event::RemovalScheduled { .. }) => Ok(()),
            Some(Event::RemovalRejected { reason, .. }) => Err(reason),
            _ => Err(RemovalError::Vacant),
        }
    }

    /// Closes the ledger, returning the issued commands and reported events.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Command>, Vec<Event>) {
        (self.commands, self.events)
    }

    fn submit(&mut self, command: Command) -> Option<Event> {
        let before = self.events.len();
        self.commands.push(command);
        self.engine.apply(command, &mut self.events);
        let event = self.events.get(before).copied();
        trace!(?command, ?event, "command submitted");
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeline_world::Arena;

    fn arena(structure: f64, mobile: f64) -> Arena {
        let mut arena = Arena::new(&MatchSetup::standard(false));
        arena.set_resource(Player::Me, Pool::Structure, structure);
        arena.set_resource(Player::Me, Pool::Mobile, mobile);
        arena
    }

    #[test]
    fn unaffordable_structures_never_reach_the_engine() {
        let mut arena = arena(1.0, 0.0);
        let setup = MatchSetup::standard(false);
        let mut orders = Orders::new(&mut arena, &setup, PlayerResources::new(1.0, 0.0));

        assert_eq!(
            orders.spawn_structure(StructureKind::Turret, Point::new(13, 3)),
            Err(SpawnError::InsufficientResources)
        );
        assert_eq!(orders.issued(), 0);
        assert_eq!(orders.spawn_structure(StructureKind::Wall, Point::new(13, 3)), Ok(()));
        assert_eq!(orders.remaining(Pool::Structure), 0.0);
    }

    #[test]
    fn mobile_spawns_deduct_the_clamped_count() {
        let mut arena = arena(0.0, 7.0);
        let setup = MatchSetup::standard(false);
        let mut orders = Orders::new(&mut arena, &setup, PlayerResources::new(0.0, 7.0));

        assert_eq!(
            orders.spawn_mobile(MobileKind::Demolisher, Point::new(24, 10), 10_000),
            Ok(2)
        );
        assert_eq!(orders.remaining(Pool::Mobile), 1.0);
        assert_eq!(
            orders.spawn_mobile(MobileKind::Demolisher, Point::new(24, 10), 1),
            Err(SpawnError::InsufficientResources)
        );
        assert_eq!(orders.issued(), 1);
    }

    #[test]
    fn off_board_points_are_rejected_locally() {
        let mut arena = arena(10.0, 10.0);
        let setup = MatchSetup::standard(false);
        let mut orders = Orders::new(&mut arena, &setup, PlayerResources::new(10.0, 10.0));

        assert_eq!(
            orders.spawn_structure(StructureKind::Wall, Point::new(27, 12)),
            Err(SpawnError::OutOfBounds)
        );
        assert_eq!(orders.remove(Point::new(0, 0)), Err(RemovalError::OutOfBounds));
        assert_eq!(orders.issued(), 0);
    }
}
