#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ordered fortification blueprints and the ledger that applies them.
//!
//! A [`BuildPlan`] is plain data: an ordered list of [`PlanStep`] values in
//! logical coordinates. Applying it through [`Orders`] issues every step in
//! order and records one [`StepOutcome`] per step. A rejected step never
//! stops the plan; partial application is the normal case.

mod orders;
pub mod templates;

use siegeline_core::{Player, Point, Pool, RemovalError, SpawnError, StructureKind, UpgradeError};
use tracing::debug;

pub use orders::Orders;

/// Desired structure at a logical location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementIntent {
    /// Kind of structure to place.
    pub kind: StructureKind,
    /// Logical location of the structure.
    pub at: Point,
    /// Indicates whether the structure should be upgraded once present.
    pub upgrade: bool,
}

impl PlacementIntent {
    /// Creates a new placement intent.
    #[must_use]
    pub const fn new(kind: StructureKind, at: Point, upgrade: bool) -> Self {
        Self { kind, at, upgrade }
    }
}

/// Repeated placement marching away from an origin.
///
/// Structures are placed at `origin`, `origin + step`, `origin + 2 * step`
/// and so on. Cells outside the arena are skipped. The extension stops at the
/// first placement the ledger cannot fund and never runs for more than
/// `max_len` cells or the board width, whichever is smaller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extension {
    /// Kind of structure placed at every cell.
    pub kind: StructureKind,
    /// First logical cell of the extension.
    pub origin: Point,
    /// Displacement between consecutive cells.
    pub step: (i32, i32),
    /// Maximum number of cells visited.
    pub max_len: u32,
    /// Removes each structure right after placing it to reclaim its refund.
    pub remove_after: bool,
}

/// Single instruction of a [`BuildPlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanStep {
    /// Place a structure, upgrading it afterwards when requested.
    Place(PlacementIntent),
    /// Upgrade whatever own structure occupies the point.
    Upgrade(Point),
    /// Schedule removal of the own structure at the point.
    Remove(Point),
    /// Place structures along a line for as long as resources allow.
    Extend(Extension),
}

/// Result of a single step or extension cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementOutcome {
    /// A new structure was placed.
    Placed,
    /// A structure was upgraded.
    Upgraded,
    /// The requested structure or upgrade already exists.
    SkippedAlreadyPresent,
    /// The ledger could not fund the step.
    SkippedInsufficientResources,
    /// The cell holds an incompatible unit or cannot be acted upon.
    SkippedBlocked,
    /// A structure was scheduled for removal.
    Removed,
    /// A removal step found nothing it could remove.
    SkippedNothingToRemove,
    /// The step's point lies outside the arena.
    OutOfBounds,
}

/// Outcome recorded for one cell touched by a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Index of the step within the plan.
    pub step: usize,
    /// Logical point the outcome refers to.
    pub at: Point,
    /// What happened at the point.
    pub outcome: PlacementOutcome,
}

/// Per-step results of applying a [`BuildPlan`].
///
/// Extension steps contribute one entry per visited cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedPlan {
    outcomes: Vec<StepOutcome>,
}

impl AppliedPlan {
    /// Outcomes in the order they were produced.
    #[must_use]
    pub fn outcomes(&self) -> &[StepOutcome] {
        &self.outcomes
    }

    /// Number of entries carrying the provided outcome.
    #[must_use]
    pub fn count(&self, outcome: PlacementOutcome) -> usize {
        self.outcomes
            .iter()
            .filter(|entry| entry.outcome == outcome)
            .count()
    }

    /// Consumes the result, yielding the raw outcome list.
    #[must_use]
    pub fn into_outcomes(self) -> Vec<StepOutcome> {
        self.outcomes
    }

    fn record(&mut self, step: usize, at: Point, outcome: PlacementOutcome) {
        self.outcomes.push(StepOutcome { step, at, outcome });
    }
}

/// Ordered fortification blueprint expressed in logical coordinates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildPlan {
    steps: Vec<PlanStep>,
}

impl BuildPlan {
    /// Creates an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Steps in application order.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the plan holds no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends an arbitrary step.
    #[must_use]
    pub fn push(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a placement without upgrade.
    #[must_use]
    pub fn place(self, kind: StructureKind, at: Point) -> Self {
        self.push(PlanStep::Place(PlacementIntent::new(kind, at, false)))
    }

    /// Appends a placement followed by its upgrade.
    #[must_use]
    pub fn place_upgraded(self, kind: StructureKind, at: Point) -> Self {
        self.push(PlanStep::Place(PlacementIntent::new(kind, at, true)))
    }

    /// Appends an upgrade of an existing structure.
    #[must_use]
    pub fn upgrade(self, at: Point) -> Self {
        self.push(PlanStep::Upgrade(at))
    }

    /// Appends a removal.
    #[must_use]
    pub fn remove(self, at: Point) -> Self {
        self.push(PlanStep::Remove(at))
    }

    /// Appends a build/sell cycle: a placement immediately followed by its removal.
    #[must_use]
    pub fn cycle(self, kind: StructureKind, at: Point, upgrade: bool) -> Self {
        self.push(PlanStep::Place(PlacementIntent::new(kind, at, upgrade)))
            .remove(at)
    }

    /// Appends an extension.
    #[must_use]
    pub fn extend(self, extension: Extension) -> Self {
        self.push(PlanStep::Extend(extension))
    }

    /// Appends every step of another plan.
    #[must_use]
    pub fn append(mut self, other: &BuildPlan) -> Self {
        self.steps.extend_from_slice(&other.steps);
        self
    }

    /// Issues every step in order through the turn's ledger.
    pub fn apply(&self, orders: &mut Orders<'_>) -> AppliedPlan {
        let mut applied = AppliedPlan::default();
        for (index, step) in self.steps.iter().enumerate() {
            match *step {
                PlanStep::Place(intent) => {
                    applied.record(index, intent.at, place(orders, intent));
                }
                PlanStep::Upgrade(at) => {
                    applied.record(index, at, upgrade_outcome(orders.upgrade(at)));
                }
                PlanStep::Remove(at) => {
                    applied.record(index, at, removal_outcome(orders.remove(at)));
                }
                PlanStep::Extend(extension) => {
                    extend(orders, index, extension, &mut applied);
                }
            }
        }

        debug!(
            steps = self.steps.len(),
            placed = applied.count(PlacementOutcome::Placed),
            upgraded = applied.count(PlacementOutcome::Upgraded),
            removed = applied.count(PlacementOutcome::Removed),
            starved = applied.count(PlacementOutcome::SkippedInsufficientResources),
            remaining_sp = orders.remaining(Pool::Structure),
            "build plan applied"
        );
        applied
    }
}

fn place(orders: &mut Orders<'_>, intent: PlacementIntent) -> PlacementOutcome {
    if !orders.contains(intent.at) {
        return PlacementOutcome::OutOfBounds;
    }

    match orders.occupant(intent.at) {
        Some(unit) if unit.owner == Player::Me && unit.kind == intent.kind => {
            if intent.upgrade && !unit.upgraded {
                match orders.upgrade(intent.at) {
                    Ok(()) => PlacementOutcome::Upgraded,
                    Err(UpgradeError::InsufficientResources) => {
                        PlacementOutcome::SkippedInsufficientResources
                    }
                    Err(_) => PlacementOutcome::SkippedAlreadyPresent,
                }
            } else {
                PlacementOutcome::SkippedAlreadyPresent
            }
        }
        Some(_) => PlacementOutcome::SkippedBlocked,
        None => match orders.spawn_structure(intent.kind, intent.at) {
            Ok(()) if intent.upgrade => match orders.upgrade(intent.at) {
                Ok(()) => PlacementOutcome::Upgraded,
                Err(_) => PlacementOutcome::Placed,
            },
            Ok(()) => PlacementOutcome::Placed,
            Err(error) => spawn_outcome(error),
        },
    }
}

fn extend(orders: &mut Orders<'_>, index: usize, extension: Extension, applied: &mut AppliedPlan) {
    let width = u32::try_from(orders.normalizer().width()).unwrap_or(0);
    let limit = extension.max_len.min(width);
    let (dx, dy) = extension.step;

    let mut at = extension.origin;
    for _ in 0..limit {
        let outcome = place(orders, PlacementIntent::new(extension.kind, at, false));
        applied.record(index, at, outcome);
        match outcome {
            PlacementOutcome::SkippedInsufficientResources => break,
            PlacementOutcome::Placed if extension.remove_after => {
                applied.record(index, at, removal_outcome(orders.remove(at)));
            }
            _ => {}
        }
        at = at.offset(dx, dy);
    }
}

fn spawn_outcome(error: SpawnError) -> PlacementOutcome {
    match error {
        SpawnError::OutOfBounds => PlacementOutcome::OutOfBounds,
        SpawnError::InsufficientResources => PlacementOutcome::SkippedInsufficientResources,
        SpawnError::OutsideTerritory | SpawnError::NotOnEdge | SpawnError::Occupied => {
            PlacementOutcome::SkippedBlocked
        }
    }
}

fn upgrade_outcome(result: Result<(), UpgradeError>) -> PlacementOutcome {
    match result {
        Ok(()) => PlacementOutcome::Upgraded,
        Err(UpgradeError::OutOfBounds) => PlacementOutcome::OutOfBounds,
        Err(UpgradeError::AlreadyUpgraded) => PlacementOutcome::SkippedAlreadyPresent,
        Err(UpgradeError::InsufficientResources) => PlacementOutcome::SkippedInsufficientResources,
        Err(UpgradeError::Vacant | UpgradeError::NotOwned) => PlacementOutcome::SkippedBlocked,
    }
}

fn removal_outcome(result: Result<(), RemovalError>) -> PlacementOutcome {
    match result {
        Ok(()) => PlacementOutcome::Removed,
        Err(RemovalError::OutOfBounds) => PlacementOutcome::OutOfBounds,
        Err(RemovalError::NotOwned) => PlacementOutcome::SkippedBlocked,
        Err(RemovalError::Vacant | RemovalError::AlreadyScheduled) => {
            PlacementOutcome::SkippedNothingToRemove
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_keeps_placement_and_removal_adjacent() {
        let at = Point::new(20, 13);
        let plan = BuildPlan::new().cycle(StructureKind::Wall, at, true);
        assert_eq!(
            plan.steps(),
            &[
                PlanStep::Place(PlacementIntent::new(StructureKind::Wall, at, true)),
                PlanStep::Remove(at),
            ]
        );
    }

    #[test]
    fn append_preserves_order() {
        let first = BuildPlan::new().place(StructureKind::Turret, Point::new(3, 13));
        let second = BuildPlan::new().upgrade(Point::new(3, 13));
        let combined = first.clone().append(&second);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.steps()[0], first.steps()[0]);
        assert_eq!(combined.steps()[1], PlanStep::Upgrade(Point::new(3, 13)));
    }
}
