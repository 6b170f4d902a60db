#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Offense stage machines.
//!
//! Every offense follows the same linear lifecycle,
//! `Idle -> Preparing -> Executing -> Cooldown -> Idle`, advanced at most once
//! per turn. A [`StageMachine`] owns the lifecycle and the step counter while
//! an [`Archetype`] supplies the entry guard, the preparing step, the
//! execution gate and the formation. Any step may abort straight back to
//! `Idle`; nothing applied before an abort is rolled back.

pub mod archetypes;
pub mod tiers;

use serde::{Deserialize, Serialize};
use siegeline_core::{BoardError, Pool};
use siegeline_system_board_query::BoardQuery;
use siegeline_system_build_plan::Orders;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use archetypes::{
    CornerRush, CornerRushTuning, LineBreach, LineBreachTuning, RushStick, RushStickTuning,
};

/// Maximum number of steps a machine may take before it is forced back to `Idle`.
pub const MAX_STEPS: u32 = 3;

/// Lifecycle position of a stage machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageState {
    /// Waiting for the entry guard to hold.
    #[default]
    Idle,
    /// Clearing space and sending cover units.
    Preparing,
    /// Building the formation and launching the attack.
    Executing,
    /// Resting for a turn before the stage may trigger again.
    Cooldown,
}

/// Shared resource a stage claims while it is outside `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExclusionKey {
    /// Ownership of the always-on base defense and its spending.
    BaseDefense,
}

/// Reasons a stage step aborts back to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum StageError {
    /// A guard or formation read a point outside the arena.
    #[error("stage read outside the arena: {0}")]
    InvalidConfiguration(#[from] BoardError),
    /// The turn's ledger lacks the reserve the execution gate requires.
    #[error("{pool:?} reserve {available} does not meet the required {required}")]
    InsufficientReserve {
        /// Pool that was checked.
        pool: Pool,
        /// Amount left in the pool.
        available: f64,
        /// Boundary the gate compares against.
        required: f64,
    },
    /// A formation the stage relies on is no longer standing.
    #[error("required formation is no longer intact")]
    FormationBroken,
    /// The stage lost the target it selected on entry.
    #[error("no target recorded for execution")]
    MissingTarget,
    /// The machine exceeded its step budget.
    #[error("stage exceeded its step budget")]
    StepLimit,
}

/// Kind of lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    /// The entry guard held and the lock was acquired.
    Entered,
    /// The preparing step completed.
    Prepared,
    /// The formation was built and the attack launched.
    Executed,
    /// The cooldown turn elapsed.
    Cooled,
    /// The machine returned to `Idle` early.
    Aborted(StageError),
}

/// Transition recorded by a machine during a turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageTransition {
    /// Name of the archetype.
    pub stage: &'static str,
    /// State before the transition.
    pub from: StageState,
    /// State after the transition.
    pub to: StageState,
    /// What happened.
    pub kind: Transition,
}

/// Behaviour plugged into a [`StageMachine`].
///
/// Points used by implementations are logical; the query and the ledger
/// perform all normalization.
pub trait Archetype {
    /// Stable name used in logs and transitions.
    fn name(&self) -> &'static str;

    /// Lock claimed while the stage is active.
    fn exclusion(&self) -> ExclusionKey {
        ExclusionKey::BaseDefense
    }

    /// Entry predicate evaluated against projected resources.
    fn guard(&mut self, query: &BoardQuery<'_>) -> Result<bool, BoardError>;

    /// Preparing step, run on the entry turn.
    fn prepare(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError>;

    /// Execution gate evaluated against the turn's remaining resources.
    ///
    /// A failing gate aborts the stage before any command is issued.
    fn gate(&self, query: &BoardQuery<'_>, orders: &Orders<'_>) -> Result<(), StageError>;

    /// Builds the formation and launches the attack.
    fn execute(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError>;
}

/// Lifecycle driver for a single offense archetype.
pub struct StageMachine {
    archetype: Box<dyn Archetype>,
    state: StageState,
    steps: u32,
    misconfigured: bool,
}

impl std::fmt::Debug for StageMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageMachine")
            .field("stage", &self.archetype.name())
            .field("state", &self.state)
            .field("steps", &self.steps)
            .finish()
    }
}

impl StageMachine {
    /// Wraps an archetype in an idle machine.
    #[must_use]
    pub fn new(archetype: Box<dyn Archetype>) -> Self {
        Self {
            archetype,
            state: StageState::Idle,
            steps: 0,
            misconfigured: false,
        }
    }

    /// Name of the wrapped archetype.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.archetype.name()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> StageState {
        self.state
    }

    /// Steps taken since the machine last left `Idle`.
    #[must_use]
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    /// Lock claimed while the machine is active.
    #[must_use]
    pub fn exclusion(&self) -> ExclusionKey {
        self.archetype.exclusion()
    }

    /// Reports whether the machine currently holds its lock.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != StageState::Idle
    }

    /// Offers entry to an idle machine.
    ///
    /// When the guard holds the machine enters `Preparing` and runs its
    /// preparing step immediately. Returns whether the machine entered.
    ///
    /// A guard that reads outside the arena records an `Idle -> Idle` abort
    /// with [`StageError::InvalidConfiguration`] on every poll, so each turn
    /// report shows the stage is misconfigured. Only the first abort of a run
    /// of failing polls is logged as a warning.
    pub fn poll_entry(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
        out: &mut Vec<StageTransition>,
    ) -> bool {
        if self.state != StageState::Idle {
            return false;
        }

        match self.archetype.guard(query) {
            Ok(false) => {
                self.misconfigured = false;
                false
            }
            Ok(true) => {
                self.misconfigured = false;
                self.transition(StageState::Preparing, Transition::Entered, out);
                self.step(query, orders, out);
                true
            }
            Err(error) => {
                let error = StageError::InvalidConfiguration(error);
                if self.misconfigured {
                    debug!(stage = self.archetype.name(), %error, "stage still misconfigured");
                    let _ = self.record(StageState::Idle, Transition::Aborted(error), out);
                } else {
                    self.misconfigured = true;
                    self.abort(error, out);
                }
                false
            }
        }
    }

    /// Advances an active machine by one step.
    pub fn step(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
        out: &mut Vec<StageTransition>,
    ) {
        if self.state == StageState::Idle {
            return;
        }
        if self.steps >= MAX_STEPS {
            self.abort(StageError::StepLimit, out);
            return;
        }
        self.steps += 1;

        match self.state {
            StageState::Idle => {}
            StageState::Preparing => match self.archetype.prepare(query, orders) {
                Ok(()) => self.transition(StageState::Executing, Transition::Prepared, out),
                Err(error) => self.abort(error, out),
            },
            StageState::Executing => {
                let result = match self.archetype.gate(query, orders) {
                    Ok(()) => self.archetype.execute(query, orders),
                    Err(error) => Err(error),
                };
                match result {
                    Ok(()) => self.transition(StageState::Cooldown, Transition::Executed, out),
                    Err(error) => self.abort(error, out),
                }
            }
            StageState::Cooldown => self.transition(StageState::Idle, Transition::Cooled, out),
        }
    }

    fn abort(&mut self, error: StageError, out: &mut Vec<StageTransition>) {
        warn!(stage = self.archetype.name(), from = ?self.state, %error, "stage aborted");
        self.transition(StageState::Idle, Transition::Aborted(error), out);
    }

    fn transition(&mut self, to: StageState, kind: Transition, out: &mut Vec<StageTransition>) {
        let from = self.record(to, kind, out);
        info!(stage = self.archetype.name(), ?from, ?to, ?kind, "stage transition");
    }

    fn record(
        &mut self,
        to: StageState,
        kind: Transition,
        out: &mut Vec<StageTransition>,
    ) -> StageState {
        let from = self.state;
        self.state = to;
        if to == StageState::Idle {
            self.steps = 0;
        }
        out.push(StageTransition {
            stage: self.archetype.name(),
            from,
            to,
            kind,
        });
        from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeline_core::{BoardGeometry, BoardSnapshot, MatchSetup, PlayerResources};
    use siegeline_world::Arena;

    #[derive(Default)]
    struct Scripted {
        enter: bool,
        reserve: f64,
        off_arena: bool,
    }

    impl Archetype for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn guard(&mut self, _query: &BoardQuery<'_>) -> Result<bool, BoardError> {
            if self.off_arena {
                return Err(BoardError::OutOfBounds {
                    point: siegeline_core::Point::new(0, 0),
                });
            }
            Ok(self.enter)
        }

        fn prepare(
            &mut self,
            _query: &BoardQuery<'_>,
            _orders: &mut Orders<'_>,
        ) -> Result<(), StageError> {
            Ok(())
        }

        fn gate(&self, _query: &BoardQuery<'_>, orders: &Orders<'_>) -> Result<(), StageError> {
            let available = orders.remaining(Pool::Structure);
            if available >= self.reserve {
                Ok(())
            } else {
                Err(StageError::InsufficientReserve {
                    pool: Pool::Structure,
                    available,
                    required: self.reserve,
                })
            }
        }

        fn execute(
            &mut self,
            _query: &BoardQuery<'_>,
            _orders: &mut Orders<'_>,
        ) -> Result<(), StageError> {
            Ok(())
        }
    }

    fn run_turn(machine: &mut StageMachine, structure: f64) -> Vec<StageTransition> {
        let setup = MatchSetup::standard(false);
        let mut arena = Arena::new(&setup);
        let snapshot = BoardSnapshot::new(1, BoardGeometry::standard());
        let query = BoardQuery::new(&snapshot, setup.normalizer());
        let mut orders = Orders::new(&mut arena, &setup, PlayerResources::new(structure, 0.0));
        let mut out = Vec::new();
        if !machine.poll_entry(&query, &mut orders, &mut out) {
            machine.step(&query, &mut orders, &mut out);
        }
        out
    }

    #[test]
    fn full_cycle_resets_the_step_counter() {
        let mut machine = StageMachine::new(Box::new(Scripted {
            enter: true,
            ..Scripted::default()
        }));
        for _ in 0..2 {
            assert_eq!(machine.steps(), 0);
            let kinds: Vec<_> = run_turn(&mut machine, 10.0).iter().map(|t| t.kind).collect();
            assert_eq!(kinds, vec![Transition::Entered, Transition::Prepared]);
            assert_eq!(machine.state(), StageState::Executing);

            let _ = run_turn(&mut machine, 10.0);
            assert_eq!(machine.state(), StageState::Cooldown);

            let cooled = run_turn(&mut machine, 10.0);
            assert_eq!(cooled[0].kind, Transition::Cooled);
            assert_eq!(machine.state(), StageState::Idle);
        }
        assert_eq!(machine.steps(), 0);
    }

    #[test]
    fn guard_failure_keeps_the_machine_idle() {
        let mut machine = StageMachine::new(Box::new(Scripted::default()));
        assert!(run_turn(&mut machine, 10.0).is_empty());
        assert_eq!(machine.state(), StageState::Idle);
        assert!(!machine.is_active());
    }

    #[test]
    fn gate_failure_aborts_to_idle() {
        let mut machine = StageMachine::new(Box::new(Scripted {
            enter: true,
            reserve: 20.0,
            ..Scripted::default()
        }));
        let _ = run_turn(&mut machine, 10.0);
        let aborted = run_turn(&mut machine, 10.0);
        assert_eq!(aborted.len(), 1);
        assert_eq!(aborted[0].from, StageState::Executing);
        assert_eq!(aborted[0].to, StageState::Idle);
        assert!(matches!(
            aborted[0].kind,
            Transition::Aborted(StageError::InsufficientReserve { .. })
        ));
        assert_eq!(machine.steps(), 0);
    }

    #[test]
    fn misconfigured_guard_aborts_on_every_poll() {
        let mut machine = StageMachine::new(Box::new(Scripted {
            off_arena: true,
            ..Scripted::default()
        }));
        for _ in 0..2 {
            let aborted = run_turn(&mut machine, 10.0);
            assert_eq!(aborted.len(), 1);
            assert_eq!(aborted[0].from, StageState::Idle);
            assert_eq!(aborted[0].to, StageState::Idle);
            assert!(matches!(
                aborted[0].kind,
                Transition::Aborted(StageError::InvalidConfiguration(_))
            ));
            assert_eq!(machine.state(), StageState::Idle);
            assert_eq!(machine.steps(), 0);
        }
    }

    #[test]
    fn stages_claim_the_base_defense_by_default() {
        let machine = StageMachine::new(Box::new(Scripted::default()));
        assert_eq!(machine.exclusion(), ExclusionKey::BaseDefense);
    }
}
