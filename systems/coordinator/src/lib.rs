#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-turn orchestration of the base defense, the offense stages, the escorts
//! and the opportunistic bursts.

mod burst;
mod defense;
mod escort;
mod tuning;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use siegeline_core::{
    BoardSnapshot, Command, Engine, Event, MatchSetup, MobileKind, Player, Point, Pool,
};
use siegeline_system_board_query::BoardQuery;
use siegeline_system_build_plan::{templates, Orders, StepOutcome};
use siegeline_system_stages::{
    archetypes::scout_split, tiers::tiers_allow, CornerRush, ExclusionKey, LineBreach, RushStick,
    StageMachine, StageState, StageTransition, Transition,
};
use tracing::debug;

pub use burst::{BurstTuning, LateDemolisherTuning};
pub use escort::EscortTuning;
pub use tuning::{Tuning, TuningError};

use escort::EscortContext;

/// Everything the coordinator did during one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReport {
    /// Turn the report belongs to.
    pub turn: u32,
    /// Commands issued, in issue order, using absolute coordinates.
    pub commands: Vec<Command>,
    /// Engine events, one per command.
    pub events: Vec<Event>,
    /// Outcomes of the base-defense plan; empty while a stage holds the base.
    pub outcomes: Vec<StepOutcome>,
    /// Indicates whether the corner walls were sold for a rebuild.
    pub refreshed_corners: bool,
    /// Stage transitions recorded this turn.
    pub transitions: Vec<StageTransition>,
}

/// Turn-level decision maker.
///
/// Stage machines are kept in priority order: the line breach is consulted
/// first, then the stick rush, then the corner rush.
#[derive(Debug)]
pub struct TurnCoordinator {
    setup: MatchSetup,
    tuning: Tuning,
    machines: Vec<StageMachine>,
    breaches: Vec<Point>,
    rng: ChaCha8Rng,
    /// A stage finished its cooldown last turn.
    recovering: bool,
}

impl TurnCoordinator {
    /// Creates a coordinator for a match.
    #[must_use]
    pub fn new(setup: MatchSetup, tuning: Tuning) -> Self {
        let machines = vec![
            StageMachine::new(Box::new(LineBreach::new(tuning.line_breach.clone()))),
            StageMachine::new(Box::new(RushStick::new(tuning.rush_stick.clone()))),
            StageMachine::new(Box::new(CornerRush::new(tuning.corner_rush.clone()))),
        ];
        let rng = ChaCha8Rng::seed_from_u64(tuning.late_demolisher.seed);
        Self {
            setup,
            tuning,
            machines,
            breaches: Vec::new(),
            rng,
            recovering: false,
        }
    }

    /// Lifecycle state of the named stage.
    #[must_use]
    pub fn stage_state(&self, name: &str) -> Option<StageState> {
        self.machines
            .iter()
            .find(|machine| machine.name() == name)
            .map(StageMachine::state)
    }

    /// Name of the stage currently holding `key`.
    #[must_use]
    pub fn lock_holder(&self, key: ExclusionKey) -> Option<&'static str> {
        self.machines
            .iter()
            .find(|machine| machine.is_active() && machine.exclusion() == key)
            .map(StageMachine::name)
    }

    fn held_keys(&self) -> Vec<ExclusionKey> {
        self.machines
            .iter()
            .filter(|machine| machine.is_active())
            .map(StageMachine::exclusion)
            .collect()
    }

    /// Logical cells where the opponent scored, in first-seen order.
    #[must_use]
    pub fn breaches(&self) -> &[Point] {
        &self.breaches
    }

    /// Records a breach reported by the engine at an absolute cell.
    ///
    /// Only breaches scored by the opponent feed the reactive defense.
    pub fn on_breach(&mut self, location: Point, scored_by_opponent: bool) {
        if !scored_by_opponent {
            return;
        }
        let logical = self.setup.normalizer().normalize(location);
        if !self.breaches.contains(&logical) {
            debug!(?logical, "breach recorded");
            self.breaches.push(logical);
        }
    }

    /// Decides and issues every command for the turn.
    pub fn decide(&mut self, snapshot: &BoardSnapshot, engine: &mut dyn Engine) -> TurnReport {
        let query = BoardQuery::new(snapshot, self.setup.normalizer());
        let mut orders = Orders::new(engine, &self.setup, snapshot.resources(Player::Me));
        let mut transitions = Vec::new();

        let mut held = self.held_keys();
        let (outcomes, refreshed_corners) = if held.contains(&ExclusionKey::BaseDefense) {
            (Vec::new(), false)
        } else {
            let keep_open = self.keep_hole_open(&query);
            let (applied, refreshed) =
                defense::build(self.tuning.defense, &self.breaches, keep_open, &mut orders);
            (applied.into_outcomes(), refreshed)
        };

        for machine in self.machines.iter_mut().filter(|machine| machine.is_active()) {
            machine.step(&query, &mut orders, &mut transitions);
        }
        // keys held at the start of the turn stay held even if their stage aborted
        for machine in &mut self.machines {
            let key = machine.exclusion();
            if !held.contains(&key) && machine.poll_entry(&query, &mut orders, &mut transitions) {
                held.push(key);
            }
        }

        let past_preparing = self.machines.iter().any(|machine| {
            matches!(machine.state(), StageState::Executing | StageState::Cooldown)
        });
        let locked = self.lock_holder(ExclusionKey::BaseDefense).is_some();
        self.escort(&query, &mut orders, locked, past_preparing);
        if !locked {
            self.burst(&query, &mut orders);
        }
        self.recovering = transitions
            .iter()
            .any(|transition| transition.kind == Transition::Cooled);

        let (commands, events) = orders.into_parts();
        debug!(
            turn = query.turn(),
            commands = commands.len(),
            transitions = transitions.len(),
            lock = ?self.lock_holder(ExclusionKey::BaseDefense),
            "turn decided"
        );
        TurnReport {
            turn: query.turn(),
            commands,
            events,
            outcomes,
            refreshed_corners,
            transitions,
        }
    }

    /// Hole left unbuilt on the first rebuild after an attack while the
    /// opponent can afford a push through it.
    fn keep_hole_open(&self, query: &BoardQuery<'_>) -> Option<Point> {
        let escort = &self.tuning.escort;
        let alert = query.available_resource(Pool::Mobile, Player::Opponent) >= escort.alert_mobile;
        (self.recovering && escort.open_hole_after_attack && alert).then_some(escort.hole)
    }

    fn escort(
        &self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
        locked: bool,
        past_preparing: bool,
    ) {
        let context = EscortContext {
            turn: query.turn(),
            opponent_mobile: query.available_resource(Pool::Mobile, Player::Opponent),
            locked,
            past_preparing,
            v_intact: templates::full_v()
                .into_iter()
                .all(|at| orders.occupant(at).is_some()),
            hole_open: orders.occupant(self.tuning.escort.hole).is_none(),
        };
        for (at, count) in escort::escorts(&self.tuning.escort, &context) {
            launch(orders, MobileKind::Interceptor, at, count);
        }
    }

    fn burst(&mut self, query: &BoardQuery<'_>, orders: &mut Orders<'_>) {
        let turn = query.turn();
        let mobile = query.available_resource(Pool::Mobile, Player::Me);
        if !tiers_allow(&self.tuning.burst.tiers, turn, mobile) {
            return;
        }

        let late = &self.tuning.late_demolisher;
        if burst::roll_late_push(late, turn, &mut self.rng) {
            let damage = self.setup.costs.turret.damage;
            let launches = &late.launches;
            let from = query
                .least_damage_launch(launches, orders.engine(), damage)
                .or_else(|| launches.first().copied());
            if let Some(at) = from {
                launch(orders, MobileKind::Demolisher, at, late.count);
            }
            return;
        }

        for (at, count) in scout_split(orders, &self.tuning.burst.launches) {
            launch(orders, MobileKind::Scout, at, count);
        }
    }
}

fn launch(orders: &mut Orders<'_>, kind: MobileKind, at: Point, count: u32) {
    match orders.spawn_mobile(kind, at, count) {
        Ok(spawned) => debug!(?kind, ?at, spawned, "mobile units launched"),
        Err(reason) => debug!(?kind, ?at, ?reason, "mobile launch rejected"),
    }
}
