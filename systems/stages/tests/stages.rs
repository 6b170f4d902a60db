use siegeline_core::{
    BoardError, MatchSetup, MobileKind, Player, Point, Pool, StationaryUnit, StructureKind,
};
use siegeline_system_board_query::BoardQuery;
use siegeline_system_build_plan::{templates, Orders};
use siegeline_system_stages::{
    CornerRush, LineBreach, LineBreachTuning, RushStick, StageError, StageMachine, StageState,
    StageTransition, Transition,
};
use siegeline_world::{query, Arena};

/// Runs one turn of a single machine against the arena.
///
/// Returns the transitions and the number of commands issued during the turn.
fn play(
    machine: &mut StageMachine,
    arena: &mut Arena,
    setup: &MatchSetup,
) -> (Vec<StageTransition>, usize) {
    let snapshot = arena.snapshot();
    let query = BoardQuery::new(&snapshot, setup.normalizer());
    let resources = query::resources(arena, Player::Me);
    let mut orders = Orders::new(arena, setup, resources);
    let mut out = Vec::new();
    if machine.is_active() {
        machine.step(&query, &mut orders, &mut out);
    } else {
        let _ = machine.poll_entry(&query, &mut orders, &mut out);
    }
    (out, orders.issued())
}

fn kinds(transitions: &[StageTransition]) -> Vec<Transition> {
    transitions.iter().map(|transition| transition.kind).collect()
}

fn own_wall(arena: &mut Arena, x: i32, y: i32) {
    arena.seed(Point::new(x, y), StationaryUnit::new(Player::Me, StructureKind::Wall));
}

/// Thirty own walls and an opposing row 14 holding nine turrets, one upgraded.
fn breach_ready(setup: &MatchSetup) -> Arena {
    let mut arena = Arena::new(setup);
    arena.set_turn(12);
    for x in 0..28 {
        own_wall(&mut arena, x, 13);
    }
    own_wall(&mut arena, 1, 12);
    own_wall(&mut arena, 2, 12);
    for x in 0..9 {
        let turret = StationaryUnit::new(Player::Opponent, StructureKind::Turret);
        let turret = if x == 0 { turret.upgraded() } else { turret };
        arena.seed(Point::new(x, 14), turret);
    }
    arena.set_resource(Player::Me, Pool::Mobile, 10.0);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 10.0);
    arena
}

#[test]
fn line_breach_enters_and_prepares_in_one_turn() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    let mut machine = StageMachine::new(Box::new(LineBreach::default()));

    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Entered, Transition::Prepared]);
    assert_eq!(transitions[0].from, StageState::Idle);
    assert_eq!(transitions[1].to, StageState::Executing);
    assert_eq!(machine.state(), StageState::Executing);

    assert!(query::removal_scheduled(&arena, Point::new(0, 13)));
    assert!(query::removal_scheduled(&arena, Point::new(2, 12)));
    let cover: Vec<_> = query::deployments(&arena)
        .iter()
        .map(|deployment| (deployment.kind, deployment.at))
        .collect();
    assert_eq!(
        cover,
        vec![
            (MobileKind::Interceptor, Point::new(14, 0)),
            (MobileKind::Interceptor, Point::new(21, 7)),
        ]
    );
}

#[test]
fn line_breach_stays_idle_without_projected_mobile_points() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 8.0);
    let mut machine = StageMachine::new(Box::new(LineBreach::default()));

    let (transitions, issued) = play(&mut machine, &mut arena, &setup);
    assert!(transitions.is_empty());
    assert_eq!(issued, 0);
    assert_eq!(machine.state(), StageState::Idle);
}

#[test]
fn failed_gate_aborts_before_any_command() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    let mut machine = StageMachine::new(Box::new(LineBreach::default()));
    let _ = play(&mut machine, &mut arena, &setup);

    arena.end_turn();
    arena.set_resource(Player::Me, Pool::Structure, 10.0);
    let (transitions, issued) = play(&mut machine, &mut arena, &setup);

    assert_eq!(issued, 0, "an aborted gate issues nothing");
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].from, StageState::Executing);
    assert_eq!(
        transitions[0].kind,
        Transition::Aborted(StageError::InsufficientReserve {
            pool: Pool::Structure,
            available: 10.0,
            required: 20.0,
        })
    );
    assert_eq!(machine.state(), StageState::Idle);
    assert_eq!(machine.steps(), 0);
}

#[test]
fn line_breach_runs_a_full_cycle() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    let mut machine = StageMachine::new(Box::new(LineBreach::default()));
    let _ = play(&mut machine, &mut arena, &setup);

    arena.end_turn();
    assert_eq!(query::resources(&arena, Player::Me).structure, 22.5);
    arena.set_resource(Player::Me, Pool::Structure, 30.0);
    arena.set_resource(Player::Me, Pool::Mobile, 9.0);
    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Executed]);
    assert_eq!(machine.state(), StageState::Cooldown);

    assert!(query::removal_scheduled(&arena, Point::new(26, 12)));
    assert!(query::removal_scheduled(&arena, Point::new(10, 12)));
    assert!(query::removal_scheduled(&arena, Point::new(21, 10)));
    let demolishers: Vec<_> = query::deployments(&arena)
        .iter()
        .filter(|deployment| deployment.kind == MobileKind::Demolisher)
        .map(|deployment| (deployment.at, deployment.count))
        .collect();
    assert_eq!(demolishers, vec![(Point::new(24, 10), 3)]);

    arena.end_turn();
    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Cooled]);
    assert_eq!(machine.state(), StageState::Idle);
    assert_eq!(machine.steps(), 0);
}

#[test]
fn off_arena_tuning_aborts_as_invalid_configuration() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    let tuning = LineBreachTuning {
        launch: Point::new(0, 0),
        ..LineBreachTuning::default()
    };
    let mut machine = StageMachine::new(Box::new(LineBreach::new(tuning)));

    let (transitions, issued) = play(&mut machine, &mut arena, &setup);
    assert_eq!(issued, 0);
    assert_eq!(
        kinds(&transitions),
        vec![Transition::Aborted(StageError::InvalidConfiguration(
            BoardError::OutOfBounds {
                point: Point::new(0, 0)
            }
        ))]
    );
    assert!(!machine.is_active());
}

#[test]
fn rush_stick_waits_for_a_quiet_opponent() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    arena.set_turn(10);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 16.0);
    arena.set_projection(Player::Opponent, Pool::Mobile, 1, 12.0);
    let mut machine = StageMachine::new(Box::new(RushStick::default()));

    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert!(transitions.is_empty());

    arena.set_projection(Player::Opponent, Pool::Mobile, 1, 5.0);
    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Entered, Transition::Prepared]);
    assert!(query::removal_scheduled(&arena, Point::new(27, 13)));
}

#[test]
fn rush_stick_respects_the_turn_tiers() {
    let setup = MatchSetup::standard(false);
    let mut arena = breach_ready(&setup);
    arena.set_turn(40);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 24.0);
    arena.set_projection(Player::Opponent, Pool::Mobile, 1, 5.0);
    let mut machine = StageMachine::new(Box::new(RushStick::default()));

    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert!(transitions.is_empty(), "turn 40 needs at least 25 projected points");
}

/// A rush stick that entered on turn 10 and is executing on turn 11.
fn rush_stick_executing(setup: &MatchSetup) -> (StageMachine, Arena) {
    let mut arena = breach_ready(setup);
    arena.set_turn(10);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 16.0);
    arena.set_projection(Player::Opponent, Pool::Mobile, 1, 5.0);
    let mut machine = StageMachine::new(Box::new(RushStick::default()));
    let (transitions, _) = play(&mut machine, &mut arena, setup);
    assert_eq!(kinds(&transitions), vec![Transition::Entered, Transition::Prepared]);

    arena.end_turn();
    arena.set_resource(Player::Me, Pool::Mobile, 12.0);
    (machine, arena)
}

#[test]
fn rush_stick_gate_needs_the_full_reserve() {
    let setup = MatchSetup::standard(false);
    let (mut machine, mut arena) = rush_stick_executing(&setup);
    arena.set_resource(Player::Me, Pool::Structure, 35.0);

    let (transitions, issued) = play(&mut machine, &mut arena, &setup);
    assert_eq!(issued, 0);
    assert_eq!(
        kinds(&transitions),
        vec![Transition::Aborted(StageError::InsufficientReserve {
            pool: Pool::Structure,
            available: 35.0,
            required: 36.0,
        })]
    );
    assert!(query::deployments(&arena).is_empty());
    assert_eq!(machine.state(), StageState::Idle);
}

#[test]
fn rush_stick_cycles_the_stick_and_sends_demolishers() {
    let setup = MatchSetup::standard(false);
    let (mut machine, mut arena) = rush_stick_executing(&setup);
    arena.set_resource(Player::Me, Pool::Structure, 36.0);

    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Executed]);
    assert_eq!(machine.state(), StageState::Cooldown);

    let stick = query::stationary_unit_at(&arena, Point::new(14, 12));
    assert!(stick.is_some_and(|unit| unit.kind == StructureKind::Wall));
    assert!(query::removal_scheduled(&arena, Point::new(14, 12)));
    let demolishers: Vec<_> = query::deployments(&arena)
        .iter()
        .filter(|deployment| deployment.kind == MobileKind::Demolisher)
        .map(|deployment| (deployment.at, deployment.count))
        .collect();
    assert_eq!(demolishers, vec![(Point::new(13, 0), 4)]);
}

#[test]
fn corner_rush_opens_the_corner_and_sends_scouts() {
    let setup = MatchSetup::standard(false);
    let mut arena = Arena::new(&setup);
    arena.set_turn(10);
    for at in templates::full_v() {
        own_wall(&mut arena, at.x(), at.y());
    }
    for (x, y) in [(26, 13), (27, 13), (0, 13), (1, 13)] {
        own_wall(&mut arena, x, y);
    }
    arena.set_resource(Player::Me, Pool::Mobile, 16.0);
    arena.set_projection(Player::Me, Pool::Mobile, 1, 16.0);
    let mut machine = StageMachine::new(Box::new(CornerRush::default()));

    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Entered, Transition::Prepared]);
    for at in templates::corner_walls() {
        assert!(query::removal_scheduled(&arena, at));
    }
    assert!(!query::removal_scheduled(&arena, Point::new(0, 13)));

    arena.end_turn();
    arena.set_resource(Player::Me, Pool::Structure, 5.0);
    let (transitions, _) = play(&mut machine, &mut arena, &setup);
    assert_eq!(kinds(&transitions), vec![Transition::Executed]);

    let pivot = query::stationary_unit_at(&arena, Point::new(20, 13));
    assert!(pivot.is_some_and(|unit| unit.upgraded));
    assert!(query::removal_scheduled(&arena, Point::new(20, 13)));
    let scouts: Vec<_> = query::deployments(&arena)
        .iter()
        .map(|deployment| (deployment.kind, deployment.at, deployment.count))
        .collect();
    assert_eq!(
        scouts,
        vec![
            (MobileKind::Scout, Point::new(13, 0), 4),
            (MobileKind::Scout, Point::new(11, 2), 12),
        ]
    );
}

#[test]
fn corner_rush_aborts_when_the_funnel_breaks() {
    let setup = MatchSetup::standard(false);
    let mut arena = Arena::new(&setup);
    arena.set_turn(10);
    for at in templates::full_v() {
        own_wall(&mut arena, at.x(), at.y());
    }
    for (x, y) in [(26, 13), (27, 13), (0, 13), (1, 13)] {
        own_wall(&mut arena, x, y);
    }
    arena.set_projection(Player::Me, Pool::Mobile, 1, 16.0);
    let mut machine = StageMachine::new(Box::new(CornerRush::default()));
    let _ = play(&mut machine, &mut arena, &setup);

    // the next snapshot is taken from a board missing a funnel wall
    let mut broken = Arena::new(&setup);
    for at in templates::full_v().into_iter().skip(1) {
        own_wall(&mut broken, at.x(), at.y());
    }
    let (transitions, issued) = play(&mut machine, &mut broken, &setup);
    assert_eq!(issued, 0);
    assert_eq!(
        kinds(&transitions),
        vec![Transition::Aborted(StageError::FormationBroken)]
    );
}
