//! The three offense archetypes and their tuning.

use serde::{Deserialize, Serialize};
use siegeline_core::{BoardError, MobileKind, Player, Point, Pool, StructureKind};
use siegeline_system_board_query::BoardQuery;
use siegeline_system_build_plan::{
    templates, AppliedPlan, BuildPlan, Extension, Orders, PlacementOutcome,
};
use tracing::debug;

use crate::tiers::{rush_tiers, tiers_allow, Threshold, TurnTier};
use crate::{Archetype, StageError};

/// Projected amount of a pool, falling back to the current amount when the
/// engine reported no projection.
fn projected_or_current(
    query: &BoardQuery<'_>,
    pool: Pool,
    player: Player,
    lookahead: u32,
) -> f64 {
    query
        .projected_resource(pool, player, lookahead)
        .unwrap_or_else(|| query.available_resource(pool, player))
}

fn ensure_in_arena(query: &BoardQuery<'_>, points: &[Point]) -> Result<(), BoardError> {
    for point in points {
        let _ = query.absolute(*point)?;
    }
    Ok(())
}

fn require(orders: &Orders<'_>, pool: Pool, threshold: Threshold) -> Result<(), StageError> {
    let available = orders.remaining(pool);
    if threshold.admits(available) {
        Ok(())
    } else {
        Err(StageError::InsufficientReserve {
            pool,
            available,
            required: threshold.value(),
        })
    }
}

/// Schedules removal of every own structure on rows up to `through_row`.
///
/// Reads live occupancy so structures placed earlier in the turn are cleared
/// as well. The own half is symmetric under mirroring, so arena cells can be
/// walked directly as logical points.
fn clear_own_rows(query: &BoardQuery<'_>, orders: &mut Orders<'_>, through_row: i32) -> usize {
    let mut cleared = 0;
    for at in query.geometry().points().filter(|at| at.y() <= through_row) {
        let owned = orders
            .occupant(at)
            .is_some_and(|unit| unit.owner == Player::Me);
        if owned && orders.remove(at).is_ok() {
            cleared += 1;
        }
    }
    cleared
}

fn launch(orders: &mut Orders<'_>, kind: MobileKind, at: Point, count: u32) {
    match orders.spawn_mobile(kind, at, count) {
        Ok(spawned) => debug!(?kind, ?at, spawned, "mobile units launched"),
        Err(reason) => debug!(?kind, ?at, ?reason, "mobile launch rejected"),
    }
}

fn report(stage: &'static str, applied: &AppliedPlan) {
    debug!(
        stage,
        placed = applied.count(PlacementOutcome::Placed),
        removed = applied.count(PlacementOutcome::Removed),
        starved = applied.count(PlacementOutcome::SkippedInsufficientResources),
        "formation applied"
    );
}

/// Splits the scouts the ledger can afford across weighted launch points.
///
/// Each share is floored on its own, so a split may leave a few scouts
/// unspent. Launches whose share rounds down to zero are omitted.
#[must_use]
pub fn scout_split(orders: &Orders<'_>, launches: &[(Point, f64)]) -> Vec<(Point, u32)> {
    let cost = orders.costs().mobile_cost(MobileKind::Scout);
    if cost <= 0.0 {
        return Vec::new();
    }
    let affordable = (orders.remaining(Pool::Mobile) / cost).floor();
    launches
        .iter()
        .filter_map(|&(at, share)| {
            let count = (affordable * share).floor();
            (count >= 1.0).then_some((at, count as u32))
        })
        .collect()
}

/// Thresholds and coordinates of the demolisher line breach.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineBreachTuning {
    /// Opposing rows inspected for a weak front.
    pub rows: [i32; 2],
    /// Turrets a row must exceed to count as turret-weak.
    pub turret_count_threshold: usize,
    /// Upgraded turrets a turret-weak row may hold at most.
    pub upgraded_turret_ceiling: usize,
    /// Structures a row must exceed to count as structure-dense.
    pub structure_count_threshold: usize,
    /// Projected mobile points required to enter.
    pub min_projected_mobile: f64,
    /// Lookahead used for resource projections.
    pub projection_lookahead: u32,
    /// Own structures that must be exceeded to enter.
    pub own_structure_floor: usize,
    /// Highest own row counted and cleared.
    pub own_rows_through: i32,
    /// Structure points the formation requires when executing.
    pub structure_reserve: Threshold,
    /// Column the wall line starts from before marching left.
    pub wall_origin_x: i32,
    /// Cells visited by the wall line.
    pub wall_len: u32,
    /// First and last column of the support line.
    pub support_columns: [i32; 2],
    /// Launch point of the demolishers.
    pub launch: Point,
    /// Interceptors sent while the base is cleared.
    pub cover: Vec<Point>,
    /// Oversized count requesting every affordable demolisher.
    pub heavy_count: u32,
}

impl Default for LineBreachTuning {
    fn default() -> Self {
        Self {
            rows: [14, 15],
            turret_count_threshold: 7,
            upgraded_turret_ceiling: 1,
            structure_count_threshold: 22,
            min_projected_mobile: 9.0,
            projection_lookahead: 1,
            own_structure_floor: 25,
            own_rows_through: 13,
            structure_reserve: Threshold::Above(20.0),
            wall_origin_x: 27,
            wall_len: 18,
            support_columns: [21, 6],
            launch: Point::new(24, 10),
            cover: vec![Point::new(14, 0), Point::new(21, 7)],
            heavy_count: 10_000,
        }
    }
}

/// Demolisher attack against the weakest opposing front row.
///
/// Demolishers stop behind a disposable wall line two rows short of the
/// target row and shell it from range, shielded by a support line.
#[derive(Clone, Debug, Default)]
pub struct LineBreach {
    tuning: LineBreachTuning,
    target: Option<i32>,
}

impl LineBreach {
    /// Creates the archetype with the provided tuning.
    #[must_use]
    pub fn new(tuning: LineBreachTuning) -> Self {
        Self {
            tuning,
            target: None,
        }
    }

    /// Row selected on entry, if any.
    #[must_use]
    pub const fn target(&self) -> Option<i32> {
        self.target
    }

    fn weakest_row(&self, query: &BoardQuery<'_>) -> Option<i32> {
        let tuning = &self.tuning;
        query.find_weakest_front_row(
            tuning.rows,
            tuning.turret_count_threshold,
            tuning.upgraded_turret_ceiling,
            tuning.structure_count_threshold,
        )
    }

    fn formation(&self, row: i32) -> BuildPlan {
        let tuning = &self.tuning;
        let support_row = row - 4;
        let [first, last] = tuning.support_columns;
        let columns: Vec<i32> = if first >= last {
            (last..=first).rev().collect()
        } else {
            (first..=last).collect()
        };

        let mut plan = BuildPlan::new().extend(Extension {
            kind: StructureKind::Wall,
            origin: Point::new(tuning.wall_origin_x, row - 2),
            step: (-1, 0),
            max_len: tuning.wall_len,
            remove_after: true,
        });
        for x in &columns {
            plan = plan.cycle(StructureKind::Support, Point::new(*x, support_row), false);
        }
        for x in &columns {
            plan = plan.upgrade(Point::new(*x, support_row));
        }
        plan
    }
}

impl Archetype for LineBreach {
    fn name(&self) -> &'static str {
        "line_breach"
    }

    fn guard(&mut self, query: &BoardQuery<'_>) -> Result<bool, BoardError> {
        ensure_in_arena(query, &[self.tuning.launch])?;
        ensure_in_arena(query, &self.tuning.cover)?;

        let Some(row) = self.weakest_row(query) else {
            return Ok(false);
        };
        let tuning = &self.tuning;
        let mobile =
            projected_or_current(query, Pool::Mobile, Player::Me, tuning.projection_lookahead);
        if mobile < tuning.min_projected_mobile
            || query.count_own_structures(tuning.own_rows_through) <= tuning.own_structure_floor
        {
            return Ok(false);
        }

        self.target = Some(row);
        Ok(true)
    }

    fn prepare(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        let cleared = clear_own_rows(query, orders, self.tuning.own_rows_through);
        debug!(cleared, target = ?self.target, "line breach cleared the base");
        for at in self.tuning.cover.clone() {
            launch(orders, MobileKind::Interceptor, at, 1);
        }
        Ok(())
    }

    fn gate(&self, _query: &BoardQuery<'_>, orders: &Orders<'_>) -> Result<(), StageError> {
        require(orders, Pool::Structure, self.tuning.structure_reserve)
    }

    fn execute(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        let row = self
            .weakest_row(query)
            .or(self.target)
            .ok_or(StageError::MissingTarget)?;
        self.target = None;

        let applied = self.formation(row).apply(orders);
        report(self.name(), &applied);
        launch(orders, MobileKind::Demolisher, self.tuning.launch, self.tuning.heavy_count);
        Ok(())
    }
}

/// Thresholds and coordinates of the stick rush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RushStickTuning {
    /// Own structures that must be exceeded to enter.
    pub own_structure_floor: usize,
    /// Highest own row counted and cleared.
    pub own_rows_through: i32,
    /// Highest projected opponent mobile total that still allows entry.
    pub opponent_mobile_ceiling: f64,
    /// Lookahead used for resource projections.
    pub projection_lookahead: u32,
    /// Projected own mobile points required to enter, by turn.
    pub entry_tiers: Vec<TurnTier>,
    /// Structure points the formation requires when executing.
    pub structure_reserve: Threshold,
    /// Launch point of the demolishers.
    pub launch: Point,
    /// Oversized count requesting every affordable demolisher.
    pub heavy_count: u32,
    /// Interceptors escorting the rush.
    pub escorts: Vec<Point>,
}

impl Default for RushStickTuning {
    fn default() -> Self {
        Self {
            own_structure_floor: 25,
            own_rows_through: 13,
            opponent_mobile_ceiling: 10.0,
            projection_lookahead: 1,
            entry_tiers: rush_tiers(),
            structure_reserve: Threshold::AtLeast(36.0),
            launch: Point::new(13, 0),
            heavy_count: 10_000,
            escorts: vec![Point::new(24, 10), Point::new(4, 9)],
        }
    }
}

/// Demolisher rush along a single refunded column of walls and supports.
#[derive(Clone, Debug, Default)]
pub struct RushStick {
    tuning: RushStickTuning,
}

impl RushStick {
    /// Creates the archetype with the provided tuning.
    #[must_use]
    pub fn new(tuning: RushStickTuning) -> Self {
        Self { tuning }
    }
}

impl Archetype for RushStick {
    fn name(&self) -> &'static str {
        "rush_stick"
    }

    fn guard(&mut self, query: &BoardQuery<'_>) -> Result<bool, BoardError> {
        let tuning = &self.tuning;
        ensure_in_arena(query, &[tuning.launch])?;
        ensure_in_arena(query, &tuning.escorts)?;

        if query.count_own_structures(tuning.own_rows_through) <= tuning.own_structure_floor {
            return Ok(false);
        }
        let opponent = projected_or_current(
            query,
            Pool::Mobile,
            Player::Opponent,
            tuning.projection_lookahead,
        );
        if opponent > tuning.opponent_mobile_ceiling {
            return Ok(false);
        }
        let mobile =
            projected_or_current(query, Pool::Mobile, Player::Me, tuning.projection_lookahead);
        Ok(tiers_allow(&tuning.entry_tiers, query.turn(), mobile))
    }

    fn prepare(
        &mut self,
        query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        let cleared = clear_own_rows(query, orders, self.tuning.own_rows_through);
        debug!(cleared, "rush stick cleared the base");
        Ok(())
    }

    fn gate(&self, _query: &BoardQuery<'_>, orders: &Orders<'_>) -> Result<(), StageError> {
        require(orders, Pool::Structure, self.tuning.structure_reserve)
    }

    fn execute(
        &mut self,
        _query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        let applied = templates::rush_stick().apply(orders);
        report(self.name(), &applied);
        launch(orders, MobileKind::Demolisher, self.tuning.launch, self.tuning.heavy_count);
        for at in self.tuning.escorts.clone() {
            launch(orders, MobileKind::Interceptor, at, 1);
        }
        Ok(())
    }
}

/// Thresholds and coordinates of the corner rush.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerRushTuning {
    /// Own structures that must be exceeded to enter.
    pub own_structure_floor: usize,
    /// Highest own row counted.
    pub own_rows_through: i32,
    /// Lookahead used for resource projections.
    pub projection_lookahead: u32,
    /// Projected own mobile points required to enter, by turn.
    pub entry_tiers: Vec<TurnTier>,
    /// Wall built, upgraded and sold to steer the scouts into the corner.
    pub pivot: Point,
    /// Scout launch points with the share of scouts sent from each.
    pub launches: Vec<(Point, f64)>,
}

impl Default for CornerRushTuning {
    fn default() -> Self {
        Self {
            own_structure_floor: 25,
            own_rows_through: 13,
            projection_lookahead: 1,
            entry_tiers: rush_tiers(),
            pivot: Point::new(20, 13),
            launches: vec![(Point::new(13, 0), 0.25), (Point::new(11, 2), 0.75)],
        }
    }
}

/// Scout rush through the opened right-hand corner.
#[derive(Clone, Debug, Default)]
pub struct CornerRush {
    tuning: CornerRushTuning,
}

impl CornerRush {
    /// Creates the archetype with the provided tuning.
    #[must_use]
    pub fn new(tuning: CornerRushTuning) -> Self {
        Self { tuning }
    }

    /// V cells that must still stand once the corner walls are sold.
    fn funnel(&self) -> Vec<Point> {
        let corner = templates::corner_walls();
        templates::full_v()
            .into_iter()
            .filter(|at| !corner.contains(at))
            .collect()
    }
}

impl Archetype for CornerRush {
    fn name(&self) -> &'static str {
        "corner_rush"
    }

    fn guard(&mut self, query: &BoardQuery<'_>) -> Result<bool, BoardError> {
        let tuning = &self.tuning;
        ensure_in_arena(query, &[tuning.pivot])?;
        let launches: Vec<Point> = tuning.launches.iter().map(|(at, _)| *at).collect();
        ensure_in_arena(query, &launches)?;

        if query.count_own_structures(tuning.own_rows_through) <= tuning.own_structure_floor
            || !query.all_occupied(&templates::full_v())?
        {
            return Ok(false);
        }
        let mobile =
            projected_or_current(query, Pool::Mobile, Player::Me, tuning.projection_lookahead);
        Ok(tiers_allow(&tuning.entry_tiers, query.turn(), mobile))
    }

    fn prepare(
        &mut self,
        _query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        for at in templates::corner_walls() {
            if orders.occupant(at).is_some_and(|unit| unit.owner == Player::Me) {
                let _ = orders.remove(at);
            }
        }
        Ok(())
    }

    fn gate(&self, query: &BoardQuery<'_>, _orders: &Orders<'_>) -> Result<(), StageError> {
        if query.all_occupied(&self.funnel())? {
            Ok(())
        } else {
            Err(StageError::FormationBroken)
        }
    }

    fn execute(
        &mut self,
        _query: &BoardQuery<'_>,
        orders: &mut Orders<'_>,
    ) -> Result<(), StageError> {
        let applied = BuildPlan::new()
            .cycle(StructureKind::Wall, self.tuning.pivot, true)
            .apply(orders);
        report(self.name(), &applied);

        for (at, count) in scout_split(orders, &self.tuning.launches) {
            launch(orders, MobileKind::Scout, at, count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeline_core::{BoardGeometry, BoardSnapshot, Normalizer, StationaryUnit};
    use siegeline_system_build_plan::PlanStep;

    fn breach_ready() -> BoardSnapshot {
        let own = (0..28).map(|x| Point::new(x, 13)).chain([Point::new(1, 12), Point::new(2, 12)]);
        let wall = StationaryUnit::new(Player::Me, StructureKind::Wall);
        let snapshot = own.fold(BoardSnapshot::new(12, BoardGeometry::standard()), |snapshot, at| {
            snapshot.with_unit(at, wall)
        });
        (0..9)
            .fold(snapshot, |snapshot, x| {
                let turret = StationaryUnit::new(Player::Opponent, StructureKind::Turret);
                let turret = if x == 0 { turret.upgraded() } else { turret };
                snapshot.with_unit(Point::new(x, 14), turret)
            })
            .with_projection(Player::Me, Pool::Mobile, 1, 10.0)
    }

    #[test]
    fn line_breach_guard_records_the_weakest_row() {
        let snapshot = breach_ready();
        let query = BoardQuery::new(&snapshot, Normalizer::new(28, false));
        let mut breach = LineBreach::default();
        assert_eq!(breach.target(), None);

        assert_eq!(breach.guard(&query), Ok(true));
        assert_eq!(breach.target(), Some(14));
    }

    #[test]
    fn line_breach_guard_leaves_the_target_unset_when_idle() {
        let snapshot = breach_ready().with_projection(Player::Me, Pool::Mobile, 1, 8.0);
        let query = BoardQuery::new(&snapshot, Normalizer::new(28, false));
        let mut breach = LineBreach::default();

        assert_eq!(breach.guard(&query), Ok(false));
        assert_eq!(breach.target(), None);
    }

    #[test]
    fn corner_funnel_excludes_the_sold_walls() {
        let funnel = CornerRush::default().funnel();
        assert_eq!(funnel.len(), templates::full_v().len() - 1);
        assert!(!funnel.contains(&Point::new(26, 12)));
    }

    #[test]
    fn line_breach_formation_is_anchored_on_the_target_row() {
        let plan = LineBreach::default().formation(15);
        let Some(PlanStep::Extend(extension)) = plan.steps().first() else {
            panic!("formation must open with the wall line");
        };
        assert_eq!(extension.origin, Point::new(27, 13));
        assert!(extension.remove_after);

        // sixteen support cycles followed by sixteen upgrades
        assert_eq!(plan.len(), 1 + 16 * 2 + 16);
        assert_eq!(plan.steps().last(), Some(&PlanStep::Upgrade(Point::new(6, 11))));
    }
}
