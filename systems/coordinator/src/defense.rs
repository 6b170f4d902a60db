//! Always-on base defense.

use siegeline_core::{Player, Point, StructureKind};
use siegeline_system_build_plan::{
    templates::{self, DefenseTemplate},
    AppliedPlan, BuildPlan, Orders, PlanStep,
};
use tracing::debug;

/// Plan rebuilding the base: breach turrets first, then the template.
///
/// Each breach is answered by a turret one row further into the base. When
/// `keep_open` names a cell, the template neither builds nor upgrades it.
pub(crate) fn plan(
    template: DefenseTemplate,
    breaches: &[Point],
    keep_open: Option<Point>,
) -> BuildPlan {
    let turrets = breaches.iter().fold(BuildPlan::new(), |plan, breach| {
        plan.place(StructureKind::Turret, breach.offset(0, 1))
    });
    template
        .plan()
        .steps()
        .iter()
        .filter(|step| match (**step, keep_open) {
            (PlanStep::Place(intent), Some(open)) => intent.at != open,
            (PlanStep::Upgrade(at), Some(open)) => at != open,
            _ => true,
        })
        .fold(turrets, |plan, step| plan.push(*step))
}

/// Applies the base defense and reports whether the corner walls were cycled.
pub(crate) fn build(
    template: DefenseTemplate,
    breaches: &[Point],
    keep_open: Option<Point>,
    orders: &mut Orders<'_>,
) -> (AppliedPlan, bool) {
    let applied = plan(template, breaches, keep_open).apply(orders);
    let refreshed = refresh_corners(orders);
    (applied, refreshed)
}

/// Sells the exposed corner walls once they all stand so they are rebuilt
/// at full strength on the next turn.
fn refresh_corners(orders: &mut Orders<'_>) -> bool {
    let walls = templates::refreshed_walls();
    let standing = walls
        .iter()
        .all(|at| orders.occupant(*at).is_some_and(|unit| unit.owner == Player::Me));
    if !standing {
        return false;
    }

    let removed = walls.into_iter().filter(|at| orders.remove(*at).is_ok()).count();
    debug!(removed, "corner walls cycled");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeline_system_build_plan::PlacementIntent;

    #[test]
    fn breach_turrets_precede_the_template() {
        let plan = plan(DefenseTemplate::Funnel, &[Point::new(5, 8)], None);
        assert_eq!(
            plan.steps()[0],
            PlanStep::Place(PlacementIntent::new(
                StructureKind::Turret,
                Point::new(5, 9),
                false
            ))
        );
        assert_eq!(plan.len(), DefenseTemplate::Funnel.plan().len() + 1);
    }

    #[test]
    fn kept_open_cell_is_left_out_of_every_template() {
        let hole = Point::new(6, 7);
        let touches_hole = |step: &PlanStep| match *step {
            PlanStep::Place(intent) => intent.at == hole,
            PlanStep::Upgrade(at) => at == hole,
            _ => false,
        };
        for template in [
            DefenseTemplate::Staged,
            DefenseTemplate::Funnel,
            DefenseTemplate::FortifiedFunnel,
        ] {
            assert!(plan(template, &[], None).steps().iter().any(touches_hole));
            let open = plan(template, &[], Some(hole));
            assert!(!open.steps().iter().any(touches_hole));
            assert!(open.steps().iter().any(|step| matches!(
                step,
                PlanStep::Place(intent) if intent.at == Point::new(5, 8)
            )));
        }
    }
}
