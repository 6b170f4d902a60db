//! Interceptor escorts shielding the base while it is rebuilt or exposed.

use serde::{Deserialize, Serialize};
use siegeline_core::Point;

/// Thresholds and launch points for escort interceptors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscortTuning {
    /// Turns before this one always send the opening escort.
    pub opening_turns: u32,
    /// Opening escort as `(launch, count)` pairs.
    pub opening: Vec<(Point, u32)>,
    /// Opponent mobile points that put the base on alert.
    pub alert_mobile: f64,
    /// Opponent mobile points treated as a surge rather than a light push.
    pub surge_mobile: f64,
    /// Launch used while the V is broken.
    pub broken_launch: Point,
    /// Turn separating the early and late responses to a broken V.
    pub late_turn: u32,
    /// Opponent mobile points answered by a heavy escort after `late_turn`.
    pub heavy_mobile: f64,
    /// Interceptors in a heavy escort.
    pub heavy_count: u32,
    /// Opponent mobile points always answered by an extreme escort.
    pub extreme_mobile: f64,
    /// Interceptors in an extreme escort.
    pub extreme_count: u32,
    /// Escort sent against a light push while the V stands.
    pub intact_light: Vec<(Point, u32)>,
    /// Escort sent against a surge while the V stands.
    pub intact_surge: Vec<(Point, u32)>,
    /// Opponent mobile points that justify plugging the hole.
    pub hole_mobile: f64,
    /// V cell that doubles as an interceptor launch when it is empty.
    pub hole: Point,
    /// Leaves `hole` unbuilt on the first rebuild after an attack while the
    /// opponent is on alert, so escorts can launch through it.
    pub open_hole_after_attack: bool,
}

impl Default for EscortTuning {
    fn default() -> Self {
        Self {
            opening_turns: 4,
            opening: vec![(Point::new(6, 7), 2), (Point::new(20, 6), 2)],
            alert_mobile: 9.0,
            surge_mobile: 12.0,
            broken_launch: Point::new(20, 6),
            late_turn: 40,
            heavy_mobile: 20.0,
            heavy_count: 3,
            extreme_mobile: 30.0,
            extreme_count: 6,
            intact_light: vec![(Point::new(21, 7), 2), (Point::new(15, 1), 1)],
            intact_surge: vec![(Point::new(20, 6), 2), (Point::new(6, 7), 2)],
            hole_mobile: 6.0,
            hole: Point::new(6, 7),
            open_hole_after_attack: true,
        }
    }
}

/// Board facts the escort decision depends on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EscortContext {
    pub(crate) turn: u32,
    pub(crate) opponent_mobile: f64,
    /// A stage holds the base-defense lock.
    pub(crate) locked: bool,
    /// A stage is executing or cooling down once this turn's stage steps ran.
    pub(crate) past_preparing: bool,
    pub(crate) v_intact: bool,
    pub(crate) hole_open: bool,
}

/// Interceptors to launch this turn as `(launch, count)` pairs.
pub(crate) fn escorts(tuning: &EscortTuning, context: &EscortContext) -> Vec<(Point, u32)> {
    let opponent = context.opponent_mobile;

    if context.turn < tuning.opening_turns {
        return tuning.opening.clone();
    }

    if opponent >= tuning.alert_mobile && !context.locked {
        if context.v_intact {
            return if opponent < tuning.surge_mobile {
                tuning.intact_light.clone()
            } else {
                tuning.intact_surge.clone()
            };
        }

        let count = if opponent < tuning.surge_mobile {
            u32::from(context.turn < tuning.late_turn)
        } else if opponent >= tuning.heavy_mobile && context.turn > tuning.late_turn {
            tuning.heavy_count
        } else if opponent >= tuning.extreme_mobile {
            tuning.extreme_count
        } else {
            1
        };
        return if count > 0 {
            vec![(tuning.broken_launch, count)]
        } else {
            Vec::new()
        };
    }

    if opponent >= tuning.hole_mobile && !context.past_preparing && context.hole_open {
        return vec![(tuning.hole, 1)];
    }

    Vec::new()
}
