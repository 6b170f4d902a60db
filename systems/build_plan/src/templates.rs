//! Fixed blueprints shared by the base defense and the offense stages.
//!
//! Every point is logical: the bottom-left corner of the own half is `(0, 13)`
//! and the own launch corners are `(13, 0)` and `(14, 0)`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use siegeline_core::{Point, StructureKind};

use crate::BuildPlan;

const W: StructureKind = StructureKind::Wall;
const S: StructureKind = StructureKind::Support;
const T: StructureKind = StructureKind::Turret;

/// `(kind, x, y, upgrade)` row of a literal blueprint.
type Entry = (StructureKind, i32, i32, bool);

const FUNNEL: &[Entry] = &[
    (T, 3, 13, true),
    (T, 24, 13, true),
    (T, 1, 12, false),
    (T, 21, 10, false),
    (W, 10, 3, false),
    (W, 9, 4, false),
    (W, 8, 5, false),
    (W, 7, 6, false),
    (W, 6, 7, false),
    (W, 5, 8, false),
    (W, 11, 3, false),
    (W, 12, 3, false),
    (W, 13, 3, false),
    (W, 14, 2, false),
    (W, 15, 3, false),
    (W, 16, 4, false),
    (W, 17, 5, false),
    (W, 18, 6, false),
    (W, 19, 7, false),
    (W, 20, 8, false),
    (W, 21, 9, false),
    (T, 23, 12, false),
    (T, 25, 13, false),
    (W, 26, 12, false),
    (W, 27, 13, false),
    (W, 0, 13, false),
    (W, 4, 9, false),
    (W, 3, 10, false),
    (W, 2, 11, false),
    (T, 4, 12, false),
    (T, 20, 11, false),
    (T, 2, 12, false),
    (T, 3, 11, false),
    (S, 20, 9, true),
    (S, 19, 8, true),
    (T, 19, 11, false),
    (W, 19, 12, false),
    (T, 22, 13, false),
    (W, 21, 13, false),
    (W, 22, 12, false),
    (T, 20, 10, false),
    (W, 23, 11, false),
    (W, 1, 13, false),
    (W, 26, 13, false),
    (W, 0, 13, true),
    (W, 27, 13, true),
    (T, 4, 13, false),
    (T, 3, 12, false),
    (T, 2, 13, false),
    (W, 26, 13, true),
    (W, 1, 13, true),
    (T, 21, 10, false),
    (T, 24, 12, false),
    (S, 19, 9, false),
    (S, 18, 7, false),
    (S, 17, 6, false),
    (S, 16, 5, false),
    (S, 15, 4, false),
    (S, 14, 3, false),
    (S, 13, 2, false),
];

/// Funnel prefix shared with the fortified variant, up to the first support pair.
const FORTIFIED_HEAD: usize = 33;

const FORTIFIED_MIDDLE: &[Entry] = &[
    (T, 23, 13, true),
    (S, 20, 9, true),
    (S, 19, 8, true),
    (T, 19, 11, false),
    (W, 19, 12, false),
    (T, 22, 13, false),
    (W, 21, 13, false),
    (W, 22, 12, false),
    (T, 20, 10, false),
    (W, 23, 11, false),
    (W, 1, 13, false),
    (W, 26, 13, false),
    (W, 0, 13, true),
    (W, 27, 13, true),
    (T, 4, 13, false),
    (T, 3, 12, false),
    (T, 2, 13, false),
    (T, 19, 10, false),
    (W, 26, 13, true),
    (W, 1, 13, true),
];

const FORTIFIED_TAIL: &[Entry] = &[
    (T, 21, 10, true),
    (T, 24, 12, true),
    (T, 25, 13, true),
    (T, 20, 11, true),
    (S, 19, 9, false),
    (S, 18, 7, false),
    (S, 17, 6, false),
    (S, 16, 5, false),
    (S, 15, 4, false),
    (S, 14, 3, false),
    (S, 13, 2, false),
    (T, 19, 11, true),
    (T, 20, 10, true),
    (S, 19, 9, true),
    (S, 18, 7, true),
    (S, 17, 6, true),
    (S, 16, 5, true),
    (S, 15, 4, true),
    (S, 14, 3, true),
    (S, 13, 2, true),
    (T, 1, 12, true),
    (T, 2, 12, true),
    (T, 3, 12, true),
    (T, 4, 12, true),
    (T, 2, 13, true),
    (T, 4, 13, true),
    (T, 3, 11, true),
    (T, 22, 13, true),
    (T, 23, 12, true),
    (T, 19, 10, true),
];

const STAGED_SUPPORTS: &[(i32, i32)] = &[
    (14, 3),
    (13, 2),
    (19, 8),
    (20, 9),
    (19, 9),
    (18, 7),
    (17, 6),
    (16, 5),
    (15, 4),
];

const STAGED_TURRETS: &[(i32, i32)] = &[
    (3, 13),
    (24, 13),
    (1, 12),
    (24, 12),
    (2, 12),
    (21, 10),
    (25, 13),
    (3, 12),
    (20, 11),
    (22, 13),
    (4, 13),
    (3, 11),
    (23, 12),
    (23, 13),
    (19, 10),
    (19, 11),
    (20, 10),
    (4, 12),
];

const STAGED_WALLS: &[(i32, i32)] = &[
    (13, 3),
    (14, 2),
    (26, 12),
    (27, 13),
    (0, 13),
    (1, 13),
    (2, 13),
    (15, 3),
    (16, 4),
    (17, 5),
    (18, 6),
    (12, 3),
    (11, 3),
    (10, 3),
    (9, 4),
    (8, 5),
    (7, 6),
    (5, 8),
    (4, 9),
    (3, 10),
    (2, 11),
    (19, 7),
    (20, 8),
    (21, 9),
    (22, 12),
    (23, 11),
    (26, 13),
    (25, 12),
    (19, 12),
    (21, 13),
    (6, 7),
];

/// Order in which staged walls, and the turret at `(1, 12)`, are upgraded.
const STAGED_WALL_UPGRADES: &[(i32, i32)] = &[
    (0, 13),
    (1, 13),
    (2, 13),
    (27, 13),
    (26, 13),
    (26, 12),
    (1, 12),
    (25, 12),
    (21, 13),
    (22, 12),
    (19, 12),
];

/// Cumulative counts reached by each of the four build stages.
struct StageCounts {
    supports: [usize; 4],
    support_upgrades: [usize; 4],
    turrets: [usize; 4],
    walls: [usize; 4],
    wall_upgrades: [usize; 4],
}

const STAGED_COUNTS: StageCounts = StageCounts {
    supports: [0, 0, 2, 9],
    support_upgrades: [2, 2, 2, 9],
    turrets: [2, 4, 5, 18],
    walls: [2, 24, 31, 31],
    wall_upgrades: [4, 4, 4, 11],
};

const RUSH_STICK: &[Entry] = &[
    (W, 14, 12, false),
    (W, 14, 11, false),
    (W, 14, 10, false),
    (W, 14, 9, false),
    (W, 14, 8, false),
    (W, 14, 7, false),
    (W, 14, 6, false),
    (W, 14, 5, false),
    (S, 14, 4, false),
    (S, 14, 3, false),
    (S, 14, 2, false),
    (S, 14, 1, false),
    (S, 14, 0, false),
    (S, 13, 2, false),
    (S, 11, 2, false),
    (S, 15, 4, false),
    (S, 15, 3, false),
    (S, 15, 2, false),
    (S, 15, 1, false),
    (S, 11, 3, true),
    (S, 12, 4, true),
    (S, 14, 4, true),
    (S, 14, 3, true),
    (S, 14, 2, true),
    (S, 14, 1, true),
    (S, 14, 0, false),
    (S, 16, 4, false),
    (S, 16, 3, false),
    (S, 16, 2, false),
    (S, 17, 3, false),
    (S, 13, 2, true),
    (S, 11, 2, true),
    (S, 15, 4, true),
    (S, 15, 3, true),
    (S, 15, 2, true),
    (S, 15, 1, true),
    (S, 16, 4, true),
    (S, 16, 3, true),
    (S, 16, 2, true),
    (S, 17, 3, true),
    (W, 14, 12, true),
    (W, 14, 11, true),
    (W, 14, 10, true),
    (W, 14, 9, true),
    (W, 14, 8, true),
    (W, 14, 7, true),
    (W, 14, 6, true),
    (W, 14, 5, true),
];

const FULL_V: &[(i32, i32)] = &[
    (14, 2),
    (15, 3),
    (16, 4),
    (17, 5),
    (18, 6),
    (19, 7),
    (20, 8),
    (21, 9),
    (23, 11),
    (22, 12),
    (24, 12),
    (25, 12),
    (26, 12),
    (13, 3),
    (12, 3),
    (11, 3),
    (10, 3),
    (9, 4),
    (8, 5),
    (7, 6),
    (6, 7),
    (5, 8),
    (4, 9),
    (3, 10),
    (2, 11),
];

const CORNER_WALLS: &[(i32, i32)] = &[(26, 12), (26, 13), (27, 13)];

const REFRESHED_WALLS: &[(i32, i32)] = &[(0, 13), (1, 13), (26, 13), (27, 13), (26, 12)];

/// Named base-defense blueprints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseTemplate {
    /// Four cumulative build stages, each adding walls, turrets and supports.
    Staged,
    /// Upgraded corner turrets behind a V of walls feeding a support lane.
    #[default]
    Funnel,
    /// The funnel with an extra corner turret and a long upgrade tail.
    FortifiedFunnel,
}

impl DefenseTemplate {
    /// Expands the template into its build plan.
    #[must_use]
    pub fn plan(self) -> BuildPlan {
        match self {
            Self::Staged => staged_plan(),
            Self::Funnel => entries_plan(FUNNEL),
            Self::FortifiedFunnel => {
                let head = entries_plan(&FUNNEL[..FORTIFIED_HEAD]);
                head.append(&entries_plan(FORTIFIED_MIDDLE))
                    .append(&entries_plan(FORTIFIED_TAIL))
            }
        }
    }
}

fn point((x, y): (i32, i32)) -> Point {
    Point::new(x, y)
}

fn entries_plan(entries: &[Entry]) -> BuildPlan {
    entries
        .iter()
        .fold(BuildPlan::new(), |plan, &(kind, x, y, upgrade)| {
            if upgrade {
                plan.place_upgraded(kind, Point::new(x, y))
            } else {
                plan.place(kind, Point::new(x, y))
            }
        })
}

/// Expands the four build stages without repeating a step.
///
/// Upgrades are deferred until the stage that places their target, so an
/// upgrade is never issued for a cell the plan has not built yet.
fn staged_plan() -> BuildPlan {
    let counts = &STAGED_COUNTS;
    let mut plan = BuildPlan::new();
    let mut built = BTreeSet::new();
    let mut done = [0usize; 3];
    let mut upgraded = BTreeSet::new();

    for stage in 0..4 {
        for &at in &STAGED_WALLS[done[0]..counts.walls[stage]] {
            plan = plan.place(W, point(at));
            let _ = built.insert(at);
        }
        done[0] = counts.walls[stage];

        for &at in &STAGED_TURRETS[done[1]..counts.turrets[stage]] {
            plan = plan.place(T, point(at));
            let _ = built.insert(at);
        }
        done[1] = counts.turrets[stage];

        for at in pending_upgrades(STAGED_TURRETS, counts.turrets[stage], &built, &upgraded) {
            plan = plan.upgrade(point(at));
            let _ = upgraded.insert(at);
        }
        let walls = pending_upgrades(
            STAGED_WALL_UPGRADES,
            counts.wall_upgrades[stage],
            &built,
            &upgraded,
        );
        for at in walls {
            plan = plan.upgrade(point(at));
            let _ = upgraded.insert(at);
        }

        for &at in &STAGED_SUPPORTS[done[2]..counts.supports[stage]] {
            plan = plan.place(S, point(at));
            let _ = built.insert(at);
        }
        done[2] = counts.supports[stage];

        let supports = pending_upgrades(
            STAGED_SUPPORTS,
            counts.support_upgrades[stage],
            &built,
            &upgraded,
        );
        for at in supports {
            plan = plan.upgrade(point(at));
            let _ = upgraded.insert(at);
        }
    }

    plan
}

fn pending_upgrades(
    list: &[(i32, i32)],
    limit: usize,
    built: &BTreeSet<(i32, i32)>,
    upgraded: &BTreeSet<(i32, i32)>,
) -> Vec<(i32, i32)> {
    list[..limit]
        .iter()
        .copied()
        .filter(|at| built.contains(at) && !upgraded.contains(at))
        .collect()
}

/// Build/sell formation that opens a single lane for demolishers.
///
/// Every entry is placed, upgraded when flagged and immediately removed.
#[must_use]
pub fn rush_stick() -> BuildPlan {
    RUSH_STICK
        .iter()
        .fold(BuildPlan::new(), |plan, &(kind, x, y, upgrade)| {
            plan.cycle(kind, Point::new(x, y), upgrade)
        })
}

/// Wall cells whose joint presence means the defensive V is intact.
#[must_use]
pub fn full_v() -> Vec<Point> {
    FULL_V.iter().copied().map(point).collect()
}

/// Walls closing the right-hand corner, removed to open a corner lane.
#[must_use]
pub fn corner_walls() -> Vec<Point> {
    CORNER_WALLS.iter().copied().map(point).collect()
}

/// Exposed corner walls cycled whenever they are all standing.
#[must_use]
pub fn refreshed_walls() -> Vec<Point> {
    REFRESHED_WALLS.iter().copied().map(point).collect()
}
