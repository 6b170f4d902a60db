#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure read-only queries over a turn's board snapshot.
//!
//! Every point accepted or returned by [`BoardQuery`] is expressed in logical
//! coordinates. The query owns the single conversion to absolute coordinates
//! on the read side, so callers never normalize points themselves.

use std::ops::RangeInclusive;

use siegeline_core::{
    BoardError, BoardGeometry, BoardSnapshot, Normalizer, PathOracle, Player, Point, Pool,
    StationaryUnit, StructureKind,
};

/// Read-only view answering strategic questions about a [`BoardSnapshot`].
#[derive(Clone, Copy, Debug)]
pub struct BoardQuery<'a> {
    snapshot: &'a BoardSnapshot,
    normalizer: Normalizer,
}

impl<'a> BoardQuery<'a> {
    /// Creates a query over `snapshot` for the side described by `normalizer`.
    #[must_use]
    pub const fn new(snapshot: &'a BoardSnapshot, normalizer: Normalizer) -> Self {
        Self {
            snapshot,
            normalizer,
        }
    }

    /// Turn the underlying snapshot was captured on.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.snapshot.turn()
    }

    /// Shape of the arena.
    #[must_use]
    pub const fn geometry(&self) -> BoardGeometry {
        self.snapshot.geometry()
    }

    /// Normalizer used to translate logical points.
    #[must_use]
    pub const fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    /// Converts a logical point to an absolute arena cell.
    pub fn absolute(&self, point: Point) -> Result<Point, BoardError> {
        let absolute = self.normalizer.normalize(point);
        if self.geometry().contains(absolute) {
            Ok(absolute)
        } else {
            Err(BoardError::OutOfBounds { point })
        }
    }

    /// Stationary unit at a logical point, if any.
    pub fn unit_at(&self, point: Point) -> Result<Option<&'a StationaryUnit>, BoardError> {
        let absolute = self.absolute(point)?;
        Ok(self.snapshot.unit_at(absolute))
    }

    /// Reports whether a stationary unit of either player occupies the point.
    pub fn has_stationary_unit_at(&self, point: Point) -> Result<bool, BoardError> {
        Ok(self.unit_at(point)?.is_some())
    }

    /// Counts own structures on rows at or below `below_row`.
    #[must_use]
    pub fn count_own_structures(&self, below_row: i32) -> usize {
        self.snapshot
            .units()
            .filter(|(point, unit)| unit.owner == Player::Me && point.y() <= below_row)
            .count()
    }

    /// Logical points of own structures on rows at or below `below_row`.
    ///
    /// Points are returned in ascending absolute order.
    #[must_use]
    pub fn own_structures(&self, below_row: i32) -> Vec<Point> {
        self.snapshot
            .units()
            .filter(|(point, unit)| unit.owner == Player::Me && point.y() <= below_row)
            .map(|(point, _)| self.normalizer.normalize(point))
            .collect()
    }

    /// Reports whether every listed point currently holds a stationary unit.
    ///
    /// All points are bounds-checked before any occupancy is inspected, so an
    /// out-of-bounds entry is reported regardless of its position in the list.
    pub fn all_occupied(&self, points: &[Point]) -> Result<bool, BoardError> {
        let cells = self.absolute_all(points)?;
        Ok(cells.iter().all(|cell| self.snapshot.unit_at(*cell).is_some()))
    }

    /// Reports whether every listed point holds an upgraded stationary unit.
    pub fn all_upgraded(&self, points: &[Point]) -> Result<bool, BoardError> {
        let cells = self.absolute_all(points)?;
        Ok(cells
            .iter()
            .all(|cell| self.snapshot.unit_at(*cell).is_some_and(|unit| unit.upgraded)))
    }

    /// Counts opposing structures inside a band of rows, optionally of one kind.
    #[must_use]
    pub fn count_opponent_structures(
        &self,
        kind: Option<StructureKind>,
        rows: RangeInclusive<i32>,
    ) -> usize {
        self.snapshot
            .units()
            .filter(|(point, unit)| {
                unit.owner == Player::Opponent
                    && rows.contains(&point.y())
                    && kind.map_or(true, |kind| unit.kind == kind)
            })
            .count()
    }

    /// Finds the opposing front row most exposed to a demolisher line.
    ///
    /// Rows between the two bounds (inclusive, in either order) are scanned in
    /// ascending order. A row is turret-weak when it holds more than
    /// `turret_count_threshold` opposing turrets of which at most
    /// `upgraded_turret_ceiling` are upgraded; clusters of upgraded turrets
    /// shred demolishers, so they never qualify. A row is structure-dense when
    /// it holds more than `structure_count_threshold` opposing structures.
    /// The first turret-weak row wins, then the first structure-dense row.
    #[must_use]
    pub fn find_weakest_front_row(
        &self,
        rows: [i32; 2],
        turret_count_threshold: usize,
        upgraded_turret_ceiling: usize,
        structure_count_threshold: usize,
    ) -> Option<i32> {
        let first = rows[0].min(rows[1]);
        let last = rows[0].max(rows[1]);

        let mut turret_weak = None;
        let mut structure_dense = None;
        for row in first..=last {
            let tally = self.tally_opponent_row(row);
            if turret_weak.is_none()
                && tally.turrets > turret_count_threshold
                && tally.upgraded_turrets <= upgraded_turret_ceiling
            {
                turret_weak = Some(row);
            }
            if structure_dense.is_none() && tally.structures > structure_count_threshold {
                structure_dense = Some(row);
            }
        }

        turret_weak.or(structure_dense)
    }

    /// Amount a player currently holds in a pool.
    #[must_use]
    pub const fn available_resource(&self, pool: Pool, player: Player) -> f64 {
        self.snapshot.resources(player).get(pool)
    }

    /// Engine projection of a pool `lookahead` turns ahead.
    ///
    /// The projection is supplied by the engine; `None` means it was not
    /// reported for this lookahead.
    #[must_use]
    pub fn projected_resource(&self, pool: Pool, player: Player, lookahead: u32) -> Option<f64> {
        self.snapshot.projection(player, pool, lookahead)
    }

    /// Picks the launch point whose path crosses the least turret fire.
    ///
    /// Damage along a path is the number of opposing attackers at each step
    /// multiplied by `damage_per_attacker`. Options that leave the arena or
    /// have no path are skipped and ties keep the earliest option.
    pub fn least_damage_launch<O>(
        &self,
        options: &[Point],
        oracle: &O,
        damage_per_attacker: f64,
    ) -> Option<Point>
    where
        O: PathOracle + ?Sized,
    {
        let mut best: Option<(Point, f64)> = None;
        for &option in options {
            let Ok(absolute) = self.absolute(option) else {
                continue;
            };
            let Some(path) = oracle.path_to_edge(absolute) else {
                continue;
            };

            let damage: f64 = path
                .iter()
                .map(|step| f64::from(oracle.attackers(*step, Player::Me)) * damage_per_attacker)
                .sum();
            let replace = match best {
                None => true,
                Some((_, lowest)) => damage < lowest,
            };
            if replace {
                best = Some((option, damage));
            }
        }

        best.map(|(option, _)| option)
    }

    fn absolute_all(&self, points: &[Point]) -> Result<Vec<Point>, BoardError> {
        points.iter().map(|point| self.absolute(*point)).collect()
    }

    fn tally_opponent_row(&self, row: i32) -> RowTally {
        let mut tally = RowTally::default();
        for (_, unit) in self
            .snapshot
            .units()
            .filter(|(point, unit)| point.y() == row && unit.owner == Player::Opponent)
        {
            tally.structures += 1;
            if unit.kind == StructureKind::Turret {
                tally.turrets += 1;
                if unit.upgraded {
                    tally.upgraded_turrets += 1;
                }
            }
        }
        tally
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct RowTally {
    turrets: usize,
    upgraded_turrets: usize,
    structures: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_rejects_points_off_the_diamond() {
        let snapshot = BoardSnapshot::new(0, BoardGeometry::standard());
        let query = BoardQuery::new(&snapshot, Normalizer::new(28, false));
        assert_eq!(
            query.absolute(Point::new(27, 12)),
            Err(BoardError::OutOfBounds {
                point: Point::new(27, 12)
            })
        );
        assert_eq!(query.absolute(Point::new(27, 13)), Ok(Point::new(27, 13)));
    }

    #[test]
    fn inverted_queries_read_mirrored_cells() {
        let snapshot = BoardSnapshot::new(0, BoardGeometry::standard()).with_unit(
            Point::new(24, 13),
            StationaryUnit::new(Player::Me, StructureKind::Turret),
        );
        let query = BoardQuery::new(&snapshot, Normalizer::new(28, true));
        assert_eq!(query.has_stationary_unit_at(Point::new(3, 13)), Ok(true));
        assert_eq!(query.has_stationary_unit_at(Point::new(24, 13)), Ok(false));
        assert_eq!(query.own_structures(13), vec![Point::new(3, 13)]);
    }
}
