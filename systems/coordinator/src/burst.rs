//! Opportunistic scout bursts and the seeded late demolisher variant.

use rand::Rng;
use serde::{Deserialize, Serialize};
use siegeline_core::Point;
use siegeline_system_stages::tiers::{Threshold, TurnTier};

/// Turn-banded mobile thresholds and launch shares of the scout burst.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    /// Mobile points required to burst, by turn.
    pub tiers: Vec<TurnTier>,
    /// Scout launch points with the share of scouts sent from each.
    pub launches: Vec<(Point, f64)>,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            tiers: vec![
                TurnTier::through(24, Threshold::AtLeast(15.0)),
                TurnTier::closed_through(29),
                TurnTier::through(50, Threshold::Above(25.0)),
                TurnTier::after(Threshold::AtLeast(25.0)),
            ],
            launches: vec![(Point::new(13, 0), 0.25), (Point::new(11, 2), 0.75)],
        }
    }
}

/// Occasional all-in demolisher push replacing a late burst.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LateDemolisherTuning {
    /// Bursts after this turn may turn into a demolisher push.
    pub after_turn: u32,
    /// A qualifying burst becomes a push with probability `1 / one_in`.
    ///
    /// Zero disables the variant.
    pub one_in: u32,
    /// Seed of the coordinator's random stream.
    pub seed: u64,
    /// Oversized count requesting every affordable demolisher.
    pub count: u32,
    /// Candidate launches; the one crossing the least turret fire is used.
    pub launches: Vec<Point>,
}

impl Default for LateDemolisherTuning {
    fn default() -> Self {
        Self {
            after_turn: 70,
            one_in: 4,
            seed: 0x5eed_11e5,
            count: 100_000,
            launches: vec![Point::new(13, 0), Point::new(14, 0)],
        }
    }
}

/// Rolls whether a qualifying burst turns into a demolisher push.
///
/// The stream is only advanced after `after_turn`, so earlier turns never
/// shift the sequence.
pub(crate) fn roll_late_push<R: Rng>(
    tuning: &LateDemolisherTuning,
    turn: u32,
    rng: &mut R,
) -> bool {
    if turn <= tuning.after_turn || tuning.one_in == 0 {
        return false;
    }
    rng.gen_ratio(1, tuning.one_in)
}
