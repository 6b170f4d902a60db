//! Turn-banded resource thresholds.

use serde::{Deserialize, Serialize};

/// Comparison applied to a resource amount.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Admits amounts greater than or equal to the value.
    AtLeast(f64),
    /// Admits amounts strictly greater than the value.
    Above(f64),
}

impl Threshold {
    /// Reports whether `amount` satisfies the threshold.
    #[must_use]
    pub fn admits(self, amount: f64) -> bool {
        match self {
            Self::AtLeast(value) => amount >= value,
            Self::Above(value) => amount > value,
        }
    }

    /// Boundary value of the threshold.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::AtLeast(value) | Self::Above(value) => value,
        }
    }
}

/// Threshold applying up to and including a given turn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnTier {
    /// Last turn covered by the tier; `None` covers every later turn.
    pub through_turn: Option<u32>,
    /// Threshold for the band; `None` means nothing qualifies.
    pub threshold: Option<Threshold>,
}

impl TurnTier {
    /// Tier covering turns up to and including `through_turn`.
    #[must_use]
    pub const fn through(through_turn: u32, threshold: Threshold) -> Self {
        Self {
            through_turn: Some(through_turn),
            threshold: Some(threshold),
        }
    }

    /// Tier during which nothing qualifies.
    #[must_use]
    pub const fn closed_through(through_turn: u32) -> Self {
        Self {
            through_turn: Some(through_turn),
            threshold: None,
        }
    }

    /// Tier covering every remaining turn.
    #[must_use]
    pub const fn after(threshold: Threshold) -> Self {
        Self {
            through_turn: None,
            threshold: Some(threshold),
        }
    }

    fn covers(&self, turn: u32) -> bool {
        self.through_turn.map_or(true, |last| turn <= last)
    }
}

/// Evaluates `amount` against the first tier covering `turn`.
///
/// Tiers are expected in ascending turn order. Turns past the last tier never
/// qualify.
#[must_use]
pub fn tiers_allow(tiers: &[TurnTier], turn: u32, amount: f64) -> bool {
    tiers
        .iter()
        .find(|tier| tier.covers(turn))
        .and_then(|tier| tier.threshold)
        .is_some_and(|threshold| threshold.admits(amount))
}

/// Projected mobile points needed to launch a rush, by turn.
#[must_use]
pub fn rush_tiers() -> Vec<TurnTier> {
    vec![
        TurnTier::through(24, Threshold::Above(15.0)),
        TurnTier::through(35, Threshold::AtLeast(21.0)),
        TurnTier::through(50, Threshold::AtLeast(25.0)),
        TurnTier::after(Threshold::AtLeast(31.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_covering_tier_decides() {
        let tiers = rush_tiers();
        assert!(!tiers_allow(&tiers, 10, 15.0));
        assert!(tiers_allow(&tiers, 10, 15.5));
        assert!(tiers_allow(&tiers, 25, 21.0));
        assert!(!tiers_allow(&tiers, 36, 24.0));
        assert!(tiers_allow(&tiers, 50, 25.0));
        assert!(!tiers_allow(&tiers, 51, 30.0));
        assert!(tiers_allow(&tiers, 51, 31.0));
    }

    #[test]
    fn closed_tiers_and_uncovered_turns_never_qualify() {
        let tiers = [
            TurnTier::through(24, Threshold::AtLeast(15.0)),
            TurnTier::closed_through(29),
        ];
        assert!(tiers_allow(&tiers, 24, 15.0));
        assert!(!tiers_allow(&tiers, 27, 1_000.0));
        assert!(!tiers_allow(&tiers, 30, 1_000.0));
    }
}
