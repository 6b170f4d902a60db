//! Every adjustable threshold of the coordinator.

use serde::{Deserialize, Serialize};
use siegeline_system_build_plan::templates::DefenseTemplate;
use siegeline_system_stages::{CornerRushTuning, LineBreachTuning, RushStickTuning};
use thiserror::Error;

use crate::{BurstTuning, EscortTuning, LateDemolisherTuning};

/// Aggregated tuning knobs for the base defense, the stages, the escorts and the bursts.
///
/// Missing sections fall back to their defaults, so an override file only
/// needs to name the values it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Blueprint rebuilt every turn no stage holds the base.
    pub defense: DefenseTemplate,
    /// Demolisher line breach.
    pub line_breach: LineBreachTuning,
    /// Demolisher stick rush.
    pub rush_stick: RushStickTuning,
    /// Scout corner rush.
    pub corner_rush: CornerRushTuning,
    /// Interceptor escorts.
    pub escort: EscortTuning,
    /// Opportunistic scout burst.
    pub burst: BurstTuning,
    /// Seeded late demolisher push.
    pub late_demolisher: LateDemolisherTuning,
}

/// Errors raised while loading tuning overrides.
#[derive(Debug, Error)]
pub enum TuningError {
    /// The document is not valid TOML or does not match the tuning layout.
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] toml::de::Error),
    /// A launch share lies outside `0..=1`.
    #[error("launch share {share} is outside 0..=1")]
    InvalidShare {
        /// Offending share.
        share: f64,
    },
}

impl Tuning {
    /// Parses tuning overrides from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, TuningError> {
        let tuning: Self = toml::from_str(contents)?;
        tuning.validate()?;
        Ok(tuning)
    }

    fn validate(&self) -> Result<(), TuningError> {
        let shares = self
            .burst
            .launches
            .iter()
            .chain(&self.corner_rush.launches)
            .map(|(_, share)| *share);
        for share in shares {
            if !(0.0..=1.0).contains(&share) {
                return Err(TuningError::InvalidShare { share });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siegeline_core::Point;
    use siegeline_system_stages::tiers::Threshold;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(Tuning::from_toml_str("").ok(), Some(Tuning::default()));
    }

    #[test]
    fn overrides_leave_other_values_untouched() {
        let tuning = Tuning::from_toml_str(
            r#"
defense = "staged"

[line_breach]
min_projected_mobile = 12.0
structure_reserve = { at_least = 18.0 }
launch = { x = 3, y = 10 }

[late_demolisher]
seed = 7
"#,
        )
        .expect("valid tuning");

        assert_eq!(tuning.defense, DefenseTemplate::Staged);
        assert_eq!(tuning.line_breach.min_projected_mobile, 12.0);
        assert_eq!(tuning.line_breach.structure_reserve, Threshold::AtLeast(18.0));
        assert_eq!(tuning.line_breach.launch, Point::new(3, 10));
        assert_eq!(tuning.line_breach.rows, [14, 15]);
        assert_eq!(tuning.late_demolisher.seed, 7);
        assert_eq!(tuning.late_demolisher.one_in, 4);
        assert_eq!(tuning.escort, EscortTuning::default());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            Tuning::from_toml_str("defense = \"moat\""),
            Err(TuningError::Parse(_))
        ));
        assert!(matches!(
            Tuning::from_toml_str("[burst]\nlaunches = [[{ x = 13, y = 0 }, 1.5]]"),
            Err(TuningError::InvalidShare { share }) if share == 1.5
        ));
    }
}
