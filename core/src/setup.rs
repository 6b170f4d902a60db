//! Static per-match configuration handed to the decision core at setup.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{BoardGeometry, MobileKind, Normalizer, StructureKind, UnitKind};

/// Order in which the engine lists units inside `unitInformation`.
const ENGINE_UNIT_ORDER: [UnitKind; 6] = [
    UnitKind::Structure(StructureKind::Wall),
    UnitKind::Structure(StructureKind::Support),
    UnitKind::Structure(StructureKind::Turret),
    UnitKind::Mobile(MobileKind::Scout),
    UnitKind::Mobile(MobileKind::Demolisher),
    UnitKind::Mobile(MobileKind::Interceptor),
];

/// Cost and combat constants for a single unit kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Structure points required to place the unit.
    pub structure_cost: f64,
    /// Mobile points required to spawn the unit.
    pub mobile_cost: f64,
    /// Structure points required for the one-time upgrade.
    pub upgrade_cost: f64,
    /// Damage dealt to mobile units per attack.
    pub damage: f64,
    /// Attack range measured in cells.
    pub range: f64,
}

impl UnitStats {
    const fn structure(structure_cost: f64, upgrade_cost: f64, damage: f64, range: f64) -> Self {
        Self {
            structure_cost,
            mobile_cost: 0.0,
            upgrade_cost,
            damage,
            range,
        }
    }

    const fn mobile(mobile_cost: f64, damage: f64, range: f64) -> Self {
        Self {
            structure_cost: 0.0,
            mobile_cost,
            upgrade_cost: 0.0,
            damage,
            range,
        }
    }
}

/// Cost table covering every unit kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitCosts {
    /// Wall constants.
    pub wall: UnitStats,
    /// Support constants.
    pub support: UnitStats,
    /// Turret constants.
    pub turret: UnitStats,
    /// Scout constants.
    pub scout: UnitStats,
    /// Demolisher constants.
    pub demolisher: UnitStats,
    /// Interceptor constants.
    pub interceptor: UnitStats,
}

impl Default for UnitCosts {
    fn default() -> Self {
        Self {
            wall: UnitStats::structure(1.0, 1.0, 0.0, 0.0),
            support: UnitStats::structure(4.0, 4.0, 0.0, 3.5),
            turret: UnitStats::structure(2.0, 4.0, 5.0, 2.5),
            scout: UnitStats::mobile(1.0, 2.0, 3.5),
            demolisher: UnitStats::mobile(3.0, 8.0, 4.5),
            interceptor: UnitStats::mobile(1.0, 20.0, 4.5),
        }
    }
}

impl UnitCosts {
    /// Constants for the provided unit kind.
    #[must_use]
    pub const fn stats(&self, kind: UnitKind) -> &UnitStats {
        match kind {
            UnitKind::Structure(StructureKind::Wall) => &self.wall,
            UnitKind::Structure(StructureKind::Support) => &self.support,
            UnitKind::Structure(StructureKind::Turret) => &self.turret,
            UnitKind::Mobile(MobileKind::Scout) => &self.scout,
            UnitKind::Mobile(MobileKind::Demolisher) => &self.demolisher,
            UnitKind::Mobile(MobileKind::Interceptor) => &self.interceptor,
        }
    }

    /// Structure points required to place a structure.
    #[must_use]
    pub const fn structure_cost(&self, kind: StructureKind) -> f64 {
        self.stats(UnitKind::Structure(kind)).structure_cost
    }

    /// Structure points required to upgrade a structure.
    #[must_use]
    pub const fn upgrade_cost(&self, kind: StructureKind) -> f64 {
        self.stats(UnitKind::Structure(kind)).upgrade_cost
    }

    /// Mobile points required to spawn a single mobile unit.
    #[must_use]
    pub const fn mobile_cost(&self, kind: MobileKind) -> f64 {
        self.stats(UnitKind::Mobile(kind)).mobile_cost
    }

    fn stats_mut(&mut self, kind: UnitKind) -> &mut UnitStats {
        match kind {
            UnitKind::Structure(StructureKind::Wall) => &mut self.wall,
            UnitKind::Structure(StructureKind::Support) => &mut self.support,
            UnitKind::Structure(StructureKind::Turret) => &mut self.turret,
            UnitKind::Mobile(MobileKind::Scout) => &mut self.scout,
            UnitKind::Mobile(MobileKind::Demolisher) => &mut self.demolisher,
            UnitKind::Mobile(MobileKind::Interceptor) => &mut self.interceptor,
        }
    }
}

/// Errors raised while reading the engine's match configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration is not valid JSON.
    #[error("match configuration is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The `unitInformation` array is absent.
    #[error("match configuration has no unitInformation array")]
    MissingUnitInformation,
    /// The `unitInformation` array lacks an entry for a unit kind.
    #[error("unitInformation has no entry for {kind:?} at index {index}")]
    MissingUnit {
        /// Expected position of the entry.
        index: usize,
        /// Unit kind expected at that position.
        kind: UnitKind,
    },
}

#[derive(Debug, Default, Deserialize)]
struct EngineUnit {
    #[serde(default)]
    cost1: Option<f64>,
    #[serde(default)]
    cost2: Option<f64>,
    #[serde(default, rename = "attackDamageWalker")]
    attack_damage_walker: Option<f64>,
    #[serde(default, rename = "attackRange")]
    attack_range: Option<f64>,
    #[serde(default)]
    upgrade: Option<EngineUpgrade>,
}

#[derive(Debug, Default, Deserialize)]
struct EngineUpgrade {
    #[serde(default)]
    cost1: Option<f64>,
}

/// Static configuration received once per match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSetup {
    /// Shape of the arena.
    pub geometry: BoardGeometry,
    /// Indicates whether logical coordinates are mirrored for this player.
    pub inverted: bool,
    /// Cost and combat constants.
    pub costs: UnitCosts,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            geometry: BoardGeometry::standard(),
            inverted: false,
            costs: UnitCosts::default(),
        }
    }
}

impl MatchSetup {
    /// Creates a setup for the standard arena with default costs.
    #[must_use]
    pub fn standard(inverted: bool) -> Self {
        Self {
            inverted,
            ..Self::default()
        }
    }

    /// Normalizer bound to this player's side of the arena.
    #[must_use]
    pub const fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.geometry.width(), self.inverted)
    }

    /// Reads costs from the engine's JSON match configuration.
    ///
    /// Only the `unitInformation` array is consulted. Fields absent from an
    /// entry keep their default values.
    pub fn from_engine_json(json: &str, inverted: bool) -> Result<Self, SetupError> {
        let root: Value = serde_json::from_str(json)?;
        let units = root
            .get("unitInformation")
            .and_then(Value::as_array)
            .ok_or(SetupError::MissingUnitInformation)?;

        let mut costs = UnitCosts::default();
        for (index, kind) in ENGINE_UNIT_ORDER.iter().copied().enumerate() {
            let entry = units
                .get(index)
                .ok_or(SetupError::MissingUnit { index, kind })?;
            let unit: EngineUnit = serde_json::from_value(entry.clone())?;
            let stats = costs.stats_mut(kind);
            if let Some(cost) = unit.cost1 {
                stats.structure_cost = cost;
            }
            if let Some(cost) = unit.cost2 {
                stats.mobile_cost = cost;
            }
            if let Some(damage) = unit.attack_damage_walker {
                stats.damage = damage;
            }
            if let Some(range) = unit.attack_range {
                stats.range = range;
            }
            if let Some(cost) = unit.upgrade.and_then(|upgrade| upgrade.cost1) {
                stats.upgrade_cost = cost;
            }
        }

        Ok(Self {
            geometry: BoardGeometry::standard(),
            inverted,
            costs,
        })
    }
}
