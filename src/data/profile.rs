//! Optimization profile: solver knobs, weight maps and category rarities for one solver run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::orb::{finite_number, trimmed_text};
use super::rarity::{normalize_category_rarity, CategoryRarity};

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const DEFAULT_POWER: f64 = 2.0;
pub const DEFAULT_EPSILON: f64 = 0.02;

pub type WeightMap = BTreeMap<String, f64>;
pub type CategoryMap = BTreeMap<String, CategoryRarity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    #[default]
    SetsFirst,
    TypesFirst,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetsFirst => "sets-first",
            Self::TypesFirst => "types-first",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "sets-first" => Some(Self::SetsFirst),
            "types-first" => Some(Self::TypesFirst),
            _ => None,
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects one of the three per-profile weight maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMapKind {
    SetPriority,
    OrbWeights,
    OrbLevelWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub objective: Objective,
    pub power: f64,
    pub epsilon: f64,
    #[serde(default)]
    pub set_priority: WeightMap,
    #[serde(default)]
    pub orb_weights: WeightMap,
    #[serde(default)]
    pub orb_level_weights: WeightMap,
    #[serde(default)]
    pub categories: CategoryMap,
}

impl Default for Profile {
    fn default() -> Self {
        Self::baseline()
    }
}

impl Profile {
    /// Blank profile every new profile and every template reset starts from.
    pub fn baseline() -> Self {
        Self {
            name: String::new(),
            weight: DEFAULT_WEIGHT,
            objective: Objective::SetsFirst,
            power: DEFAULT_POWER,
            epsilon: DEFAULT_EPSILON,
            set_priority: WeightMap::new(),
            orb_weights: WeightMap::new(),
            orb_level_weights: WeightMap::new(),
            categories: CategoryMap::new(),
        }
    }

    /// Slot count of a category; absent categories have none.
    pub fn slots(&self, category: &str) -> u32 {
        self.categories.get(category).map_or(0, CategoryRarity::slots)
    }

    pub fn total_slots(&self) -> u32 {
        self.categories.values().map(CategoryRarity::slots).sum()
    }

    pub fn weight_map(&self, kind: WeightMapKind) -> &WeightMap {
        match kind {
            WeightMapKind::SetPriority => &self.set_priority,
            WeightMapKind::OrbWeights => &self.orb_weights,
            WeightMapKind::OrbLevelWeights => &self.orb_level_weights,
        }
    }

    pub fn weight_map_mut(&mut self, kind: WeightMapKind) -> &mut WeightMap {
        match kind {
            WeightMapKind::SetPriority => &mut self.set_priority,
            WeightMapKind::OrbWeights => &mut self.orb_weights,
            WeightMapKind::OrbLevelWeights => &mut self.orb_level_weights,
        }
    }

    /// Lenient build from untyped JSON (profile files, older exports). Non-objects are rejected;
    /// missing knobs take baseline values and category rarities are normalized.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let baseline = Self::baseline();
        Some(Self {
            name: trimmed_text(obj.get("name")).unwrap_or_default(),
            weight: finite_number(obj.get("weight")).unwrap_or(baseline.weight),
            objective: obj
                .get("objective")
                .and_then(Value::as_str)
                .and_then(Objective::parse)
                .unwrap_or(baseline.objective),
            power: finite_number(obj.get("power")).unwrap_or(baseline.power),
            epsilon: finite_number(obj.get("epsilon")).unwrap_or(baseline.epsilon),
            set_priority: weight_map_from_value(obj.get("set_priority")),
            orb_weights: weight_map_from_value(obj.get("orb_weights")),
            orb_level_weights: weight_map_from_value(obj.get("orb_level_weights")),
            categories: category_map_from_value(obj.get("categories")),
        })
    }
}

/// Numeric entries of a JSON object; non-numeric entries are skipped.
fn weight_map_from_value(raw: Option<&Value>) -> WeightMap {
    raw.and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(key, value)| finite_number(Some(value)).map(|v| (key.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

fn category_map_from_value(raw: Option<&Value>) -> CategoryMap {
    raw.and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(key, value)| {
                    let label = value.as_str().unwrap_or_default();
                    (key.clone(), normalize_category_rarity(label))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// First `Profile N` name not already used by `existing`.
pub fn default_profile_name(existing: &[Profile]) -> String {
    free_profile_name(existing.len() + 1, |candidate| {
        existing.iter().any(|p| p.name == candidate)
    })
}

/// First `Profile N` with `N >= from` that `taken` does not claim.
pub fn free_profile_name(from: usize, taken: impl Fn(&str) -> bool) -> String {
    (from..)
        .map(|n| format!("Profile {n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| "Profile".to_string())
}
