//! Loadout report derived from a parsed result: active set tiers, orb type totals and slot fill.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::Profile;

use super::result::{ParsedResult, ProfileResult};

/// Piece counts at which each set's bonus tiers unlock.
pub const SET_THRESHOLDS: [(&str, &[u32]); 7] = [
    ("Lucifer", &[4, 5]),
    ("Mammon", &[2, 4, 6]),
    ("Leviathan", &[3, 5, 6]),
    ("Satan", &[4, 5, 6]),
    ("Asmodeus", &[2, 4]),
    ("Beezlebub", &[1, 3, 5]),
    ("Belphegor", &[2, 4, 6]),
];

pub fn set_thresholds(set: &str) -> &'static [u32] {
    SET_THRESHOLDS
        .iter()
        .find(|(name, _)| *name == set)
        .map(|(_, thresholds)| *thresholds)
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSet {
    pub set: String,
    pub pieces: u32,
    pub tiers: u32,
    pub weight: f64,
    pub contrib: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub orb_type: String,
    pub pieces: u32,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFill {
    pub category: String,
    pub filled: u32,
    pub slots: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub name: String,
    pub active_sets: Vec<ActiveSet>,
    pub orb_types: Vec<TypeSummary>,
    pub slot_fill: Vec<SlotFill>,
}

/// Builds one report per result profile. Configuration is matched by profile name; results for
/// profiles that no longer exist are reported against the baseline profile.
pub fn summarize(parsed: &ParsedResult, profiles: &[Profile]) -> Vec<ProfileReport> {
    let baseline = Profile::baseline();
    parsed
        .profiles
        .iter()
        .map(|result| {
            let config = profiles
                .iter()
                .find(|p| p.name == result.name)
                .unwrap_or(&baseline);
            ProfileReport {
                name: result.name.clone(),
                active_sets: active_sets(result, config),
                orb_types: orb_types(result),
                slot_fill: slot_fill(result, config),
            }
        })
        .collect()
}

fn active_sets(result: &ProfileResult, config: &Profile) -> Vec<ActiveSet> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for orb in result.assignments.values().flatten() {
        *counts.entry(orb.set.as_str()).or_default() += 1;
    }

    let mut rows: Vec<ActiveSet> = counts
        .into_iter()
        .filter_map(|(set, pieces)| {
            let tiers = set_thresholds(set).iter().filter(|t| pieces >= **t).count() as u32;
            if tiers == 0 {
                return None;
            }
            let weight = config.set_priority.get(set).copied().unwrap_or(0.0);
            Some(ActiveSet {
                set: set.to_string(),
                pieces,
                tiers,
                weight,
                contrib: weight * f64::from(tiers),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.contrib
            .total_cmp(&a.contrib)
            .then(b.tiers.cmp(&a.tiers))
            .then(b.pieces.cmp(&a.pieces))
            .then_with(|| a.set.cmp(&b.set))
    });
    rows
}

fn orb_types(result: &ProfileResult) -> Vec<TypeSummary> {
    let mut totals: BTreeMap<&str, (u32, f64)> = BTreeMap::new();
    for orb in result.assignments.values().flatten() {
        let entry = totals.entry(orb.orb_type.as_str()).or_default();
        entry.0 += 1;
        entry.1 += orb.value;
    }
    totals
        .into_iter()
        .map(|(orb_type, (pieces, total_value))| TypeSummary {
            orb_type: orb_type.to_string(),
            pieces,
            total_value,
        })
        .collect()
}

/// Configured categories first (in name order), then any extra categories the solver returned.
fn slot_fill(result: &ProfileResult, config: &Profile) -> Vec<SlotFill> {
    let filled = |category: &str| {
        result
            .assignments
            .get(category)
            .map_or(0, |orbs| orbs.len() as u32)
    };
    let configured = config.categories.keys().map(|category| SlotFill {
        category: category.clone(),
        filled: filled(category),
        slots: config.slots(category),
    });
    let extra = result
        .assignments
        .keys()
        .filter(|category| !config.categories.contains_key(*category))
        .map(|category| SlotFill {
            category: category.clone(),
            filled: filled(category),
            slots: 0,
        });
    configured.chain(extra).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::CategoryRarity;
    use crate::solver::result::parse_result;

    fn sample() -> ParsedResult {
        parse_result(&json!({"profiles":[{"name":"PVP","assignments":{
            "Soul": [
                {"type":"Flame","set":"Mammon","value":2},
                {"type":"Flame","set":"Mammon","value":3},
                {"type":"Steel","set":"Beezlebub","value":1}
            ],
            "Wings": [
                {"type":"Steel","set":"Lucifer","value":4}
            ]
        }}]}))
        .expect("canonical layout")
    }

    fn pvp_profile() -> Profile {
        let mut profile = Profile::baseline();
        profile.name = "PVP".to_string();
        profile.set_priority.insert("Mammon".to_string(), 2.0);
        profile.set_priority.insert("Beezlebub".to_string(), 6.0);
        profile
            .categories
            .insert("Soul".to_string(), CategoryRarity::Legendary);
        profile
            .categories
            .insert("Heart".to_string(), CategoryRarity::Rare);
        profile
    }

    #[test]
    fn active_sets_rank_by_contribution() {
        let reports = summarize(&sample(), &[pvp_profile()]);
        let sets = &reports[0].active_sets;
        let names: Vec<&str> = sets.iter().map(|s| s.set.as_str()).collect();
        // Lucifer has one piece and unlocks nothing.
        assert_eq!(names, ["Beezlebub", "Mammon"]);
        assert_eq!(sets[0].tiers, 1);
        assert_eq!(sets[0].contrib, 6.0);
        assert_eq!(sets[1].pieces, 2);
        assert_eq!(sets[1].contrib, 2.0);
    }

    #[test]
    fn orb_types_total_values() {
        let reports = summarize(&sample(), &[pvp_profile()]);
        let types = &reports[0].orb_types;
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].orb_type, "Flame");
        assert_eq!(types[0].pieces, 2);
        assert_eq!(types[0].total_value, 5.0);
        assert_eq!(types[1].orb_type, "Steel");
        assert_eq!(types[1].total_value, 5.0);
    }

    #[test]
    fn slot_fill_lists_configured_then_extra_categories() {
        let reports = summarize(&sample(), &[pvp_profile()]);
        let fill = &reports[0].slot_fill;
        assert_eq!(
            fill,
            &vec![
                SlotFill { category: "Heart".to_string(), filled: 0, slots: 1 },
                SlotFill { category: "Soul".to_string(), filled: 3, slots: 3 },
                SlotFill { category: "Wings".to_string(), filled: 1, slots: 0 },
            ]
        );
    }

    #[test]
    fn unknown_profile_uses_baseline_weights() {
        let reports = summarize(&sample(), &[]);
        assert!(reports[0].active_sets.iter().all(|s| s.weight == 0.0));
        assert!(reports[0].slot_fill.iter().all(|f| f.slots == 0));
    }
}
