//! Result normalization.
//!
//! The solver has answered in three layouts over time. Each layout gets one decoder, tried in a
//! fixed order; a decoder only runs once its discriminating field has the expected JSON type.
//!
//! 1. Canonical: `profiles` is an array of `{ name, score, set_score, orb_score, assignments }`.
//! 2. Assign map: `assign` is `{ profile: { category: [orb] } }`, with scores looked up in a
//!    `profiles` object keyed by profile name.
//! 3. Loadout map: `profiles` is `{ profile: { set_score, orb_score, loadout } }`.
//!
//! Anything else is [ResultShape::Unrecognized] and [parse_result] returns `None`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::data::orb::{coerce_result_orb, finite_number, trimmed_text};
use crate::data::Orb;

pub type Assignments = IndexMap<String, Vec<Orb>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub name: String,
    pub score: Option<f64>,
    pub set_score: Option<f64>,
    pub orb_score: Option<f64>,
    pub assignments: Assignments,
}

impl ProfileResult {
    pub fn orb_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResult {
    pub combined_score: Option<f64>,
    pub profiles: Vec<ProfileResult>,
}

impl ParsedResult {
    pub fn profile(&self, name: &str) -> Option<&ProfileResult> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Which layout a raw response uses, holding borrowed views of the discriminating fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultShape<'a> {
    Canonical(&'a [Value]),
    AssignMap {
        assign: &'a Map<String, Value>,
        scores: Option<&'a Map<String, Value>>,
    },
    LoadoutMap(&'a Map<String, Value>),
    Unrecognized,
}

pub fn classify(raw: &Value) -> ResultShape<'_> {
    let profiles = raw.get("profiles");
    if let Some(list) = profiles.and_then(Value::as_array) {
        return ResultShape::Canonical(list);
    }
    if let Some(assign) = raw.get("assign").and_then(Value::as_object) {
        return ResultShape::AssignMap {
            assign,
            scores: profiles.and_then(Value::as_object),
        };
    }
    if let Some(by_name) = profiles.and_then(Value::as_object) {
        return ResultShape::LoadoutMap(by_name);
    }
    ResultShape::Unrecognized
}

/// Decodes a solver result into the canonical model, or `None` when no layout matches.
pub fn parse_result(raw: &Value) -> Option<ParsedResult> {
    let profiles = match classify(raw) {
        ResultShape::Canonical(list) => decode_canonical(list),
        ResultShape::AssignMap { assign, scores } => decode_assign_map(assign, scores),
        ResultShape::LoadoutMap(by_name) => decode_loadout_map(by_name),
        ResultShape::Unrecognized => {
            debug!("solver result matched no known layout");
            return None;
        }
    };

    Some(ParsedResult {
        combined_score: finite_number(raw.get("combined_score")),
        profiles,
    })
}

fn decode_canonical(list: &[Value]) -> Vec<ProfileResult> {
    list.iter()
        .enumerate()
        .map(|(index, entry)| {
            let name = trimmed_text(entry.get("name"))
                .unwrap_or_else(|| format!("Profile {}", index + 1));
            profile_result(name, Some(entry), entry.get("assignments"))
        })
        .collect()
}

fn decode_assign_map(
    assign: &Map<String, Value>,
    scores: Option<&Map<String, Value>>,
) -> Vec<ProfileResult> {
    assign
        .iter()
        .map(|(name, categories)| {
            let meta = scores.and_then(|s| s.get(name));
            profile_result(name.clone(), meta, Some(categories))
        })
        .collect()
}

fn decode_loadout_map(by_name: &Map<String, Value>) -> Vec<ProfileResult> {
    by_name
        .iter()
        .map(|(name, entry)| profile_result(name.clone(), Some(entry), entry.get("loadout")))
        .collect()
}

fn profile_result(
    name: String,
    meta: Option<&Value>,
    assignments: Option<&Value>,
) -> ProfileResult {
    let score = |key: &str| finite_number(meta.and_then(|m| m.get(key)));
    ProfileResult {
        name,
        score: score("score"),
        set_score: score("set_score"),
        orb_score: score("orb_score"),
        assignments: decode_assignments(assignments),
    }
}

/// Category -> orbs, keeping the response's key order. Non-object input is empty and any
/// non-array category value is an empty list.
fn decode_assignments(raw: Option<&Value>) -> Assignments {
    let Some(categories) = raw.and_then(Value::as_object) else {
        return Assignments::new();
    };
    categories
        .iter()
        .map(|(category, orbs)| {
            let orbs = orbs
                .as_array()
                .map(|list| list.iter().map(coerce_result_orb).collect())
                .unwrap_or_default();
            (category.clone(), orbs)
        })
        .collect()
}
