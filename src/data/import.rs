//! Bulk orb and profile import.
//!
//! Orb payloads are JSON (a bare array or `{ "orbs": [...] }`) or CSV with a
//! `type,set,rarity,value,level` header. Items are normalized leniently and the whole import is
//! rejected when nothing valid remains, so callers only replace their list on success.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::orb::{parse_level, parse_value, trimmed_text, Orb, UNKNOWN_LABEL};
use super::profile::{free_profile_name, Profile};
use super::rarity::Rarity;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse import JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to parse import CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported import shape: expected {expected}")]
    UnsupportedShape { expected: &'static str },
    #[error("import contained no valid {what}")]
    NoValidItems { what: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbImport {
    pub orbs: Vec<Orb>,
    pub total_records: usize,
    pub dropped_records: usize,
    pub clipped_levels: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileImport {
    pub profiles: Vec<Profile>,
    pub shareable: BTreeSet<String>,
    pub dropped_records: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrbExport {
    Records(Vec<Value>),
    Wrapped { orbs: Vec<Value> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileExport {
    Records(Vec<Value>),
    Wrapped {
        profiles: Vec<Value>,
        #[serde(default)]
        shareable_categories: Option<Vec<String>>,
    },
}

/// Parses an orb import payload. JSON is detected by a leading `{` or `[`; anything else is CSV.
pub fn import_orbs(raw: &str) -> Result<OrbImport, ImportError> {
    let trimmed = raw.trim();
    let records = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        json_orb_records(trimmed)?
    } else {
        csv_orb_records(trimmed)?
    };

    let total_records = records.len();
    let mut clipped_levels = 0usize;
    let orbs: Vec<Orb> = records
        .iter()
        .filter_map(|record| {
            let (orb, clipped) = normalize_orb_record(record)?;
            if clipped {
                clipped_levels += 1;
            }
            Some(orb)
        })
        .collect();

    if orbs.is_empty() {
        warn!(total_records, "orb import rejected: no valid items");
        return Err(ImportError::NoValidItems { what: "orbs" });
    }

    let dropped_records = total_records - orbs.len();
    if dropped_records > 0 {
        debug!(dropped_records, "dropped orb records without type and set");
    }
    if clipped_levels > 0 {
        warn!(clipped_levels, "orb levels exceeded rarity cap and were clipped");
    }

    Ok(OrbImport {
        orbs,
        total_records,
        dropped_records,
        clipped_levels,
    })
}

fn json_orb_records(raw: &str) -> Result<Vec<Value>, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    match serde_json::from_value::<OrbExport>(value) {
        Ok(OrbExport::Records(records)) | Ok(OrbExport::Wrapped { orbs: records }) => Ok(records),
        Err(_) => Err(ImportError::UnsupportedShape {
            expected: "an array of orbs or an object with an `orbs` array",
        }),
    }
}

fn csv_orb_records(raw: &str) -> Result<Vec<Value>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    if !headers.iter().any(|h| h == "type" || h == "set") {
        return Err(ImportError::UnsupportedShape {
            expected: "CSV with a `type` or `set` header column",
        });
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_string())))
            .collect();
        records.push(Value::Object(object));
    }
    Ok(records)
}

/// Normalizes a single orb object the same way a bulk import does.
pub fn orb_from_value(record: &Value) -> Result<Orb, ImportError> {
    normalize_orb_record(record)
        .map(|(orb, _)| orb)
        .ok_or(ImportError::NoValidItems { what: "orbs" })
}

/// Normalizes one import record. Returns `None` for items with neither type nor set, and flags
/// whether the level had to be clipped to the rarity cap.
fn normalize_orb_record(record: &Value) -> Option<(Orb, bool)> {
    let obj = record.as_object()?;
    let orb_type = trimmed_text(obj.get("type"));
    let set = trimmed_text(obj.get("set")).or_else(|| trimmed_text(obj.get("set_name")));
    if orb_type.is_none() && set.is_none() {
        return None;
    }

    let rarity = obj
        .get("rarity")
        .and_then(Value::as_str)
        .and_then(Rarity::parse_lenient)
        .unwrap_or(Rarity::Rare);
    let level = parse_level(obj.get("level"));
    let orb = Orb::new(
        orb_type.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        set.unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        rarity,
        parse_value(obj.get("value")),
        level,
    );
    let clipped = orb.level < level;
    Some((orb, clipped))
}

/// Names blank profiles and renames repeated ones so every name in the list is distinct.
/// Explicit names are reserved up front, so a generated name never shadows a later entry.
fn dedupe_profile_names(profiles: &mut [Profile]) {
    let mut taken: BTreeSet<String> = profiles
        .iter()
        .filter(|p| !p.name.is_empty())
        .map(|p| p.name.clone())
        .collect();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (index, profile) in profiles.iter_mut().enumerate() {
        if profile.name.is_empty() {
            profile.name = free_profile_name(index + 1, |c| taken.contains(c));
        } else if seen.contains(&profile.name) {
            let base = profile.name.clone();
            let renamed = (2..)
                .map(|n| format!("{base} ({n})"))
                .find(|c| !taken.contains(c.as_str()))
                .unwrap_or_else(|| base.clone());
            debug!(from = %base, to = %renamed, "renamed duplicate imported profile");
            profile.name = renamed;
        }
        taken.insert(profile.name.clone());
        seen.insert(profile.name.clone());
    }
}

/// Parses a profile file: a bare array of profiles or `{ "profiles": [...], "shareable_categories": [...] }`.
pub fn import_profiles(raw: &str) -> Result<ProfileImport, ImportError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let (records, shareable) = match serde_json::from_value::<ProfileExport>(value) {
        Ok(ProfileExport::Records(records)) => (records, None),
        Ok(ProfileExport::Wrapped {
            profiles,
            shareable_categories,
        }) => (profiles, shareable_categories),
        Err(_) => {
            return Err(ImportError::UnsupportedShape {
                expected: "an array of profiles or an object with a `profiles` array",
            })
        }
    };

    let mut profiles: Vec<Profile> = records.iter().filter_map(Profile::from_value).collect();
    dedupe_profile_names(&mut profiles);

    if profiles.is_empty() {
        warn!(total_records = records.len(), "profile import rejected: no valid items");
        return Err(ImportError::NoValidItems { what: "profiles" });
    }

    let shareable = shareable
        .unwrap_or_default()
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(ProfileImport {
        dropped_records: records.len() - profiles.len(),
        profiles,
        shareable,
    })
}

/// Serializes profiles and the shareable set in the shape [import_profiles] accepts.
pub fn export_profiles(profiles: &[Profile], shareable: &BTreeSet<String>) -> Value {
    serde_json::json!({
        "profiles": profiles,
        "shareable_categories": shareable,
    })
}
