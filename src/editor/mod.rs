//! Editor state and its transitions.
//!
//! [AppState] is a plain value. Every edit is a function from `&AppState` to a new `AppState`, so
//! a transition is either applied completely or not at all, and the prior state is never touched.

pub mod template;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::data::import::{self, ImportError, OrbImport, ProfileImport};
use crate::data::profile::{default_profile_name, Objective, Profile, WeightMapKind};
use crate::data::rarity::CategoryRarity;
use crate::data::Orb;
use template::{apply_template, Template};

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("profile index {index} out of range ({len} profiles)")]
    ProfileIndex { index: usize, len: usize },
    #[error("orb index {index} out of range ({len} orbs)")]
    OrbIndex { index: usize, len: usize },
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("profile name must not be blank")]
    BlankName,
    #[error("profile name '{0}' is already used")]
    DuplicateName(String),
}

/// One field edit on a single profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ProfileEdit {
    Name(String),
    Weight(f64),
    Objective(Objective),
    Power(f64),
    Epsilon(f64),
    /// Sets (`Some`) or removes (`None`) one key of a weight map.
    MapEntry {
        map: WeightMapKind,
        key: String,
        #[serde(default)]
        value: Option<f64>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub orbs: Vec<Orb>,
    pub profiles: Vec<Profile>,
    /// Categories whose rarity is kept identical across every profile.
    pub shareable: BTreeSet<String>,
}

impl AppState {
    pub fn is_shareable(&self, category: &str) -> bool {
        self.shareable.contains(category)
    }

    fn check_profile(&self, index: usize) -> Result<(), EditError> {
        if index < self.profiles.len() {
            Ok(())
        } else {
            Err(EditError::ProfileIndex {
                index,
                len: self.profiles.len(),
            })
        }
    }

    /// Sets (`Some`) or clears (`None`) a category rarity on one profile. Shareable categories
    /// receive the identical edit on every profile in the same transition.
    pub fn set_category(
        &self,
        index: usize,
        category: &str,
        rarity: Option<CategoryRarity>,
    ) -> Result<Self, EditError> {
        self.check_profile(index)?;
        let propagate = self.is_shareable(category);
        let profiles = self
            .profiles
            .iter()
            .enumerate()
            .map(|(i, profile)| {
                if i != index && !propagate {
                    return profile.clone();
                }
                let mut next = profile.clone();
                match rarity {
                    Some(rarity) => {
                        next.categories.insert(category.to_string(), rarity);
                    }
                    None => {
                        next.categories.remove(category);
                    }
                }
                next
            })
            .collect();

        debug!(index, category, ?rarity, propagate, "category set");
        Ok(Self {
            profiles,
            ..self.clone()
        })
    }

    /// Appends a baseline profile with the first free `Profile N` name.
    pub fn add_profile(&self) -> Self {
        let mut profile = Profile::baseline();
        profile.name = default_profile_name(&self.profiles);
        let mut next = self.clone();
        next.profiles.push(profile);
        next
    }

    /// Removes one profile; the others keep their relative order.
    pub fn remove_profile(&self, index: usize) -> Result<Self, EditError> {
        self.check_profile(index)?;
        let mut next = self.clone();
        next.profiles.remove(index);
        Ok(next)
    }

    pub fn edit_profile(&self, index: usize, edit: ProfileEdit) -> Result<Self, EditError> {
        self.check_profile(index)?;
        let mut next = self.clone();
        let profile = &mut next.profiles[index];
        match edit {
            ProfileEdit::Name(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(EditError::BlankName);
                }
                let taken = self
                    .profiles
                    .iter()
                    .enumerate()
                    .any(|(i, other)| i != index && other.name == name);
                if taken {
                    return Err(EditError::DuplicateName(name.to_string()));
                }
                profile.name = name.to_string();
            }
            ProfileEdit::Weight(weight) => profile.weight = finite("weight", weight)?,
            ProfileEdit::Objective(objective) => profile.objective = objective,
            ProfileEdit::Power(power) => profile.power = finite("power", power)?,
            ProfileEdit::Epsilon(epsilon) => profile.epsilon = finite("epsilon", epsilon)?,
            ProfileEdit::MapEntry { map, key, value } => {
                let entries = profile.weight_map_mut(map);
                match value {
                    Some(value) => {
                        entries.insert(key, finite("value", value)?);
                    }
                    None => {
                        entries.remove(&key);
                    }
                }
            }
        }
        Ok(next)
    }

    /// Replaces one profile with the template applied over `baseline`.
    pub fn apply_template(
        &self,
        index: usize,
        template: &Template,
        baseline: &Profile,
    ) -> Result<Self, EditError> {
        self.check_profile(index)?;
        let mut next = self.clone();
        next.profiles[index] = apply_template(&self.profiles[index], template, baseline);
        debug!(index, template = %template.id, "template applied");
        Ok(next)
    }

    /// Adds or removes a category from the shareable set. Profiles are not reconciled; the
    /// membership only governs later [AppState::set_category] calls.
    pub fn toggle_shareable(&self, category: &str) -> Self {
        let mut next = self.clone();
        if !next.shareable.remove(category) {
            next.shareable.insert(category.to_string());
        }
        next
    }

    /// Replaces the orb list with a successful import. On error nothing changes.
    pub fn import_orbs(&self, raw: &str) -> Result<(Self, OrbImport), ImportError> {
        let report = import::import_orbs(raw)?;
        let next = Self {
            orbs: report.orbs.clone(),
            ..self.clone()
        };
        Ok((next, report))
    }

    /// Replaces profiles and the shareable set with a successful profile import; orbs are kept.
    pub fn import_profiles(&self, raw: &str) -> Result<(Self, ProfileImport), ImportError> {
        let report = import::import_profiles(raw)?;
        let next = Self {
            orbs: self.orbs.clone(),
            profiles: report.profiles.clone(),
            shareable: report.shareable.clone(),
        };
        Ok((next, report))
    }

    pub fn add_orb(&self, orb: Orb) -> Self {
        let mut next = self.clone();
        next.orbs.push(orb.normalized());
        next
    }

    pub fn remove_orb(&self, index: usize) -> Result<Self, EditError> {
        if index >= self.orbs.len() {
            return Err(EditError::OrbIndex {
                index,
                len: self.orbs.len(),
            });
        }
        let mut next = self.clone();
        next.orbs.remove(index);
        Ok(next)
    }

    pub fn clear_orbs(&self) -> Self {
        Self {
            orbs: Vec::new(),
            ..self.clone()
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, EditError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EditError::NotFinite { field })
    }
}
