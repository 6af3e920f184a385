//! Profile templates: named partial profiles applied as a destructive reset.
//!
//! Applying a template rebuilds the profile from a baseline. Only name and weight survive
//! verbatim; power and epsilon survive unless the template sets them; every other field is
//! either the template's value or the baseline's.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::profile::{CategoryMap, Objective, Profile, WeightMap};

pub const DEFAULT_TEMPLATES_PATH: &str = "data/templates.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_priority: Option<WeightMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_weights: Option<WeightMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb_level_weights: Option<WeightMap>,
}

impl Template {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            objective: None,
            power: None,
            epsilon: None,
            categories: None,
            set_priority: None,
            orb_weights: None,
            orb_level_weights: None,
        }
    }

    /// Drops non-finite knobs and weight entries so every profile a template produces stays
    /// finite.
    pub fn sanitized(mut self) -> Self {
        let id = self.id.clone();
        for (field, knob) in [("power", &mut self.power), ("epsilon", &mut self.epsilon)] {
            if knob.is_some_and(|v| !v.is_finite()) {
                warn!(template = %id, field, "dropping non-finite template value");
                *knob = None;
            }
        }
        for (field, map) in [
            ("set_priority", &mut self.set_priority),
            ("orb_weights", &mut self.orb_weights),
            ("orb_level_weights", &mut self.orb_level_weights),
        ] {
            if let Some(map) = map {
                let before = map.len();
                map.retain(|_, v| v.is_finite());
                if map.len() < before {
                    warn!(
                        template = %id,
                        field,
                        dropped = before - map.len(),
                        "dropping non-finite template weights"
                    );
                }
            }
        }
        self
    }
}

/// Resets `profile` to `baseline` and lays `template` over it. Pure; see module docs for the
/// field rules.
pub fn apply_template(profile: &Profile, template: &Template, baseline: &Profile) -> Profile {
    let reset = Profile {
        name: profile.name.clone(),
        weight: profile.weight,
        power: profile.power,
        epsilon: profile.epsilon,
        ..baseline.clone()
    };

    Profile {
        objective: template.objective.unwrap_or(reset.objective),
        power: template.power.unwrap_or(reset.power),
        epsilon: template.epsilon.unwrap_or(reset.epsilon),
        categories: template
            .categories
            .clone()
            .unwrap_or_else(|| reset.categories.clone()),
        set_priority: template
            .set_priority
            .clone()
            .unwrap_or_else(|| reset.set_priority.clone()),
        orb_weights: template
            .orb_weights
            .clone()
            .unwrap_or_else(|| reset.orb_weights.clone()),
        orb_level_weights: template
            .orb_level_weights
            .clone()
            .unwrap_or_else(|| reset.orb_level_weights.clone()),
        ..reset
    }
}

const SET_NAMES: [&str; 7] = [
    "Leviathan",
    "Beezlebub",
    "Belphegor",
    "Asmodeus",
    "Mammon",
    "Satan",
    "Lucifer",
];

const ORB_TYPES: [&str; 8] = [
    "Flame", "Water", "Wind", "Earth", "Sun", "Grass", "Lightning", "Steel",
];

fn weights(entries: &[(&str, f64)]) -> WeightMap {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), *value))
        .collect()
}

fn flat(keys: &[&str], value: f64) -> WeightMap {
    keys.iter().map(|key| ((*key).to_string(), value)).collect()
}

/// Templates shipped with the crate, built from the solver's default knob tables.
pub fn builtin_templates() -> Vec<Template> {
    let mut flat_sets = flat(&SET_NAMES, 1.0);
    flat_sets.insert("Mammon".to_string(), 1.1);

    let mut steel_heavy = flat(&ORB_TYPES, 1.0);
    steel_heavy.insert("Steel".to_string(), 5.0);

    vec![
        Template {
            objective: Some(Objective::SetsFirst),
            power: Some(2.0),
            epsilon: Some(0.02),
            set_priority: Some(flat_sets),
            orb_weights: Some(flat(&ORB_TYPES, 1.0)),
            orb_level_weights: Some(flat(&ORB_TYPES, 1.0)),
            ..Template::new("balanced", "Balanced (flat weights)")
        },
        Template {
            objective: Some(Objective::SetsFirst),
            power: Some(2.0),
            set_priority: Some(weights(&[
                ("Leviathan", 8.0),
                ("Beezlebub", 6.0),
                ("Belphegor", 5.0),
                ("Asmodeus", 3.0),
                ("Mammon", 2.0),
                ("Satan", 1.5),
                ("Lucifer", 1.0),
            ])),
            orb_weights: Some(flat(&ORB_TYPES, 1.0)),
            orb_level_weights: Some(steel_heavy),
            ..Template::new("set-hunter", "Set hunter (ranked sets)")
        },
        Template {
            objective: Some(Objective::TypesFirst),
            power: Some(1.0),
            epsilon: Some(0.0),
            orb_weights: Some(flat(&ORB_TYPES, 1.0)),
            ..Template::new("type-stacker", "Type stacker (no set priority)")
        },
    ]
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    List(Vec<Template>),
    Wrapped { templates: Vec<Template> },
}

/// Load templates from a YAML file (a list, or `templates:` holding a list).
pub fn load_templates_file(
    path: impl AsRef<Path>,
) -> Result<Vec<Template>, Box<dyn std::error::Error + Send + Sync>> {
    let raw = fs::read_to_string(path)?;
    let parsed: TemplateFile = serde_yaml::from_str(&raw)?;
    Ok(match parsed {
        TemplateFile::List(templates) | TemplateFile::Wrapped { templates } => templates,
    })
}

/// Built-in templates plus user templates; a user template replaces a built-in with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }
}

impl TemplateCatalog {
    /// Built-ins merged with the templates in `path`. A missing file is not an error; an
    /// unreadable one is logged and skipped.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut catalog = Self::default();
        if !path.is_file() {
            return catalog;
        }
        match load_templates_file(path) {
            Ok(user) => {
                info!(path = %path.display(), count = user.len(), "loaded user templates");
                catalog.extend(user);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable templates file");
            }
        }
        catalog
    }

    pub fn extend(&mut self, templates: impl IntoIterator<Item = Template>) {
        for template in templates.into_iter().map(Template::sanitized) {
            match self.templates.iter_mut().find(|t| t.id == template.id) {
                Some(existing) => *existing = template,
                None => self.templates.push(template),
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }
}
