use serde::{Deserialize, Serialize};

use crate::data::{Orb, Profile};
use crate::editor::AppState;

/// The only algorithm the front-end requests.
pub const ALGORITHM: &str = "greedy";

/// Optional search knobs forwarded to the solver; unset knobs are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topk: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine_passes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine_report: Option<bool>,
}

/// Body of `POST /optimize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub orbs: Vec<Orb>,
    pub profiles: Vec<Profile>,
    pub shareable_categories: Vec<String>,
    pub algorithm: &'static str,
    #[serde(flatten)]
    pub options: SolverOptions,
}

impl OptimizeRequest {
    /// Snapshots the editor state; later edits do not reach an already-built request.
    pub fn from_state(state: &AppState, options: SolverOptions) -> Self {
        Self {
            orbs: state.orbs.clone(),
            profiles: state.profiles.clone(),
            shareable_categories: state.shareable.iter().cloned().collect(),
            algorithm: ALGORITHM,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CategoryRarity, Rarity};

    #[test]
    fn body_matches_solver_contract() {
        let state = AppState::default()
            .add_profile()
            .toggle_shareable("Soul")
            .add_orb(Orb::new("Flame", "Lucifer", Rarity::Epic, 2.5, 4));
        let state = state
            .set_category(0, "Soul", Some(CategoryRarity::Legendary))
            .expect("index in range");
        let request = OptimizeRequest::from_state(
            &state,
            SolverOptions {
                topk: Some(10),
                refine_report: Some(true),
                ..SolverOptions::default()
            },
        );
        let body = serde_json::to_value(&request).expect("request serializes");

        assert_eq!(body["algorithm"], "greedy");
        assert_eq!(body["topk"], 10);
        assert_eq!(body["refine_report"], true);
        assert!(body.get("beam").is_none());
        assert!(body.get("refine_passes").is_none());
        assert_eq!(body["shareable_categories"], serde_json::json!(["Soul"]));
        assert_eq!(body["orbs"][0]["type"], "Flame");
        assert_eq!(body["orbs"][0]["set"], "Lucifer");
        assert_eq!(body["orbs"][0]["rarity"], "Epic");
        assert_eq!(body["profiles"][0]["name"], "Profile 1");
        assert_eq!(body["profiles"][0]["objective"], "sets-first");
        assert_eq!(body["profiles"][0]["categories"]["Soul"], "Legendary");
    }
}
