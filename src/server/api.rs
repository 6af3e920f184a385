use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::controller::Controller;
use crate::data::import::{export_profiles, orb_from_value, ImportError};
use crate::data::CategoryRarity;
use crate::editor::{AppState, EditError, ProfileEdit};
use crate::solver::{SolverError, SolverOptions};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid index '{0}'")]
    BadIndex(String),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("{0}")]
    Persistence(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::Parse(_) | Self::BadIndex(_) | Self::Import(_) => (400, "Bad Request"),
            Self::Edit(EditError::NotFinite { .. } | EditError::BlankName) => {
                (400, "Bad Request")
            }
            Self::Edit(EditError::DuplicateName(_)) => (409, "Conflict"),
            Self::Edit(_) | Self::NotFound(_) => (404, "Not Found"),
            Self::Solver(SolverError::AlreadyRunning) => (409, "Conflict"),
            Self::Solver(_) => (502, "Bad Gateway"),
            Self::Persistence(_) => (500, "Internal Server Error"),
        }
    }
}

#[derive(Debug, Serialize)]
struct StateResponse<'a> {
    status: &'static str,
    state: &'a AppState,
}

fn state_response(state: &AppState) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&StateResponse {
        status: "ok",
        state,
    })?)
}

fn parse_index(raw: &str) -> Result<usize, ApiError> {
    raw.parse().map_err(|_| ApiError::BadIndex(raw.to_string()))
}

/// Empty bodies read as `{}` so optional-only requests can be sent bare.
fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiError> {
    let body = body.trim();
    Ok(serde_json::from_str(if body.is_empty() { "{}" } else { body })?)
}

pub fn health_payload(ctl: &Controller) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "service": "orbsmith-api",
        "version": env!("CARGO_PKG_VERSION"),
        "running": ctl.is_running(),
    }))?)
}

pub fn state_payload(ctl: &Controller) -> Result<String, ApiError> {
    state_response(&ctl.snapshot())
}

pub fn state_reset_payload(ctl: &Controller) -> Result<String, ApiError> {
    if !ctl.reset() {
        return Err(ApiError::Persistence("could not clear saved state"));
    }
    state_response(&ctl.snapshot())
}

pub fn state_save_payload(ctl: &Controller) -> Result<String, ApiError> {
    if !ctl.save() {
        return Err(ApiError::Persistence("could not save state"));
    }
    Ok(serde_json::to_string_pretty(&json!({"status": "ok", "saved": true}))?)
}

pub fn state_load_payload(ctl: &Controller) -> Result<String, ApiError> {
    if !ctl.load() {
        return Err(ApiError::NotFound("no saved state to load"));
    }
    state_response(&ctl.snapshot())
}

pub fn orbs_import_payload(ctl: &Controller, body: &str) -> Result<String, ApiError> {
    let (report, state) = ctl.apply_with(|app| app.import_orbs(body))?;
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "imported": report.orbs.len(),
        "total_records": report.total_records,
        "dropped_records": report.dropped_records,
        "clipped_levels": report.clipped_levels,
        "state": state,
    }))?)
}

pub fn orb_add_payload(ctl: &Controller, body: &str) -> Result<String, ApiError> {
    let raw: Value = serde_json::from_str(body)?;
    let orb = orb_from_value(&raw)?;
    let state = ctl.apply(|app| Ok::<_, ApiError>(app.add_orb(orb)))?;
    state_response(&state)
}

pub fn orb_remove_payload(ctl: &Controller, index: &str) -> Result<String, ApiError> {
    let index = parse_index(index)?;
    let state = ctl.apply(|app| app.remove_orb(index))?;
    state_response(&state)
}

pub fn orbs_clear_payload(ctl: &Controller) -> Result<String, ApiError> {
    let state = ctl.apply(|app| Ok::<_, ApiError>(app.clear_orbs()))?;
    state_response(&state)
}

pub fn profile_add_payload(ctl: &Controller) -> Result<String, ApiError> {
    let state = ctl.apply(|app| Ok::<_, ApiError>(app.add_profile()))?;
    state_response(&state)
}

pub fn profile_remove_payload(ctl: &Controller, index: &str) -> Result<String, ApiError> {
    let index = parse_index(index)?;
    let state = ctl.apply(|app| app.remove_profile(index))?;
    state_response(&state)
}

pub fn profile_edit_payload(ctl: &Controller, index: &str, body: &str) -> Result<String, ApiError> {
    let index = parse_index(index)?;
    let edit: ProfileEdit = serde_json::from_str(body)?;
    let state = ctl.apply(|app| app.edit_profile(index, edit))?;
    state_response(&state)
}

#[derive(Debug, Deserialize)]
struct CategoryBody {
    #[serde(default)]
    rarity: Option<CategoryRarity>,
}

/// `rarity: null` (or no field) clears the category.
pub fn category_set_payload(
    ctl: &Controller,
    index: &str,
    category: &str,
    body: &str,
) -> Result<String, ApiError> {
    let index = parse_index(index)?;
    let CategoryBody { rarity } = parse_body(body)?;
    let state = ctl.apply(|app| app.set_category(index, category, rarity))?;
    state_response(&state)
}

#[derive(Debug, Deserialize)]
struct TemplateBody {
    template: String,
}

pub fn template_apply_payload(ctl: &Controller, index: &str, body: &str) -> Result<String, ApiError> {
    let index = parse_index(index)?;
    let TemplateBody { template } = serde_json::from_str(body)?;
    let state = ctl.apply_template(index, &template)?;
    state_response(&state)
}

pub fn profiles_import_payload(ctl: &Controller, body: &str) -> Result<String, ApiError> {
    let (report, state) = ctl.apply_with(|app| app.import_profiles(body))?;
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "imported": report.profiles.len(),
        "dropped_records": report.dropped_records,
        "state": state,
    }))?)
}

pub fn profiles_export_payload(ctl: &Controller) -> Result<String, ApiError> {
    let state = ctl.snapshot();
    Ok(serde_json::to_string_pretty(&export_profiles(
        &state.profiles,
        &state.shareable,
    ))?)
}

pub fn shareable_toggle_payload(ctl: &Controller, category: &str) -> Result<String, ApiError> {
    let state = ctl.apply(|app| Ok::<_, ApiError>(app.toggle_shareable(category)))?;
    state_response(&state)
}

pub fn templates_payload(ctl: &Controller) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "templates": ctl.templates().templates(),
    }))?)
}

pub async fn optimize_payload(ctl: &Controller, body: &str) -> Result<String, ApiError> {
    let options: SolverOptions = parse_body(body)?;
    let outcome = ctl.optimize(options).await?;
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "outcome": outcome,
    }))?)
}

pub fn result_payload(ctl: &Controller) -> Result<String, ApiError> {
    let outcome = ctl
        .outcome()
        .ok_or(ApiError::NotFound("no optimize result yet"))?;
    Ok(serde_json::to_string_pretty(&json!({
        "status": "ok",
        "outcome": outcome,
    }))?)
}
