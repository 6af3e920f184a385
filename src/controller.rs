//! Owns the editor state, the last optimize outcome and the running flag.
//!
//! State transitions run under one lock and are never held across the solver call, so edits stay
//! possible while an optimize request is in flight without touching its payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::data::persist::StateStore;
use crate::data::Profile;
use crate::editor::template::TemplateCatalog;
use crate::editor::{AppState, EditError};
use crate::solver::report::{summarize, ProfileReport};
use crate::solver::{OptimizeRequest, ParsedResult, SolverClient, SolverError, SolverOptions};

/// What the last successful optimize call produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Parsed {
        result: ParsedResult,
        report: Vec<ProfileReport>,
        summary: Value,
    },
    /// No known layout matched; the payload is kept for display as-is.
    Unrecognized { summary: Value, raw: Value },
}

#[derive(Debug, Default)]
struct Session {
    app: AppState,
    outcome: Option<Outcome>,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Controller {
    session: Mutex<Session>,
    running: AtomicBool,
    store: StateStore,
    templates: TemplateCatalog,
    solver: SolverClient,
}

impl Controller {
    /// Builds a controller from config, restoring persisted state when it is readable.
    pub fn new(config: &Config) -> Result<Self, SolverError> {
        let store = StateStore::new(config.state_path.clone());
        let app = store.load().unwrap_or_default();
        let templates = TemplateCatalog::load(&config.templates_path);
        let solver = SolverClient::new(&config.solver_url, config.timeout)?;
        Ok(Self::with_parts(store, templates, solver, app))
    }

    pub fn with_parts(
        store: StateStore,
        templates: TemplateCatalog,
        solver: SolverClient,
        app: AppState,
    ) -> Self {
        Self {
            session: Mutex::new(Session { app, outcome: None }),
            running: AtomicBool::new(false),
            store,
            templates,
            solver,
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> AppState {
        self.session().app.clone()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.session().outcome.clone()
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs one transition and persists the result. On error the state is unchanged.
    pub fn apply<E>(
        &self,
        transition: impl FnOnce(&AppState) -> Result<AppState, E>,
    ) -> Result<AppState, E> {
        self.apply_with(|app| transition(app).map(|next| (next, ())))
            .map(|((), next)| next)
    }

    /// Like [Controller::apply], for transitions that also produce a report.
    ///
    /// The save runs under the session lock so the file always holds the latest state.
    pub fn apply_with<T, E>(
        &self,
        transition: impl FnOnce(&AppState) -> Result<(AppState, T), E>,
    ) -> Result<(T, AppState), E> {
        let mut session = self.session();
        let (next, extra) = transition(&session.app)?;
        session.app = next.clone();
        self.store.save(&next);
        drop(session);
        Ok((extra, next))
    }

    /// Applies a catalog template to one profile, resetting it over the baseline profile.
    pub fn apply_template(&self, index: usize, template_id: &str) -> Result<AppState, EditError> {
        let template = self
            .templates
            .find(template_id)
            .ok_or_else(|| EditError::UnknownTemplate(template_id.to_string()))?;
        let baseline = Profile::baseline();
        self.apply(|app| app.apply_template(index, template, &baseline))
    }

    pub fn save(&self) -> bool {
        let session = self.session();
        self.store.save(&session.app)
    }

    /// Replaces in-memory state with the persisted one. Nothing changes when loading fails.
    pub fn load(&self) -> bool {
        match self.store.load() {
            Some(app) => {
                self.session().app = app;
                true
            }
            None => false,
        }
    }

    /// Clears persisted state, then resets in-memory state and the last outcome.
    pub fn reset(&self) -> bool {
        let mut session = self.session();
        let cleared = self.store.clear();
        if cleared {
            session.app = AppState::default();
            session.outcome = None;
        }
        cleared
    }

    /// Sends the current state to the solver. Only one request may be in flight; on failure the
    /// previous outcome is kept.
    pub async fn optimize(&self, options: SolverOptions) -> Result<Outcome, SolverError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SolverError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let request = OptimizeRequest::from_state(&self.snapshot(), options);
        let response = self.solver.optimize(&request).await?;

        let summary = response.result.summary.clone();
        let outcome = match response.parsed() {
            Some(result) => {
                let report = summarize(&result, &request.profiles);
                info!(profiles = result.profiles.len(), "solver result normalized");
                Outcome::Parsed {
                    result,
                    report,
                    summary,
                }
            }
            None => {
                warn!("solver result has no recognized layout, keeping raw payload");
                Outcome::Unrecognized {
                    summary,
                    raw: response.result.raw,
                }
            }
        };

        self.session().outcome = Some(outcome.clone());
        Ok(outcome)
    }
}
