use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::controller::Controller;
use crate::data::import::export_profiles;
use crate::data::persist::StateStore;
use crate::editor::template::TemplateCatalog;
use crate::editor::AppState;
use crate::server;
use crate::solver::SolverOptions;

#[derive(Debug, Parser)]
#[command(name = "orbsmith", version, about = "Orb loadout profile editor and solver client")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,
    #[command(subcommand)]
    pub command: Command,
}

/// Flags that take precedence over the `ORBSMITH_*` environment.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Persisted state file
    #[arg(long, global = true)]
    pub state_path: Option<PathBuf>,
    /// Solver base URL (`/optimize` is appended)
    #[arg(long, global = true)]
    pub solver_url: Option<String>,
    /// User templates YAML file
    #[arg(long, global = true)]
    pub templates_path: Option<PathBuf>,
    /// Solver request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the local console API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Replace the saved orb list with a JSON or CSV import
    Import { path: PathBuf },
    /// Profile import and export
    #[command(subcommand)]
    Profiles(ProfilesCommand),
    /// List available templates
    Templates,
    /// Print the saved state
    Show,
    /// Send the saved state to the solver and print the outcome
    Optimize {
        #[arg(long)]
        topk: Option<u32>,
        #[arg(long)]
        beam: Option<u32>,
        #[arg(long)]
        refine_passes: Option<u32>,
        #[arg(long)]
        refine_report: bool,
    },
    /// Delete the saved state
    Reset,
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// Replace saved profiles and shareable categories from a JSON file
    Import { path: PathBuf },
    /// Print profiles and shareable categories as JSON
    Export,
}

impl Overrides {
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(path) = &self.state_path {
            config.state_path = path.clone();
        }
        if let Some(url) = &self.solver_url {
            config.solver_url = url.clone();
        }
        if let Some(path) = &self.templates_path {
            config.templates_path = path.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 2,
            };
            let _ = err.print();
            return code;
        }
    };
    let config = cli.overrides.apply(Config::from_env());

    match cli.command {
        Command::Serve { bind } => handle_serve(config, bind),
        Command::Import { path } => handle_import(&config, &path),
        Command::Profiles(ProfilesCommand::Import { path }) => handle_profiles_import(&config, &path),
        Command::Profiles(ProfilesCommand::Export) => handle_profiles_export(&config),
        Command::Templates => handle_templates(&config),
        Command::Show => print_json(&load_state(&config)),
        Command::Optimize {
            topk,
            beam,
            refine_passes,
            refine_report,
        } => handle_optimize(
            &config,
            SolverOptions {
                topk,
                beam,
                refine_passes,
                refine_report: refine_report.then_some(true),
            },
        ),
        Command::Reset => handle_reset(&config),
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => Some(rt),
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            None
        }
    }
}

fn controller(config: &Config) -> Option<Controller> {
    match Controller::new(config) {
        Ok(ctl) => Some(ctl),
        Err(err) => {
            eprintln!("failed to build solver client: {err}");
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

fn load_state(config: &Config) -> AppState {
    StateStore::new(config.state_path.clone())
        .load()
        .unwrap_or_default()
}

fn read_input(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) => {
            eprintln!("failed to read '{}': {err}", path.display());
            None
        }
    }
}

fn save_state(config: &Config, state: &AppState) -> bool {
    let saved = StateStore::new(config.state_path.clone()).save(state);
    if !saved {
        eprintln!("failed to save state to '{}'", config.state_path.display());
    }
    saved
}

fn handle_serve(mut config: Config, bind: Option<String>) -> i32 {
    if let Some(bind) = bind {
        config.bind = bind;
    }
    let (Some(rt), Some(ctl)) = (runtime(), controller(&config)) else {
        return 1;
    };
    match rt.block_on(server::run_server(&config.bind, Arc::new(ctl))) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_import(config: &Config, path: &Path) -> i32 {
    let Some(raw) = read_input(path) else {
        return 1;
    };
    match load_state(config).import_orbs(&raw) {
        Ok((state, report)) => {
            if !save_state(config, &state) {
                return 1;
            }
            println!(
                "import complete: orbs={}, dropped={}, clipped_levels={}, source='{}'",
                report.orbs.len(),
                report.dropped_records,
                report.clipped_levels,
                path.display()
            );
            0
        }
        Err(err) => {
            eprintln!("import failed: {err}");
            1
        }
    }
}

fn handle_profiles_import(config: &Config, path: &Path) -> i32 {
    let Some(raw) = read_input(path) else {
        return 1;
    };
    match load_state(config).import_profiles(&raw) {
        Ok((state, report)) => {
            if !save_state(config, &state) {
                return 1;
            }
            println!(
                "profile import complete: profiles={}, shareable={}, dropped={}",
                report.profiles.len(),
                report.shareable.len(),
                report.dropped_records
            );
            0
        }
        Err(err) => {
            eprintln!("profile import failed: {err}");
            1
        }
    }
}

fn handle_profiles_export(config: &Config) -> i32 {
    let state = load_state(config);
    print_json(&export_profiles(&state.profiles, &state.shareable))
}

fn handle_templates(config: &Config) -> i32 {
    let catalog = TemplateCatalog::load(&config.templates_path);
    print_json(&catalog.templates())
}

fn handle_optimize(config: &Config, options: SolverOptions) -> i32 {
    let (Some(rt), Some(ctl)) = (runtime(), controller(config)) else {
        return 1;
    };
    match rt.block_on(ctl.optimize(options)) {
        Ok(outcome) => print_json(&outcome),
        Err(err) => {
            eprintln!("optimize failed: {err}");
            1
        }
    }
}

fn handle_reset(config: &Config) -> i32 {
    if StateStore::new(config.state_path.clone()).clear() {
        println!("state cleared: '{}'", config.state_path.display());
        0
    } else {
        eprintln!("failed to clear '{}'", config.state_path.display());
        1
    }
}
