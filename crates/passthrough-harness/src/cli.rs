// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line front end.
#![allow(clippy::print_stdout)]

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use passthrough_app_core::config::ConfigService;
use passthrough_app_core::prefs::PassthroughPrefs;
use passthrough_config_fs::FsConfigStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::prefs::{load_or_init, StoredPrefs};
use crate::scenario::{run_scenario_with_prefs, Scenario, Trace};

/// Harness arguments.
#[derive(Parser)]
#[command(name = "passthrough-harness")]
#[command(about = "Replay passthrough scenarios against the headless runtime")]
pub struct Cli {
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log: String,
    /// Apply the user's saved style prefs instead of the scenario's.
    #[arg(long, global = true)]
    pub saved_prefs: bool,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Harness subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario and optionally check against a golden trace
    Run {
        /// Path to the scenario JSON
        scenario: PathBuf,
        /// Optional path to a golden trace JSON
        #[arg(long)]
        golden: Option<PathBuf>,
    },
    /// Run a scenario and write its trace as a golden file
    Record {
        /// Path to the scenario JSON
        scenario: PathBuf,
        /// Path to the output trace JSON
        #[arg(long)]
        out: PathBuf,
    },
}

/// Parse arguments, install logging and dispatch.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log))?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let prefs = if cli.saved_prefs {
        Some(saved_prefs()?)
    } else {
        None
    };

    match cli.command {
        Commands::Run { scenario, golden } => {
            let scenario = Scenario::load(&scenario)?;
            let trace = run_scenario_with_prefs(&scenario, prefs.as_ref())?;
            if let Some(golden_path) = golden {
                let f = File::open(&golden_path).context("failed to open golden file")?;
                let expected: Trace = serde_json::from_reader(BufReader::new(f))
                    .context("failed to parse golden file")?;
                trace.compare(&expected)?;
                println!(
                    "{}: {} frames match golden {}",
                    trace.scenario,
                    trace.frames.len(),
                    golden_path.display()
                );
            } else {
                println!("{}: {} frames ok", trace.scenario, trace.frames.len());
            }
        }
        Commands::Record { scenario, out } => {
            let scenario = Scenario::load(&scenario)?;
            let trace = run_scenario_with_prefs(&scenario, prefs.as_ref())?;
            let f = File::create(&out).context("failed to create output file")?;
            serde_json::to_writer_pretty(f, &trace)?;
            info!(out = %out.display(), frames = trace.frames.len(), "golden recorded");
        }
    }

    Ok(())
}

fn saved_prefs() -> Result<PassthroughPrefs> {
    let store = FsConfigStore::new().context("failed to resolve config directory")?;
    info!(dir = %store.base().display(), "using saved passthrough prefs");
    Ok(load_or_init(&StoredPrefs::new(ConfigService::new(store))))
}
