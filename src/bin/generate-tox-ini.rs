//! Generate a tox configuration for the conda test matrix
//!
//! Writes `<name>-conda.ini` next to the given file, with `envlist`
//! replaced by environments for a sample of the supported R versions.
//!
//! Usage:
//!   generate-tox-ini tox.ini
//!   generate-tox-ini -p osx-64 tox.ini

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use swat_cicd::convert::{CondaCli, conda};
use swat_cicd::core::{PlatformTag, output};
use swat_cicd::tox;

#[derive(Parser)]
#[command(name = "generate-tox-ini")]
#[command(about = "Generate a Tox config file for all test configurations")]
#[command(version)]
struct Cli {
    /// Path to tox.ini file
    #[arg(value_name = "INI_FILE")]
    tox_ini: PathBuf,

    /// Platform to look up packages for [default: host platform]
    #[arg(short, long, value_enum)]
    platform: Option<PlatformTag>,

    /// Enable debug logging, including conda output
    #[arg(long)]
    debug: bool,

    /// conda executable
    #[arg(long, env = "CONDA_EXE", default_value = conda::DEFAULT_CONDA)]
    conda: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    output::set_verbose(cli.debug);

    let platform = cli.platform.unwrap_or_else(PlatformTag::detect);
    let tool = CondaCli::new(cli.conda);

    output::action(&format!("Generating test environments for {}", platform));
    let generated = tox::generate(&tool, &cli.tox_ini, platform, &mut rand::thread_rng())
        .with_context(|| format!("Failed to generate from {}", cli.tox_ini.display()))?;

    if generated.environments.is_empty() {
        output::warning(&format!("no supported R versions found for {}", platform));
    }
    for env in &generated.environments {
        output::detail(env);
    }
    output::info(&format!("wrote {}", generated.path.display()));
    Ok(())
}
