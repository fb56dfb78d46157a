//! Convert a tar.gz R package distribution to conda packages
//!
//! Usage:
//!   tar2conda -r conda.recipe https://example.com/R-swat-1.6.0-linux64.tar.gz
//!   tar2conda -r conda.recipe/meta.yaml -c r --output-folder dist R-swat-1.6.0.tar.gz

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use swat_cicd::convert::{self, CondaCli, ConvertOptions, conda};
use swat_cicd::core::{PlatformTag, output};

#[derive(Parser)]
#[command(name = "tar2conda")]
#[command(about = "Convert a tar.gz R package distribution to a conda package")]
#[command(version)]
struct Cli {
    /// Input file / URL
    #[arg(value_name = "URL")]
    url: String,

    /// Build number (reserved; the recipe controls the build number)
    #[arg(short, long, default_value_t = 0)]
    build: u32,

    /// Additional channel to search (repeatable)
    #[arg(short = 'c', long = "channel", value_name = "CHANNEL")]
    channels: Vec<String>,

    /// Enable debug logging, including conda output
    #[arg(long)]
    debug: bool,

    /// Folder to create the output packages in [default: current directory]
    #[arg(long, value_name = "DIR")]
    output_folder: Option<PathBuf>,

    /// Disable searching default or .condarc channels
    #[arg(long)]
    override_channels: bool,

    /// Path to the recipe directory or recipe file
    #[arg(short, long, value_name = "PATH")]
    recipe_dir: PathBuf,

    /// Platform libraries to build against [default: host platform]
    #[arg(short, long, value_enum)]
    platform: Option<PlatformTag>,

    /// conda executable
    #[arg(long, env = "CONDA_EXE", default_value = conda::DEFAULT_CONDA)]
    conda: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    output::set_verbose(cli.debug);
    output::debug(&format!("build number {} (reserved)", cli.build));

    let opts = ConvertOptions {
        input: cli.url.clone(),
        recipe_dir: cli.recipe_dir,
        output_folder: cli.output_folder.unwrap_or_default(),
        channels: cli.channels,
        override_channels: cli.override_channels,
        platform: cli.platform.unwrap_or_else(PlatformTag::detect),
    };
    let tool = CondaCli::new(cli.conda);
    output::debug(&format!("using {}", tool.exe().display()));

    output::action(&format!("Converting {}", cli.url));
    let built = convert::convert(&tool, &opts)
        .with_context(|| format!("Failed to convert {}", cli.url))?;

    output::success(&format!("built {} package(s)", built.len()));
    Ok(())
}
