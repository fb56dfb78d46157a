//! Print the current working directory as a `file://` URL

use anyhow::{Context, Result};
use clap::Parser;
use swat_cicd::core::naming;

#[derive(Parser)]
#[command(name = "get-workspace-url")]
#[command(about = "Return the WORKSPACE as a URL")]
#[command(version)]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    println!("{}", naming::workspace_url(&cwd, cfg!(windows)));
    Ok(())
}
