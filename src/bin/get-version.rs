//! Print the version of the R package
//!
//! Usage:
//!   get-version [DIRECTORY]            1.6.0
//!   get-version --as-expr [DIRECTORY]  ==1.6.0

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use swat_cicd::core::naming;

#[derive(Parser)]
#[command(name = "get-version")]
#[command(about = "Return the version of the package")]
#[command(version)]
struct Cli {
    /// Root directory of the R package
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    root: PathBuf,

    /// Format the version as a dependency expression
    #[arg(short = 'e', long)]
    as_expr: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let desc = match swat_cicd::read_description_or_exit(&cli.root) {
        Ok(desc) => desc,
        Err(code) => return code,
    };

    println!("{}", naming::version_string(&desc, cli.as_expr));
    ExitCode::SUCCESS
}
