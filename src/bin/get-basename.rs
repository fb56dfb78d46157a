//! Print the basename for the package
//!
//! Without `--full` only the short form is printed:
//!
//!   R-swat-{version}
//!
//! With `--full` the TK version and platform are included. The platform
//! defaults to the one the program is running on:
//!
//!   R-swat-{version}+{tk_version}-{platform}

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use swat_cicd::core::{PlatformTag, naming};

#[derive(Parser)]
#[command(name = "get-basename")]
#[command(about = "Return the basename for the package")]
#[command(version)]
struct Cli {
    /// Root directory of the R package
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    root: PathBuf,

    /// Platform of the resulting package [default: host platform]
    #[arg(short, long, value_enum)]
    platform: Option<PlatformTag>,

    /// Return the full variant of the basename including TK version and platform
    #[arg(short, long)]
    full: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let platform = cli.platform.unwrap_or_else(PlatformTag::detect);

    let desc = match swat_cicd::read_description_or_exit(&cli.root) {
        Ok(desc) => desc,
        Err(code) => return code,
    };

    if cli.full {
        println!("{}", naming::full_basename(&desc, platform));
    } else {
        println!("{}", naming::short_basename(&desc));
    }
    ExitCode::SUCCESS
}
