//! Print the preferred CAS protocol: `cas` if TK is available, `http` otherwise

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use swat_cicd::core::naming;

#[derive(Parser)]
#[command(name = "get-protocol")]
#[command(about = "Return the preferred CAS protocol ('cas' if TK is available; 'http' otherwise)")]
#[command(version)]
struct Cli {
    /// Root directory of the R package
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    root: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let desc = match swat_cicd::read_description_or_exit(&cli.root) {
        Ok(desc) => desc,
        Err(code) => return code,
    };

    println!("{}", naming::preferred_protocol(&desc));
    ExitCode::SUCCESS
}
