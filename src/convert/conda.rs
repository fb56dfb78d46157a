//! Invoking conda
//!
//! The converter talks to conda through [`CondaTool`] so the version
//! discovery and build loop can run against a fake in tests.

use super::error::ConvertError;
use crate::core::{PlatformTag, output};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default conda executable, looked up on `PATH`
pub const DEFAULT_CONDA: &str = "conda";

/// One `conda build` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub recipe_dir: PathBuf,
    pub r_version: String,
    pub output_folder: Option<PathBuf>,
    pub channels: Vec<String>,
    pub override_channels: bool,
}

impl BuildRequest {
    /// Arguments following the conda executable
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["build", "-q", "--no-test", "--R"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(self.r_version.clone().into());
        if let Some(folder) = &self.output_folder {
            args.push("--output-folder".into());
            args.push(folder.clone().into());
        }
        if self.override_channels {
            args.push("--override-channels".into());
        }
        for channel in &self.channels {
            args.push("--channel".into());
            args.push(channel.into());
        }
        args.push(self.recipe_dir.clone().into());
        args
    }
}

/// Package index queries and package builds
pub trait CondaTool {
    /// Raw `--json` search output for `package` on `platform`
    fn search(&self, platform: PlatformTag, package: &str) -> Result<String, ConvertError>;

    /// Build one package; failure aborts the conversion
    fn build(&self, request: &BuildRequest) -> Result<(), ConvertError>;
}

/// The real conda command line
#[derive(Debug, Clone)]
pub struct CondaCli {
    exe: PathBuf,
}

impl CondaCli {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }
}

impl CondaTool for CondaCli {
    fn search(&self, platform: PlatformTag, package: &str) -> Result<String, ConvertError> {
        let args: Vec<OsString> = ["search", "-q", "--json", "--subdir", platform.as_str(), package]
            .into_iter()
            .map(OsString::from)
            .collect();
        run_output(&self.exe, &args)
    }

    fn build(&self, request: &BuildRequest) -> Result<(), ConvertError> {
        let pb = output::spinner(&format!("building for R {}", request.r_version));
        let result = run_output(&self.exe, &request.args());
        pb.finish_and_clear();
        result.map(|_| ())
    }
}

fn display_command(exe: &Path, args: &[OsString]) -> String {
    std::iter::once(exe.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command, capturing its output.
///
/// Returns stdout on success. A non-zero exit becomes
/// [`ConvertError::CommandFailed`] carrying stderr.
pub fn run_output(exe: &Path, args: &[OsString]) -> Result<String, ConvertError> {
    let cmd = display_command(exe, args);
    output::command(&cmd);

    let out = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ConvertError::Spawn {
            cmd: cmd.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
    if !stdout.trim().is_empty() {
        output::debug(&format!("stdout:\n{}", stdout.trim_end()));
    }
    if !stderr.trim().is_empty() {
        output::debug(&format!("stderr:\n{}", stderr.trim_end()));
    }

    if !out.status.success() {
        return Err(ConvertError::CommandFailed {
            cmd,
            code: out.status.code(),
            stderr,
        });
    }

    Ok(stdout)
}
