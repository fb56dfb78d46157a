//! Tox environments for the conda test matrix
//!
//! CI does not test every supported R version. For each flavor it runs
//! the oldest and newest supported versions plus one picked at random
//! from those in between. The picked versions become generated
//! `[testenv:...]` sections appended to a copy of the project's tox
//! configuration, and the copy's `envlist` is replaced with them.

use crate::convert::matrix::{self, Flavor, RVersion, VersionMatrix};
use crate::convert::{CondaTool, ConvertError};
use crate::core::PlatformTag;
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Package kind the generated environments install SWAT from
pub const PACKAGE_KIND: &str = "conda";

#[derive(Error, Debug)]
pub enum ToxError {
    #[error(transparent)]
    Discover(#[from] ConvertError),

    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of [`generate`]
#[derive(Debug, Clone)]
pub struct Generated {
    /// The written configuration
    pub path: PathBuf,
    /// Generated environment names, in `envlist` order
    pub environments: Vec<String>,
}

/// Pick oldest, newest and one random in-between version per flavor.
pub fn select_subset<R: Rng + ?Sized>(supported: &VersionMatrix, rng: &mut R) -> VersionMatrix {
    let mut picked = Vec::new();

    for flavor in Flavor::ALL {
        let versions: Vec<&RVersion> = supported.versions(flavor).collect();
        let (Some(oldest), Some(newest)) = (versions.first(), versions.last()) else {
            continue;
        };
        picked.push((flavor, (*oldest).clone()));
        picked.push((flavor, (*newest).clone()));

        if versions.len() > 2
            && let Some(middle) = versions[1..versions.len() - 1].choose(&mut *rng)
        {
            picked.push((flavor, (*middle).clone()));
        }
    }

    picked.into_iter().collect()
}

/// `r351-conda-cicd` for r-base 3.5.1
pub fn environment_name(flavor: Flavor, version: &RVersion) -> String {
    format!(
        "{}{}-{}-cicd",
        flavor.short_name(),
        version.as_str().replace('.', ""),
        PACKAGE_KIND
    )
}

/// Generated `[testenv:...]` sections, one block per flavor.
fn environment_sections(subset: &VersionMatrix) -> Vec<String> {
    let mut out: Vec<String> = ["", "#", "# BEGIN GENERATED ENVIRONMENTS", "#", ""]
        .into_iter()
        .map(String::from)
        .collect();

    for flavor in Flavor::ALL {
        let mut versions = subset.versions(flavor).peekable();
        if versions.peek().is_none() {
            continue;
        }

        out.push("#".into());
        out.push(format!("# {}", flavor.base_package()));
        out.push("#".into());
        out.push(String::new());

        for version in versions {
            out.push(format!("# R {}", version));
            out.push(format!("[testenv:{}]", environment_name(flavor, version)));
            out.push(format!("commands = {{[testenv:{}]commands}}", PACKAGE_KIND));
            out.push("conda_deps =".into());
            out.push(format!("    {}=={}", flavor.base_package(), version));
            out.push("    {[testenv]conda_deps}".into());
            out.push(String::new());
        }
    }

    out
}

/// Rewrite a tox configuration for `subset`.
///
/// The `envlist` key and its indented continuation lines are replaced by
/// the generated environment names; every other line is kept. The
/// generated sections are appended at the end.
pub fn render(template: &str, subset: &VersionMatrix) -> String {
    let mut out = String::new();
    let mut in_envlist = false;

    for line in template.lines() {
        if in_envlist {
            if line.starts_with([' ', '\t']) {
                continue;
            }
            in_envlist = false;
        }

        if line.starts_with("envlist") {
            out.push_str("envlist =\n");
            for (flavor, version) in subset.pairs() {
                out.push_str("    ");
                out.push_str(&environment_name(flavor, version));
                out.push('\n');
            }
            in_envlist = true;
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    for line in environment_sections(subset) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// `tox.ini` → `tox-conda.ini`, next to the input.
pub fn output_path(tox_ini: &Path) -> PathBuf {
    let stem = tox_ini
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tox".to_string());
    tox_ini.with_file_name(format!("{}-{}.ini", stem, PACKAGE_KIND))
}

/// Discover the supported versions, pick a subset and write the
/// generated configuration next to `tox_ini`.
pub fn generate<R: Rng + ?Sized>(
    tool: &dyn CondaTool,
    tox_ini: &Path,
    platform: PlatformTag,
    rng: &mut R,
) -> Result<Generated, ToxError> {
    let template = std::fs::read_to_string(tox_ini).map_err(|source| ToxError::Read {
        path: tox_ini.to_path_buf(),
        source,
    })?;

    let supported = matrix::discover(tool, platform)?;
    let subset = select_subset(&supported, rng);

    let path = output_path(tox_ini);
    std::fs::write(&path, render(&template, &subset)).map_err(|source| ToxError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(Generated {
        path,
        environments: subset
            .pairs()
            .map(|(flavor, version)| environment_name(flavor, version))
            .collect(),
    })
}
