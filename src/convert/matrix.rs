//! Discover which R versions can be built against
//!
//! Every release of the four R packages SWAT depends on declares the R
//! runtime it was built for (`r-base 3.5.1*` or `mro-base 3.4.3*`). A
//! runtime version is supported when all four packages have a release
//! for it on the target platform.

use super::conda::CondaTool;
use super::error::ConvertError;
use crate::core::PlatformTag;
use regex::Regex;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

/// Packages that must be installable next to SWAT
pub const DEPENDENCY_PACKAGES: [&str; 4] =
    ["r::r-dplyr", "r::r-httr", "r::r-testthat", "r::r-xlsx"];

/// Early `mro-base` releases were published without a version in the
/// dependency string; they are all MRO 3.4.3.
pub const ALTERNATE_FALLBACK_VERSION: &str = "3.4.3";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)?)").expect("valid version regex"));

/// R runtime family a package is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flavor {
    /// CRAN R (`r-base`)
    Primary,
    /// Microsoft R Open (`mro-base`)
    Alternate,
}

impl Flavor {
    pub const ALL: [Flavor; 2] = [Flavor::Primary, Flavor::Alternate];

    /// Conda package providing the runtime
    pub fn base_package(&self) -> &'static str {
        match self {
            Self::Primary => "r-base",
            Self::Alternate => "mro-base",
        }
    }

    /// Prefix used in generated tox environment names
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Primary => "r",
            Self::Alternate => "mro",
        }
    }

    /// Version assumed when a dependency string has none
    pub fn fallback_version(&self) -> Option<&'static str> {
        match self {
            Self::Primary => None,
            Self::Alternate => Some(ALTERNATE_FALLBACK_VERSION),
        }
    }

    /// Flavor whose base package a dependency spec names.
    ///
    /// Matches the package name exactly, so `r-base64enc` is not `r-base`.
    fn from_dependency(dependency: &str) -> Option<Self> {
        let name = dependency.split_whitespace().next()?;
        Self::ALL
            .into_iter()
            .find(|flavor| name == flavor.base_package())
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.base_package())
    }
}

/// An R runtime version such as `3.5.1`, ordered numerically
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RVersion(String);

impl RVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn components(&self) -> Vec<u64> {
        self.0.split('.').filter_map(|c| c.parse().ok()).collect()
    }
}

impl Ord for RVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for RVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime versions per flavor
pub type FlavorVersions = BTreeMap<Flavor, BTreeSet<RVersion>>;

/// Every (flavor, version) pair a package is built for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMatrix {
    versions: FlavorVersions,
}

impl VersionMatrix {
    /// Versions supported for one flavor, ascending
    pub fn versions(&self, flavor: Flavor) -> impl Iterator<Item = &RVersion> {
        self.versions.get(&flavor).into_iter().flatten()
    }

    /// All pairs, primary flavor first
    pub fn pairs(&self) -> impl Iterator<Item = (Flavor, &RVersion)> {
        self.versions
            .iter()
            .flat_map(|(flavor, versions)| versions.iter().map(move |v| (*flavor, v)))
    }

    pub fn len(&self) -> usize {
        self.versions.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(Flavor, RVersion)> for VersionMatrix {
    fn from_iter<I: IntoIterator<Item = (Flavor, RVersion)>>(iter: I) -> Self {
        let mut versions = FlavorVersions::new();
        for (flavor, version) in iter {
            versions.entry(flavor).or_default().insert(version);
        }
        Self { versions }
    }
}

/// Intersect per-package version sets flavor by flavor.
///
/// A version survives only if every package lists it. No packages means
/// no supported versions.
pub fn intersect(per_package: &[FlavorVersions]) -> VersionMatrix {
    let mut versions = FlavorVersions::new();
    if per_package.is_empty() {
        return VersionMatrix { versions };
    }

    for flavor in Flavor::ALL {
        let mut sets = per_package
            .iter()
            .map(|pkg| pkg.get(&flavor).cloned().unwrap_or_default());
        let Some(first) = sets.next() else { continue };
        let common = sets.fold(first, |acc, set| acc.intersection(&set).cloned().collect());
        if !common.is_empty() {
            versions.insert(flavor, common);
        }
    }

    VersionMatrix { versions }
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    depends: Vec<String>,
}

/// Pull the runtime version out of a dependency like `r-base 3.5.1*`.
pub fn dependency_version(
    flavor: Flavor,
    package: &str,
    dependency: &str,
) -> Result<RVersion, ConvertError> {
    if let Some(m) = VERSION_RE.find(dependency) {
        return Ok(RVersion::new(m.as_str()));
    }
    flavor
        .fallback_version()
        .map(RVersion::new)
        .ok_or_else(|| ConvertError::PatternMismatch {
            package: package.to_string(),
            dependency: dependency.to_string(),
        })
}

/// Parse `conda search --json` output for one package.
///
/// `package` may carry a channel prefix (`r::r-dplyr`); the JSON is keyed
/// by the bare name. Releases without a runtime dependency are ignored.
pub fn parse_search_results(package: &str, json: &str) -> Result<FlavorVersions, ConvertError> {
    let name = package.rsplit("::").next().unwrap_or(package);

    let mut results: HashMap<String, Vec<Release>> =
        serde_json::from_str(json).map_err(|e| ConvertError::SearchOutput {
            package: package.to_string(),
            reason: e.to_string(),
        })?;
    let releases = results
        .remove(name)
        .ok_or_else(|| ConvertError::SearchOutput {
            package: package.to_string(),
            reason: format!("no entry for '{}'", name),
        })?;

    let mut versions = FlavorVersions::new();
    for release in releases {
        let Some((flavor, dependency)) = release
            .depends
            .iter()
            .find_map(|dep| Flavor::from_dependency(dep).map(|flavor| (flavor, dep)))
        else {
            continue;
        };
        let version = dependency_version(flavor, package, dependency)?;
        versions.entry(flavor).or_default().insert(version);
    }

    Ok(versions)
}

/// Query the package index and compute the supported version matrix.
pub fn discover(tool: &dyn CondaTool, platform: PlatformTag) -> Result<VersionMatrix, ConvertError> {
    let mut per_package = Vec::with_capacity(DEPENDENCY_PACKAGES.len());
    for package in DEPENDENCY_PACKAGES {
        let json = tool.search(platform, package)?;
        per_package.push(parse_search_results(package, &json)?);
    }
    Ok(intersect(&per_package))
}
