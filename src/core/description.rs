//! R package `DESCRIPTION` metadata
//!
//! Only two keys matter for packaging: `Version` and `TKVersion`. Every
//! read goes to disk; nothing is cached.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Name of the metadata file at the root of an R package
pub const DESCRIPTION_FILE: &str = "DESCRIPTION";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Version\s*:\s*(\S+)").expect("valid Version regex"));

static TK_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TKVersion\s*:\s*(\S+)").expect("valid TKVersion regex"));

/// Errors reading package metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The file exists but declares no `Version:`
    #[error("Could not find DESCRIPTION file.")]
    MissingVersion { path: PathBuf },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// TK component the package was released against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TkVersion {
    Release(String),
    /// `TKVersion: none`, or no `TKVersion` line at all
    RestOnly,
}

impl TkVersion {
    fn parse(value: &str) -> Self {
        if value == "none" {
            Self::RestOnly
        } else {
            Self::Release(value.to_string())
        }
    }
}

impl std::fmt::Display for TkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Release(v) => f.write_str(v),
            Self::RestOnly => f.write_str("REST-only"),
        }
    }
}

/// Parsed `DESCRIPTION` metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub version: String,
    pub tk_version: TkVersion,
}

impl Description {
    /// Read `DESCRIPTION` from the root of an R package.
    pub fn read(root: &Path) -> Result<Self, MetadataError> {
        let path = root.join(DESCRIPTION_FILE);
        // `Encoding: latin1` packages are common; the keys we read are ASCII.
        let bytes = std::fs::read(&path).map_err(|source| MetadataError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&String::from_utf8_lossy(&bytes))
            .ok_or(MetadataError::MissingVersion { path })
    }

    /// Parse metadata text. Returns `None` when no `Version:` line exists.
    ///
    /// The first occurrence of each key wins.
    pub fn parse(content: &str) -> Option<Self> {
        let mut version = None;
        let mut tk_version = None;

        for line in content.lines() {
            if version.is_none()
                && let Some(caps) = VERSION_RE.captures(line)
            {
                version = Some(caps[1].to_string());
            }
            if tk_version.is_none()
                && let Some(caps) = TK_VERSION_RE.captures(line)
            {
                tk_version = Some(TkVersion::parse(&caps[1]));
            }
        }

        Some(Self {
            version: version?,
            tk_version: tk_version.unwrap_or(TkVersion::RestOnly),
        })
    }
}
