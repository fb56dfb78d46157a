//! Converter error types.

use crate::core::MetadataError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting a tarball into conda packages.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("command failed: {cmd} (exit code: {code:?})\nstderr: {stderr}")]
    CommandFailed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to execute {cmd}: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("cannot open archive {}: {source}", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tar contains unsafe path: {0}")]
    UnsafePath(String),

    #[error("no R-swat* package directory in archive {}", .0.display())]
    NoPackageRoot(PathBuf),

    #[error("cannot parse search results for {package}: {reason}")]
    SearchOutput { package: String, reason: String },

    #[error("no version number in dependency '{dependency}' of {package}")]
    PatternMismatch { package: String, dependency: String },

    #[error("cannot update recipe {}: {source}", .path.display())]
    Recipe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
