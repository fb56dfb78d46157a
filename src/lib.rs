//! Release-engineering helpers for the R SWAT client
//!
//! The library behind a handful of CI binaries:
//!
//! - `get-version` - print the package version from `DESCRIPTION`
//! - `get-basename` - print the release basename (`R-swat-1.6.0+vb21020-linux-64`)
//! - `get-protocol` - print the preferred CAS protocol (`cas` or `http`)
//! - `get-workspace-url` - print the working directory as a `file://` URL
//! - `tar2conda` - build conda packages from a source tarball for every
//!   supported R version
//! - `generate-tox-ini` - write tox environments for a sample of the
//!   supported R versions
//!
//! # Example
//!
//! ```no_run
//! use swat_cicd::core::{Description, PlatformTag, naming};
//! use std::path::Path;
//!
//! let desc = Description::read(Path::new("."))?;
//! println!("{}", naming::full_basename(&desc, PlatformTag::detect()));
//! # Ok::<(), swat_cicd::core::MetadataError>(())
//! ```

pub mod convert;
pub mod core;
pub mod tox;

use crate::core::{Description, output};
use std::path::Path;
use std::process::ExitCode;

/// Read `DESCRIPTION` for a helper binary.
///
/// On failure the error is reported on stderr and the exit code to
/// return from `main` is handed back.
pub fn read_description_or_exit(root: &Path) -> Result<Description, ExitCode> {
    Description::read(root).map_err(|e| {
        output::error(&e.to_string());
        ExitCode::from(1)
    })
}
