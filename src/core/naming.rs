//! Release names and identifiers derived from package metadata

use super::description::{Description, TkVersion};
use super::platform::PlatformTag;
use std::path::Path;

/// Product name used in release artifacts
pub const PRODUCT: &str = "swat";

/// `R-swat-{version}`
pub fn short_basename(desc: &Description) -> String {
    format!("R-{}-{}", PRODUCT, desc.version)
}

/// `R-swat-{version}+{tk_version}-{platform}`
pub fn full_basename(desc: &Description, platform: PlatformTag) -> String {
    format!(
        "R-{}-{}+{}-{}",
        PRODUCT, desc.version, desc.tk_version, platform
    )
}

/// Version, optionally as a `==` dependency expression.
pub fn version_string(desc: &Description, as_expr: bool) -> String {
    if as_expr {
        format!("=={}", desc.version)
    } else {
        desc.version.clone()
    }
}

/// Preferred CAS protocol: binary `cas` needs the TK component.
pub fn preferred_protocol(desc: &Description) -> &'static str {
    match desc.tk_version {
        TkVersion::Release(_) => "cas",
        TkVersion::RestOnly => "http",
    }
}

/// Render a directory as a `file://` URL.
///
/// Windows paths get forward slashes and a third slash before the drive
/// letter; MSYS-style `/c/...` prefixes become `c:/...`.
pub fn workspace_url(dir: &Path, windows: bool) -> String {
    let path = dir.to_string_lossy();
    if !windows {
        return format!("file://{}", path);
    }

    let path = path.replace('\\', "/");
    let bytes = path.as_bytes();
    let msys_drive = bytes.len() >= 3
        && bytes[0] == b'/'
        && bytes[1].is_ascii_alphabetic()
        && bytes[2] == b'/';
    let path = if msys_drive {
        format!("{}:{}", &path[1..2], &path[2..])
    } else {
        path
    };
    format!("file:///{}", path.trim_start_matches('/'))
}
