//! Conda platform (subdir) names

use clap::ValueEnum;

/// Conda platform a package is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum PlatformTag {
    #[value(name = "linux-64")]
    Linux64,
    #[value(name = "osx-64")]
    Osx64,
    #[value(name = "win-64")]
    Win64,
    #[value(name = "linux-ppc64le")]
    LinuxPpc64le,
    /// Host could not be mapped; never accepted on the command line
    #[value(skip)]
    Unknown,
}

impl PlatformTag {
    /// Conda subdir name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux64 => "linux-64",
            Self::Osx64 => "osx-64",
            Self::Win64 => "win-64",
            Self::LinuxPpc64le => "linux-ppc64le",
            Self::Unknown => "unknown",
        }
    }

    /// Map an OS name and machine name (uname style) to a platform.
    pub fn from_host(os: &str, machine: &str) -> Self {
        let os = os.to_lowercase();
        if os.contains("darwin") {
            return Self::Osx64;
        }
        if os.starts_with("win") {
            return Self::Win64;
        }
        if os.contains("linux") {
            let machine = machine.to_lowercase();
            if machine.contains("x86") {
                return Self::Linux64;
            }
            if machine.contains("ppc") {
                return Self::LinuxPpc64le;
            }
        }
        Self::Unknown
    }

    /// Platform of the running host
    pub fn detect() -> Self {
        Self::from_host(host_os(), host_machine())
    }
}

impl std::fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Rust's target names differ from what uname reports for these two.
fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_machine() -> &'static str {
    match std::env::consts::ARCH {
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_host_table() {
        let cases = [
            ("Darwin", "x86_64", PlatformTag::Osx64),
            ("darwin", "arm64", PlatformTag::Osx64),
            ("Windows", "AMD64", PlatformTag::Win64),
            ("win32", "", PlatformTag::Win64),
            ("Linux", "x86_64", PlatformTag::Linux64),
            ("linux", "i686_x86", PlatformTag::Linux64),
            ("Linux", "ppc64le", PlatformTag::LinuxPpc64le),
            ("Linux", "aarch64", PlatformTag::Unknown),
            ("Linux", "", PlatformTag::Unknown),
            ("FreeBSD", "x86_64", PlatformTag::Unknown),
            ("", "", PlatformTag::Unknown),
            // "cygwin" contains neither prefix "win" nor "linux"
            ("cygwin", "x86_64", PlatformTag::Unknown),
        ];

        for (os, machine, expected) in cases {
            assert_eq!(
                PlatformTag::from_host(os, machine),
                expected,
                "os={:?} machine={:?}",
                os,
                machine
            );
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(PlatformTag::Linux64.to_string(), "linux-64");
        assert_eq!(PlatformTag::Osx64.to_string(), "osx-64");
        assert_eq!(PlatformTag::Win64.to_string(), "win-64");
        assert_eq!(PlatformTag::LinuxPpc64le.to_string(), "linux-ppc64le");
        assert_eq!(PlatformTag::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_cli_rejects_unknown() {
        assert!(PlatformTag::from_str("linux-ppc64le", false).is_ok());
        assert!(PlatformTag::from_str("unknown", false).is_err());
    }

    #[test]
    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    fn test_detect_linux_x86_64() {
        assert_eq!(PlatformTag::detect(), PlatformTag::Linux64);
    }

    #[test]
    #[cfg(target_os = "macos")]
    fn test_detect_macos() {
        assert_eq!(PlatformTag::detect(), PlatformTag::Osx64);
    }
}
