//! generate-tox-ini against a scripted conda

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TOX_INI: &str = "\
[tox]
envlist = py
skipsdist = True

[testenv:conda]
commands = Rscript -e 'testthat::test_dir(\"tests\")'
";

/// Every package has r-base 3.4.1, 3.5.1, 3.6.0 and an unversioned mro-base release.
fn fake_conda(dir: &Path) -> PathBuf {
    let script = r#"#!/bin/sh
[ "$1" = "search" ] || exit 3
for last; do :; done
name="${last#*::}"
printf '{"%s": [' "$name"
printf '{"depends": ["r-base 3.4.1*"]}, {"depends": ["r-base 3.5.1*"]}, '
printf '{"depends": ["r-base 3.6.0*"]}, {"depends": ["mro-base"]}'
printf ']}'
"#;
    let conda = dir.join("conda");
    std::fs::write(&conda, script).unwrap();
    std::fs::set_permissions(&conda, std::fs::Permissions::from_mode(0o755)).unwrap();
    conda
}

#[test]
fn test_generate_tox_ini_binary() {
    let dir = TempDir::new().unwrap();
    let conda = fake_conda(dir.path());
    let tox_ini = dir.path().join("tox.ini");
    std::fs::write(&tox_ini, TOX_INI).unwrap();

    let out = assert_cmd::Command::cargo_bin("generate-tox-ini")
        .unwrap()
        .env("CONDA_EXE", &conda)
        .args(["-p", "linux-64"])
        .arg(&tox_ini)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(out.stdout.is_empty());

    let generated = std::fs::read_to_string(dir.path().join("tox-conda.ini")).unwrap();
    assert!(generated.starts_with(
        "[tox]\nenvlist =\n    r341-conda-cicd\n    r351-conda-cicd\n    r360-conda-cicd\n    mro343-conda-cicd\nskipsdist = True\n"
    ));
    assert!(generated.contains("[testenv:conda]\n"));
    assert!(generated.contains("[testenv:mro343-conda-cicd]\n"));
    assert!(generated.contains("    mro-base==3.4.3\n"));
    assert_eq!(std::fs::read_to_string(&tox_ini).unwrap(), TOX_INI);
}

#[test]
fn test_generate_tox_ini_missing_file() {
    let dir = TempDir::new().unwrap();
    let conda = fake_conda(dir.path());

    let out = assert_cmd::Command::cargo_bin("generate-tox-ini")
        .unwrap()
        .env("CONDA_EXE", &conda)
        .args(["-p", "linux-64"])
        .arg(dir.path().join("tox.ini"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(!dir.path().join("tox-conda.ini").exists());
}
