//! Unpack the source tarball into scratch storage
//!
//! Native extraction with tar plus the matching decompressor; no
//! external `tar` binary is required.

use super::error::ConvertError;
use crate::core::output;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;

/// Compression wrapped around the tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
    Bzip2,
    Zstd,
}

impl Compression {
    /// Pick the decompressor from the file name.
    ///
    /// Unrecognized names are assumed to be gzip, which is how R
    /// source distributions are published.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".tar") {
            Self::None
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Self::Xz
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Self::Bzip2
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Self::Zstd
        } else {
            Self::Gzip
        }
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // No filesystem access: link targets are validated without following them.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_link_target_within_dest(
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> Result<(), ConvertError> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(ConvertError::UnsafePath(format!(
            "absolute link target: {}",
            link_name.display()
        )));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    if candidate.strip_prefix(normalize_lexical(dest)).is_err() {
        return Err(ConvertError::UnsafePath(format!(
            "link target escapes destination: {} -> {}",
            link_parent.display(),
            link_name.display()
        )));
    }

    Ok(())
}

/// Unpack a tar stream into `dest`.
///
/// R source distributions only hold directories, regular files and the
/// odd relative symlink. Anything else (hard links, devices, fifos) is
/// refused rather than interpreted.
fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<(), ConvertError> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
            return Err(ConvertError::UnsafePath(path.display().to_string()));
        }

        // Some archives contain a "." entry
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::Regular | EntryType::Continuous | EntryType::Directory => {}
            EntryType::Symlink => {
                let Some(target) = entry.link_name()? else {
                    return Err(ConvertError::UnsafePath(format!(
                        "symlink without target: {}",
                        path.display()
                    )));
                };
                let full_path = dest.join(&path);
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_link_target_within_dest(dest, link_parent, &target)?;
            }
            t if t.is_pax_global_extensions() => continue,
            other => {
                return Err(ConvertError::UnsafePath(format!(
                    "unsupported {:?} entry: {}",
                    other,
                    path.display()
                )));
            }
        }

        // unpack_in refuses to write through symlinks pointing outside dest
        if !entry.unpack_in(dest)? {
            return Err(ConvertError::UnsafePath(path.display().to_string()));
        }
    }

    Ok(())
}

/// Extract a tarball into `dest`, choosing the decompressor by file name.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<(), ConvertError> {
    let file = File::open(archive_path).map_err(|source| ConvertError::OpenArchive {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    std::fs::create_dir_all(dest)?;

    let filename = archive_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let pb = output::spinner(&format!("extracting {}", filename));

    let result = match Compression::detect(archive_path) {
        Compression::None => unpack_tar(reader, dest),
        Compression::Gzip => unpack_tar(flate2::read::GzDecoder::new(reader), dest),
        Compression::Xz => unpack_tar(xz2::read::XzDecoder::new(reader), dest),
        Compression::Bzip2 => unpack_tar(bzip2::read::BzDecoder::new(reader), dest),
        Compression::Zstd => match zstd::stream::read::Decoder::new(reader) {
            Ok(decoder) => unpack_tar(decoder, dest),
            Err(e) => Err(e.into()),
        },
    };

    pb.finish_and_clear();
    result?;
    output::detail(&format!("extracted {} to {}", filename, dest.display()));
    Ok(())
}

/// Locate the unpacked package directory (`R-swat*`) inside `dest`.
pub fn find_package_root(dest: &Path) -> Result<PathBuf, ConvertError> {
    let escaped = glob::Pattern::escape(&dest.to_string_lossy());
    let pattern = format!("{}/R-swat*", escaped);

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|_| ConvertError::NoPackageRoot(dest.to_path_buf()))?
        .filter_map(|r| r.ok())
        .collect();
    matches.sort();

    matches
        .into_iter()
        .next()
        .ok_or_else(|| ConvertError::NoPackageRoot(dest.to_path_buf()))
}
