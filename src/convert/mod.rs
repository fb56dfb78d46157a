//! Tarball to conda package conversion
//!
//! Pipeline, strictly sequential:
//!
//! 1. acquire the tarball (download URLs to a temporary file)
//! 2. extract it into a scratch directory
//! 3. discover the supported R versions from the package index
//! 4. for every (flavor, version) pair, rewrite the recipe and run `conda build`
//!
//! The scratch directory and any download are removed when they go out of
//! scope, on success and on error. A failed build aborts the remaining
//! matrix; packages already built are left in the output folder.

pub mod acquire;
pub mod conda;
pub mod error;
pub mod extract;
pub mod matrix;
pub mod recipe;

pub use conda::{BuildRequest, CondaCli, CondaTool};
pub use error::ConvertError;
pub use matrix::{Flavor, RVersion, VersionMatrix};

use crate::core::{Description, PlatformTag, output};
use recipe::{RecipeDocument, SourceLocation, Substitutions};
use std::path::PathBuf;

/// Inputs of one conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// URL or path of the source tarball
    pub input: String,
    /// Recipe directory, or the recipe file inside it
    pub recipe_dir: PathBuf,
    /// Where built packages go; empty means the current directory
    pub output_folder: PathBuf,
    /// Extra channels to search during builds
    pub channels: Vec<String>,
    pub override_channels: bool,
    pub platform: PlatformTag,
}

/// Convert a tarball into one conda package per supported R version.
///
/// Returns the (flavor, version) pairs that were built.
pub fn convert(
    tool: &dyn CondaTool,
    opts: &ConvertOptions,
) -> Result<Vec<(Flavor, RVersion)>, ConvertError> {
    let output_folder = if opts.output_folder.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        std::path::absolute(&opts.output_folder)?
    };
    std::fs::create_dir_all(&output_folder)?;

    let recipe_dir = recipe::resolve_recipe_dir(&opts.recipe_dir)?;
    let recipe = RecipeDocument::load(&recipe_dir)?;
    output::detail(&format!("recipe {}", recipe.path().display()));

    let archive = acquire::acquire(&opts.input)?;

    let scratch = tempfile::Builder::new().prefix("tar2conda-").tempdir()?;
    output::sub_action("extract");
    extract::extract(archive.path(), scratch.path())?;
    drop(archive);

    let package_root = extract::find_package_root(scratch.path())?;
    let source = SourceLocation::detect(&package_root.to_string_lossy());

    output::sub_action(&format!("discover R versions for {}", opts.platform));
    let supported = matrix::discover(tool, opts.platform)?;
    if supported.is_empty() {
        output::warning(&format!("no supported R versions found for {}", opts.platform));
    }
    for flavor in Flavor::ALL {
        let versions: Vec<_> = supported.versions(flavor).map(RVersion::as_str).collect();
        if !versions.is_empty() {
            output::detail(&format!("{}: {}", flavor, versions.join(", ")));
        }
    }

    let total = supported.len();
    let mut built = Vec::with_capacity(total);
    for (i, (flavor, r_version)) in supported.pairs().enumerate() {
        output::action_numbered(i + 1, total, &format!("Building for {} {}", flavor, r_version));

        // Read from the extracted tree, not the input, every iteration.
        let desc = Description::read(&package_root)?;
        let subs = Substitutions::new()
            .source(source.clone())
            .set("version", desc.version)
            .set("r_base", flavor.base_package())
            .set("r_version", r_version.as_str());
        recipe.apply(&subs)?;

        tool.build(&BuildRequest {
            recipe_dir: recipe_dir.clone(),
            r_version: r_version.to_string(),
            output_folder: Some(output_folder.clone()),
            channels: opts.channels.clone(),
            override_channels: opts.override_channels,
        })?;
        built.push((flavor, r_version.clone()));
    }

    Ok(built)
}
