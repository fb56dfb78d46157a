//! Conda recipe (`meta.yaml`) rewriting
//!
//! The recipe is a template with two kinds of editable lines:
//!
//! ```yaml
//! {% set version = '1.6.0' %}
//! source:
//!   path: /tmp/R-swat-1.6.0  # [linux]
//! ```
//!
//! Rewriting loads the file once, renders a new document in memory and
//! atomically replaces the original.

use super::error::ConvertError;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Recipe file name inside a recipe directory
pub const RECIPE_FILE: &str = "meta.yaml";

/// Lines containing this marker are dropped; the checksum is not recomputed.
const CHECKSUM_MARKER: &str = "sha256";

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s+)(?:url|path):.*?(\s*#\s*\[.+?\]\s*)?$").expect("valid source regex")
});

/// Where the build tool should fetch the package source from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local directory, written as `path:`
    Path(String),
    /// Anything else, written as `url:`
    Url(String),
}

impl SourceLocation {
    /// `Path` for an existing directory, `Url` otherwise.
    pub fn detect(source: &str) -> Self {
        let normalized = source.replace('\\', "/");
        if Path::new(source).is_dir() {
            Self::Path(normalized)
        } else {
            Self::Url(normalized)
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Self::Path(_) => "path",
            Self::Url(_) => "url",
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Path(v) | Self::Url(v) => v,
        }
    }

    /// Repoint a `url:`/`path:` line, keeping indentation and any selector comment
    fn apply(&self, line: &str) -> Option<String> {
        let caps = SOURCE_RE.captures(line)?;
        Some(format!(
            "{}{}: {}{}",
            &caps[1],
            self.keyword(),
            self.value(),
            caps.get(2).map_or("", |m| m.as_str())
        ))
    }
}

/// Values to write into a recipe
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    source: Option<SourceLocation>,
    variables: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the `source` section at `location`
    pub fn source(mut self, location: SourceLocation) -> Self {
        self.source = Some(location);
        self
    }

    /// Set the value of `{% set NAME = '...' %}`
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }
}

/// Matcher for one `{% set NAME = '...' %}` line
struct SetVariable {
    re: Regex,
    value: String,
}

impl SetVariable {
    fn new(name: &str, value: &str) -> Self {
        let pattern = format!(
            r"^(\{{%\s*set\s+{}\s*=\s*)'[^']+'(\s*%\}}\s*)$",
            regex::escape(name)
        );
        Self {
            re: Regex::new(&pattern).expect("escaped variable pattern is valid"),
            value: value.to_string(),
        }
    }

    fn apply(&self, line: &str) -> Option<String> {
        let caps = self.re.captures(line)?;
        Some(format!("{}'{}'{}", &caps[1], self.value, &caps[2]))
    }
}

/// Resolve `--recipe-dir`, which may name the recipe file itself.
pub fn resolve_recipe_dir(path: &Path) -> Result<PathBuf, ConvertError> {
    let path = std::path::absolute(path)?;
    if path.is_file() {
        Ok(path.parent().map(Path::to_path_buf).unwrap_or(path))
    } else {
        Ok(path)
    }
}

/// A recipe held in memory
#[derive(Debug, Clone)]
pub struct RecipeDocument {
    path: PathBuf,
    original: String,
}

impl RecipeDocument {
    /// Load `meta.yaml` from a recipe directory.
    pub fn load(recipe_dir: &Path) -> Result<Self, ConvertError> {
        Self::load_file(&recipe_dir.join(RECIPE_FILE))
    }

    pub fn load_file(path: &Path) -> Result<Self, ConvertError> {
        let original = std::fs::read_to_string(path).map_err(|source| ConvertError::Recipe {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Produce the rewritten recipe text.
    pub fn render(&self, subs: &Substitutions) -> String {
        render(&self.original, subs)
    }

    /// Render and atomically replace the recipe on disk.
    pub fn apply(&self, subs: &Substitutions) -> Result<(), ConvertError> {
        let rendered = self.render(subs);
        self.replace(&rendered).map_err(|source| ConvertError::Recipe {
            path: self.path.clone(),
            source,
        })
    }

    fn replace(&self, content: &str) -> std::io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let permissions = std::fs::metadata(&self.path)?.permissions();
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        // Temporary files are created 0600; keep the recipe's own mode
        tmp.as_file().set_permissions(permissions)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Rewrite recipe text.
///
/// Checksum lines are removed, the source line is repointed and named
/// variables are replaced. Lines are right-trimmed and the result always
/// ends with a single newline.
pub fn render(template: &str, subs: &Substitutions) -> String {
    let variables: Vec<SetVariable> = subs
        .variables
        .iter()
        .map(|(name, value)| SetVariable::new(name, value))
        .collect();

    let mut out = Vec::new();
    for line in template.lines() {
        if line.contains(CHECKSUM_MARKER) {
            continue;
        }

        let mut line = line.to_string();

        if let Some(source) = &subs.source
            && let Some(replaced) = source.apply(&line)
        {
            line = replaced;
        }

        for var in &variables {
            if let Some(replaced) = var.apply(&line) {
                line = replaced;
            }
        }

        out.push(line.trim_end().to_string());
    }

    let mut rendered = out.join("\n");
    rendered.push('\n');
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
{% set version = '0.0.0' %}
{% set r_base = 'r-base' %}
{% set r_version = '0.0' %}

package:
  name: r-swat
  version: {{ version }}

source:
  url: https://example.com/R-swat-0.0.0.tar.gz  # [linux]
  sha256: 0123456789abcdef
  url: https://example.com/R-swat-0.0.0.zip   # [win]
  sha256: fedcba9876543210

requirements:
  run:
    - {{ r_base }} {{ r_version }}*
";

    fn subs() -> Substitutions {
        Substitutions::new()
            .source(SourceLocation::Url("https://cdn.example.com/R-swat-1.6.0.tar.gz".into()))
            .set("version", "1.6.0")
            .set("r_base", "mro-base")
            .set("r_version", "3.4.3")
    }

    #[test]
    fn test_render_substitutes_variables() {
        let out = render(TEMPLATE, &subs());
        assert!(out.starts_with(
            "{% set version = '1.6.0' %}\n{% set r_base = 'mro-base' %}\n{% set r_version = '3.4.3' %}\n"
        ));
    }

    #[test]
    fn test_render_drops_every_checksum_line() {
        let out = render(TEMPLATE, &subs());
        assert!(!out.contains("sha256"));
        assert_eq!(out.lines().count(), TEMPLATE.lines().count() - 2);
    }

    #[test]
    fn test_render_without_checksum_lines() {
        let template = "{% set version = '1.0' %}\npackage:\n  name: r-swat\n";
        let out = render(template, &Substitutions::new().set("version", "2.0"));
        assert_eq!(out, "{% set version = '2.0' %}\npackage:\n  name: r-swat\n");
    }

    #[test]
    fn test_render_source_keeps_selector_comment() {
        let out = render(TEMPLATE, &subs());
        assert!(out.contains("  url: https://cdn.example.com/R-swat-1.6.0.tar.gz  # [linux]\n"));
        assert!(out.contains("  url: https://cdn.example.com/R-swat-1.6.0.tar.gz   # [win]\n"));
    }

    #[test]
    fn test_render_source_path_for_directory() {
        let template = "source:\n  url: https://example.com/x.tar.gz\n";
        let subs = Substitutions::new().source(SourceLocation::Path("/tmp/R-swat-1.6.0".into()));
        assert_eq!(
            render(template, &subs),
            "source:\n  path: /tmp/R-swat-1.6.0\n"
        );
    }

    #[test]
    fn test_render_source_requires_indentation() {
        let template = "url: https://example.com/home\n";
        let subs = Substitutions::new().source(SourceLocation::Path("/tmp/x".into()));
        assert_eq!(render(template, &subs), template);
    }

    #[test]
    fn test_render_is_idempotent() {
        let once = render(TEMPLATE, &subs());
        let twice = render(&once, &subs());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_render_exact_variable_name() {
        let template = "{% set r_version = '3.5' %}\n{% set version = '1.0' %}\n";
        let out = render(template, &Substitutions::new().set("version", "2.0"));
        assert_eq!(out, "{% set r_version = '3.5' %}\n{% set version = '2.0' %}\n");
    }

    #[test]
    fn test_render_trims_trailing_whitespace() {
        let out = render("package:   \r\n  name: r-swat\t\n", &Substitutions::new());
        assert_eq!(out, "package:\n  name: r-swat\n");
    }

    #[test]
    fn test_source_location_detect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        assert!(matches!(SourceLocation::detect(path), SourceLocation::Path(_)));
        assert!(matches!(
            SourceLocation::detect("https://example.com/R-swat.tar.gz"),
            SourceLocation::Url(_)
        ));
        assert_eq!(
            SourceLocation::detect(r"C:\nowhere\R-swat"),
            SourceLocation::Url("C:/nowhere/R-swat".to_string())
        );
    }

    #[test]
    fn test_apply_replaces_file() {
        let dir = TempDir::new().unwrap();
        let recipe_path = dir.path().join(RECIPE_FILE);
        std::fs::write(&recipe_path, TEMPLATE).unwrap();

        let doc = RecipeDocument::load(dir.path()).unwrap();
        doc.apply(&subs()).unwrap();

        let written = std::fs::read_to_string(&recipe_path).unwrap();
        assert_eq!(written, render(TEMPLATE, &subs()));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary file should be renamed over the recipe");
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let recipe_path = dir.path().join(RECIPE_FILE);
        std::fs::write(&recipe_path, TEMPLATE).unwrap();
        std::fs::set_permissions(&recipe_path, std::fs::Permissions::from_mode(0o644)).unwrap();

        RecipeDocument::load(dir.path()).unwrap().apply(&subs()).unwrap();

        let mode = std::fs::metadata(&recipe_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_load_missing_recipe() {
        let dir = TempDir::new().unwrap();
        let err = RecipeDocument::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConvertError::Recipe { .. }));
    }

    #[test]
    fn test_resolve_recipe_dir_from_file() {
        let dir = TempDir::new().unwrap();
        let recipe_path = dir.path().join(RECIPE_FILE);
        std::fs::write(&recipe_path, TEMPLATE).unwrap();

        assert_eq!(resolve_recipe_dir(&recipe_path).unwrap(), dir.path());
        assert_eq!(resolve_recipe_dir(dir.path()).unwrap(), dir.path());
    }
}
