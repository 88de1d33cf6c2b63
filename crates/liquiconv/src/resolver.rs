use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use liquiconv_command_runner::CommandRunner;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConvertError, Result};

/// Build descriptor that declares which Liquibase version a project uses.
pub const MANIFEST_FILE: &str = "pom.xml";

static LIQUIBASE_COORDINATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"org\.liquibase:liquibase-core:jar:[.0-9]*").expect("coordinate pattern is valid")
});

/// Produces the dependency listing of the project rooted at a directory.
pub trait DependencyLister {
    fn list_dependencies(&self, project_dir: &Path) -> Result<String>;
}

/// `mvn dependency:list`. The exit status is ignored: a failing build prints
/// no coordinates, which surfaces as [`ConvertError::VersionNotFound`].
pub struct Maven;

impl DependencyLister for Maven {
    fn list_dependencies(&self, project_dir: &Path) -> Result<String> {
        let out = CommandRunner::new("mvn")
            .arg("dependency:list")
            .current_dir(project_dir)
            .capture()?;
        if !out.success() {
            log::debug!("mvn dependency:list exited with {}", out.status);
        }
        Ok(out.output)
    }
}

/// Walk upward from `start` looking for a `pom.xml`, never leaving `root`.
/// `root` itself is checked last.
pub fn find_manifest(start: &Path, root: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take_while(|dir| dir.starts_with(root))
        .map(|dir| dir.join(MANIFEST_FILE))
        .find(|candidate| candidate.is_file())
}

/// Pull the liquibase-core version out of a dependency listing.
///
/// The first `org.liquibase:liquibase-core:jar:<version>` coordinate wins and
/// the version is whatever follows its last colon. Returns `None` when no
/// coordinate is present or the version part is empty.
pub fn extract_version(listing: &str) -> Option<String> {
    let coordinate = LIQUIBASE_COORDINATE.find(listing)?.as_str();
    let (_, version) = coordinate.rsplit_once(':')?;
    (!version.is_empty()).then(|| version.to_string())
}

/// Result of resolving one migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub manifest: PathBuf,
    pub version: String,
    pub cached: bool,
}

/// Maps each migration to the Liquibase version of its enclosing Maven
/// project. Versions are memoised per `pom.xml` for the lifetime of the
/// resolver, which is a single run.
pub struct VersionResolver<'a> {
    root: PathBuf,
    lister: &'a dyn DependencyLister,
    versions: HashMap<PathBuf, String>,
}

impl<'a> VersionResolver<'a> {
    pub fn new(root: impl Into<PathBuf>, lister: &'a dyn DependencyLister) -> Self {
        Self {
            root: root.into(),
            lister,
            versions: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, migration: &Path) -> Result<Resolution> {
        let start = migration.parent().unwrap_or(self.root.as_path());
        let manifest = find_manifest(start, &self.root)
            .ok_or_else(|| ConvertError::ManifestNotFound(migration.to_path_buf()))?;

        if let Some(version) = self.versions.get(&manifest) {
            log::debug!("Version cache hit for {}", manifest.display());
            return Ok(Resolution {
                manifest,
                version: version.clone(),
                cached: true,
            });
        }

        let project_dir = manifest.parent().unwrap_or(self.root.as_path());
        let spinner = ProgressBar::new_spinner()
            .with_message(format!("Listing dependencies of {}", manifest.display()));
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        let listing = self.lister.list_dependencies(project_dir);
        spinner.finish_and_clear();

        let version = extract_version(&listing?).ok_or_else(|| ConvertError::VersionNotFound {
            pom: manifest.clone(),
        })?;
        self.versions.insert(manifest.clone(), version.clone());

        Ok(Resolution {
            manifest,
            version,
            cached: false,
        })
    }

    /// Number of distinct manifests queried so far.
    pub fn manifests_resolved(&self) -> usize {
        self.versions.len()
    }
}
