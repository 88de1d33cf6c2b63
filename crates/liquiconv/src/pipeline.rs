//! One conversion run: guard, discover, then resolve, fetch and convert each
//! migration in turn. The first failure ends the run.

use std::path::PathBuf;

use colored::Colorize;

use crate::artifact::{ArtifactFetcher, ArtifactStore, Curl};
use crate::config::Config;
use crate::convert::{self, Converter, Java};
use crate::error::{ConvertError, Result};
use crate::finder::collect_migrations;
use crate::guard::{self, Git, VersionControl};
use crate::resolver::{DependencyLister, Maven, VersionResolver};

/// External tools the run talks to.
pub struct Toolchain<'a> {
    pub vcs: &'a dyn VersionControl,
    pub dependencies: &'a dyn DependencyLister,
    pub fetcher: &'a dyn ArtifactFetcher,
    pub converter: &'a dyn Converter,
}

impl Toolchain<'static> {
    /// git, mvn, curl and java from `PATH`.
    pub fn system() -> Self {
        Self {
            vcs: &Git,
            dependencies: &Maven,
            fetcher: &Curl,
            converter: &Java,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub converted: Vec<PathBuf>,
    pub manifests_resolved: usize,
    pub downloads: usize,
}

pub fn run(config: &Config, tools: &Toolchain) -> Result<Summary> {
    guard::verify_repository(tools.vcs, &config.root)?;

    let migrations = collect_migrations(&config.root)?;
    log::debug!(
        "Found {} migration(s) under {}",
        migrations.len(),
        config.root.display()
    );
    if migrations.is_empty() {
        println!(
            "No xml liquibase migrations found under '{}'",
            config.root.display()
        );
    }

    let mut resolver = VersionResolver::new(&config.root, tools.dependencies);
    let mut store = ArtifactStore::new(&config.artifact_dir, &config.base_url, tools.fetcher);
    let mut converted = Vec::with_capacity(migrations.len());

    for migration in migrations {
        println!(
            "Found xml liquibase migration '{}'",
            migration.display().to_string().bold()
        );

        let resolution = resolver.resolve(&migration)?;
        if resolution.cached {
            log::debug!("Reusing version of {}", resolution.manifest.display());
        }
        println!(
            "Using pom '{}' to discover liquibase version",
            resolution.manifest.display()
        );
        println!(
            "Determined liquibase version to be {}",
            resolution.version.yellow()
        );

        let artifact = store.ensure(&resolution.version)?;

        if !tools.converter.convert(&artifact.path, &migration)? {
            return Err(ConvertError::Conversion(migration));
        }
        println!(
            "{} '{}' to sql ('{}')\n",
            "Converted".green(),
            migration.display(),
            convert::output_path(&migration).display()
        );
        converted.push(migration);
    }

    Ok(Summary {
        converted,
        manifests_resolved: resolver.manifests_resolved(),
        downloads: store.downloads(),
    })
}
