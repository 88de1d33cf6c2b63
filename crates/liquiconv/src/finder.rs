use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ConvertError, Result};

/// Extension a changelog file must carry to be considered at all.
pub const MIGRATION_EXTENSION: &str = "xml";

/// Root element every Liquibase XML changelog contains.
pub const MIGRATION_MARKER: &str = "databaseChangeLog";

/// Maven copies resources here on build; those are duplicates of the sources.
/// Matched as a plain substring of the root-relative path.
const BUILD_OUTPUT_SEGMENT: &str = "target/classes";

/// Walk `root` and call `processor` for every Liquibase changelog found.
///
/// - Always recursive, hidden directories included
/// - Skips any path containing `target/classes` below the root
/// - Entries that cannot be read are skipped with a warning
/// - A candidate that cannot be opened aborts the walk
fn walk_migrations<F>(root: &Path, mut processor: F) -> Result<usize>
where
    F: FnMut(&Path) -> Result<()>,
{
    let mut found = 0;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !has_migration_extension(path) {
            continue;
        }
        if is_build_output(root, path) {
            log::debug!("Ignoring build output {}", path.display());
            continue;
        }
        if looks_like_migration(path)? {
            processor(path)?;
            found += 1;
        }
    }

    Ok(found)
}

/// Walk `root` and collect every changelog path before anything else runs.
pub fn collect_migrations(root: &Path) -> Result<Vec<PathBuf>> {
    let mut migrations = Vec::new();
    walk_migrations(root, |path| {
        migrations.push(path.to_path_buf());
        Ok(())
    })?;
    Ok(migrations)
}

fn has_migration_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MIGRATION_EXTENSION)
}

fn is_build_output(root: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy()
        .replace('\\', "/")
        .contains(BUILD_OUTPUT_SEGMENT)
}

/// The whole file is read; changelogs are small and the marker can sit
/// anywhere after a long license header.
fn looks_like_migration(path: &Path) -> Result<bool> {
    let bytes = fs::read(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).contains(MIGRATION_MARKER))
}
