use std::path::PathBuf;

use crate::artifact::RELEASE_BASE_URL;
use crate::error::{ConvertError, Result};

/// Settings for one run, fixed before any work starts.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical tree root. Every discovered migration lives below it and the
    /// upward `pom.xml` search stops here.
    pub root: PathBuf,
    /// Where liquify jars are kept between runs.
    pub artifact_dir: PathBuf,
    pub base_url: String,
}

impl Config {
    pub fn new(root: Option<PathBuf>, artifact_dir: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().map_err(|source| ConvertError::Io {
                path: PathBuf::from("."),
                source,
            })?,
        };
        let root = root
            .canonicalize()
            .map_err(|source| ConvertError::Io { path: root, source })?;

        Ok(Self {
            root,
            artifact_dir: artifact_dir.unwrap_or_else(default_artifact_dir),
            base_url: RELEASE_BASE_URL.to_string(),
        })
    }
}

/// Fixed location shared by every run, independent of `$TMPDIR`.
#[cfg(unix)]
fn default_artifact_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

#[cfg(not(unix))]
fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();

        let config = Config::new(Some(dir.path().join("a/b/..")), None).unwrap();

        assert_eq!(config.root, dir.path().join("a").canonicalize().unwrap());
        assert_eq!(config.base_url, RELEASE_BASE_URL);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::new(Some(dir.path().join("nope")), None).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn artifacts_default_to_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.artifact_dir, PathBuf::from("/tmp"));
    }

    #[test]
    fn artifact_dir_can_be_overridden() {
        let dir = tempfile::tempdir().unwrap();
        let jars = dir.path().join("jars");
        let config = Config::new(Some(dir.path().to_path_buf()), Some(jars.clone())).unwrap();
        assert_eq!(config.artifact_dir, jars);
    }
}
