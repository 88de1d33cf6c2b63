use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::ProgressBar;
use liquiconv_command_runner::CommandRunner;

use crate::error::{ConvertError, Result};

/// Release that hosts one liquify jar per supported Liquibase version.
pub const RELEASE_BASE_URL: &str = "https://github.com/jhaber/liquify/releases/download/0.6";

/// What became of a download attempt that managed to run at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched,
    Failed { output: String },
}

/// Retrieves a URL into a local file.
pub trait ArtifactFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome>;
}

/// `curl <url> -o <dest> --fail --location`
pub struct Curl;

impl ArtifactFetcher for Curl {
    fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome> {
        let out = CommandRunner::new("curl")
            .arg(url)
            .arg("-o")
            .arg(dest)
            .args(["--fail", "--location"])
            .capture()?;
        if out.success() {
            Ok(FetchOutcome::Fetched)
        } else {
            Ok(FetchOutcome::Failed { output: out.output })
        }
    }
}

/// The liquify jar matching one Liquibase version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
}

impl Artifact {
    pub fn for_version(version: &str, dir: &Path, base_url: &str) -> Self {
        let file_name = format!("liquify-{version}.jar");
        Self {
            path: dir.join(&file_name),
            url: format!("{}/{file_name}", base_url.trim_end_matches('/')),
            file_name,
        }
    }
}

/// Downloads jars on demand into a directory that outlives the run. A jar
/// already present under the expected name is reused as-is.
pub struct ArtifactStore<'a> {
    dir: PathBuf,
    base_url: String,
    fetcher: &'a dyn ArtifactFetcher,
    downloads: usize,
}

impl<'a> ArtifactStore<'a> {
    pub fn new(
        dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        fetcher: &'a dyn ArtifactFetcher,
    ) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
            fetcher,
            downloads: 0,
        }
    }

    pub fn ensure(&mut self, version: &str) -> Result<Artifact> {
        let artifact = Artifact::for_version(version, &self.dir, &self.base_url);

        if artifact.path.is_file() {
            println!(
                "Using cached liquify jar '{}'",
                artifact.path.display().to_string().cyan()
            );
            return Ok(artifact);
        }

        println!(
            "Downloading liquify jar to '{}'",
            artifact.path.display().to_string().cyan()
        );
        let spinner = ProgressBar::new_spinner()
            .with_message(format!("Fetching {}", artifact.file_name));
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        let outcome = self.fetcher.fetch(&artifact.url, &artifact.path);
        spinner.finish_and_clear();

        match outcome? {
            FetchOutcome::Fetched => {
                self.downloads += 1;
                log::debug!("Fetched {} into {}", artifact.url, artifact.path.display());
                Ok(artifact)
            }
            FetchOutcome::Failed { output } => {
                println!("{output}");
                Err(ConvertError::Download { url: artifact.url })
            }
        }
    }

    /// Number of jars actually downloaded (cache misses).
    pub fn downloads(&self) -> usize {
        self.downloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;

    /// Writes a dummy jar on success and records each request.
    struct FakeFetcher {
        fail_with: Option<String>,
        requests: RefCell<Vec<(String, PathBuf)>>,
    }

    impl FakeFetcher {
        fn ok() -> Self {
            Self {
                fail_with: None,
                requests: RefCell::new(Vec::new()),
            }
        }

        fn failing(output: &str) -> Self {
            Self {
                fail_with: Some(output.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ArtifactFetcher for FakeFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), dest.to_path_buf()));
            match &self.fail_with {
                Some(output) => Ok(FetchOutcome::Failed {
                    output: output.clone(),
                }),
                None => {
                    fs::write(dest, b"PK").unwrap();
                    Ok(FetchOutcome::Fetched)
                }
            }
        }
    }

    #[test]
    fn artifact_name_and_url_follow_version() {
        let artifact = Artifact::for_version("4.2.0", Path::new("/tmp"), RELEASE_BASE_URL);
        assert_eq!(artifact.file_name, "liquify-4.2.0.jar");
        assert_eq!(artifact.path, Path::new("/tmp/liquify-4.2.0.jar"));
        assert_eq!(
            artifact.url,
            "https://github.com/jhaber/liquify/releases/download/0.6/liquify-4.2.0.jar"
        );

        let trailing = Artifact::for_version("3.5.3", Path::new("/cache"), "http://mirror/");
        assert_eq!(trailing.url, "http://mirror/liquify-3.5.3.jar");
    }

    #[test]
    fn downloads_once_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::ok();
        let mut store = ArtifactStore::new(dir.path(), RELEASE_BASE_URL, &fetcher);

        let first = store.ensure("4.2.0").unwrap();
        let second = store.ensure("4.2.0").unwrap();

        assert_eq!(first, second);
        assert!(first.path.is_file());
        assert_eq!(store.downloads(), 1);
        assert_eq!(fetcher.requests.borrow().len(), 1);
        assert_eq!(fetcher.requests.borrow()[0].1, dir.path().join("liquify-4.2.0.jar"));
    }

    #[test]
    fn existing_jar_is_used_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        // Contents are never checked.
        fs::write(dir.path().join("liquify-3.6.1.jar"), b"stale").unwrap();
        let fetcher = FakeFetcher::failing("should not be called");
        let mut store = ArtifactStore::new(dir.path(), RELEASE_BASE_URL, &fetcher);

        let artifact = store.ensure("3.6.1").unwrap();

        assert_eq!(artifact.path, dir.path().join("liquify-3.6.1.jar"));
        assert_eq!(store.downloads(), 0);
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn failed_download_reports_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::failing("curl: (22) The requested URL returned error: 404");
        let mut store = ArtifactStore::new(dir.path(), RELEASE_BASE_URL, &fetcher);

        let err = store.ensure("9.9.9").unwrap_err();

        match err {
            ConvertError::Download { url } => assert!(url.ends_with("/liquify-9.9.9.jar")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.downloads(), 0);
    }
}
