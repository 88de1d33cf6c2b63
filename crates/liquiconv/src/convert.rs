use std::path::{Path, PathBuf};

use liquiconv_command_runner::CommandRunner;

use crate::error::Result;

/// Output type passed to liquify.
pub const TARGET_FORMAT: &str = "sql";

/// SQL dialect passed to liquify.
pub const DIALECT: &str = "mysql";

/// Translates one changelog with a given converter jar. Returns whether the
/// conversion succeeded.
pub trait Converter {
    fn convert(&self, artifact: &Path, migration: &Path) -> Result<bool>;
}

/// `java -jar <artifact> -t sql -db mysql <migration>`, run from the
/// migration's directory with stdio inherited so liquify's own messages
/// reach the user.
pub struct Java;

impl Converter for Java {
    fn convert(&self, artifact: &Path, migration: &Path) -> Result<bool> {
        let status = CommandRunner::new("java")
            .arg("-jar")
            .arg(artifact)
            .args(["-t", TARGET_FORMAT, "-db", DIALECT])
            .arg(migration)
            .current_dir(working_dir(migration))
            .status()?;
        Ok(status.success())
    }
}

/// Directory a conversion runs in.
pub fn working_dir(migration: &Path) -> &Path {
    migration
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Where liquify writes its result: next to the changelog, extension
/// replaced by the target format.
pub fn output_path(migration: &Path) -> PathBuf {
    migration.with_extension(TARGET_FORMAT)
}
