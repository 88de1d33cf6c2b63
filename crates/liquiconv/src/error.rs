use std::path::PathBuf;

use liquiconv_command_runner::RunError;
use thiserror::Error;

/// Every way a run can end early. All of them are fatal: the pipeline stops
/// at the first one and `main` turns it into exit code 1.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Directory {} does not appear to be a git repository", .0.display())]
    NotARepository(PathBuf),

    #[error("No pom.xml found in parent directories of '{}'", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Unable to determine liquibase version from '{}'", .pom.display())]
    VersionNotFound { pom: PathBuf },

    #[error("Unable to fetch jar from url '{url}'")]
    Download { url: String },

    #[error("Error trying to convert '{}' to sql", .0.display())]
    Conversion(PathBuf),

    #[error("Unable to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: RunError,
    },

    #[error("Failed to read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RunError> for ConvertError {
    fn from(source: RunError) -> Self {
        ConvertError::Spawn {
            program: source.program().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_failure_names_the_program() {
        let err = ConvertError::from(RunError::Io {
            program: "java".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });

        match &err {
            ConvertError::Spawn { program, .. } => assert_eq!(program, "java"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "Unable to start 'java'");
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert_eq!(cause, "failed to run 'java'");
    }
}
