use std::path::Path;

use liquiconv_command_runner::CommandRunner;

use crate::error::{ConvertError, Result};

/// Answers whether a directory lies inside a version-controlled working tree.
pub trait VersionControl {
    fn is_working_tree(&self, root: &Path) -> Result<bool>;
}

/// `git status` run in the root with all streams discarded; only the exit
/// code is looked at.
pub struct Git;

impl VersionControl for Git {
    fn is_working_tree(&self, root: &Path) -> Result<bool> {
        let status = CommandRunner::new("git")
            .arg("status")
            .current_dir(root)
            .status_silent()?;
        Ok(status.success())
    }
}

/// Refuse to touch a tree that is not under version control, since the
/// converter writes its output next to every migration it finds.
pub fn verify_repository(vcs: &dyn VersionControl, root: &Path) -> Result<()> {
    if vcs.is_working_tree(root)? {
        log::debug!("{} is inside a git working tree", root.display());
        Ok(())
    } else {
        Err(ConvertError::NotARepository(root.to_path_buf()))
    }
}
