use crate::errors::Result;
use crate::git::VcsGateway;
use tracing::{info, warn};

/// Runs right before the first pull request for a branch is opened.
///
/// Hooks are synchronous; the sync engine calls them without yielding, so
/// working-copy changes made here never interleave with another item's.
pub trait PreCreateHook {
    fn before_create(&self, vcs: &dyn VcsGateway, branch: &str) -> Result<()>;
}

/// Pushes an empty `[skip ci]` commit so opening the PR does not trigger a CI run
#[derive(Debug, Clone)]
pub struct SkipCiHook {
    message: String,
}

impl SkipCiHook {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn push_marker_commit(&self, vcs: &dyn VcsGateway, branch: &str) -> Result<()> {
        vcs.checkout(branch)?;
        vcs.rebase_onto_fetched()?;
        vcs.commit_empty(&self.message)?;
        vcs.force_push(branch)
    }
}

impl PreCreateHook for SkipCiHook {
    fn before_create(&self, vcs: &dyn VcsGateway, branch: &str) -> Result<()> {
        let original = vcs.current_branch()?;

        let result = self.push_marker_commit(vcs, branch);
        // Always try to go back, but report the hook's own failure first
        let restored = vcs.checkout(&original);

        result?;
        if let Err(e) = &restored {
            warn!("Could not switch back to '{}': {}", original, e);
        }
        restored?;

        info!("Pushed skip-ci commit on '{}'", branch);
        Ok(())
    }
}
