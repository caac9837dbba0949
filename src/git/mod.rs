pub mod repository;

pub use repository::GitRepository;

use crate::errors::Result;

/// A commit in a log range, oldest first when produced by [`VcsGateway::commit_log_range`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub sha: String,
    pub subject: String,
}

/// Narrow contract over the version-control operations the stack engine sequences.
///
/// Every method is a blocking call; the sync engine only drives it from
/// sequential phases (plus the pre-create hook, which runs to completion
/// without yielding).
pub trait VcsGateway {
    /// Name of the remote that stack branches live on (usually `origin`)
    fn remote_name(&self) -> &str;

    /// Does the local branch exist?
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Does `<remote>/<name>` exist as a remote-tracking branch?
    fn remote_branch_exists(&self, name: &str) -> Result<bool>;

    /// Create a local branch pointing at `from_sha`
    fn create_branch(&self, name: &str, from_sha: &str) -> Result<()>;

    /// Point `branch`'s upstream at `<remote>/<upstream>`
    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<()>;

    /// Publish a branch to the remote
    fn push(&self, branch: &str) -> Result<()>;

    /// Publish a branch whose history was rewritten
    fn force_push(&self, branch: &str) -> Result<()>;

    /// Publish a freshly rebased branch through the configured send helper
    fn push_rebased(&self, branch: &str) -> Result<()>;

    fn checkout(&self, branch: &str) -> Result<()>;

    fn current_branch(&self) -> Result<String>;

    /// Fetch a single branch from the remote
    fn fetch(&self, branch: &str) -> Result<()>;

    /// Rebase the checked-out branch onto its (freshly fetched) upstream
    fn rebase_onto_fetched(&self) -> Result<()>;

    /// Record an empty commit on the checked-out branch
    fn commit_empty(&self, message: &str) -> Result<()>;

    /// Commits reachable from HEAD but not from `base_ref`, oldest first
    fn commit_log_range(&self, base_ref: &str) -> Result<Vec<CommitSummary>>;

    /// The remote's default branch, e.g. `main`
    fn default_branch_name(&self) -> Result<String>;
}
