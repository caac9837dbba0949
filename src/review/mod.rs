//! Hosted code-review integration
//!
//! This module provides:
//! - The `ReviewGateway` contract the sync engine talks to
//! - A `gh` CLI backed implementation
//! - `PullRequestHandle`, the idempotent ensure protocol for one branch
//! - PR body composition (navigation links + preserved description)

pub mod gh;
pub mod pull_request;

pub use gh::GhCli;
pub use pull_request::{
    compose_body_prefix, splice_body, EnsureOutcome, EnsureRequest, PrUrlCache, PullRequestHandle,
    DESCRIPTION_MARKER, LINKS_HEADER,
};

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed state of a branch's pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    Open,
    Draft,
    Merged,
    Closed,
}

impl PrState {
    /// Closed pull requests (and missing ones) count as "no PR yet"; merged ones are still edited
    pub fn has_pr(self) -> bool {
        !matches!(self, PrState::Closed)
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PrState::Open => "OPEN",
            PrState::Draft => "DRAFT",
            PrState::Merged => "MERGED",
            PrState::Closed => "CLOSED",
        };
        f.write_str(label)
    }
}

/// Parameters for opening a new pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequest {
    pub branch: String,
    pub title: String,
    pub base: String,
    pub body: String,
    pub draft: bool,
}

/// Narrow contract over the hosted review service, addressed by head branch.
///
/// Implementations must be safe to call concurrently for different branches.
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    /// URL of the branch's pull request, `None` when there is none
    async fn view_url(&self, branch: &str) -> Result<Option<String>>;

    /// State of the branch's pull request; a missing PR is reported as `Closed`
    async fn view_state(&self, branch: &str) -> Result<PrState>;

    /// Current body of the branch's pull request
    async fn view_body(&self, branch: &str) -> Result<String>;

    /// Open a pull request, returning its URL
    async fn create(&self, request: &CreatePullRequest) -> Result<String>;

    /// Replace the body and, when given, the base branch
    async fn edit(&self, branch: &str, base: Option<&str>, body: &str) -> Result<()>;

    /// Take the pull request out of draft
    async fn mark_ready(&self, branch: &str) -> Result<()>;
}
