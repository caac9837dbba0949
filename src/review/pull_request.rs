use super::{CreatePullRequest, PrState, ReviewGateway};
use crate::config::LinkSettings;
use crate::errors::{PrStackError, Result};
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Header of the machine-owned navigation section
pub const LINKS_HEADER: &str = "## Links";

/// Everything from this marker onward belongs to the author and is never rewritten
pub const DESCRIPTION_MARKER: &str = "## Description";

/// Build the regenerated part of a PR body.
///
/// One line per stack item (disabled ones included), the item at `current`
/// gets the distinguishing marker. Ends with [`DESCRIPTION_MARKER`], the join
/// point with whatever description the PR already carries.
pub fn compose_body_prefix(links: &[Option<String>], current: usize, markers: &LinkSettings) -> String {
    let mut body = format!("{LINKS_HEADER}\n");
    for (index, link) in links.iter().enumerate() {
        let marker = if index == current {
            &markers.current_marker
        } else {
            &markers.other_marker
        };
        let link = link.as_deref().unwrap_or(&markers.placeholder);
        // Writing into a String cannot fail
        let _ = writeln!(body, "- {marker} {link}");
    }
    body.push('\n');
    body.push_str(DESCRIPTION_MARKER);
    body
}

/// Replace the navigation prefix of `remote_body`, keeping its description verbatim.
///
/// The suffix starts at the first [`DESCRIPTION_MARKER`]; a body without the
/// marker was not written by us and is rejected rather than overwritten.
pub fn splice_body(prefix: &str, remote_body: &str) -> Result<String> {
    let start = remote_body.find(DESCRIPTION_MARKER).ok_or_else(|| {
        PrStackError::malformed(format!(
            "pull request body has no `{DESCRIPTION_MARKER}` section; add one to let prstack manage it"
        ))
    })?;

    let head = prefix.strip_suffix(DESCRIPTION_MARKER).unwrap_or(prefix);
    Ok(format!("{head}{}", &remote_body[start..]))
}

/// URL lookups memoized for one process run.
///
/// Only hits are remembered: a branch without a PR may get one during the run.
#[derive(Debug, Default)]
pub struct PrUrlCache {
    urls: Mutex<HashMap<String, String>>,
}

impl PrUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, review: &dyn ReviewGateway, branch: &str) -> Result<Option<String>> {
        if let Some(url) = self.get(branch) {
            return Ok(Some(url));
        }

        let url = review.view_url(branch).await?;
        if let Some(url) = &url {
            self.remember(branch, url);
        }
        Ok(url)
    }

    pub fn remember(&self, branch: &str, url: &str) {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(branch.to_string(), url.to_string());
    }

    fn get(&self, branch: &str) -> Option<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(branch)
            .cloned()
    }
}

/// What `ensure` did for one branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A new draft pull request was opened
    Created { url: String },
    /// The existing pull request's body (and base, if enabled) was refreshed
    Updated,
    /// Disabled item without a pull request; nothing to do
    Skipped,
}

impl fmt::Display for EnsureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnsureOutcome::Created { url } => write!(f, "created {url}"),
            EnsureOutcome::Updated => f.write_str("updated"),
            EnsureOutcome::Skipped => f.write_str("skipped (disabled, no pull request)"),
        }
    }
}

/// Desired state of one branch's pull request
#[derive(Debug, Clone)]
pub struct EnsureRequest<'a> {
    pub title: &'a str,
    pub base: &'a str,
    pub body_prefix: &'a str,
    pub enabled: bool,
}

/// The pull request projected from exactly one stack branch
pub struct PullRequestHandle<'a> {
    branch: &'a str,
    review: &'a dyn ReviewGateway,
}

impl<'a> PullRequestHandle<'a> {
    pub fn new(branch: &'a str, review: &'a dyn ReviewGateway) -> Self {
        Self { branch, review }
    }

    pub async fn state(&self) -> Result<PrState> {
        self.review.view_state(self.branch).await
    }

    /// Idempotent create-or-edit.
    ///
    /// - no PR, enabled: run `before_create`, then open a draft
    /// - no PR, disabled: nothing
    /// - has PR: refresh the navigation prefix; move the base only when enabled
    pub async fn ensure<F>(&self, request: EnsureRequest<'_>, before_create: F) -> Result<EnsureOutcome>
    where
        F: FnOnce(&str) -> Result<()>,
    {
        let state = self.state().await?;
        debug!("Pull request for '{}' is {}", self.branch, state);

        if !state.has_pr() {
            if !request.enabled {
                return Ok(EnsureOutcome::Skipped);
            }

            before_create(self.branch)?;
            let url = self
                .review
                .create(&CreatePullRequest {
                    branch: self.branch.to_string(),
                    title: request.title.to_string(),
                    base: request.base.to_string(),
                    body: request.body_prefix.to_string(),
                    draft: true,
                })
                .await?;
            return Ok(EnsureOutcome::Created { url });
        }

        let current_body = self.review.view_body(self.branch).await?;
        let body = splice_body(request.body_prefix, &current_body)?;
        let base = request.enabled.then_some(request.base);
        self.review.edit(self.branch, base, &body).await?;
        Ok(EnsureOutcome::Updated)
    }

    pub async fn mark_ready(&self) -> Result<()> {
        self.review.mark_ready(self.branch).await
    }
}
