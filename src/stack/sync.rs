use super::hooks::{PreCreateHook, SkipCiHook};
use super::{check_position, ChainedItem, Stack};
use crate::config::{LinkSettings, Settings};
use crate::errors::{PrStackError, Result, SyncFailure};
use crate::git::VcsGateway;
use crate::review::{
    compose_body_prefix, EnsureOutcome, EnsureRequest, PrUrlCache, PullRequestHandle,
    ReviewGateway,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Result of reconciling one item's pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub position: usize,
    pub branch: String,
    pub outcome: EnsureOutcome,
}

/// Reconciles a stack against the VCS and the review service.
///
/// Branch materialization and the rebase sweep are strictly sequential; the
/// PR phase fans out over items with at most `concurrency` requests in flight.
pub struct SyncEngine<'a> {
    vcs: &'a dyn VcsGateway,
    review: &'a dyn ReviewGateway,
    links: LinkSettings,
    concurrency: usize,
    hook: Option<Box<dyn PreCreateHook + 'a>>,
    urls: PrUrlCache,
}

impl<'a> SyncEngine<'a> {
    pub fn new(vcs: &'a dyn VcsGateway, review: &'a dyn ReviewGateway, settings: &Settings) -> Self {
        let hook: Option<Box<dyn PreCreateHook + 'a>> = if settings.review.skip_ci_on_create {
            Some(Box::new(SkipCiHook::new(settings.review.skip_ci_message.clone())))
        } else {
            None
        };

        Self {
            vcs,
            review,
            links: settings.links.clone(),
            concurrency: settings.review.concurrency.max(1),
            hook,
            urls: PrUrlCache::new(),
        }
    }

    /// Replace the pre-create hook chosen from settings
    pub fn with_hook(mut self, hook: Option<Box<dyn PreCreateHook + 'a>>) -> Self {
        self.hook = hook;
        self
    }

    /// The stack's chain resolved against the repository's default branch
    pub fn chain(&self, stack: &Stack, include_disabled: bool) -> Result<Vec<ChainedItem>> {
        let default_branch = self.vcs.default_branch_name()?;
        Ok(stack.chain(include_disabled, &default_branch))
    }

    /// Make sure every enabled item has a local branch, tracks its upstream, and exists remotely.
    ///
    /// Runs in position order: an item's upstream must already be on the
    /// remote before the next item can track it.
    pub fn ensure_branches(&self, stack: &Stack) -> Result<()> {
        for chained in self.chain(stack, false)? {
            let branch = &chained.item.branch;

            if !self.vcs.branch_exists(branch)? {
                self.vcs.create_branch(branch, &chained.item.initial_sha)?;
            }

            self.vcs.set_upstream(branch, &chained.upstream)?;

            if !self.vcs.remote_branch_exists(branch)? {
                self.vcs.push(branch)?;
            }
        }

        info!("Branches of stack '{}' are in place", stack.name);
        Ok(())
    }

    /// Create or refresh the pull request of every item, disabled ones included.
    ///
    /// Links for all items are gathered once up front, so every body in this
    /// run shows the same navigation. Per-item failures, including a failed
    /// link lookup, do not stop the other items; they are returned together as
    /// [`PrStackError::PullRequestSync`].
    pub async fn ensure_prs(&self, stack: &Stack) -> Result<Vec<ItemOutcome>> {
        let chain = self.chain(stack, true)?;
        let lookups = self.collect_links(&chain).await;
        let links: Vec<Option<String>> = lookups
            .iter()
            .map(|lookup| lookup.as_ref().ok().cloned().flatten())
            .collect();

        let mut results: Vec<(&ChainedItem, Result<EnsureOutcome>)> =
            stream::iter(chain.iter().zip(lookups).enumerate())
                .map(|(index, (chained, lookup))| {
                    let body_prefix = compose_body_prefix(&links, index, &self.links);
                    async move {
                        let outcome = match lookup {
                            Ok(_) => self.ensure_item(chained, &body_prefix).await,
                            Err(error) => Err(error),
                        };
                        (chained, outcome)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        results.sort_by_key(|(chained, _)| chained.position);

        let mut outcomes = Vec::new();
        let mut failures = Vec::new();
        for (chained, result) in results {
            match result {
                Ok(outcome) => outcomes.push(ItemOutcome {
                    position: chained.position,
                    branch: chained.item.branch.clone(),
                    outcome,
                }),
                Err(error) => failures.push(SyncFailure {
                    branch: chained.item.branch.clone(),
                    error,
                }),
            }
        }

        if !failures.is_empty() {
            return Err(PrStackError::PullRequestSync(failures));
        }

        Ok(outcomes)
    }

    /// One URL lookup per item, in chain order; a failed lookup stays with its item
    async fn collect_links(&self, chain: &[ChainedItem]) -> Vec<Result<Option<String>>> {
        stream::iter(chain)
            .map(|chained| async move {
                let lookup = self.urls.lookup(self.review, &chained.item.branch).await;
                if let Err(error) = &lookup {
                    warn!(
                        "Could not look up the pull request of '{}': {}",
                        chained.item.branch, error
                    );
                }
                lookup
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn ensure_item(&self, chained: &ChainedItem, body_prefix: &str) -> Result<EnsureOutcome> {
        let branch = chained.item.branch.as_str();
        let handle = PullRequestHandle::new(branch, self.review);
        let request = EnsureRequest {
            title: &chained.item.title,
            base: &chained.upstream,
            body_prefix,
            enabled: chained.item.enabled,
        };

        let outcome = handle
            .ensure(request, |branch| self.run_pre_create_hook(branch))
            .await?;

        if let EnsureOutcome::Created { url } = &outcome {
            self.urls.remember(branch, url);
        }
        info!("{}: {}", branch, outcome);
        Ok(outcome)
    }

    fn run_pre_create_hook(&self, branch: &str) -> Result<()> {
        match &self.hook {
            Some(hook) => hook.before_create(self.vcs, branch),
            None => Ok(()),
        }
    }

    /// Rebase every enabled item at or after `start` onto its upstream and publish it.
    ///
    /// Stops at the first failure; the error names the position to resume from.
    /// Returns the positions that were rebased.
    pub fn rebase_all(&self, stack: &Stack, start: usize) -> Result<Vec<usize>> {
        check_position(start, stack.len())?;

        let mut rebased = Vec::new();
        for chained in self
            .chain(stack, false)?
            .into_iter()
            .filter(|c| c.position >= start)
        {
            self.rebase_item(&chained)
                .map_err(|source| PrStackError::RebaseStopped {
                    position: chained.position,
                    source: Box::new(source),
                })?;
            rebased.push(chained.position);
        }

        info!("Rebased {} item(s) of stack '{}'", rebased.len(), stack.name);
        Ok(rebased)
    }

    fn rebase_item(&self, chained: &ChainedItem) -> Result<()> {
        let branch = &chained.item.branch;
        debug!("Rebasing '{}' onto '{}'", branch, chained.upstream);

        self.vcs.checkout(branch)?;
        self.vcs.fetch(&chained.upstream)?;
        self.vcs.rebase_onto_fetched()?;
        self.vcs.push_rebased(branch)
    }

    /// URL of the pull request at `position`, if it has one
    pub async fn pr_url(&self, stack: &Stack, position: usize) -> Result<Option<String>> {
        let item = stack.item(position)?;
        self.urls.lookup(self.review, &item.branch).await
    }

    /// `(position, url)` for every item, disabled ones included
    pub async fn all_pr_urls(&self, stack: &Stack) -> Result<Vec<(usize, Option<String>)>> {
        let mut urls = Vec::with_capacity(stack.len());
        for (index, item) in stack.items.iter().enumerate() {
            urls.push((index + 1, self.urls.lookup(self.review, &item.branch).await?));
        }
        Ok(urls)
    }

    /// Switch the working copy to the branch at `position`
    pub fn checkout(&self, stack: &Stack, position: usize) -> Result<()> {
        let item = stack.item(position)?;
        self.vcs.checkout(&item.branch)
    }

    /// Take every enabled item's pull request out of draft, in position order
    pub async fn submit(&self, stack: &Stack) -> Result<Vec<String>> {
        let mut submitted = Vec::new();
        for item in stack.items.iter().filter(|item| item.enabled) {
            PullRequestHandle::new(&item.branch, self.review)
                .mark_ready()
                .await?;
            submitted.push(item.branch.clone());
        }
        Ok(submitted)
    }
}
