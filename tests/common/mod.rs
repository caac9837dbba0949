//! Recording mocks of the git and review gateways
//!
//! Not every helper is used by every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use prstack::errors::{PrStackError, Result};
use prstack::git::{CommitSummary, VcsGateway};
use prstack::review::{CreatePullRequest, PrState, ReviewGateway};
use prstack::stack::Stack;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const DEFAULT_BRANCH: &str = "main";

/// Three-item stack `foo` over commits `sha1..sha3`
pub fn foo_stack() -> Stack {
    Stack::from_commits("foo", &commits(3)).unwrap()
}

pub fn commits(n: usize) -> Vec<CommitSummary> {
    (1..=n)
        .map(|i| CommitSummary {
            sha: format!("sha{i}"),
            subject: format!("Change {i}"),
        })
        .collect()
}

/// In-memory VCS that records every state-changing call as a string
///
/// Call strings look like `create_branch prstack-foo-1 sha1` or, for calls
/// acting on the checked-out branch, `rebase prstack-foo-2`.
pub struct MockVcs {
    local: Mutex<BTreeSet<String>>,
    remote: Mutex<BTreeSet<String>>,
    current: Mutex<String>,
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self {
            local: Mutex::new(BTreeSet::from([DEFAULT_BRANCH.to_string()])),
            remote: Mutex::new(BTreeSet::from([DEFAULT_BRANCH.to_string()])),
            current: Mutex::new(DEFAULT_BRANCH.to_string()),
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
        }
    }

    /// Make the call with exactly this string fail
    pub fn fail_on(&self, call: &str) {
        *self.fail_on.lock().unwrap() = Some(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn current(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail_on.lock().unwrap().as_deref() == Some(call.as_str()) {
            return Err(PrStackError::external(call, "injected failure"));
        }
        Ok(())
    }
}

impl VcsGateway for MockVcs {
    fn remote_name(&self) -> &str {
        "origin"
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.local.lock().unwrap().contains(name))
    }

    fn remote_branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.remote.lock().unwrap().contains(name))
    }

    fn create_branch(&self, name: &str, from_sha: &str) -> Result<()> {
        self.record(format!("create_branch {name} {from_sha}"))?;
        self.local.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<()> {
        self.record(format!("set_upstream {branch} origin/{upstream}"))
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.record(format!("push {branch}"))?;
        self.remote.lock().unwrap().insert(branch.to_string());
        Ok(())
    }

    fn force_push(&self, branch: &str) -> Result<()> {
        self.record(format!("force_push {branch}"))
    }

    fn push_rebased(&self, branch: &str) -> Result<()> {
        self.record(format!("push_rebased {branch}"))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {branch}"))?;
        *self.current.lock().unwrap() = branch.to_string();
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.current())
    }

    fn fetch(&self, branch: &str) -> Result<()> {
        self.record(format!("fetch {branch}"))
    }

    fn rebase_onto_fetched(&self) -> Result<()> {
        let current = self.current();
        self.record(format!("rebase {current}"))
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        let current = self.current();
        self.record(format!("commit_empty {current} {message}"))
    }

    fn commit_log_range(&self, _base_ref: &str) -> Result<Vec<CommitSummary>> {
        Ok(commits(3))
    }

    fn default_branch_name(&self) -> Result<String> {
        Ok(DEFAULT_BRANCH.to_string())
    }
}

/// A pull request held by [`MockReview`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPr {
    pub url: String,
    pub state: PrState,
    pub title: String,
    pub base: String,
    pub body: String,
}

/// Call record for [`ReviewGateway::edit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCall {
    pub branch: String,
    pub base: Option<String>,
    pub body: String,
}

/// In-memory review service keyed by head branch
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking for verification
/// - Seeded pull requests per branch
/// - Error injection per branch and call
pub struct MockReview {
    next_number: AtomicU64,
    prs: Mutex<HashMap<String, MockPr>>,
    create_calls: Mutex<Vec<CreatePullRequest>>,
    edit_calls: Mutex<Vec<EditCall>>,
    ready_calls: Mutex<Vec<String>>,
    view_url_calls: AtomicUsize,
    fail_view_url_for: Mutex<HashSet<String>>,
    fail_create_for: Mutex<HashSet<String>>,
    fail_edit_for: Mutex<HashSet<String>>,
}

impl MockReview {
    pub fn new() -> Self {
        Self {
            next_number: AtomicU64::new(1),
            prs: Mutex::new(HashMap::new()),
            create_calls: Mutex::new(Vec::new()),
            edit_calls: Mutex::new(Vec::new()),
            ready_calls: Mutex::new(Vec::new()),
            view_url_calls: AtomicUsize::new(0),
            fail_view_url_for: Mutex::new(HashSet::new()),
            fail_create_for: Mutex::new(HashSet::new()),
            fail_edit_for: Mutex::new(HashSet::new()),
        }
    }

    /// Put an existing pull request in place for `branch`
    pub fn seed_pr(&self, branch: &str, state: PrState, base: &str, body: &str) -> String {
        let url = self.next_url();
        self.prs.lock().unwrap().insert(
            branch.to_string(),
            MockPr {
                url: url.clone(),
                state,
                title: format!("seeded {branch}"),
                base: base.to_string(),
                body: body.to_string(),
            },
        );
        url
    }

    pub fn fail_view_url(&self, branch: &str) {
        self.fail_view_url_for.lock().unwrap().insert(branch.to_string());
    }

    pub fn fail_create(&self, branch: &str) {
        self.fail_create_for.lock().unwrap().insert(branch.to_string());
    }

    pub fn fail_edit(&self, branch: &str) {
        self.fail_edit_for.lock().unwrap().insert(branch.to_string());
    }

    pub fn pr(&self, branch: &str) -> Option<MockPr> {
        self.prs.lock().unwrap().get(branch).cloned()
    }

    pub fn create_calls(&self) -> Vec<CreatePullRequest> {
        let mut calls = self.create_calls.lock().unwrap().clone();
        calls.sort_by(|a, b| a.branch.cmp(&b.branch));
        calls
    }

    pub fn edit_calls(&self) -> Vec<EditCall> {
        let mut calls = self.edit_calls.lock().unwrap().clone();
        calls.sort_by(|a, b| a.branch.cmp(&b.branch));
        calls
    }

    pub fn ready_calls(&self) -> Vec<String> {
        self.ready_calls.lock().unwrap().clone()
    }

    pub fn view_url_calls(&self) -> usize {
        self.view_url_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) {
        self.create_calls.lock().unwrap().clear();
        self.edit_calls.lock().unwrap().clear();
        self.ready_calls.lock().unwrap().clear();
    }

    fn next_url(&self) -> String {
        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        format!("https://github.com/acme/widgets/pull/{number}")
    }
}

#[async_trait]
impl ReviewGateway for MockReview {
    async fn view_url(&self, branch: &str) -> Result<Option<String>> {
        self.view_url_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_view_url_for.lock().unwrap().contains(branch) {
            return Err(PrStackError::external(
                format!("gh pr view {branch} --json url"),
                "HTTP 502",
            ));
        }
        Ok(self.pr(branch).map(|pr| pr.url))
    }

    async fn view_state(&self, branch: &str) -> Result<PrState> {
        Ok(self.pr(branch).map_or(PrState::Closed, |pr| pr.state))
    }

    async fn view_body(&self, branch: &str) -> Result<String> {
        self.pr(branch)
            .map(|pr| pr.body)
            .ok_or_else(|| PrStackError::not_found(format!("no pull request for `{branch}`")))
    }

    async fn create(&self, request: &CreatePullRequest) -> Result<String> {
        self.create_calls.lock().unwrap().push(request.clone());
        if self.fail_create_for.lock().unwrap().contains(&request.branch) {
            return Err(PrStackError::external(
                format!("gh pr create --head {}", request.branch),
                "HTTP 502",
            ));
        }

        let url = self.next_url();
        self.prs.lock().unwrap().insert(
            request.branch.clone(),
            MockPr {
                url: url.clone(),
                state: if request.draft {
                    PrState::Draft
                } else {
                    PrState::Open
                },
                title: request.title.clone(),
                base: request.base.clone(),
                body: request.body.clone(),
            },
        );
        Ok(url)
    }

    async fn edit(&self, branch: &str, base: Option<&str>, body: &str) -> Result<()> {
        self.edit_calls.lock().unwrap().push(EditCall {
            branch: branch.to_string(),
            base: base.map(ToString::to_string),
            body: body.to_string(),
        });
        if self.fail_edit_for.lock().unwrap().contains(branch) {
            return Err(PrStackError::external(format!("gh pr edit {branch}"), "HTTP 502"));
        }

        let mut prs = self.prs.lock().unwrap();
        let pr = prs
            .get_mut(branch)
            .ok_or_else(|| PrStackError::not_found(format!("no pull request for `{branch}`")))?;
        pr.body = body.to_string();
        if let Some(base) = base {
            pr.base = base.to_string();
        }
        Ok(())
    }

    async fn mark_ready(&self, branch: &str) -> Result<()> {
        self.ready_calls.lock().unwrap().push(branch.to_string());
        let mut prs = self.prs.lock().unwrap();
        let pr = prs
            .get_mut(branch)
            .ok_or_else(|| PrStackError::not_found(format!("no pull request for `{branch}`")))?;
        pr.state = PrState::Open;
        Ok(())
    }
}
