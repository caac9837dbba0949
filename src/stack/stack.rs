use crate::errors::{PrStackError, Result};
use crate::git::CommitSummary;
use serde::{Deserialize, Serialize};

/// Branch name of the item at `position` (1-based) in stack `stack_name`
pub fn branch_name(stack_name: &str, position: usize) -> String {
    format!("prstack-{stack_name}-{position}")
}

/// Display title of the item at `position`
pub fn item_title(position: usize, subject: &str) -> String {
    format!("{position}) {subject}")
}

/// Check a 1-based position against a stack of `len` items
pub fn check_position(position: usize, len: usize) -> Result<()> {
    if position == 0 || position > len {
        return Err(PrStackError::out_of_range(position, len));
    }
    Ok(())
}

fn default_enabled() -> bool {
    true
}

/// A single reviewable change: one branch, at most one pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackItem {
    /// One-line description taken from the originating commit
    pub subject: String,
    /// `prstack-<stack>-<position>`, used locally and on the remote
    pub branch: String,
    /// `"<position>) <subject>"`
    pub title: String,
    /// Commit the branch was rooted at when first materialized
    pub initial_sha: String,
    /// Disabled items are left out of PR sync and of the upstream chain
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl StackItem {
    pub fn new(stack_name: &str, position: usize, subject: &str, initial_sha: &str) -> Self {
        Self {
            subject: subject.to_string(),
            branch: branch_name(stack_name, position),
            title: item_title(position, subject),
            initial_sha: initial_sha.to_string(),
            enabled: true,
        }
    }
}

/// A stack item together with its derived chain relationships
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainedItem {
    /// Absolute 1-based position, counting disabled items
    pub position: usize,
    pub item: StackItem,
    /// Position of the prior item in the same view, if any
    pub previous: Option<usize>,
    /// Branch this item is based on: nearest enabled predecessor, or the default branch
    pub upstream: String,
}

/// A named, ordered collection of stack items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Taken from the directory the stack lives in, never written to the file
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<StackItem>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Build a fresh stack with one item per commit, oldest first
    pub fn from_commits(name: &str, commits: &[CommitSummary]) -> Result<Self> {
        if commits.is_empty() {
            return Err(PrStackError::validation(
                "No commits ahead of the base; nothing to stack",
            ));
        }

        let items = commits
            .iter()
            .enumerate()
            .map(|(index, commit)| StackItem::new(name, index + 1, &commit.subject, &commit.sha))
            .collect();

        Ok(Self {
            name: name.to_string(),
            items,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at a 1-based position, disabled items included
    pub fn item(&self, position: usize) -> Result<&StackItem> {
        check_position(position, self.len())?;
        Ok(&self.items[position - 1])
    }

    /// The ordered chain with upstreams computed.
    ///
    /// Upstreams always skip disabled items, so they are the same whether or
    /// not `include_disabled` is set; only the set of returned items (and
    /// their `previous` links) changes.
    pub fn chain(&self, include_disabled: bool, default_branch: &str) -> Vec<ChainedItem> {
        let mut chain = Vec::with_capacity(self.items.len());
        let mut last_enabled: Option<&StackItem> = None;
        let mut last_in_view: Option<usize> = None;

        for (index, item) in self.items.iter().enumerate() {
            let position = index + 1;
            let upstream = last_enabled
                .map(|prev| prev.branch.clone())
                .unwrap_or_else(|| default_branch.to_string());

            if item.enabled {
                last_enabled = Some(item);
            } else if !include_disabled {
                continue;
            }

            chain.push(ChainedItem {
                position,
                item: item.clone(),
                previous: last_in_view,
                upstream,
            });
            last_in_view = Some(position);
        }

        chain
    }

    /// Append a placeholder item rooted where the last enabled item is rooted.
    ///
    /// Existing positions are never renumbered; the new position is one past
    /// the full (disabled-inclusive) length.
    pub fn extend(&mut self, subject: &str) -> Result<&StackItem> {
        let root = self
            .items
            .iter()
            .rev()
            .find(|item| item.enabled)
            .or_else(|| self.items.last())
            .map(|item| item.initial_sha.clone())
            .ok_or_else(|| {
                PrStackError::validation(format!("Stack '{}' has no items to extend", self.name))
            })?;

        let position = self.items.len() + 1;
        self.items
            .push(StackItem::new(&self.name, position, subject, &root));
        Ok(&self.items[position - 1])
    }

    /// Toggle an item in place. Idempotent.
    pub fn set_enabled(&mut self, position: usize, enabled: bool) -> Result<()> {
        check_position(position, self.len())?;
        self.items[position - 1].enabled = enabled;
        Ok(())
    }
}
