use super::{ChainedItem, Stack, StackItem, StackStore};
use crate::errors::{PrStackError, Result};
use crate::git::CommitSummary;
use tracing::info;

/// Stack lifecycle on top of the store: generate, extend, enable/disable, delete
pub struct StackManager {
    store: StackStore,
}

impl StackManager {
    pub fn new(store: StackStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &StackStore {
        &self.store
    }

    pub fn exists(&self, name: &str) -> bool {
        self.store.exists(name)
    }

    pub fn load(&self, name: &str) -> Result<Stack> {
        self.store.load(name)
    }

    /// Load a stack and compute its chain against `default_branch`
    pub fn load_chain(
        &self,
        name: &str,
        include_disabled: bool,
        default_branch: &str,
    ) -> Result<Vec<ChainedItem>> {
        Ok(self.load(name)?.chain(include_disabled, default_branch))
    }

    /// Create a stack with one item per commit (oldest first).
    ///
    /// An existing stack is only replaced when `replace` is set; callers ask
    /// the user first.
    pub fn generate(&self, name: &str, commits: &[CommitSummary], replace: bool) -> Result<Stack> {
        StackStore::validate_name(name)?;
        if self.store.exists(name) && !replace {
            return Err(PrStackError::AlreadyExists(format!("Stack '{name}'")));
        }

        let stack = Stack::from_commits(name, commits)?;
        self.store.save(&stack)?;

        info!("Generated stack '{}' with {} items", name, stack.len());
        Ok(stack)
    }

    /// Append a placeholder item and persist the whole list
    pub fn extend(&self, name: &str, subject: &str) -> Result<StackItem> {
        let mut stack = self.load(name)?;
        let item = stack.extend(subject)?.clone();
        self.store.save(&stack)?;

        info!("Extended stack '{}' with '{}'", name, item.branch);
        Ok(item)
    }

    pub fn enable(&self, name: &str, position: usize) -> Result<Stack> {
        self.set_enabled(name, position, true)
    }

    pub fn disable(&self, name: &str, position: usize) -> Result<Stack> {
        self.set_enabled(name, position, false)
    }

    fn set_enabled(&self, name: &str, position: usize, enabled: bool) -> Result<Stack> {
        let mut stack = self.load(name)?;
        stack.set_enabled(position, enabled)?;
        self.store.save(&stack)?;

        info!(
            "{} item {} of stack '{}'",
            if enabled { "Enabled" } else { "Disabled" },
            position,
            name
        );
        Ok(stack)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.store.delete(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commits(n: usize) -> Vec<CommitSummary> {
        (1..=n)
            .map(|i| CommitSummary {
                sha: format!("sha{i}"),
                subject: format!("Change {i}"),
            })
            .collect()
    }

    fn manager() -> (TempDir, StackManager) {
        let tmp = TempDir::new().unwrap();
        let manager = StackManager::new(StackStore::new(tmp.path()));
        (tmp, manager)
    }

    #[test]
    fn test_generate_refuses_silent_overwrite() {
        let (_tmp, manager) = manager();
        manager.generate("foo", &commits(3), false).unwrap();

        let err = manager.generate("foo", &commits(1), false).unwrap_err();
        assert!(matches!(err, PrStackError::AlreadyExists(_)));
        assert_eq!(manager.load("foo").unwrap().len(), 3);

        manager.generate("foo", &commits(1), true).unwrap();
        assert_eq!(manager.load("foo").unwrap().len(), 1);
    }

    #[test]
    fn test_disable_persists_and_reroutes_upstream() {
        let (_tmp, manager) = manager();
        manager.generate("foo", &commits(3), false).unwrap();

        manager.disable("foo", 2).unwrap();
        let chain = manager.load_chain("foo", false, "main").unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].item.branch, "prstack-foo-3");
        assert_eq!(chain[1].upstream, "prstack-foo-1");

        manager.enable("foo", 2).unwrap();
        let chain = manager.load_chain("foo", false, "main").unwrap();
        assert_eq!(chain[2].upstream, "prstack-foo-2");
    }

    #[test]
    fn test_out_of_range_toggle_leaves_file_alone() {
        let (_tmp, manager) = manager();
        manager.generate("foo", &commits(2), false).unwrap();

        assert!(matches!(
            manager.disable("foo", 3),
            Err(PrStackError::OutOfRange { position: 3, len: 2 })
        ));
        assert!(manager.load("foo").unwrap().items.iter().all(|i| i.enabled));
    }

    #[test]
    fn test_extend_persists_new_item() {
        let (_tmp, manager) = manager();
        manager.generate("foo", &commits(2), false).unwrap();
        manager.disable("foo", 2).unwrap();

        let item = manager.extend("foo", "Placeholder").unwrap();
        let stack = manager.load("foo").unwrap();

        assert_eq!(item.branch, "prstack-foo-3");
        assert_eq!(item.initial_sha, "sha1");
        assert_eq!(stack.items.last(), Some(&item));
        assert!(!stack.items[1].enabled);
    }

    #[test]
    fn test_operations_on_missing_stack() {
        let (_tmp, manager) = manager();
        assert!(manager.load("ghost").unwrap_err().is_not_found());
        assert!(manager.extend("ghost", "x").unwrap_err().is_not_found());
        assert!(manager.delete("ghost").unwrap_err().is_not_found());
    }
}
