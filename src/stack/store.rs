use super::Stack;
use crate::config::{get_config_dir, POINTER_FILE_NAME};
use crate::errors::{PrStackError, Result};
use crate::utils::atomic_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding a stack's items inside its directory
pub const STACK_FILE_NAME: &str = "stack.toml";

const STACK_FILE_HEADER: &str = "\
# prstack stack file
#
# Items are listed in position order (1-based). Set `enabled = false` to leave
# an item out of pull request sync; positions and branch names never change.

";

/// Persistence of stacks and the current-stack pointer under the config root
#[derive(Debug, Clone)]
pub struct StackStore {
    root: PathBuf,
}

impl StackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `$PRSTACK_HOME` or `~/.prstack`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(get_config_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stack names become branch names, so keep them to a safe ref alphabet
    pub fn validate_name(name: &str) -> Result<()> {
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if name.is_empty()
            || !valid_chars
            || name.starts_with(['.', '-'])
            || name.ends_with('.')
            || name.contains("..")
            || name.ends_with(".lock")
        {
            return Err(PrStackError::validation(format!(
                "Invalid stack name '{name}': use letters, digits, '-', '_' or '.'"
            )));
        }
        Ok(())
    }

    pub fn stack_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn stack_path(&self, name: &str) -> PathBuf {
        self.stack_dir(name).join(STACK_FILE_NAME)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.stack_path(name).is_file()
    }

    pub fn load(&self, name: &str) -> Result<Stack> {
        Self::validate_name(name)?;
        let path = self.stack_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PrStackError::not_found(format!(
                    "Stack '{name}' does not exist (run `prstack generate {name}`)"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut stack: Stack = toml::from_str(&content)?;
        stack.name = name.to_string();
        debug!("Loaded stack '{}' with {} items", name, stack.len());
        Ok(stack)
    }

    /// Rewrite the whole stack file
    pub fn save(&self, stack: &Stack) -> Result<()> {
        Self::validate_name(&stack.name)?;
        let content = format!("{STACK_FILE_HEADER}{}", toml::to_string(stack)?);
        atomic_file::write_string(&self.stack_path(&stack.name), &content)?;
        debug!("Saved stack '{}'", stack.name);
        Ok(())
    }

    /// Remove the stack directory; clears the pointer if it named this stack
    pub fn delete(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;
        if !self.exists(name) {
            return Err(PrStackError::not_found(format!("Stack '{name}' does not exist")));
        }

        fs::remove_dir_all(self.stack_dir(name))?;
        if self.current()?.as_deref() == Some(name) {
            self.clear_current()?;
        }

        info!("Deleted stack '{}'", name);
        Ok(())
    }

    /// Names of every stack under the root, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().join(STACK_FILE_NAME).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn pointer_path(&self) -> PathBuf {
        self.root.join(POINTER_FILE_NAME)
    }

    /// The currently selected stack, if any
    pub fn current(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.pointer_path()) {
            Ok(content) => {
                let name = content.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_current(&self, name: &str) -> Result<()> {
        Self::validate_name(name)?;
        atomic_file::write_string(&self.pointer_path(), &format!("{name}\n"))?;
        info!("Now using stack '{}'", name);
        Ok(())
    }

    pub fn clear_current(&self) -> Result<()> {
        match fs::remove_file(self.pointer_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// An explicit stack argument, else the pointer file's contents
    pub fn resolve_name(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit {
            return Ok(name.to_string());
        }
        self.current()?.ok_or_else(|| {
            PrStackError::not_found("No stack selected; pass a stack name or run `prstack use <stack>`")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackItem;
    use tempfile::TempDir;

    fn sample(name: &str) -> Stack {
        let mut stack = Stack::new(name);
        stack.items.push(StackItem::new(name, 1, "First change", "aaa111"));
        stack.items.push(StackItem::new(name, 2, "Second \"quoted\" change", "bbb222"));
        stack.items[1].enabled = false;
        stack
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());

        store.save(&sample("foo")).unwrap();
        let loaded = store.load("foo").unwrap();

        assert_eq!(loaded, sample("foo"));
        assert!(tmp.path().join("foo").join("stack.toml").is_file());
    }

    #[test]
    fn test_file_is_human_editable() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());
        store.save(&sample("foo")).unwrap();

        let content = fs::read_to_string(store.stack_path("foo")).unwrap();
        assert!(content.starts_with("# prstack stack file"));
        assert_eq!(content.matches("[[items]]").count(), 2);
        assert!(content.contains("branch = \"prstack-foo-1\""));
        assert!(content.contains("enabled = false"));
    }

    #[test]
    fn test_load_tolerates_hand_edits() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());
        fs::create_dir_all(store.stack_dir("bar")).unwrap();
        fs::write(
            store.stack_path("bar"),
            "# mine\n[[items]]\nsubject = \"x\" # note\nbranch = \"prstack-bar-1\"\ntitle = \"1) x\"\ninitial_sha = \"abc\"\n",
        )
        .unwrap();

        let stack = store.load("bar").unwrap();
        assert_eq!(stack.name, "bar");
        assert!(stack.items[0].enabled);
    }

    #[test]
    fn test_missing_stack_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());
        assert!(store.load("nope").unwrap_err().is_not_found());
        assert!(store.delete("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", "../x", "a/b", ".hidden", "-flag", "x.lock", "a b"] {
            assert!(StackStore::validate_name(name).is_err(), "{name:?}");
        }
        for name in ["foo", "feature_2", "v1.2"] {
            assert!(StackStore::validate_name(name).is_ok(), "{name:?}");
        }
    }

    #[test]
    fn test_pointer_and_list() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());

        assert_eq!(store.current().unwrap(), None);
        assert!(store.resolve_name(None).unwrap_err().is_not_found());

        store.save(&sample("foo")).unwrap();
        store.save(&sample("bar")).unwrap();
        store.set_current("foo").unwrap();

        assert_eq!(store.list().unwrap(), ["bar", "foo"]);
        assert_eq!(store.resolve_name(None).unwrap(), "foo");
        assert_eq!(store.resolve_name(Some("bar")).unwrap(), "bar");

        store.delete("foo").unwrap();
        assert_eq!(store.current().unwrap(), None);
        assert_eq!(store.list().unwrap(), ["bar"]);
    }

    #[test]
    fn test_delete_keeps_pointer_to_other_stack() {
        let tmp = TempDir::new().unwrap();
        let store = StackStore::new(tmp.path());
        store.save(&sample("foo")).unwrap();
        store.save(&sample("bar")).unwrap();
        store.set_current("bar").unwrap();

        store.delete("foo").unwrap();
        assert_eq!(store.current().unwrap().as_deref(), Some("bar"));
    }
}
