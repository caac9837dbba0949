pub mod config;
pub mod stack;

use crate::config::{load_settings, Settings};
use crate::errors::{PrStackError, Result};
use crate::git::GitRepository;
use crate::review::GhCli;
use crate::stack::{StackManager, StackStore, SyncEngine};
use dialoguer::{theme::ColorfulTheme, Confirm};

/// Stack manager rooted at the config directory, plus the loaded settings
pub(crate) fn open_manager() -> Result<(StackManager, Settings)> {
    let store = StackStore::open_default()?;
    let settings = load_settings(store.root())?;
    Ok((StackManager::new(store), settings))
}

/// Everything a command needs to talk to git and the review service
pub(crate) struct Workspace {
    pub manager: StackManager,
    pub settings: Settings,
    pub repo: GitRepository,
    pub review: GhCli,
}

impl Workspace {
    pub fn open() -> Result<Self> {
        let (manager, settings) = open_manager()?;
        let repo = GitRepository::discover_current(&settings.git)?;
        let review = GhCli::new(&settings.review).with_workdir(repo.path().to_path_buf());

        Ok(Self {
            manager,
            settings,
            repo,
            review,
        })
    }

    pub fn engine(&self) -> SyncEngine<'_> {
        SyncEngine::new(&self.repo, &self.review, &self.settings)
    }

    pub fn stack_name(&self, explicit: Option<&str>) -> Result<String> {
        self.manager.store().resolve_name(explicit)
    }
}

/// Ask a yes/no question defaulting to no; declining aborts the command
pub(crate) fn confirm(prompt: &str) -> Result<()> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    if confirmed {
        Ok(())
    } else {
        Err(PrStackError::UserAborted)
    }
}
