use super::{confirm, open_manager, Workspace};
use crate::cli::output::Output;
use crate::errors::{PrStackError, Result};
use crate::git::VcsGateway;
use crate::stack::{Stack, StackStore, SyncEngine};
use crate::utils::spinner::Spinner;
use console::style;
use tracing::{debug, warn};

pub fn use_stack(name: &str) -> Result<()> {
    let (manager, _) = open_manager()?;
    StackStore::validate_name(name)?;

    if !manager.exists(name) {
        Output::warning(format!(
            "Stack '{name}' does not exist yet; create it with `prstack generate {name}`"
        ));
    }
    manager.store().set_current(name)?;

    Output::success(format!("Using stack '{name}'"));
    Ok(())
}

pub fn generate(name: &str, base: Option<String>) -> Result<()> {
    let workspace = Workspace::open()?;
    StackStore::validate_name(name)?;

    let base = match base {
        Some(base) => base,
        None => format!(
            "{}/{}",
            workspace.repo.remote_name(),
            workspace.repo.default_branch_name()?
        ),
    };

    let commits = workspace.repo.commit_log_range(&base)?;
    debug!("{} commit(s) ahead of {}", commits.len(), base);

    if workspace.manager.exists(name) {
        confirm(&format!("Stack '{name}' already exists. Replace it?"))?;
    }

    let stack = workspace.manager.generate(name, &commits, true)?;
    Output::success(format!(
        "Generated stack '{}' with {} item(s) on top of {}",
        name,
        stack.len(),
        base
    ));
    let engine = workspace.engine();
    print_stack(&engine, &stack)
}

pub fn show(name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;
    let engine = workspace.engine();
    print_stack(&engine, &stack)
}

fn print_stack(engine: &SyncEngine<'_>, stack: &Stack) -> Result<()> {
    let chain = engine.chain(stack, true)?;
    Output::stack_items(&stack.name, &chain);
    Ok(())
}

pub async fn sync(name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;
    let engine = workspace.engine();

    engine.ensure_branches(&stack)?;

    let spinner = Spinner::new(format!("Syncing pull requests of '{}'", stack.name));
    let result = engine.ensure_prs(&stack).await;
    spinner.stop();

    let outcomes = result?;
    Output::section(format!("Pull requests of '{}'", stack.name));
    for item in &outcomes {
        Output::pr_outcome(item.position, &item.branch, &item.outcome);
    }
    Output::success("Stack is in sync");
    Ok(())
}

pub async fn open(num: Option<usize>, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;
    let engine = workspace.engine();

    let urls = match num {
        Some(position) => vec![(position, engine.pr_url(&stack, position).await?)],
        None => engine.all_pr_urls(&stack).await?,
    };

    for (position, url) in urls {
        match url {
            Some(url) => {
                Output::sub_item(format!("{position}: {url}"));
                if let Err(e) = open::that(&url) {
                    warn!("Could not open a browser for {}: {}", url, e);
                }
            }
            None => Output::warning(format!("{position}: no PR found")),
        }
    }
    Ok(())
}

pub fn rebase_all(start: usize, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;

    let rebased = workspace.engine().rebase_all(&stack, start)?;
    if rebased.is_empty() {
        Output::info(format!("No enabled items at or after position {start}"));
    } else {
        Output::success(format!(
            "Rebased and pushed item(s) {}",
            rebased
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(())
}

pub fn set_enabled(position: usize, enabled: bool, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let name = workspace.stack_name(name)?;

    let stack = if enabled {
        workspace.manager.enable(&name, position)?
    } else {
        workspace.manager.disable(&name, position)?
    };

    Output::success(format!(
        "{} item {position} of '{name}'",
        if enabled { "Enabled" } else { "Disabled" }
    ));
    let engine = workspace.engine();
    print_stack(&engine, &stack)
}

pub fn checkout(position: usize, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;

    workspace.engine().checkout(&stack, position)?;
    Output::success(format!("Checked out {}", stack.item(position)?.branch));
    Ok(())
}

pub fn list() -> Result<()> {
    let (manager, _) = open_manager()?;
    let names = manager.store().list()?;
    let current = manager.store().current()?;

    if names.is_empty() {
        Output::info("No stacks yet");
        Output::tip("Create one with `prstack generate <stack>`");
        return Ok(());
    }

    for name in names {
        if current.as_deref() == Some(name.as_str()) {
            println!("* {}", style(name).green().bold());
        } else {
            println!("  {name}");
        }
    }
    Ok(())
}

pub fn extend(subject: &str, name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let name = workspace.stack_name(name)?;

    let item = workspace.manager.extend(&name, subject)?;
    Output::success(format!("Added {} ({})", item.branch, item.title));

    let stack = workspace.manager.load(&name)?;
    let engine = workspace.engine();
    engine.ensure_branches(&stack)?;
    print_stack(&engine, &stack)
}

pub fn delete(name: Option<&str>) -> Result<()> {
    let (manager, _) = open_manager()?;
    let name = manager.store().resolve_name(name)?;

    if !manager.exists(&name) {
        return Err(PrStackError::not_found(format!("Stack '{name}' does not exist")));
    }
    confirm(&format!("Delete stack '{name}'?"))?;

    manager.delete(&name)?;
    Output::success(format!("Deleted stack '{name}'"));
    Ok(())
}

pub async fn submit(name: Option<&str>) -> Result<()> {
    let workspace = Workspace::open()?;
    let stack = workspace.manager.load(&workspace.stack_name(name)?)?;

    confirm(&format!(
        "Mark every enabled pull request of '{}' ready for review?",
        stack.name
    ))?;

    let submitted = workspace.engine().submit(&stack).await?;
    for branch in &submitted {
        Output::sub_item(branch);
    }
    Output::success(format!("Submitted {} pull request(s)", submitted.len()));
    Ok(())
}
