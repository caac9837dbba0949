use super::{CommitSummary, VcsGateway};
use crate::config::GitSettings;
use crate::errors::{PrStackError, Result};
use git2::{BranchType, ErrorCode, Repository, Sort};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Wrapper around git2::Repository, shelling out to `git` for network and rebase work
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
    remote: String,
    send_command: Option<Vec<String>>,
    default_branch: OnceCell<String>,
}

impl GitRepository {
    /// Open a Git repository at the given path
    pub fn open(path: &Path, settings: &GitSettings) -> Result<Self> {
        let repo = Repository::discover(path)
            .map_err(|e| PrStackError::config(format!("Not a git repository: {e}")))?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| PrStackError::config("Repository has no working directory"))?
            .to_path_buf();

        Ok(Self {
            repo,
            path: workdir,
            remote: settings.remote.clone(),
            send_command: settings.send_command.clone(),
            default_branch: OnceCell::new(),
        })
    }

    /// Open the repository containing the current directory
    pub fn discover_current(settings: &GitSettings) -> Result<Self> {
        let current_dir = std::env::current_dir()
            .map_err(|e| PrStackError::config(format!("Could not get current directory: {e}")))?;
        Self::open(&current_dir, settings)
    }

    /// Get repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `git` with structured arguments and return trimmed stdout
    fn git(&self, args: &[&str]) -> Result<String> {
        let operation = format!("git {}", args.join(" "));
        debug!(">>> {}", operation);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| PrStackError::external(&operation, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PrStackError::external(operation, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run the user's send helper, substituting `{branch}` and `{remote}` per argument
    fn run_send_command(&self, argv: &[String], branch: &str) -> Result<()> {
        let args: Vec<String> = argv
            .iter()
            .map(|arg| arg.replace("{branch}", branch).replace("{remote}", &self.remote))
            .collect();
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| PrStackError::config("git.send_command is empty"))?;

        let operation = args.join(" ");
        debug!(">>> {}", operation);

        // Inherit stdio: helpers commonly prompt or stream progress
        let status = Command::new(program)
            .args(rest)
            .current_dir(&self.path)
            .status()
            .map_err(|e| PrStackError::external(&operation, e.to_string()))?;

        if !status.success() {
            return Err(PrStackError::external(operation, format!("exited with {status}")));
        }
        Ok(())
    }

    fn resolve_default_branch(&self) -> Result<String> {
        let head_ref = format!("refs/remotes/{}/HEAD", self.remote);
        let reference = match self.repo.find_reference(&head_ref) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(PrStackError::not_found(format!(
                    "{head_ref} is not set; run `git remote set-head {} --auto`",
                    self.remote
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let target = reference.symbolic_target().ok_or_else(|| {
            PrStackError::config(format!("{head_ref} is not a symbolic reference"))
        })?;

        let prefix = format!("refs/remotes/{}/", self.remote);
        target
            .strip_prefix(&prefix)
            .map(ToString::to_string)
            .ok_or_else(|| PrStackError::config(format!("Unexpected target for {head_ref}: {target}")))
    }

    fn find_local_branch(&self, name: &str) -> Result<Option<git2::Branch<'_>>> {
        match self.repo.find_branch(name, BranchType::Local) {
            Ok(branch) => Ok(Some(branch)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl VcsGateway for GitRepository {
    fn remote_name(&self) -> &str {
        &self.remote
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_local_branch(name)?.is_some())
    }

    fn remote_branch_exists(&self, name: &str) -> Result<bool> {
        let remote_name = format!("{}/{}", self.remote, name);
        match self.repo.find_branch(&remote_name, BranchType::Remote) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_branch(&self, name: &str, from_sha: &str) -> Result<()> {
        let target = self.repo.revparse_single(from_sha).map_err(|e| {
            PrStackError::not_found(format!("Could not find commit '{from_sha}': {e}"))
        })?;
        let commit = target.peel_to_commit().map_err(|e| {
            PrStackError::validation(format!("'{from_sha}' is not a commit: {e}"))
        })?;

        self.repo.branch(name, &commit, false)?;

        info!("Created branch '{}' at {}", name, from_sha);
        Ok(())
    }

    fn set_upstream(&self, branch: &str, upstream: &str) -> Result<()> {
        let mut local = self
            .find_local_branch(branch)?
            .ok_or_else(|| PrStackError::not_found(format!("Branch '{branch}' does not exist")))?;

        let upstream_name = format!("{}/{}", self.remote, upstream);
        local.set_upstream(Some(&upstream_name)).map_err(|e| {
            PrStackError::external(
                format!("git branch -u {upstream_name} {branch}"),
                e.message().to_string(),
            )
        })?;

        debug!("Branch '{}' now tracks '{}'", branch, upstream_name);
        Ok(())
    }

    fn push(&self, branch: &str) -> Result<()> {
        self.git(&["push", self.remote.as_str(), branch])?;
        info!("Pushed '{}' to {}", branch, self.remote);
        Ok(())
    }

    fn force_push(&self, branch: &str) -> Result<()> {
        self.git(&["push", "--force-with-lease", self.remote.as_str(), branch])?;
        info!("Force pushed '{}' to {}", branch, self.remote);
        Ok(())
    }

    fn push_rebased(&self, branch: &str) -> Result<()> {
        match &self.send_command {
            Some(argv) => self.run_send_command(argv, branch),
            None => self.force_push(branch),
        }
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let local = self
            .find_local_branch(branch)?
            .ok_or_else(|| PrStackError::not_found(format!("Branch '{branch}' does not exist")))?;

        let tree = local.get().peel_to_tree()?;
        self.repo.checkout_tree(tree.as_object(), None).map_err(|e| {
            PrStackError::external(format!("git checkout {branch}"), e.message().to_string())
        })?;
        self.repo.set_head(&format!("refs/heads/{branch}"))?;

        info!("Switched to branch '{}'", branch);
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(PrStackError::validation("HEAD is detached"));
        }
        head.shorthand()
            .map(ToString::to_string)
            .ok_or_else(|| PrStackError::validation("Current branch name is not valid UTF-8"))
    }

    fn fetch(&self, branch: &str) -> Result<()> {
        self.git(&["fetch", self.remote.as_str(), branch])?;
        Ok(())
    }

    fn rebase_onto_fetched(&self) -> Result<()> {
        self.git(&["rebase"]).map_err(|e| match e {
            PrStackError::ExternalCommand { operation, message } => PrStackError::ExternalCommand {
                operation,
                message: format!(
                    "{message}\nResolve the conflicts and run `git rebase --continue`, or `git rebase --abort`"
                ),
            },
            other => other,
        })?;
        Ok(())
    }

    fn commit_empty(&self, message: &str) -> Result<()> {
        self.git(&["commit", "--allow-empty", "-m", message])?;
        Ok(())
    }

    fn commit_log_range(&self, base_ref: &str) -> Result<Vec<CommitSummary>> {
        let base = self
            .repo
            .revparse_single(base_ref)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| PrStackError::not_found(format!("Invalid base reference '{base_ref}': {e}")))?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.hide(base.id())?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(CommitSummary {
                sha: commit.id().to_string(),
                subject: commit.summary().unwrap_or_default().to_string(),
            });
        }

        Ok(commits)
    }

    fn default_branch_name(&self) -> Result<String> {
        if let Some(name) = self.default_branch.get() {
            return Ok(name.clone());
        }

        let name = self.resolve_default_branch()?;
        let _ = self.default_branch.set(name.clone());
        Ok(name)
    }
}
