use super::{CreatePullRequest, PrState, ReviewGateway};
use crate::config::ReviewSettings;
use crate::errors::{PrStackError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// What `gh` prints when a branch has no pull request at all
const NO_PR_MESSAGE: &str = "no pull requests found";

#[derive(Debug, Deserialize)]
struct UrlView {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateView {
    state: String,
    #[serde(default)]
    is_draft: bool,
}

#[derive(Debug, Deserialize)]
struct BodyView {
    #[serde(default)]
    body: String,
}

/// Review gateway backed by the GitHub CLI
pub struct GhCli {
    program: String,
    timeout: Duration,
    workdir: Option<PathBuf>,
}

impl GhCli {
    pub fn new(settings: &ReviewSettings) -> Self {
        Self {
            program: settings.program.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            workdir: None,
        }
    }

    /// Run `gh` from inside the given repository checkout
    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = Some(workdir);
        self
    }

    /// Run the CLI with structured arguments, optionally feeding `stdin`, bounded by the timeout
    async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String> {
        let operation = format!("{} {}", self.program, args.join(" "));
        debug!(">>> {}", operation);

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let run = async {
            let mut child = command.spawn()?;
            if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(input.as_bytes()).await?;
            }
            child.wait_with_output().await
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                PrStackError::external(
                    &operation,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| PrStackError::external(&operation, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(NO_PR_MESSAGE) {
                return Err(PrStackError::not_found(format!(
                    "no pull request for `{}`",
                    args.get(2).copied().unwrap_or_default()
                )));
            }
            return Err(PrStackError::external(operation, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn view_json(&self, branch: &str, fields: &str) -> Result<String> {
        self.run(&["pr", "view", branch, "--json", fields], None).await
    }
}

/// Map `gh`'s `state`/`isDraft` pair onto the four observed states
fn parse_state(json: &str) -> Result<PrState> {
    let view: StateView = serde_json::from_str(json)?;
    match view.state.as_str() {
        "OPEN" if view.is_draft => Ok(PrState::Draft),
        "OPEN" => Ok(PrState::Open),
        "MERGED" => Ok(PrState::Merged),
        "CLOSED" => Ok(PrState::Closed),
        other => Err(PrStackError::malformed(format!(
            "unknown pull request state '{other}'"
        ))),
    }
}

/// `gh pr create` prints progress lines before the URL; the URL is the last line
fn parse_created_url(stdout: &str) -> Result<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .last()
        .map(ToString::to_string)
        .ok_or_else(|| PrStackError::malformed(format!("no URL in `gh pr create` output: {stdout}")))
}

#[async_trait]
impl ReviewGateway for GhCli {
    async fn view_url(&self, branch: &str) -> Result<Option<String>> {
        match self.view_json(branch, "url").await {
            Ok(json) => Ok(Some(serde_json::from_str::<UrlView>(&json)?.url)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn view_state(&self, branch: &str) -> Result<PrState> {
        match self.view_json(branch, "state,isDraft").await {
            Ok(json) => parse_state(&json),
            Err(e) if e.is_not_found() => Ok(PrState::Closed),
            Err(e) => Err(e),
        }
    }

    async fn view_body(&self, branch: &str) -> Result<String> {
        let json = self.view_json(branch, "body").await?;
        Ok(serde_json::from_str::<BodyView>(&json)?.body)
    }

    async fn create(&self, request: &CreatePullRequest) -> Result<String> {
        let mut args = vec![
            "pr",
            "create",
            "--head",
            request.branch.as_str(),
            "--title",
            request.title.as_str(),
            "--base",
            request.base.as_str(),
            "--body-file",
            "-",
        ];
        if request.draft {
            args.push("--draft");
        }

        let stdout = self.run(&args, Some(request.body.as_str())).await?;
        let url = parse_created_url(&stdout)?;
        info!("Created pull request for '{}': {}", request.branch, url);
        Ok(url)
    }

    async fn edit(&self, branch: &str, base: Option<&str>, body: &str) -> Result<()> {
        let mut args = vec!["pr", "edit", branch, "--body-file", "-"];
        if let Some(base) = base {
            args.extend(["--base", base]);
        }

        self.run(&args, Some(body)).await?;
        info!("Updated pull request for '{}'", branch);
        Ok(())
    }

    async fn mark_ready(&self, branch: &str) -> Result<()> {
        self.run(&["pr", "ready", branch], None).await?;
        info!("Marked pull request for '{}' ready for review", branch);
        Ok(())
    }
}
