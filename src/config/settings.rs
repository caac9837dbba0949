use crate::errors::{PrStackError, Result};
use crate::utils::atomic_file;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub git: GitSettings,
    pub review: ReviewSettings,
    pub links: LinkSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Remote that stack branches are pushed to
    pub remote: String,
    /// Command used to publish a rebased branch, as an argv list.
    /// `{branch}` and `{remote}` are substituted per argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_command: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    /// Review service CLI
    pub program: String,
    /// Upper bound for a single review-service call
    pub timeout_secs: u64,
    /// How many pull requests are reconciled at once during sync
    pub concurrency: usize,
    /// Push an empty skip-ci commit before opening a new pull request
    pub skip_ci_on_create: bool,
    /// Commit message used by the skip-ci hook
    pub skip_ci_message: String,
}

/// Settings for the navigation links written at the top of each PR body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    pub current_marker: String,
    pub other_marker: String,
    pub placeholder: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            send_command: None,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
            timeout_secs: 120,
            concurrency: 4,
            skip_ci_on_create: false,
            skip_ci_message: "skip ci [skip ci]".to_string(),
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            current_marker: "🐢".to_string(),
            other_marker: "🥚".to_string(),
            placeholder: "(none)".to_string(),
        }
    }
}

/// Every key accepted by `get_value`/`set_value`, in display order
pub const KEYS: &[&str] = &[
    "git.remote",
    "git.send_command",
    "review.program",
    "review.timeout_secs",
    "review.concurrency",
    "review.skip_ci_on_create",
    "review.skip_ci_message",
    "links.current_marker",
    "links.other_marker",
    "links.placeholder",
];

impl Settings {
    /// Load settings from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PrStackError::config(format!("Failed to read config file: {e}")))?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| PrStackError::config(format!("Failed to parse config file: {e}")))?;

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PrStackError::config(format!("Failed to serialize config: {e}")))?;

        atomic_file::write_string(path, &content)
    }

    /// Update a configuration value by key
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, name) = split_key(key)?;

        match (section, name) {
            ("git", "remote") => self.git.remote = value.to_string(),
            ("git", "send_command") => {
                self.git.send_command = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.split_whitespace().map(ToString::to_string).collect())
                };
            }
            ("review", "program") => self.review.program = value.to_string(),
            ("review", "timeout_secs") => {
                self.review.timeout_secs = value
                    .parse()
                    .map_err(|_| PrStackError::config(format!("Invalid number: {value}")))?;
            }
            ("review", "concurrency") => {
                self.review.concurrency = value
                    .parse()
                    .map_err(|_| PrStackError::config(format!("Invalid number: {value}")))?;
            }
            ("review", "skip_ci_on_create") => {
                self.review.skip_ci_on_create = value.parse().map_err(|_| {
                    PrStackError::config(format!("Invalid boolean value: {value}"))
                })?;
            }
            ("review", "skip_ci_message") => self.review.skip_ci_message = value.to_string(),
            ("links", "current_marker") => self.links.current_marker = value.to_string(),
            ("links", "other_marker") => self.links.other_marker = value.to_string(),
            ("links", "placeholder") => self.links.placeholder = value.to_string(),
            _ => return Err(PrStackError::config(format!("Unknown config key: {key}"))),
        }

        self.validate()
    }

    /// Get a configuration value by key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let (section, name) = split_key(key)?;

        let value = match (section, name) {
            ("git", "remote") => self.git.remote.clone(),
            ("git", "send_command") => self
                .git
                .send_command
                .as_ref()
                .map(|argv| argv.join(" "))
                .unwrap_or_default(),
            ("review", "program") => self.review.program.clone(),
            ("review", "timeout_secs") => self.review.timeout_secs.to_string(),
            ("review", "concurrency") => self.review.concurrency.to_string(),
            ("review", "skip_ci_on_create") => self.review.skip_ci_on_create.to_string(),
            ("review", "skip_ci_message") => self.review.skip_ci_message.clone(),
            ("links", "current_marker") => self.links.current_marker.clone(),
            ("links", "other_marker") => self.links.other_marker.clone(),
            ("links", "placeholder") => self.links.placeholder.clone(),
            _ => return Err(PrStackError::config(format!("Unknown config key: {key}"))),
        };

        Ok(value)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.git.remote.trim().is_empty() {
            return Err(PrStackError::config("git.remote must not be empty"));
        }

        if let Some(argv) = &self.git.send_command {
            if argv.is_empty() {
                return Err(PrStackError::config(
                    "git.send_command must name a program when set",
                ));
            }
        }

        if self.review.program.trim().is_empty() {
            return Err(PrStackError::config("review.program must not be empty"));
        }

        if self.review.timeout_secs == 0 {
            return Err(PrStackError::config("review.timeout_secs must be at least 1"));
        }

        if self.review.concurrency == 0 {
            return Err(PrStackError::config("review.concurrency must be at least 1"));
        }

        Ok(())
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    key.split_once('.')
        .filter(|(section, name)| !section.is_empty() && !name.contains('.'))
        .ok_or_else(|| PrStackError::config(format!("Invalid config key format: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_listed_key_is_readable() {
        let settings = Settings::default();
        for key in KEYS {
            assert!(settings.get_value(key).is_ok(), "key {key} not readable");
        }
    }

    #[test]
    fn test_set_and_get_values() {
        let mut settings = Settings::default();

        settings.set_value("git.remote", "upstream").unwrap();
        settings.set_value("review.skip_ci_on_create", "true").unwrap();
        settings
            .set_value("git.send_command", "git push -f {remote} {branch}")
            .unwrap();

        assert_eq!(settings.get_value("git.remote").unwrap(), "upstream");
        assert!(settings.review.skip_ci_on_create);
        assert_eq!(
            settings.git.send_command,
            Some(vec![
                "git".to_string(),
                "push".to_string(),
                "-f".to_string(),
                "{remote}".to_string(),
                "{branch}".to_string(),
            ])
        );

        settings.set_value("git.send_command", "").unwrap();
        assert_eq!(settings.git.send_command, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = Settings::default();

        assert!(settings.set_value("review.concurrency", "many").is_err());
        assert!(settings.set_value("review.concurrency", "0").is_err());
        assert!(settings.set_value("review.skip_ci_on_create", "maybe").is_err());
        assert!(settings.set_value("nope.key", "x").is_err());
        assert!(settings.get_value("remote").is_err());
        assert!(settings.get_value("git.remote.extra").is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "# local overrides\n[review]\nconcurrency = 2\n\n[links]\ncurrent_marker = \">>\"\n",
        )
        .unwrap();

        let settings = Settings::load_from_file(&path).unwrap();
        assert_eq!(settings.review.concurrency, 2);
        assert_eq!(settings.review.program, "gh");
        assert_eq!(settings.links.current_marker, ">>");
        assert_eq!(settings.links.other_marker, "🥚");
        assert_eq!(settings.git.remote, "origin");
    }

    #[test]
    fn test_round_trip_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut settings = Settings::default();
        settings.set_value("links.placeholder", "pending").unwrap();
        settings.save_to_file(&path).unwrap();

        assert_eq!(Settings::load_from_file(&path).unwrap(), settings);
    }
}
