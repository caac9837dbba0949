use crate::cli::output::Output;
use crate::cli::ConfigAction;
use crate::config::{
    get_config_dir, load_settings, save_settings, settings::KEYS, Settings, SETTINGS_FILE_NAME,
};
use crate::errors::Result;
use std::path::Path;

/// Handle configuration commands
pub fn run(action: ConfigAction) -> Result<()> {
    let config_dir = get_config_dir()?;

    match action {
        ConfigAction::Set { key, value } => set_config_value(&config_dir, &key, &value),
        ConfigAction::Get { key } => get_config_value(&config_dir, &key),
        ConfigAction::List => list_config_values(&config_dir),
    }
}

fn set_config_value(config_dir: &Path, key: &str, value: &str) -> Result<()> {
    let mut settings = load_settings(config_dir)?;
    settings.set_value(key, value)?;
    save_settings(config_dir, &settings)?;

    Output::success(format!("Configuration updated: {key} = {}", display(&settings, key)?));

    if key == "git.send_command" {
        Output::tip("Use {branch} and {remote} as placeholders, e.g. `git push -f {remote} {branch}`");
    }
    Ok(())
}

fn get_config_value(config_dir: &Path, key: &str) -> Result<()> {
    let settings = load_settings(config_dir)?;
    println!("{key} = {}", display(&settings, key)?);
    Ok(())
}

fn list_config_values(config_dir: &Path) -> Result<()> {
    let settings = load_settings(config_dir)?;

    Output::section(format!(
        "prstack configuration ({})",
        config_dir.join(SETTINGS_FILE_NAME).display()
    ));
    for key in KEYS {
        println!("  {key} = {}", display(&settings, key)?);
    }
    Ok(())
}

fn display(settings: &Settings, key: &str) -> Result<String> {
    let value = settings.get_value(key)?;
    Ok(if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    })
}
