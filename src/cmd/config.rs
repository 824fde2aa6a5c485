use clap::{Args, Subcommand};

use crate::cmd::prompt::{PromptAction, prompt};
use crate::config::{
    StoredConfig, config_file_path, parse_debounce, parse_merge_policy, parse_transition_policy,
};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring deskflow.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("The access token is stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Ticket API base URL (e.g., http://localhost:8000)",
        &mut cfg.api_base_url,
        false,
    )?;
    apply_prompt("Access token", &mut cfg.access_token, true)?;
    apply_prompt("Log level (error/warn/info/debug)", &mut cfg.log_level, false)?;
    apply_checked_prompt("Suggestion debounce in ms", &mut cfg.debounce_ms, parse_debounce)?;
    apply_checked_prompt(
        "Suggestion merge policy (overwrite/preserve)",
        &mut cfg.merge_policy,
        parse_merge_policy,
    )?;
    apply_checked_prompt(
        "Status transition policy (unconstrained/forward-only)",
        &mut cfg.transition_policy,
        parse_transition_policy,
    )?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("API base URL: {}", display_value(&cfg.api_base_url));
    println!("Access token: {}", mask_secret(&cfg.access_token));
    println!("Log level: {}", display_value(&cfg.log_level));
    println!("Debounce (ms): {}", display_value(&cfg.debounce_ms));
    println!("Merge policy: {}", display_value(&cfg.merge_policy));
    println!(
        "Transition policy: {}",
        display_value(&cfg.transition_policy)
    );

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    let action = prompt(field, target.as_deref(), secret)?;
    apply_action(action, target);
    Ok(())
}

/// Re-prompts until the entered value passes `check`.
fn apply_checked_prompt<T>(
    field: &str,
    target: &mut Option<String>,
    check: impl Fn(&str) -> AppResult<T>,
) -> AppResult<()> {
    loop {
        let action = prompt(field, target.as_deref(), false)?;
        match checked(action, &check) {
            Ok(action) => {
                apply_action(action, target);
                return Ok(());
            }
            Err(err) => eprintln!("{err}"),
        }
    }
}

fn checked<T>(
    action: PromptAction,
    check: impl Fn(&str) -> AppResult<T>,
) -> AppResult<PromptAction> {
    if let PromptAction::Set(value) = &action {
        check(value)?;
    }
    Ok(action)
}

fn apply_action(action: PromptAction, target: &mut Option<String>) {
    match action {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
