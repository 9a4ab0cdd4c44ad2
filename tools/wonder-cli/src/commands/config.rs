//! Configuration management commands.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{CliConfig, CONFIG_FILE_NAMES};
use crate::context::Context;
use crate::output::format_duration;

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate { path } => validate_config(path.as_deref(), ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let session = &ctx.config.session;
    ctx.output.info("[session]");
    ctx.output.kv(
        "replacement_cache_enabled",
        &session.replacement_cache_enabled.to_string(),
    );
    ctx.output.kv(
        "max_page_replacement_cache_size",
        &session.max_page_replacement_cache_size.to_string(),
    );
    ctx.output
        .kv("generations_per_slot", &session.generations_per_slot.to_string());
    ctx.output.kv(
        "replacement_grace_period",
        &format_duration(session.replacement_grace_period_secs),
    );
    ctx.output
        .kv("page_cache_size", &session.page_cache_size.to_string());
    ctx.output.kv(
        "permanent_page_cache_size",
        &session.permanent_page_cache_size.to_string(),
    );
    ctx.output
        .kv("override_private_cache", &session.override_private_cache.to_string());
    ctx.output
        .kv("stores_page_info", &session.stores_page_info.to_string());
    ctx.output.kv(
        "replacement_capacity",
        &session.replacement_capacity().to_string(),
    );

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    CliConfig::default().save(&config_path.to_string_lossy())?;
    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(path: Option<&str>, ctx: &Context) -> Result<()> {
    let config = match path {
        Some(path) => {
            let resolved = ctx.resolve_path(path);
            CliConfig::load(&resolved.to_string_lossy())?
        }
        None => {
            if ctx.config_path.is_none() {
                ctx.output
                    .warn("No config file found; validating defaults");
            }
            ctx.config.clone()
        }
    };

    config.session.validate()?;

    let session = &config.session;
    if !session.replacement_cache_enabled {
        ctx.output
            .warn("replacement cache disabled; fragment updates will use the backtrack cache");
    }
    if session.max_page_replacement_cache_size == 0 {
        ctx.output
            .warn("max_page_replacement_cache_size is 0; nothing will be kept across fragment updates");
    }
    if session.page_cache_size == 0 {
        ctx.output
            .warn("page_cache_size is 0; backtracking is disabled");
    }

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "valid": true, "session": session }));
    } else {
        ctx.output.success("Configuration is valid");
    }

    Ok(())
}
