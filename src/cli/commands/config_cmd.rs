//! config command - Show or initialize configuration

use crate::cli::Context;
use crate::core::config::Config;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the effective configuration, flags applied.
pub fn show(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    match config.loaded_from() {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no config file found, using defaults"),
    }
    println!("server = {}", ctx.server_addr(&config));
    println!("client = {}", ctx.client_addr(&config));

    Ok(())
}

/// Write the defaults to `--config` or the canonical location.
pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = match &ctx.config_path {
        Some(path) => path.clone(),
        None => Config::default_path().context("Failed to locate config directory")?,
    };

    if force && path.exists() {
        output::warn(
            format!("Overwriting existing {}", path.display()),
            ctx.verbosity(),
        );
    }

    Config::write(&path, &Config::defaults_file(), force)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::print(
        format!("Wrote default configuration to {}", path.display()),
        ctx.verbosity(),
    );
    Ok(())
}
