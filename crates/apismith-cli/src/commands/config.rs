//! `apismith config`: show the resolved configuration.

use std::path::Path;

use anyhow::{Context, Result};
use apismith_core::Config;

/// Print the configuration file path, or the resolved settings as TOML.
///
/// `explicit` is the `--config` file when one was given.
pub fn show(config: &Config, explicit: Option<&Path>, path_only: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    let origin = if path.exists() { "" } else { " (not present, defaults)" };
    println!("# {}{origin}", path.display());
    print!("{rendered}");
    Ok(())
}
