// SPDX-FileCopyrightText: 2026 Leasesign Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Leasesign signature service.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use leasesign_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Webhook path: {}", config.gateway.webhook_path);
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, TomlSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LeasesignConfig;

/// Load the layered configuration and validate it.
///
/// Deserialization errors are converted to miette diagnostics resolved
/// against every config file that exists on disk.
pub fn load_and_validate() -> Result<LeasesignConfig, Vec<ConfigError>> {
    checked(loader::load_config(), existing_config_files)
}

/// Load `path` (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<LeasesignConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Validate an inline TOML document. Environment variables are not consulted.
pub fn load_and_validate_str(toml_content: &str) -> Result<LeasesignConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a loaded config, or explain why it could not be loaded.
///
/// `sources` is only evaluated on the error path.
fn checked(
    loaded: Result<LeasesignConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<TomlSource>,
) -> Result<LeasesignConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Every file of the lookup hierarchy that can be read, local first.
fn existing_config_files() -> Vec<TomlSource> {
    let local = std::env::current_dir()
        .map(|dir| dir.join(loader::LOCAL_CONFIG_FILE))
        .unwrap_or_else(|_| PathBuf::from(loader::LOCAL_CONFIG_FILE));

    let candidates = std::iter::once(local)
        .chain(loader::user_config_path())
        .chain(std::iter::once(PathBuf::from(loader::SYSTEM_CONFIG_PATH)));
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<TomlSource> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
