//! `rw versions list` command implementation.

use std::path::PathBuf;

use clap::Args;
use rw_config::Config;
use rw_versions::{CURRENT_IDENTIFIER, RedirectPolicy};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the versions list command.
#[derive(Args)]
pub(crate) struct ListArgs {
    /// Path to configuration file (default: auto-discover rw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ListArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let versions = config.require_versions()?;

        let current = versions.current();
        output.data(&format_row(
            CURRENT_IDENTIFIER,
            &current.label,
            current.redirect,
        ))?;
        for version in versions.versions() {
            output.data(&format_row(
                &version.slug,
                version.display_label(),
                version.redirect,
            ))?;
        }

        Ok(())
    }
}

fn format_row(identifier: &str, label: &str, redirect: RedirectPolicy) -> String {
    format!("{identifier:<12} {label:<16} {redirect}")
}
