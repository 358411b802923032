//! `rw versions url` command implementation.

use std::path::PathBuf;

use clap::Args;
use rw_config::Config;
use rw_versions::{VersionResolver, find_option, version_switcher};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the versions url command.
#[derive(Args)]
pub(crate) struct UrlArgs {
    /// Page URL (absolute or path-only).
    url: String,

    /// Target version slug, or `current` (default: list every version).
    #[arg(long)]
    to: Option<String>,

    /// Path to configuration file (default: auto-discover rw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl UrlArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let resolver = VersionResolver::new(config.require_versions()?, config.site_config());
        let options = version_switcher(&resolver, &self.url);

        if let Some(to) = &self.to {
            let option = find_option(&options, to)
                .ok_or_else(|| CliError::Validation(format!("Unknown version '{to}'")))?;
            output.data(&option.url)?;
            return Ok(());
        }

        for option in &options {
            let line = format!("{:<12} {}", option.identifier, option.url);
            if option.selected {
                output.highlight(&line);
            } else {
                output.detail(&line);
            }
        }

        Ok(())
    }
}
