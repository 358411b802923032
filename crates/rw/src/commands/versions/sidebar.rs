//! `rw versions sidebar` command implementation.

use std::path::PathBuf;

use clap::Args;
use rw_config::Config;
use rw_storage::FsStorage;
use rw_versions::{FrozenSidebarStore, compose_sidebar};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the versions sidebar command.
#[derive(Args)]
pub(crate) struct SidebarArgs {
    /// Path to configuration file (default: auto-discover rw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl SidebarArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), None)?;
        let versions = config.require_versions()?;

        let storage = FsStorage::new();
        let store = FrozenSidebarStore::new(&storage, config.docs_resolved.versions_dir.clone());
        let live = config.sidebar.as_deref().unwrap_or_default();

        let composed = compose_sidebar(live, &versions, &store)?;
        output.data(&serde_json::to_string_pretty(&composed)?)?;

        Ok(())
    }
}
