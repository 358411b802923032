//! `rw versions snapshot` command implementation.

use std::path::PathBuf;

use clap::Args;
use rw_config::{CliSettings, Config};
use rw_storage::FsStorage;
use rw_versions::SnapshotBuilder;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the versions snapshot command.
#[derive(Args)]
pub(crate) struct SnapshotArgs {
    /// Path to configuration file (default: auto-discover rw.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Enable verbose output (show created version summary logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl SnapshotArgs {
    /// Execute the snapshot command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the snapshot fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let versions = config.require_versions()?;
        let snapshot_config = config.snapshot_config();

        output.info(&format!(
            "Source: {}",
            snapshot_config.docs_dir.display()
        ));

        if config.sidebar.is_none() {
            output.warning("No [[sidebar]] configured, new versions get an autogenerated sidebar");
        }

        let storage = FsStorage::new();
        let builder = SnapshotBuilder::new(&storage, &versions, &snapshot_config);

        match builder.build(config.sidebar.as_deref())? {
            Some(report) => {
                output.success(&format!("Created version '{}'", report.version.slug));
                output.info(&format!("Documents rewritten: {}", report.documents));
                output.info(&format!("Files copied: {}", report.copied_files));
                output.info(&format!("Assets copied: {}", report.assets));
            }
            None => output.info("All configured versions already exist"),
        }

        Ok(())
    }
}
