//! `rw versions` subcommand group.

mod list;
mod sidebar;
mod snapshot;
mod url;

use clap::Subcommand;

use list::ListArgs;
use sidebar::SidebarArgs;
use snapshot::SnapshotArgs;
use url::UrlArgs;

use crate::error::CliError;

/// Versioning commands.
#[derive(Subcommand)]
pub(crate) enum VersionsCommand {
    /// Create the newly declared version from the live docs.
    Snapshot(SnapshotArgs),
    /// Print the composed sidebar of every version as JSON.
    Sidebar(SidebarArgs),
    /// Rewrite a page URL to another version.
    Url(UrlArgs),
    /// List configured versions.
    List(ListArgs),
}

impl VersionsCommand {
    /// Whether verbose logging was requested.
    pub(crate) fn verbose(&self) -> bool {
        matches!(self, Self::Snapshot(args) if args.verbose)
    }

    /// Execute the versions subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Snapshot(args) => args.execute(),
            Self::Sidebar(args) => args.execute(),
            Self::Url(args) => args.execute(),
            Self::List(args) => args.execute(),
        }
    }
}
