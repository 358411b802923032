//! CLI command implementations.

pub(crate) mod versions;

pub(crate) use versions::VersionsCommand;
