//! Version snapshots.
//!
//! A snapshot freezes the live docs tree into `<docs>/<slug>/` (or
//! `<docs>/<locale>/<slug>/` for locale directories) for the single declared
//! version that has no directory yet.
//!
//! Building runs in two phases. The pure phase walks the tree, reads every
//! file and rewrites documents in parallel; nothing is written. The commit
//! phase then writes documents, copies files and queued assets, and freezes
//! the live sidebar. A failure in the pure phase leaves the tree untouched.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rw_storage::{Storage, StorageError};

use crate::asset::Asset;
use crate::error::VersionError;
use crate::path::{doc_locale, doc_slug, is_document, is_locale};
use crate::rewrite::{DocumentContext, rewrite_document};
use crate::sidebar::{FrozenSidebar, FrozenSidebarStore, SidebarNode};
use crate::version::{ArchivedVersion, VersionSet};

/// Snapshot locations and site settings.
#[derive(Clone, Debug)]
pub struct SnapshotConfig {
    /// Docs root (e.g., `src/content/docs`).
    pub docs_dir: PathBuf,
    /// Static files directory (e.g., `public`).
    pub public_dir: PathBuf,
    /// Directory of frozen sidebars.
    pub versions_dir: PathBuf,
    /// Declared locales.
    pub locales: Vec<String>,
    /// Site base path (e.g., `/docs`).
    pub base: Option<String>,
}

/// Summary of a created version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Created version.
    pub version: ArchivedVersion,
    /// Number of rewritten documents.
    pub documents: usize,
    /// Number of files copied verbatim.
    pub copied_files: usize,
    /// Number of distinct assets copied.
    pub assets: usize,
}

/// File discovered by the walk.
#[derive(Debug)]
struct Job {
    source: PathBuf,
    destination: PathBuf,
}

/// Outcome of the pure phase for one file.
enum Prepared {
    Document {
        destination: PathBuf,
        content: String,
        assets: Vec<Asset>,
    },
    Copy {
        source: PathBuf,
        destination: PathBuf,
    },
}

/// Creates the snapshot of a new version.
pub struct SnapshotBuilder<'a, S: Storage + ?Sized> {
    storage: &'a S,
    versions: &'a VersionSet,
    config: &'a SnapshotConfig,
}

impl<'a, S: Storage + ?Sized> SnapshotBuilder<'a, S> {
    /// Create a builder.
    pub fn new(storage: &'a S, versions: &'a VersionSet, config: &'a SnapshotConfig) -> Self {
        Self {
            storage,
            versions,
            config,
        }
    }

    /// Find the declared version without a directory under the docs root.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::EmptySourceTree`] if the docs root is missing
    /// and [`VersionError::AmbiguousSnapshot`] if more than one version has no
    /// directory.
    pub fn detect_new_version(&self) -> Result<Option<&'a ArchivedVersion>, VersionError> {
        let docs_dir = &self.config.docs_dir;
        if !self.storage.is_dir(docs_dir) {
            return Err(VersionError::EmptySourceTree {
                path: docs_dir.clone(),
            });
        }

        let dirs: HashSet<String> = self
            .storage
            .list(docs_dir)?
            .into_iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.name)
            .collect();

        let missing: Vec<&'a ArchivedVersion> = self
            .versions
            .versions()
            .iter()
            .filter(|version| !dirs.contains(&version.slug))
            .collect();

        match missing.as_slice() {
            [] => Ok(None),
            [version] => Ok(Some(version)),
            _ => Err(VersionError::AmbiguousSnapshot {
                slugs: missing.iter().map(|version| version.slug.clone()).collect(),
            }),
        }
    }

    /// Create the snapshot of the new version, if any.
    ///
    /// `live_sidebar` is frozen as the version's sidebar.
    ///
    /// # Errors
    ///
    /// Returns an error if the new version is ambiguous, the docs root is
    /// empty, a document fails to rewrite, a referenced asset is missing or a
    /// write fails.
    pub fn build(
        &self,
        live_sidebar: Option<&[SidebarNode]>,
    ) -> Result<Option<SnapshotReport>, VersionError> {
        let Some(version) = self.detect_new_version()? else {
            tracing::debug!("Every configured version already exists");
            return Ok(None);
        };

        let jobs = self.collect_jobs(version)?;
        if jobs.is_empty() {
            return Err(VersionError::EmptySourceTree {
                path: self.config.docs_dir.clone(),
            });
        }

        let prepared = jobs
            .par_iter()
            .map(|job| self.prepare(job, version))
            .collect::<Result<Vec<_>, _>>()?;

        let report = self.commit(version, prepared)?;

        FrozenSidebarStore::new(self.storage, &self.config.versions_dir).write(
            &version.slug,
            &FrozenSidebar {
                sidebar: live_sidebar.map(<[SidebarNode]>::to_vec),
            },
        )?;

        tracing::info!(
            documents = report.documents,
            files = report.copied_files,
            assets = report.assets,
            "Created new version '{}'",
            version.slug
        );
        Ok(Some(report))
    }

    fn is_locale(&self, name: &str) -> bool {
        is_locale(name, &self.config.locales)
    }

    /// List every file to snapshot with its versioned destination.
    fn collect_jobs(&self, version: &ArchivedVersion) -> Result<Vec<Job>, VersionError> {
        let root = &self.config.docs_dir;
        let mut jobs = Vec::new();

        for entry in self.storage.list(root)? {
            if is_hidden(&entry.name) {
                continue;
            }
            if !entry.is_dir() {
                jobs.push(Job {
                    destination: root.join(&version.slug).join(&entry.name),
                    source: entry.path,
                });
            } else if self.versions.contains(&entry.name) {
                tracing::debug!(path = %entry.path.display(), "Skipping existing version");
            } else if self.is_locale(&entry.name) {
                let destination = root.join(&entry.name).join(&version.slug);
                self.walk(&entry.path, &destination, true, &mut jobs)?;
            } else {
                let destination = root.join(&version.slug).join(&entry.name);
                self.walk(&entry.path, &destination, false, &mut jobs)?;
            }
        }

        Ok(jobs)
    }

    fn walk(
        &self,
        source_dir: &Path,
        destination_dir: &Path,
        locale_root: bool,
        jobs: &mut Vec<Job>,
    ) -> Result<(), StorageError> {
        for entry in self.storage.list(source_dir)? {
            if is_hidden(&entry.name) {
                continue;
            }
            let destination = destination_dir.join(&entry.name);
            if !entry.is_dir() {
                jobs.push(Job {
                    source: entry.path,
                    destination,
                });
            } else if locale_root && self.versions.contains(&entry.name) {
                tracing::debug!(path = %entry.path.display(), "Skipping existing version");
            } else {
                self.walk(&entry.path, &destination, false, jobs)?;
            }
        }
        Ok(())
    }

    /// Pure phase for one file: read and rewrite, without writing.
    fn prepare(&self, job: &Job, version: &ArchivedVersion) -> Result<Prepared, VersionError> {
        if !is_document(&job.source) {
            return Ok(Prepared::Copy {
                source: job.source.clone(),
                destination: job.destination.clone(),
            });
        }

        self.rewrite(job, version)
            .map_err(|source| VersionError::Rewrite {
                path: job.source.clone(),
                source: Box::new(source),
            })
    }

    fn rewrite(&self, job: &Job, version: &ArchivedVersion) -> Result<Prepared, VersionError> {
        let source = self.storage.read(&job.source)?;
        let relative = job
            .source
            .strip_prefix(&self.config.docs_dir)
            .unwrap_or(&job.source);
        let slug = doc_slug(relative);

        let context = DocumentContext {
            locale: doc_locale(&slug, &self.config.locales),
            slug,
            locales: &self.config.locales,
            base: self.config.base.as_deref(),
            source_path: job.source.clone(),
            public_dir: &self.config.public_dir,
            version,
        };
        let output = rewrite_document(&source, &context)?;

        if let Some(missing) = output
            .assets
            .iter()
            .find(|asset| !self.storage.exists(&asset.source))
        {
            return Err(StorageError::not_found(&missing.source).into());
        }

        Ok(Prepared::Document {
            destination: job.destination.clone(),
            content: output.content,
            assets: output.assets,
        })
    }

    /// Commit phase: apply every prepared write.
    fn commit(
        &self,
        version: &ArchivedVersion,
        prepared: Vec<Prepared>,
    ) -> Result<SnapshotReport, VersionError> {
        let mut report = SnapshotReport {
            version: version.clone(),
            documents: 0,
            copied_files: 0,
            assets: 0,
        };
        let mut assets = BTreeSet::new();

        for item in prepared {
            match item {
                Prepared::Document {
                    destination,
                    content,
                    assets: document_assets,
                } => {
                    self.storage.write(&destination, &content)?;
                    tracing::debug!(path = %destination.display(), "Wrote versioned document");
                    report.documents += 1;
                    assets.extend(
                        document_assets
                            .into_iter()
                            .map(|asset| (asset.source, asset.destination)),
                    );
                }
                Prepared::Copy {
                    source,
                    destination,
                } => {
                    self.storage.copy(&source, &destination)?;
                    report.copied_files += 1;
                }
            }
        }

        for (source, destination) in assets {
            self.storage.copy(&source, &destination)?;
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Copied asset"
            );
            report.assets += 1;
        }

        Ok(report)
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
