//! Configuration management for RW.
//!
//! Parses `rw.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Expansion
//!
//! `[docs]` values are expanded before paths are resolved:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - a leading `~` - expands to the home directory (directories only)
//!
//! Expanded fields:
//! - `docs.source_dir`, `docs.public_dir`, `docs.versions_dir`
//! - `docs.base` (variables only)

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rw_versions::{
    ArchivedVersion, CurrentVersion, OutputFormat, SidebarNode, SiteConfig, SnapshotConfig,
    VersionSet,
};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override docs source directory.
    pub source_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "rw.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Settings of the live content.
    pub current: CurrentVersion,
    /// Declared versions, newest first.
    pub versions: Vec<ArchivedVersion>,
    /// Live sidebar; frozen into each new version.
    pub sidebar: Option<Vec<SidebarNode>>,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    public_dir: Option<String>,
    versions_dir: Option<String>,
    base: Option<String>,
    format: Option<OutputFormat>,
    locales: Option<Vec<String>>,
}

/// Resolved documentation configuration with absolute paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Docs root holding the live content and version directories.
    pub source_dir: PathBuf,
    /// Static files directory.
    pub public_dir: PathBuf,
    /// Directory of frozen sidebars.
    pub versions_dir: PathBuf,
    /// Site base path (e.g., `/docs`).
    pub base: Option<String>,
    /// Page addressing mode.
    pub format: OutputFormat,
    /// Declared locales.
    pub locales: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Cannot expand ${{{var}}} in {field}: {reason}")]
    EnvVar {
        /// Config field path (e.g., "`docs.base`").
        field: String,
        /// Referenced variable.
        var: String,
        /// Lookup failure.
        reason: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a version slug to be usable as a single URL segment.
fn require_slug(slug: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(slug, field)?;
    if slug.starts_with('/') || slug.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} cannot start or end with '/'"
        )));
    }
    if slug.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} cannot contain whitespace"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `rw.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
    }

    /// Get the validated version set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if no version is declared or a slug
    /// is invalid.
    pub fn require_versions(&self) -> Result<VersionSet, ConfigError> {
        self.validate_versions()?;
        VersionSet::new(self.versions.clone(), self.current.clone())
            .map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Snapshot settings derived from the resolved docs configuration.
    #[must_use]
    pub fn snapshot_config(&self) -> SnapshotConfig {
        SnapshotConfig {
            docs_dir: self.docs_resolved.source_dir.clone(),
            public_dir: self.docs_resolved.public_dir.clone(),
            versions_dir: self.docs_resolved.versions_dir.clone(),
            locales: self.docs_resolved.locales.clone(),
            base: self.docs_resolved.base.clone(),
        }
    }

    /// URL settings derived from the resolved docs configuration.
    #[must_use]
    pub fn site_config(&self) -> SiteConfig {
        SiteConfig {
            base: self.docs_resolved.base.clone(),
            locales: self.docs_resolved.locales.clone(),
            format: self.docs_resolved.format,
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            current: CurrentVersion::default(),
            versions: Vec::new(),
            sidebar: None,
            docs_resolved: DocsConfig {
                source_dir: base.join("docs"),
                public_dir: base.join("public"),
                versions_dir: base.join(".rw").join("versions"),
                base: None,
                format: OutputFormat::default(),
                locales: Vec::new(),
            },
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_docs()?;
        self.validate_versions()?;
        Ok(())
    }

    /// Validate docs configuration.
    fn validate_docs(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.docs_resolved.base
            && !base.starts_with('/')
        {
            return Err(ConfigError::Validation(
                "docs.base must start with '/'".to_owned(),
            ));
        }

        for locale in &self.docs_resolved.locales {
            require_slug(locale, "docs.locales")?;
        }

        Ok(())
    }

    /// Validate the version list.
    fn validate_versions(&self) -> Result<(), ConfigError> {
        if self.versions.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[versions]] entry is required".to_owned(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.versions.len());
        for version in &self.versions {
            require_slug(&version.slug, "versions.slug")?;
            if !seen.insert(version.slug.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "version '{}' is declared more than once",
                    version.slug
                )));
            }
        }

        require_non_empty(&self.current.label, "current.label")?;
        Ok(())
    }

    /// Expand `~` and environment variable references in `[docs]` values.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let docs = &mut self.docs;
        for (value, field) in [
            (&mut docs.source_dir, "docs.source_dir"),
            (&mut docs.public_dir, "docs.public_dir"),
            (&mut docs.versions_dir, "docs.versions_dir"),
        ] {
            if let Some(dir) = value.as_deref() {
                *value = Some(expand::expand_dir(dir, field)?);
            }
        }
        if let Some(base) = docs.base.as_deref() {
            docs.base = Some(expand::expand_base(base, "docs.base")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref(), "docs"),
            public_dir: resolve(self.docs.public_dir.as_deref(), "public"),
            versions_dir: resolve(self.docs.versions_dir.as_deref(), ".rw/versions"),
            base: self
                .docs
                .base
                .as_deref()
                .map(|base| base.trim_end_matches('/'))
                .filter(|base| !base.is_empty())
                .map(str::to_owned),
            format: self.docs.format.unwrap_or_default(),
            locales: self.docs.locales.clone().unwrap_or_default(),
        };
    }
}
