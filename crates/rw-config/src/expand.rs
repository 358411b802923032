//! Expansion of `~` and environment variables in `[docs]` values.

use std::borrow::Cow;
use std::env::VarError;

use shellexpand::LookupError;

use crate::ConfigError;

/// Expand a directory setting: a leading `~` and `${VAR}` references.
pub(crate) fn expand_dir(value: &str, field: &str) -> Result<String, ConfigError> {
    expand_dir_with_home(value, field, home_dir())
}

/// Expand `${VAR}` references in the site base path.
///
/// Values without `${` are returned unchanged, so bare `$` characters are
/// left alone.
pub(crate) fn expand_base(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }
    shellexpand::env_with_context(value, lookup)
        .map(Cow::into_owned)
        .map_err(|e| unresolved(field, e))
}

fn expand_dir_with_home(
    value: &str,
    field: &str,
    home: Option<String>,
) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(shellexpand::tilde_with_context(value, || home).into_owned());
    }
    shellexpand::full_with_context(value, || home, lookup)
        .map(Cow::into_owned)
        .map_err(|e| unresolved(field, e))
}

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok().filter(|home| !home.is_empty())
}

fn lookup(var: &str) -> Result<Option<String>, VarError> {
    std::env::var(var).map(Some)
}

fn unresolved(field: &str, error: LookupError<VarError>) -> ConfigError {
    ConfigError::EnvVar {
        field: field.to_owned(),
        var: error.var_name,
        reason: error.cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn home() -> Option<String> {
        Some("/home/writer".to_owned())
    }

    #[test]
    fn test_expand_dir_tilde() {
        let dir = expand_dir_with_home("~/site/docs", "docs.source_dir", home()).unwrap();

        assert_eq!(dir, "/home/writer/site/docs");
    }

    #[test]
    fn test_expand_dir_tilde_without_home() {
        let dir = expand_dir_with_home("~/site/docs", "docs.source_dir", None).unwrap();

        assert_eq!(dir, "~/site/docs");
    }

    #[test]
    fn test_expand_dir_tilde_only_leading() {
        let dir = expand_dir_with_home("site/~draft", "docs.public_dir", home()).unwrap();

        assert_eq!(dir, "site/~draft");
    }

    #[test]
    fn test_expand_dir_tilde_and_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("RW_TEST_SITE_ROOT", "portal");
        }
        let dir =
            expand_dir_with_home("~/${RW_TEST_SITE_ROOT}/public", "docs.public_dir", home())
                .unwrap();
        assert_eq!(dir, "/home/writer/portal/public");
        unsafe {
            std::env::remove_var("RW_TEST_SITE_ROOT");
        }
    }

    #[test]
    fn test_expand_dir_default_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("RW_TEST_UNSET_VERSIONS");
        }
        let dir = expand_dir_with_home(
            "${RW_TEST_UNSET_VERSIONS:-.rw/versions}",
            "docs.versions_dir",
            home(),
        )
        .unwrap();

        assert_eq!(dir, ".rw/versions");
    }

    #[test]
    fn test_expand_base_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("RW_TEST_BRANCH", "main");
        }
        let base = expand_base("/preview/${RW_TEST_BRANCH}", "docs.base").unwrap();
        assert_eq!(base, "/preview/main");
        unsafe {
            std::env::remove_var("RW_TEST_BRANCH");
        }
    }

    #[test]
    fn test_expand_base_keeps_tilde_and_bare_dollar() {
        assert_eq!(expand_base("/~team/$draft", "docs.base").unwrap(), "/~team/$draft");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("RW_TEST_MISSING");
        }
        let err = expand_base("${RW_TEST_MISSING}", "docs.base").unwrap_err();

        assert!(matches!(
            &err,
            ConfigError::EnvVar { field, var, .. } if field == "docs.base" && var == "RW_TEST_MISSING"
        ));
        assert_eq!(
            err.to_string(),
            "Cannot expand ${RW_TEST_MISSING} in docs.base: environment variable not found"
        );
    }
}
