//! Rich diagnostic error types for the venue-linker engine.
//!
//! Linking and stats are total over their inputs and never fail. Errors only
//! arise when building a registry or loading configuration, and each carries
//! a miette error code and help text so the caller knows how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for venue-linker.
#[derive(Debug, Error, Diagnostic)]
pub enum LinkerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("duplicate entity name: \"{name}\"")]
    #[diagnostic(
        code(linker::registry::duplicate_name),
        help(
            "Canonical names must be unique within a registry (compared case-insensitively). \
             Merge the two entries, or move one spelling into the other entry's `variations`."
        )
    )]
    DuplicateName { name: String },

    #[error("entity at position {index} has an empty name")]
    #[diagnostic(
        code(linker::registry::empty_name),
        help("Every entity needs a non-blank canonical `name`.")
    )]
    EmptyName { index: usize },

    #[error("entity \"{name}\" has priority {priority}, expected 1..=10")]
    #[diagnostic(
        code(linker::registry::invalid_priority),
        help("Priorities range from 1 (linked last) to 10 (linked first).")
    )]
    InvalidPriority { name: String, priority: u8 },

    #[error("entity \"{name}\" has no url")]
    #[diagnostic(
        code(linker::registry::missing_url),
        help("Set `url` to the destination the injected anchor should point at.")
    )]
    MissingUrl { name: String },

    #[error("failed to parse registry \"{id}\": {message}")]
    #[diagnostic(
        code(linker::registry::parse),
        help("Check the registry TOML syntax: a `[registry]` table followed by `[[entities]]` entries.")
    )]
    Parse { id: String, message: String },

    #[error("registry \"{id}\" extends unknown registry \"{parent}\"")]
    #[diagnostic(
        code(linker::registry::unknown_parent),
        help("`extends` may only name a bundled registry: \"base\" or \"enhanced\".")
    )]
    UnknownParent { id: String, parent: String },

    #[error("failed to read registry file: {path}")]
    #[diagnostic(code(linker::registry::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read linker config: {path}")]
    #[diagnostic(
        code(linker::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse linker config: {path}: {message}")]
    #[diagnostic(
        code(linker::config::parse),
        help("Check the TOML syntax in the linker config file.")
    )]
    Parse { path: String, message: String },

    #[error("unknown registry variant: \"{value}\"")]
    #[diagnostic(
        code(linker::config::unknown_variant),
        help("Valid variants are \"base\" and \"enhanced\".")
    )]
    UnknownVariant { value: String },
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Convenience alias for config results.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for top-level results.
pub type LinkerResult<T> = std::result::Result<T, LinkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_wraps_transparently() {
        let err: LinkerError = RegistryError::DuplicateName {
            name: "Sketch".into(),
        }
        .into();
        assert_eq!(format!("{err}"), "duplicate entity name: \"Sketch\"");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("linker::registry::duplicate_name"));
    }

    #[test]
    fn config_error_has_help() {
        let err = ConfigError::UnknownVariant {
            value: "huge".into(),
        };
        assert!(err.help().is_some());
        assert!(format!("{err}").contains("huge"));
    }
}
