//! Linker configuration, persisted as TOML.
//!
//! A config picks a registry (bundled variant or external file), optionally
//! overrides the link budget, and sets the attributes of injected anchors.
//!
//! ```toml
//! variant = "enhanced"
//! budget = 50
//! registry_path = "venues.toml"
//!
//! [anchor]
//! target = "_blank"
//! rel_extra = ["external"]
//! class = "entity-link"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, RegistryVariant};
use crate::error::{ConfigError, ConfigResult, RegistryResult};
use crate::registry::EntityRegistry;

/// `rel` tokens every injected anchor carries. Extra tokens are appended.
pub const SAFE_REL: [&str; 2] = ["noopener", "noreferrer"];

/// Attributes written onto every injected anchor besides `href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorAttributes {
    /// `target` attribute; omitted when `None` or blank.
    #[serde(default = "default_target")]
    pub target: Option<String>,
    /// Additional `rel` tokens appended after `noopener noreferrer`.
    #[serde(default)]
    pub rel_extra: Vec<String>,
    /// Presentational `class`; omitted when `None` or blank.
    #[serde(default = "default_class")]
    pub class: Option<String>,
}

fn default_target() -> Option<String> {
    Some("_blank".into())
}
fn default_class() -> Option<String> {
    Some("entity-link".into())
}

impl Default for AnchorAttributes {
    fn default() -> Self {
        Self {
            target: default_target(),
            rel_extra: Vec::new(),
            class: default_class(),
        }
    }
}

impl AnchorAttributes {
    /// The full `rel` value: safe tokens first, then configured extras, no repeats.
    pub fn rel(&self) -> String {
        let mut tokens: Vec<&str> = SAFE_REL.to_vec();
        for extra in self.rel_extra.iter().flat_map(|e| e.split_whitespace()) {
            if !tokens.iter().any(|t| t.eq_ignore_ascii_case(extra)) {
                tokens.push(extra);
            }
        }
        tokens.join(" ")
    }

    /// Render `text` wrapped in an anchor pointing at `url`.
    pub fn render(&self, url: &str, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + url.len() + 96);
        out.push_str("<a href=\"");
        out.push_str(&escape_attr(url));
        out.push('"');
        if let Some(target) = self.target.as_deref().filter(|t| !t.trim().is_empty()) {
            out.push_str(" target=\"");
            out.push_str(&escape_attr(target));
            out.push('"');
        }
        out.push_str(" rel=\"");
        out.push_str(&escape_attr(&self.rel()));
        out.push('"');
        if let Some(class) = self.class.as_deref().filter(|c| !c.trim().is_empty()) {
            out.push_str(" class=\"");
            out.push_str(&escape_attr(class));
            out.push('"');
        }
        out.push('>');
        out.push_str(text);
        out.push_str("</a>");
        out
    }
}

/// Escape a value for use inside a double-quoted HTML attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Linker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Bundled registry to use when `registry_path` is not set.
    #[serde(default)]
    pub variant: RegistryVariant,
    /// Link budget override.
    #[serde(default)]
    pub budget: Option<usize>,
    /// External registry file; takes precedence over `variant`.
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    #[serde(default)]
    pub anchor: AnchorAttributes,
}

impl LinkerConfig {
    /// Config for a bundled variant with its default budget.
    pub fn for_variant(variant: RegistryVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// Load a config file. A relative `registry_path` resolves against the
    /// config file's directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text, &path.display().to_string())?;
        if let (Some(registry_path), Some(dir)) = (config.registry_path.as_mut(), path.parent()) {
            if registry_path.is_relative() {
                *registry_path = dir.join(&*registry_path);
            }
        }
        Ok(config)
    }

    /// Parse a config from TOML text. `origin` names the source in errors.
    pub fn from_toml_str(text: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve the registry this config names.
    pub fn resolve_registry(&self) -> RegistryResult<Arc<EntityRegistry>> {
        match &self.registry_path {
            Some(path) => catalog::load_registry_file(path).map(Arc::new),
            None => catalog::bundled(self.variant),
        }
    }

    /// Budget precedence: explicit override, then the registry document's
    /// budget, then the variant default.
    pub fn effective_budget(&self, registry: &EntityRegistry) -> usize {
        self.budget
            .or_else(|| registry.default_budget())
            .unwrap_or_else(|| self.variant.default_budget())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_anchor_renders_documented_contract() {
        let html = AnchorAttributes::default().render("https://sketch.example", "Sketch");
        assert_eq!(
            html,
            r#"<a href="https://sketch.example" target="_blank" rel="noopener noreferrer" class="entity-link">Sketch</a>"#
        );
    }

    #[test]
    fn rel_always_keeps_safe_tokens() {
        let anchor = AnchorAttributes {
            rel_extra: vec!["NOOPENER".into(), "external nofollow".into(), "external".into()],
            ..Default::default()
        };
        assert_eq!(anchor.rel(), "noopener noreferrer external nofollow");
    }

    #[test]
    fn blank_target_and_class_are_omitted() {
        let anchor = AnchorAttributes {
            target: Some(String::new()),
            rel_extra: Vec::new(),
            class: None,
        };
        assert_eq!(
            anchor.render("/x", "Soho"),
            r#"<a href="/x" rel="noopener noreferrer">Soho</a>"#
        );
    }

    #[test]
    fn urls_are_attribute_escaped() {
        let html = AnchorAttributes::default().render("https://x.example/?a=1&b=\"2\"", "X");
        assert!(html.contains(r#"href="https://x.example/?a=1&amp;b=&quot;2&quot;""#));
    }

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let config = LinkerConfig::from_toml_str("", "inline").unwrap();
        assert_eq!(config, LinkerConfig::default());
        assert_eq!(config.variant, RegistryVariant::Base);
    }

    #[test]
    fn parse_full_config() {
        let config = LinkerConfig::from_toml_str(
            r#"
            variant = "enhanced"
            budget = 12
            [anchor]
            class = "venue"
            rel_extra = ["external"]
            "#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.variant, RegistryVariant::Enhanced);
        assert_eq!(config.budget, Some(12));
        assert_eq!(config.anchor.class.as_deref(), Some("venue"));
        assert_eq!(config.anchor.target.as_deref(), Some("_blank"));
    }

    #[test]
    fn unknown_variant_is_a_parse_error() {
        let err = LinkerConfig::from_toml_str("variant = \"huge\"", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn effective_budget_precedence() {
        let registry = EntityRegistry::new(Vec::new()).unwrap();
        let config = LinkerConfig::for_variant(RegistryVariant::Enhanced);
        assert_eq!(config.effective_budget(&registry), 75);

        let with_doc_budget = EntityRegistry::new(Vec::new()).unwrap().with_default_budget(20);
        assert_eq!(config.effective_budget(&with_doc_budget), 20);

        let overridden = LinkerConfig {
            budget: Some(3),
            ..config
        };
        assert_eq!(overridden.effective_budget(&with_doc_budget), 3);
    }
}
