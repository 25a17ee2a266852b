//! Registry documents and the bundled registry variants.
//!
//! A registry document is TOML: a `[registry]` header followed by
//! `[[entities]]` records. Two documents are bundled into the binary:
//! `base` and `enhanced`. The enhanced document `extends` the base one, so
//! it is a strict superset with a larger link budget. Both are served by the
//! same engine; a variant is configuration, not a separate code path.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::entity::EntityLink;
use crate::error::{ConfigError, RegistryError, RegistryResult};
use crate::registry::EntityRegistry;

/// Which bundled registry to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryVariant {
    #[default]
    Base,
    Enhanced,
}

impl RegistryVariant {
    pub const ALL: [RegistryVariant; 2] = [Self::Base, Self::Enhanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Enhanced => "enhanced",
        }
    }

    /// Link budget used when neither config nor document set one.
    pub fn default_budget(&self) -> usize {
        match self {
            Self::Base => 35,
            Self::Enhanced => 75,
        }
    }

    fn document(&self) -> &'static str {
        match self {
            Self::Base => BASE_TOML,
            Self::Enhanced => ENHANCED_TOML,
        }
    }
}

impl std::fmt::Display for RegistryVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistryVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "enhanced" => Ok(Self::Enhanced),
            _ => Err(ConfigError::UnknownVariant {
                value: s.to_string(),
            }),
        }
    }
}

// ── Document format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RegistryToml {
    registry: RegistryMeta,
    #[serde(default)]
    entities: Vec<EntityLink>,
}

#[derive(Debug, Deserialize)]
struct RegistryMeta {
    id: String,
    #[serde(default)]
    #[allow(dead_code)]
    description: String,
    #[serde(default)]
    budget: Option<usize>,
    #[serde(default)]
    extends: Option<String>,
}

// ── Bundled documents ───────────────────────────────────────────────────

const BASE_TOML: &str = include_str!("../../data/registries/base.toml");
const ENHANCED_TOML: &str = include_str!("../../data/registries/enhanced.toml");

static BASE: OnceLock<Arc<EntityRegistry>> = OnceLock::new();
static ENHANCED: OnceLock<Arc<EntityRegistry>> = OnceLock::new();

/// The shared bundled registry for `variant`, built on first use.
///
/// A bundled document that fails to parse or validate is an error like any
/// other registry; nothing is cached until a load succeeds.
pub fn bundled(variant: RegistryVariant) -> RegistryResult<Arc<EntityRegistry>> {
    let cell = match variant {
        RegistryVariant::Base => &BASE,
        RegistryVariant::Enhanced => &ENHANCED,
    };
    if let Some(registry) = cell.get() {
        return Ok(Arc::clone(registry));
    }
    let registry = load_registry_str(variant.document())?;
    Ok(Arc::clone(cell.get_or_init(|| Arc::new(registry))))
}

/// Parse and validate a registry document.
pub fn load_registry_str(text: &str) -> RegistryResult<EntityRegistry> {
    let (id, budget, entities) = resolve_document(text)?;
    let registry = EntityRegistry::build(id, entities)?;
    Ok(match budget {
        Some(b) => registry.with_default_budget(b),
        None => registry,
    })
}

/// Read, parse and validate a registry file.
pub fn load_registry_file(path: &Path) -> RegistryResult<EntityRegistry> {
    let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_registry_str(&text)
}

/// Parse a document and flatten its `extends` chain: parent entities first.
fn resolve_document(text: &str) -> RegistryResult<(String, Option<usize>, Vec<EntityLink>)> {
    let parsed: RegistryToml = toml::from_str(text).map_err(|e| RegistryError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;
    let RegistryToml { registry, entities } = parsed;

    let Some(parent) = registry.extends else {
        return Ok((registry.id, registry.budget, entities));
    };

    let parent_variant: RegistryVariant =
        parent.parse().map_err(|_| RegistryError::UnknownParent {
            id: registry.id.clone(),
            parent: parent.clone(),
        })?;
    if parent_variant.as_str() == registry.id {
        return Err(RegistryError::UnknownParent {
            id: registry.id,
            parent,
        });
    }

    let (_, parent_budget, mut merged) = resolve_document(parent_variant.document())?;
    merged.extend(entities);
    Ok((registry.id, registry.budget.or(parent_budget), merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Category;

    #[test]
    fn bundled_registries_load() {
        for variant in RegistryVariant::ALL {
            let reg = bundled(variant).unwrap();
            assert!(!reg.is_empty(), "{variant} registry is empty");
            assert_eq!(reg.id(), variant.as_str());
            assert_eq!(reg.default_budget(), Some(variant.default_budget()));
        }
    }

    #[test]
    fn enhanced_is_superset_of_base() {
        let base = bundled(RegistryVariant::Base).unwrap();
        let enhanced = bundled(RegistryVariant::Enhanced).unwrap();
        assert!(enhanced.len() > base.len());
        for entity in base.iter() {
            assert_eq!(enhanced.get(&entity.name), Some(entity));
        }
    }

    #[test]
    fn bundled_registry_is_shared() {
        let a = bundled(RegistryVariant::Base).unwrap();
        let b = bundled(RegistryVariant::Base).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn variant_from_str() {
        assert_eq!("Enhanced".parse::<RegistryVariant>().unwrap(), RegistryVariant::Enhanced);
        assert!(matches!(
            "huge".parse::<RegistryVariant>(),
            Err(ConfigError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn load_custom_document() {
        let reg = load_registry_str(
            r#"
            [registry]
            id = "test"
            budget = 2

            [[entities]]
            name = "Sketch"
            url = "https://sketch.example"
            category = "restaurant"
            priority = 10
            "#,
        )
        .unwrap();
        assert_eq!(reg.id(), "test");
        assert_eq!(reg.default_budget(), Some(2));
        assert_eq!(reg.get("Sketch").map(|e| e.category), Some(Category::Restaurant));
    }

    #[test]
    fn custom_document_can_extend_base() {
        let reg = load_registry_str(
            r#"
            [registry]
            id = "mine"
            extends = "base"

            [[entities]]
            name = "Brixton Village"
            url = "https://brixton.example"
            category = "shopping"
            priority = 3
            "#,
        )
        .unwrap();
        let base = bundled(RegistryVariant::Base).unwrap();
        assert_eq!(reg.len(), base.len() + 1);
        assert_eq!(reg.default_budget(), Some(35));
    }

    #[test]
    fn redefining_a_parent_entity_is_rejected() {
        let base = bundled(RegistryVariant::Base).unwrap();
        let existing = base.iter().next().unwrap();
        let doc = format!(
            "[registry]\nid = \"dup\"\nextends = \"base\"\n\n[[entities]]\nname = \"{}\"\nurl = \"https://x.example\"\ncategory = \"venue\"\npriority = 1\n",
            existing.name.replace('"', "\\\"")
        );
        assert!(matches!(
            load_registry_str(&doc),
            Err(RegistryError::DuplicateName { .. })
        ));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let err = load_registry_str("[registry]\nid = \"x\"\nextends = \"london\"\n").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownParent { .. }));
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let err = load_registry_str("[[entities]]\nname = 3\n").unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }
}
