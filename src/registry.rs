//! Entity registry: validated, immutable catalog of linkable entities.
//!
//! The [`EntityRegistry`] is built once and shared read-only. Construction
//! validates every record, derives the priority order, and precompiles one
//! [`SurfacePattern`] per distinct surface form so linking never compiles a
//! regex on the hot path.

use std::collections::HashMap;

use crate::entity::{EntityLink, MAX_PRIORITY, MIN_PRIORITY};
use crate::error::{RegistryError, RegistryResult};
use crate::linker::matcher::SurfacePattern;

/// Immutable, validated entity catalog with a precompiled pattern cache.
pub struct EntityRegistry {
    id: String,
    /// Entities in registry (insertion) order.
    entities: Vec<EntityLink>,
    /// Indices into `entities`, priority desc then name length desc.
    order: Vec<usize>,
    /// Normalized (lowercase) name → index into `entities`.
    by_name: HashMap<String, usize>,
    /// Lowercase surface form → compiled pattern.
    patterns: HashMap<String, SurfacePattern>,
    /// Budget suggested by the registry document, if any.
    default_budget: Option<usize>,
}

impl EntityRegistry {
    /// Build an anonymous registry. Fails fast on invalid records.
    pub fn new(entities: Vec<EntityLink>) -> RegistryResult<Self> {
        Self::build("custom", entities)
    }

    /// Build a registry with an identifier (used in logs and CLI output).
    pub fn build(id: impl Into<String>, entities: Vec<EntityLink>) -> RegistryResult<Self> {
        let id = id.into();
        let mut by_name = HashMap::with_capacity(entities.len());

        for (index, entity) in entities.iter().enumerate() {
            let normalized = entity.name.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(RegistryError::EmptyName { index });
            }
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&entity.priority) {
                return Err(RegistryError::InvalidPriority {
                    name: entity.name.clone(),
                    priority: entity.priority,
                });
            }
            if entity.url.trim().is_empty() {
                return Err(RegistryError::MissingUrl {
                    name: entity.name.clone(),
                });
            }
            if by_name.insert(normalized, index).is_some() {
                return Err(RegistryError::DuplicateName {
                    name: entity.name.clone(),
                });
            }
        }

        let mut order: Vec<usize> = (0..entities.len()).collect();
        // Stable: equal priority and name length keep registry order.
        order.sort_by(|&a, &b| {
            let (ea, eb) = (&entities[a], &entities[b]);
            eb.priority
                .cmp(&ea.priority)
                .then_with(|| eb.name_len().cmp(&ea.name_len()))
        });

        let mut patterns = HashMap::new();
        for entity in &entities {
            for form in entity.surface_forms() {
                let key = form.to_lowercase();
                if patterns.contains_key(&key) {
                    continue;
                }
                if let Some(pattern) = SurfacePattern::new(form) {
                    patterns.insert(key, pattern);
                }
            }
        }

        tracing::info!(
            registry = %id,
            entities = entities.len(),
            patterns = patterns.len(),
            "entity registry built"
        );

        Ok(Self {
            id,
            entities,
            order,
            by_name,
            patterns,
            default_budget: None,
        })
    }

    /// Attach the budget suggested by the registry document.
    pub fn with_default_budget(mut self, budget: usize) -> Self {
        self.default_budget = Some(budget);
        self
    }

    /// Registry identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Budget suggested by the registry document, if it declared one.
    pub fn default_budget(&self) -> Option<usize> {
        self.default_budget
    }

    /// Entities ordered by priority descending, then canonical-name length descending.
    pub fn sorted_by_priority(&self) -> impl ExactSizeIterator<Item = &EntityLink> + '_ {
        self.order.iter().map(|&i| &self.entities[i])
    }

    /// Entities in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, EntityLink> {
        self.entities.iter()
    }

    /// Look up an entity by canonical name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&EntityLink> {
        let normalized = name.trim().to_lowercase();
        self.by_name.get(&normalized).map(|&i| &self.entities[i])
    }

    /// The precompiled pattern for a surface form, if it belongs to this registry.
    pub fn pattern(&self, surface_form: &str) -> Option<&SurfacePattern> {
        self.patterns.get(&surface_form.trim().to_lowercase())
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of distinct compiled surface forms.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self {
            id: "empty".into(),
            entities: Vec::new(),
            order: Vec::new(),
            by_name: HashMap::new(),
            patterns: HashMap::new(),
            default_budget: None,
        }
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("id", &self.id)
            .field("count", &self.len())
            .field("patterns", &self.pattern_count())
            .finish()
    }
}
