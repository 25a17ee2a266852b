//! Link injection: priority-ordered, budgeted, anchor-safe rewriting.
//!
//! A pass walks the registry in priority order and, for every entity not yet
//! linked, tries its surface forms (canonical name first) against the content.
//! The first occurrence of the first form with an unprotected match is wrapped
//! in an anchor; the entity is then marked used and the pass moves on. The
//! pass stops when the registry is exhausted or the link budget is reached.
//!
//! Pass state (used entities, used forms, link counter) lives in `LinkPass`,
//! which is created inside every call and dropped at its end.

pub mod anchor;
pub mod matcher;
pub mod stats;

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::catalog;
use crate::config::{AnchorAttributes, LinkerConfig};
use crate::entity::{Category, EntityLink};
use crate::error::LinkerResult;
use crate::registry::EntityRegistry;

use self::anchor::AnchorMap;
use self::stats::LinkStats;

/// One anchor injected by a linking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectedLink {
    /// Canonical name of the linked entity.
    pub entity: String,
    pub category: Category,
    /// The registry surface form that matched.
    pub surface_form: String,
    /// The text that was wrapped, with its original casing.
    pub matched_text: String,
    pub url: String,
    /// Byte offset of the injected `<a` in the output content.
    pub offset: usize,
}

/// Result of a linking pass: the rewritten content plus what was injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub content: String,
    pub links: Vec<InjectedLink>,
}

impl LinkOutcome {
    /// Number of anchors injected.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Per-call linking state. Never shared between calls.
struct LinkPass<'a> {
    registry: &'a EntityRegistry,
    budget: usize,
    anchor: &'a AnchorAttributes,
    used_entities: HashSet<&'a str>,
    used_forms: HashSet<String>,
    links: Vec<InjectedLink>,
}

impl<'a> LinkPass<'a> {
    fn new(registry: &'a EntityRegistry, budget: usize, anchor: &'a AnchorAttributes) -> Self {
        Self {
            registry,
            budget,
            anchor,
            used_entities: HashSet::new(),
            used_forms: HashSet::new(),
            links: Vec::new(),
        }
    }

    fn budget_reached(&self) -> bool {
        self.links.len() >= self.budget
    }

    fn run(mut self, content: &str) -> LinkOutcome {
        let mut content = content.to_string();
        if content.is_empty() || self.budget == 0 || self.registry.is_empty() {
            return LinkOutcome {
                content,
                links: Vec::new(),
            };
        }

        let registry = self.registry;
        let mut map = AnchorMap::scan(&content);
        for entity in registry.sorted_by_priority() {
            if self.budget_reached() {
                tracing::trace!(budget = self.budget, "link budget reached");
                break;
            }
            if self.used_entities.contains(entity.name.as_str()) {
                continue;
            }
            if self.link_entity(entity, &mut content, &map) {
                map = AnchorMap::scan(&content);
            }
        }

        LinkOutcome {
            content,
            links: self.links,
        }
    }

    /// Try each surface form of `entity`; wrap the first unprotected match.
    fn link_entity(&mut self, entity: &'a EntityLink, content: &mut String, map: &AnchorMap) -> bool {
        for form in entity.surface_forms() {
            if self.budget_reached() {
                return false;
            }
            let key = form.to_lowercase();
            if self.used_forms.contains(&key) {
                continue;
            }
            let Some(pattern) = self.registry.pattern(form) else {
                continue;
            };
            let Some(range) = pattern.first_unprotected(content, map) else {
                continue;
            };

            let matched_text = content[range.clone()].to_string();
            let anchor = self.anchor.render(&entity.url, &matched_text);
            content.replace_range(range.clone(), &anchor);

            // Earlier links that sit after this one have moved right.
            let grown = anchor.len() - range.len();
            for link in self.links.iter_mut().filter(|l| l.offset > range.start) {
                link.offset += grown;
            }

            tracing::debug!(
                entity = %entity.name,
                form,
                offset = range.start,
                "linked entity"
            );

            self.used_entities.insert(entity.name.as_str());
            self.used_forms.insert(key);
            self.links.push(InjectedLink {
                entity: entity.name.clone(),
                category: entity.category,
                surface_form: form.to_string(),
                matched_text,
                url: entity.url.clone(),
                offset: range.start,
            });
            return true;
        }
        false
    }
}

/// Wrap the first unlinked mention of each registry entity in an anchor.
///
/// Uses the default anchor attributes (`target="_blank"`,
/// `rel="noopener noreferrer"`, `class="entity-link"`). Deterministic for a
/// given `(content, registry, budget)` and never injects more than `budget`
/// anchors.
pub fn link_entities(content: &str, registry: &EntityRegistry, budget: usize) -> String {
    LinkPass::new(registry, budget, &AnchorAttributes::default())
        .run(content)
        .content
}

/// A configured linking engine: shared registry, budget, anchor attributes.
///
/// `Linker` is `Send + Sync`; clone it or wrap it in an `Arc` to serve many
/// documents concurrently.
#[derive(Debug, Clone)]
pub struct Linker {
    registry: Arc<EntityRegistry>,
    budget: usize,
    anchor: AnchorAttributes,
}

impl Linker {
    pub fn new(registry: Arc<EntityRegistry>, budget: usize) -> Self {
        Self {
            registry,
            budget,
            anchor: AnchorAttributes::default(),
        }
    }

    /// Build a linker from configuration, resolving the registry it names.
    pub fn from_config(config: &LinkerConfig) -> LinkerResult<Self> {
        let registry = config.resolve_registry()?;
        let budget = config.effective_budget(&registry);
        Ok(Self {
            registry,
            budget,
            anchor: config.anchor.clone(),
        })
    }

    /// A linker over one of the bundled registries with its default budget.
    pub fn bundled(variant: catalog::RegistryVariant) -> LinkerResult<Self> {
        Ok(Self::new(catalog::bundled(variant)?, variant.default_budget()))
    }

    pub fn with_anchor(mut self, anchor: AnchorAttributes) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn anchor(&self) -> &AnchorAttributes {
        &self.anchor
    }

    /// Run one linking pass and report what was injected.
    pub fn link(&self, content: &str) -> LinkOutcome {
        LinkPass::new(&self.registry, self.budget, &self.anchor).run(content)
    }

    /// Link many documents in parallel. Output order matches input order.
    pub fn link_many(&self, documents: &[&str]) -> Vec<String> {
        documents
            .par_iter()
            .map(|doc| self.link(doc).content)
            .collect()
    }

    /// Presence and linking statistics for `content` under this linker's budget.
    pub fn stats(&self, content: &str) -> LinkStats {
        stats::collect(content, &self.registry, self.budget, &self.anchor)
    }
}
