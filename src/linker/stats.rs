//! Read-only linking statistics.
//!
//! `total_entities` and `breakdown` describe presence: every entity with at
//! least one surface form in the visible text counts, regardless of budget.
//! `linked_entities` describes what a linking pass would actually do under
//! the same priority order, anchor rules and budget. The two are deliberately
//! not derived from each other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::AnchorAttributes;
use crate::entity::Category;
use crate::registry::EntityRegistry;

use super::LinkPass;
use super::anchor::AnchorMap;

/// Presence and linking counts for one piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStats {
    /// Distinct entities present in the content.
    pub total_entities: usize,
    /// Entities a linking pass would link, bounded by the budget.
    pub linked_entities: usize,
    /// Present entities per category.
    pub breakdown: BTreeMap<Category, usize>,
}

impl LinkStats {
    /// Entities present but left unlinked (budget exhausted or already linked).
    pub fn unlinked_entities(&self) -> usize {
        self.total_entities.saturating_sub(self.linked_entities)
    }
}

/// Report presence and linking counts without modifying `content`.
pub fn link_stats(content: &str, registry: &EntityRegistry, budget: usize) -> LinkStats {
    collect(content, registry, budget, &AnchorAttributes::default())
}

pub(super) fn collect(
    content: &str,
    registry: &EntityRegistry,
    budget: usize,
    anchor: &AnchorAttributes,
) -> LinkStats {
    let mut stats = LinkStats::default();
    if content.is_empty() || registry.is_empty() {
        return stats;
    }

    let map = AnchorMap::scan(content);
    for entity in registry.iter() {
        let present = entity.surface_forms().into_iter().any(|form| {
            registry
                .pattern(form)
                .is_some_and(|p| p.is_present(content, &map))
        });
        if present {
            stats.total_entities += 1;
            *stats.breakdown.entry(entity.category).or_insert(0) += 1;
        }
    }

    stats.linked_entities = LinkPass::new(registry, budget, anchor)
        .run(content)
        .link_count();
    stats
}
