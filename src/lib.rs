// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # venue-linker
//!
//! An entity-linking engine for long-form HTML content. Given an article body
//! and a registry of real-world entities (hotels, restaurants, galleries,
//! districts, clubs, events, ...), it wraps the first mention of each entity
//! in a hyperlink, subject to priority ordering, whole-word matching, anchor
//! safety, and a hard link budget.
//!
//! ## Architecture
//!
//! - **Registry** (`registry`, `catalog`): validated immutable catalog with a
//!   precompiled pattern cache; bundled `base` and `enhanced` variants
//! - **Matcher** (`linker::matcher`, `linker::anchor`): escaped whole-word
//!   patterns and a tag-depth scanner marking protected spans
//! - **Injector** (`linker`): the priority-ordered, budgeted rewrite pass
//! - **Stats** (`linker::stats`): presence vs. linked counts per category
//!
//! ## Library usage
//!
//! ```
//! use venue_linker::entity::{Category, EntityLink};
//! use venue_linker::registry::EntityRegistry;
//! use venue_linker::{link_entities, link_stats};
//!
//! let registry = EntityRegistry::new(vec![
//!     EntityLink::new("Claridge's", "https://claridges.example", Category::Hotel, 10),
//!     EntityLink::new("Sketch", "https://sketch.example", Category::Restaurant, 10),
//! ])
//! .unwrap();
//!
//! let html = link_entities("Visit Claridge's and enjoy dinner at Sketch.", &registry, 35);
//! assert_eq!(html.matches("<a ").count(), 2);
//!
//! let stats = link_stats("Visit Claridge's and enjoy dinner at Sketch.", &registry, 1);
//! assert_eq!((stats.total_entities, stats.linked_entities), (2, 1));
//! ```

pub mod catalog;
pub mod config;
pub mod entity;
pub mod error;
pub mod linker;
pub mod registry;

pub use linker::stats::{LinkStats, link_stats};
pub use linker::{InjectedLink, LinkOutcome, Linker, link_entities};
