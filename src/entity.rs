//! Core data types: linkable entities and their categories.

use serde::{Deserialize, Serialize};

/// Closed set of domain tags an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hotel,
    Restaurant,
    Area,
    Gallery,
    Club,
    Event,
    Shopping,
    Transport,
    Experience,
    Venue,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 10] = [
        Self::Hotel,
        Self::Restaurant,
        Self::Area,
        Self::Gallery,
        Self::Club,
        Self::Event,
        Self::Shopping,
        Self::Transport,
        Self::Experience,
        Self::Venue,
    ];

    /// Lowercase tag as it appears in registry files and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hotel => "hotel",
            Self::Restaurant => "restaurant",
            Self::Area => "area",
            Self::Gallery => "gallery",
            Self::Club => "club",
            Self::Event => "event",
            Self::Shopping => "shopping",
            Self::Transport => "transport",
            Self::Experience => "experience",
            Self::Venue => "venue",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown category \"{s}\""))
    }
}

/// Lowest accepted priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest accepted priority.
pub const MAX_PRIORITY: u8 = 10;

/// A registry record: one real-world entity eligible for auto-linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLink {
    /// Canonical identifier and default display form.
    pub name: String,
    /// Alternate surface forms that resolve to the same entity.
    #[serde(default)]
    pub variations: Vec<String>,
    /// Destination href.
    pub url: String,
    pub category: Category,
    /// Resolution precedence, 1–10; higher is attempted first.
    pub priority: u8,
}

impl EntityLink {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        category: Category,
        priority: u8,
    ) -> Self {
        Self {
            name: name.into(),
            variations: Vec::new(),
            url: url.into(),
            category,
            priority,
        }
    }

    /// Builder-style helper to attach alternate surface forms.
    pub fn with_variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = variations.into_iter().map(Into::into).collect();
        self
    }

    /// Canonical name length in characters, used as the priority tie-break.
    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }

    /// Surface forms in attempt order: canonical name first, then variations.
    ///
    /// Blank forms are dropped and repeated spellings (case-insensitive) are
    /// yielded only once.
    pub fn surface_forms(&self) -> Vec<&str> {
        let mut seen: Vec<String> = Vec::with_capacity(self.variations.len() + 1);
        let mut forms = Vec::with_capacity(self.variations.len() + 1);
        let candidates =
            std::iter::once(self.name.as_str()).chain(self.variations.iter().map(String::as_str));
        for form in candidates {
            let trimmed = form.trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = trimmed.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            forms.push(trimmed);
        }
        forms
    }
}
