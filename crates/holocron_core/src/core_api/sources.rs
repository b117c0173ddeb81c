//! Source book catalog: which books a scan keeps and what category label
//! each kept record gets.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreErrorCode};

const DEFAULT_CATALOG: &str = include_str!("../../data/sources.json");
pub const FALLBACK_CATEGORY: &str = "Star Wars RPG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceBook {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub oggdude_sources: Vec<String>,
    #[serde(default)]
    pub adversaries_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceCatalog {
    sources: Vec<SourceBook>,
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::from_json_str(DEFAULT_CATALOG).unwrap_or(Self {
            sources: Vec::new(),
        })
    }
}

impl SourceCatalog {
    pub fn new(sources: Vec<SourceBook>) -> Self {
        Self { sources }
    }

    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Config,
                format!("invalid source catalog: {e}"),
            )
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_json_str(&text)
    }

    pub fn books(&self) -> &[SourceBook] {
        &self.sources
    }

    pub fn get(&self, key: &str) -> Option<&SourceBook> {
        self.sources.iter().find(|book| book.key == key)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn selected<'a>(
        &'a self,
        selected: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a SourceBook> + 'a {
        self.sources
            .iter()
            .filter(move |book| selected.contains(&book.key))
    }

    /// Category for an OggDude record, or `None` when no selected book
    /// claims any of its sources. An empty selection keeps everything.
    pub fn match_oggdude(
        &self,
        record_sources: &[String],
        selected: &BTreeSet<String>,
    ) -> Option<String> {
        if selected.is_empty() {
            return Some(
                self.category_for_sources(record_sources)
                    .unwrap_or_else(|| default_category(record_sources)),
            );
        }
        for source in record_sources {
            let lowered = source.to_lowercase();
            for book in self.selected(selected) {
                if book
                    .oggdude_sources
                    .iter()
                    .any(|name| lowered.contains(&name.to_lowercase()))
                {
                    return Some(book.name.clone());
                }
            }
        }
        None
    }

    /// Category for an adversary record from its tags and free-text source.
    pub fn match_adversary(
        &self,
        tags: &[String],
        source: &str,
        selected: &BTreeSet<String>,
    ) -> Option<String> {
        let lowered = source.to_lowercase();
        let claims = |book: &SourceBook| {
            book.adversaries_sources.iter().any(|tag| {
                tags.iter().any(|t| t == tag)
                    || (!tag.is_empty() && lowered.contains(&tag.to_lowercase()))
            })
        };
        if selected.is_empty() {
            return Some(
                self.sources
                    .iter()
                    .find(|book| claims(book))
                    .map(|book| book.name.clone())
                    .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            );
        }
        self.selected(selected)
            .find(|book| claims(book))
            .map(|book| book.name.clone())
    }

    fn category_for_sources(&self, record_sources: &[String]) -> Option<String> {
        record_sources.iter().find_map(|source| {
            let lowered = source.to_lowercase();
            self.sources
                .iter()
                .find(|book| {
                    book.oggdude_sources
                        .iter()
                        .any(|name| lowered.contains(&name.to_lowercase()))
                })
                .map(|book| book.name.clone())
        })
    }
}

fn default_category(record_sources: &[String]) -> String {
    record_sources
        .first()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}
