use anyhow::{Context, Result};
use search_catalog::ViewerId;
use search_syntax::{SyntaxError, parse_query};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{info, warn};

/// One named query as listed for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedSearch<'a> {
    pub name: &'a str,
    pub query: &'a str,
}

/// Named queries, kept per owner.
///
/// Only query text that parses is stored. It is compiled again every time it
/// runs, so a schema change surfaces as an execution error at replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSearches {
    owners: BTreeMap<ViewerId, BTreeMap<String, String>>,
}

impl SavedSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `query` under `name` for `owner`, returning the query it
    /// replaced.
    pub fn save(
        &mut self,
        owner: ViewerId,
        name: &str,
        query: &str,
    ) -> Result<Option<String>, SyntaxError> {
        if let Err(err) = parse_query(query) {
            warn!("Rejected saved search {name:?} for {owner}: {err}");
            return Err(err);
        }
        Ok(self
            .owners
            .entry(owner)
            .or_default()
            .insert(name.to_string(), query.to_string()))
    }

    pub fn get(&self, owner: ViewerId, name: &str) -> Option<&str> {
        self.owners
            .get(&owner)
            .and_then(|searches| searches.get(name))
            .map(String::as_str)
    }

    pub fn remove(&mut self, owner: ViewerId, name: &str) -> Option<String> {
        let searches = self.owners.get_mut(&owner)?;
        let removed = searches.remove(name);
        if searches.is_empty() {
            self.owners.remove(&owner);
        }
        removed
    }

    /// `owner`'s searches, ordered by name.
    pub fn list(&self, owner: ViewerId) -> Vec<SavedSearch<'_>> {
        self.owners
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|(name, query)| SavedSearch { name, query })
            .collect()
    }

    /// Reads the store at `path`. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No saved searches at {}", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read saved searches {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse saved searches")
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create saved searches directory")?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to encode saved searches")?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, json).context("Failed to write saved searches")?;
        fs::rename(&tmp_path, path).context("Failed to rename saved searches")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: ViewerId = ViewerId(1);

    #[test]
    fn save_replaces_by_name() {
        let mut saved = SavedSearches::new();
        assert_eq!(saved.save(OWNER, "wide", "aspect=10").unwrap(), None);
        assert_eq!(
            saved.save(OWNER, "wide", "aspect=9").unwrap(),
            Some("aspect=10".to_string())
        );
        assert_eq!(saved.get(OWNER, "wide"), Some("aspect=9"));
    }

    #[test]
    fn syntax_errors_are_not_saved() {
        let mut saved = SavedSearches::new();
        let err = saved.save(OWNER, "broken", "width>").unwrap_err();
        assert_eq!(err.message, "missing value after '>'");
        assert_eq!(saved.get(OWNER, "broken"), None);
        assert!(saved.list(OWNER).is_empty());
    }

    #[test]
    fn owners_are_separate() {
        let mut saved = SavedSearches::new();
        saved.save(OWNER, "mine", "rating=4").unwrap();
        saved.save(ViewerId(2), "theirs", "rating=1").unwrap();
        assert_eq!(saved.get(ViewerId(2), "mine"), None);
        assert_eq!(
            saved.list(OWNER),
            [SavedSearch {
                name: "mine",
                query: "rating=4"
            }]
        );
        assert_eq!(saved.remove(ViewerId(2), "mine"), None);
        assert_eq!(saved.remove(OWNER, "mine"), Some("rating=4".to_string()));
        assert!(saved.list(OWNER).is_empty());
    }

    #[test]
    fn list_is_ordered_by_name() {
        let mut saved = SavedSearches::new();
        saved.save(OWNER, "wide", "aspect=10").unwrap();
        saved.save(OWNER, "best", "rating>=4").unwrap();
        let names: Vec<_> = saved.list(OWNER).into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["best", "wide"]);
    }
}
