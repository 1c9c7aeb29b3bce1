//! Category profiles: sample phrase templates and display fields keyed by
//! lowercased directory category.
//!
//! The embedded table is parsed once per process. A deployment can point
//! `REGISTRY_CATEGORIES_PATH` at its own YAML file with the same shape.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RegistryError;

const EMBEDDED: &str = include_str!("../data/categories.yml");

static BUILTIN: LazyLock<Arc<CategoryTable>> = LazyLock::new(|| {
    Arc::new(CategoryTable::parse(EMBEDDED).unwrap_or_else(|e| {
        warn!(error = %e, "embedded category table unreadable, using generic phrases only");
        CategoryTable::default()
    }))
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Templates; `{api}` and `{endpoint}` are substituted.
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub display_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryTable {
    #[serde(default)]
    pub default: CategoryProfile,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryProfile>,
}

impl CategoryTable {
    pub fn parse(yaml: &str) -> Result<Self, RegistryError> {
        let mut table: Self =
            serde_yaml::from_str(yaml).map_err(|e| RegistryError::CategoryTable(e.to_string()))?;
        table.categories = std::mem::take(&mut table.categories)
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(table)
    }

    /// The embedded table, shared.
    pub fn builtin() -> Arc<Self> {
        BUILTIN.clone()
    }

    /// Table from `path`, or the embedded one when no path is set or the
    /// file cannot be read or parsed.
    pub fn load(path: Option<&str>) -> Arc<Self> {
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            return Self::builtin();
        };
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::CategoryTable(format!("{path}: {e}")))
            .and_then(|yaml| Self::parse(&yaml));
        match parsed {
            Ok(table) => {
                info!(path, categories = table.categories.len(), "category table loaded");
                Arc::new(table)
            }
            Err(e) => {
                warn!(path, error = %e, "falling back to embedded category table");
                Self::builtin()
            }
        }
    }

    /// Profile for `category` (case-insensitive), or the default profile.
    pub fn profile(&self, category: &str) -> &CategoryProfile {
        self.categories
            .get(&category.to_lowercase())
            .unwrap_or(&self.default)
    }

    pub fn display_fields(&self, category: &str) -> &[String] {
        &self.profile(category).display_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses() {
        let table = CategoryTable::parse(EMBEDDED).unwrap();
        assert!(!table.default.phrases.is_empty());
        assert!(table.categories.contains_key("animals"));
        assert!(table.categories.contains_key("science & math"));
    }

    #[test]
    fn lookup_is_case_insensitive_with_default() {
        let table = CategoryTable::builtin();
        assert_eq!(table.profile("Weather"), table.profile("weather"));
        assert!(table.display_fields("Weather").contains(&"current_weather".to_string()));
        assert_eq!(table.profile("No Such Category"), &table.default);
    }

    #[test]
    fn keys_are_lowercased_on_parse() {
        let table = CategoryTable::parse(
            "default: {phrases: [\"use {api}\"]}\ncategories:\n  Travel:\n    phrases: [\"plan a trip\"]\n",
        )
        .unwrap();
        assert!(table.categories.contains_key("travel"));
        assert_eq!(table.profile("TRAVEL").phrases, vec!["plan a trip"]);
    }

    #[test]
    fn unreadable_file_falls_back() {
        let table = CategoryTable::load(Some("/definitely/not/here.yml"));
        assert_eq!(*table, *CategoryTable::builtin());
        assert_eq!(*CategoryTable::load(None), *CategoryTable::builtin());
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        assert!(CategoryTable::parse("defaults: {}\n").is_err());
    }
}
