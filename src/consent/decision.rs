//! Consent categories and the visitor's per-category decision.

use crate::util::flexible_bool;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the built-in category that is always granted.
pub const NECESSARY: &str = "necessary";

/// Key of the category that gates the tag-manager bootstrap.
pub const STATISTICS: &str = "statistics";

/// A consent category as published by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub key: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_required: bool,
}

impl CategoryDefinition {
    pub fn new(key: &str, display_name: &str, is_required: bool) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            description: None,
            is_required,
        }
    }

    /// Required categories are always granted and never user-toggleable.
    /// `necessary` counts as required whatever the backend says.
    pub fn is_forced(&self) -> bool {
        self.is_required || self.key == NECESSARY
    }
}

/// Category key → granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentDecision {
    categories: BTreeMap<String, bool>,
}

impl ConsentDecision {
    pub fn from_map(categories: BTreeMap<String, bool>) -> Self {
        Self { categories }
    }

    /// Every known category granted.
    pub fn accept_all(known: &[CategoryDefinition]) -> Self {
        let mut decision = Self::from_map(
            known
                .iter()
                .map(|category| (category.key.clone(), true))
                .collect(),
        );
        decision.enforce_required(known);
        decision
    }

    /// Only required categories granted.
    pub fn reject_all(known: &[CategoryDefinition]) -> Self {
        let mut decision = Self::from_map(
            known
                .iter()
                .map(|category| (category.key.clone(), false))
                .collect(),
        );
        decision.enforce_required(known);
        decision
    }

    /// Caller selections over the known categories. Known categories the
    /// caller did not mention are denied.
    pub fn custom(known: &[CategoryDefinition], selections: &BTreeMap<String, bool>) -> Self {
        let mut categories = selections.clone();
        for category in known {
            categories.entry(category.key.clone()).or_insert(false);
        }
        let mut decision = Self::from_map(categories);
        decision.enforce_required(known);
        decision
    }

    /// Force every required category (and `necessary`) to granted.
    pub fn enforce_required(&mut self, known: &[CategoryDefinition]) {
        for category in known.iter().filter(|category| category.is_forced()) {
            self.categories.insert(category.key.clone(), true);
        }
        self.categories.insert(NECESSARY.to_string(), true);
    }

    pub fn is_granted(&self, key: &str) -> bool {
        self.categories.get(key).copied().unwrap_or(false)
    }

    pub fn granted_keys(&self) -> Vec<String> {
        self.categories
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn all_granted(&self) -> bool {
        self.categories.values().all(|granted| *granted)
    }

    pub fn categories(&self) -> &BTreeMap<String, bool> {
        &self.categories
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.categories).unwrap_or_else(|_| "{}".to_string())
    }
}
