//! Report catalog
//!
//! Which reports a run fetches, what each one requests, and the storage level
//! each report name is registered under.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ReportDefinition;
use crate::data::StorageLevel;

/// Report names grouped by storage level
pub type LevelMap = BTreeMap<StorageLevel, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Report '{0}' is defined more than once")]
    DuplicateDefinition(String),
    #[error("Report '{0}' has no storage level")]
    MissingLevel(String),
    #[error("Report '{0}' requests no dimensions; dimension 0 must be the client id")]
    NoDimensions(String),
    #[error("Report '{report}' is {level} but requests only {count} dimension(s); {level} needs {needed}")]
    TooFewDimensions {
        report: String,
        level: StorageLevel,
        count: usize,
        needed: usize,
    },
    #[error("Unknown report '{0}'")]
    UnknownReport(String),
}

/// Dimensions a level's key needs from each row
pub fn required_dimensions(level: StorageLevel) -> usize {
    match level {
        StorageLevel::UserLevel => 1,
        StorageLevel::SessionLevel => 2,
        StorageLevel::HitLevel => 3,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCatalog {
    pub levels: LevelMap,
    pub definitions: Vec<ReportDefinition>,
}

impl ReportCatalog {
    /// Churned-users job: one user level and one session level report
    pub fn churn() -> Self {
        let definitions = vec![
            ReportDefinition::new(
                "chu_users",
                &["dimension1", "deviceCategory"],
                &[
                    "sessions",
                    "sessionDuration",
                    "entrances",
                    "bounces",
                    "exits",
                    "pageValue",
                    "pageLoadTime",
                    "pageLoadSample",
                ],
            ),
            ReportDefinition::new(
                "chu_sessions",
                &[
                    "dimension1",
                    "dimension2",
                    "sessionCount",
                    "daysSinceLastSession",
                ],
                &[
                    "sessions",
                    "pageviews",
                    "uniquePageviews",
                    "screenViews",
                    "hits",
                    "timeOnPage",
                ],
            ),
        ];

        let mut levels = LevelMap::new();
        levels.insert(StorageLevel::UserLevel, vec!["chu_users".to_string()]);
        levels.insert(StorageLevel::SessionLevel, vec!["chu_sessions".to_string()]);

        Self {
            levels,
            definitions,
        }
    }

    /// Level of a report name (first match; duplicates are rejected at registration)
    pub fn level_of(&self, name: &str) -> Option<StorageLevel> {
        self.levels
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == name))
            .map(|(level, _)| *level)
    }

    /// Check every definition is unique, has a level, and requests the
    /// dimensions its level's key is built from
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for def in &self.definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(CatalogError::DuplicateDefinition(def.name.clone()));
            }
            if def.dimensions.is_empty() {
                return Err(CatalogError::NoDimensions(def.name.clone()));
            }
            let level = self
                .level_of(&def.name)
                .ok_or_else(|| CatalogError::MissingLevel(def.name.clone()))?;
            let needed = required_dimensions(level);
            if def.dimensions.len() < needed {
                return Err(CatalogError::TooFewDimensions {
                    report: def.name.clone(),
                    level,
                    count: def.dimensions.len(),
                    needed,
                });
            }
        }
        Ok(())
    }

    /// Definitions to run, in catalog order. Empty `only` selects everything.
    pub fn select(&self, only: &[String]) -> Result<Vec<&ReportDefinition>, CatalogError> {
        if let Some(unknown) = only
            .iter()
            .find(|name| !self.definitions.iter().any(|d| &d.name == *name))
        {
            return Err(CatalogError::UnknownReport(unknown.clone()));
        }

        Ok(self
            .definitions
            .iter()
            .filter(|d| only.is_empty() || only.contains(&d.name))
            .collect())
    }
}

impl Default for ReportCatalog {
    fn default() -> Self {
        Self::churn()
    }
}
