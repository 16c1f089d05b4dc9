//! Data-quality screening of a catalog feed
//!
//! The feed is untrusted but well-typed. Screening never coerces a value:
//! it decides which records enter a snapshot and reports everything that
//! violates the data model.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use serde::Serialize;
use uom_core::{CatalogFeed, CategoryId, Unit, UnitCategory, UnitId};

/// A data-model violation found in a feed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataIssue {
    /// Factor missing, zero, negative, NaN or infinite
    InvalidFactor { unit_id: UnitId, factor: Option<f64> },
    MultipleBaseUnits { category_id: CategoryId, unit_ids: Vec<UnitId> },
    BaseFactorNotOne { unit_id: UnitId, factor: f64 },
    /// Unit references a category that is not in the feed; excluded
    OrphanedUnit { unit_id: UnitId, category_id: CategoryId },
    /// Repeated unit id; only the first record is kept
    DuplicateUnitId { unit_id: UnitId },
    /// Repeated category id; only the first record is kept
    DuplicateCategoryId { category_id: CategoryId },
    DuplicateSymbol { category_id: CategoryId, symbol: String },
}

impl DataIssue {
    /// The unit that can no longer be converted because of this issue
    pub fn blocked_unit(&self) -> Option<UnitId> {
        match self {
            DataIssue::InvalidFactor { unit_id, .. } => Some(*unit_id),
            _ => None,
        }
    }
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::InvalidFactor { unit_id, factor: Some(factor) } => {
                write!(f, "unit {} has invalid to_base_factor {}", unit_id, factor)
            }
            DataIssue::InvalidFactor { unit_id, factor: None } => {
                write!(f, "unit {} has no to_base_factor", unit_id)
            }
            DataIssue::MultipleBaseUnits { category_id, unit_ids } => {
                let ids: Vec<String> = unit_ids.iter().map(|id| id.to_string()).collect();
                write!(f, "category {} has {} base units: {}", category_id, unit_ids.len(), ids.join(", "))
            }
            DataIssue::BaseFactorNotOne { unit_id, factor } => {
                write!(f, "base unit {} has to_base_factor {} instead of 1", unit_id, factor)
            }
            DataIssue::OrphanedUnit { unit_id, category_id } => {
                write!(f, "unit {} references missing category {}", unit_id, category_id)
            }
            DataIssue::DuplicateUnitId { unit_id } => write!(f, "duplicate unit id {}", unit_id),
            DataIssue::DuplicateCategoryId { category_id } => {
                write!(f, "duplicate category id {}", category_id)
            }
            DataIssue::DuplicateSymbol { category_id, symbol } => {
                write!(f, "symbol '{}' is used twice in category {}", symbol, category_id)
            }
        }
    }
}

/// Records admitted into a snapshot plus the issues found on the way
pub(crate) struct Screened<'a> {
    pub categories: Vec<&'a UnitCategory>,
    pub units: Vec<&'a Unit>,
    pub issues: Vec<DataIssue>,
}

pub(crate) fn screen(feed: &CatalogFeed) -> Screened<'_> {
    let mut issues = Vec::new();

    let mut category_ids = HashSet::new();
    let mut categories = Vec::with_capacity(feed.categories.len());
    for category in &feed.categories {
        if category_ids.insert(category.id) {
            categories.push(category);
        } else {
            issues.push(DataIssue::DuplicateCategoryId { category_id: category.id });
        }
    }

    let mut unit_ids = HashSet::new();
    let mut units = Vec::with_capacity(feed.units.len());
    for unit in &feed.units {
        if !unit_ids.insert(unit.id) {
            issues.push(DataIssue::DuplicateUnitId { unit_id: unit.id });
            continue;
        }
        if !category_ids.contains(&unit.category_id) {
            issues.push(DataIssue::OrphanedUnit { unit_id: unit.id, category_id: unit.category_id });
            continue;
        }
        units.push(unit);
    }

    for unit in &units {
        if !unit.has_valid_factor() {
            issues.push(DataIssue::InvalidFactor { unit_id: unit.id, factor: unit.to_base_factor });
        } else if unit.is_base && unit.to_base_factor != Some(1.0) {
            issues.push(DataIssue::BaseFactorNotOne {
                unit_id: unit.id,
                factor: unit.to_base_factor.unwrap_or_default(),
            });
        }
    }

    // Per-category checks, in category id order for stable reports
    let mut by_category: BTreeMap<CategoryId, Vec<&Unit>> = BTreeMap::new();
    for unit in &units {
        by_category.entry(unit.category_id).or_default().push(unit);
    }
    for (category_id, members) in &by_category {
        let bases: Vec<UnitId> = members.iter().filter(|u| u.is_base).map(|u| u.id).collect();
        if bases.len() > 1 {
            issues.push(DataIssue::MultipleBaseUnits { category_id: *category_id, unit_ids: bases });
        }

        let mut seen: HashMap<String, UnitId> = HashMap::new();
        for unit in members {
            let key = unit.symbol.trim().to_lowercase();
            if seen.insert(key, unit.id).is_some() {
                issues.push(DataIssue::DuplicateSymbol {
                    category_id: *category_id,
                    symbol: unit.symbol.clone(),
                });
            }
        }
    }

    Screened { categories, units, issues }
}

/// Report every data-model violation in a feed without building a snapshot
pub fn inspect(feed: &CatalogFeed) -> Vec<DataIssue> {
    screen(feed).issues
}
