//! Immutable catalog snapshot with lookup indices

use std::cmp::Ordering;
use std::collections::HashMap;
use uom_core::{CatalogFeed, CategoryId, Unit, UnitCategory, UnitId};
use crate::quality::{screen, DataIssue};

/// One complete, indexed view of the catalog.
///
/// Units are stored in canonical order: category name, `sort_order`, name,
/// id. Every ordered result (search, symbol tie-break) falls out of it.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    version: u64,
    loaded: bool,
    categories: Vec<UnitCategory>,
    units: Vec<Unit>,
    unit_index: HashMap<UnitId, usize>,
    category_index: HashMap<CategoryId, usize>,
    /// Lowercased symbol -> unit positions, canonical order
    symbol_index: HashMap<String, Vec<usize>>,
    issues: Vec<DataIssue>,
}

impl CatalogSnapshot {
    /// The state before any successful load
    pub fn empty() -> Self {
        Self::default()
    }

    /// Screen and index a feed
    pub fn build(feed: &CatalogFeed) -> Self {
        let screened = screen(feed);

        let mut categories: Vec<UnitCategory> = screened.categories.into_iter().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let category_index: HashMap<CategoryId, usize> =
            categories.iter().enumerate().map(|(i, c)| (c.id, i)).collect();

        // Position of each category in name order drives unit order
        let mut units: Vec<Unit> = screened.units.into_iter().cloned().collect();
        units.sort_by(|a, b| {
            let ca = category_index.get(&a.category_id);
            let cb = category_index.get(&b.category_id);
            ca.cmp(&cb).then_with(|| within_category(a, b))
        });

        let unit_index = units.iter().enumerate().map(|(i, u)| (u.id, i)).collect();
        let mut symbol_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, unit) in units.iter().enumerate() {
            symbol_index.entry(normalize(&unit.symbol)).or_default().push(i);
        }

        CatalogSnapshot {
            version: 0,
            loaded: true,
            categories,
            units,
            unit_index,
            category_index,
            symbol_index,
            issues: screened.issues,
        }
    }

    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Monotonic load counter; 0 for snapshots built outside a catalog
    pub fn version(&self) -> u64 {
        self.version
    }

    /// False only for the initial empty snapshot
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Categories ordered by name
    pub fn categories(&self) -> &[UnitCategory] {
        &self.categories
    }

    /// All units, active or not, in canonical order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit_index.get(&id).map(|&i| &self.units[i])
    }

    pub fn category(&self, id: CategoryId) -> Option<&UnitCategory> {
        self.category_index.get(&id).map(|&i| &self.categories[i])
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.category(id).map(|c| c.name.as_str())
    }

    pub fn category_by_name(&self, name: &str) -> Option<&UnitCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Units whose symbol equals `symbol` ignoring case, canonical order
    pub fn units_with_symbol(&self, symbol: &str) -> impl Iterator<Item = &Unit> {
        self.symbol_index
            .get(&normalize(symbol))
            .into_iter()
            .flatten()
            .map(move |&i| &self.units[i])
    }

    /// Data-model violations found when this snapshot was built
    pub fn issues(&self) -> &[DataIssue] {
        &self.issues
    }
}

/// Display order inside one category: `sort_order`, then name, then id
pub(crate) fn within_category(a: &Unit, b: &Unit) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
