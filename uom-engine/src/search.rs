//! Search, filtering and grouping for unit selection lists

use std::collections::BTreeMap;
use uom_core::{Unit, UnitType};
use crate::snapshot::within_category;
use crate::CatalogSnapshot;

/// Group label for units whose category is not in the snapshot
pub const UNCATEGORIZED: &str = "Uncategorized";

pub struct UnitSearch<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> UnitSearch<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// Active units matching `query` (case-insensitive substring of name,
    /// symbol or any alternate name), optionally restricted to the category
    /// named `category`. Results come in canonical order: category name,
    /// `sort_order`, name.
    ///
    /// Only the empty string matches everything; whitespace is part of the
    /// query.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<&'a Unit> {
        let needle = query.to_lowercase();
        let category_id = match category {
            Some(name) => match self.snapshot.category_by_name(name) {
                Some(c) => Some(c.id),
                None => return Vec::new(),
            },
            None => None,
        };

        self.snapshot
            .units()
            .iter()
            .filter(|u| u.is_active)
            .filter(|u| category_id.map_or(true, |id| u.category_id == id))
            .filter(|u| u.matches(&needle))
            .collect()
    }

    /// Active units carrying `unit_type`
    pub fn by_type(&self, unit_type: UnitType) -> Vec<&'a Unit> {
        self.search("", None)
            .into_iter()
            .filter(|u| u.unit_type == unit_type)
            .collect()
    }

    /// Active units in the category named `name`
    pub fn by_category(&self, name: &str) -> Vec<&'a Unit> {
        self.search("", Some(name))
    }

    /// Partition units by category name.
    ///
    /// Groups iterate in category-name order; members are ordered by
    /// `sort_order`, then name.
    pub fn group_by_category(&self, units: &[&'a Unit]) -> BTreeMap<&'a str, Vec<&'a Unit>> {
        let mut groups: BTreeMap<&'a str, Vec<&'a Unit>> = BTreeMap::new();
        for &unit in units {
            let name = self.snapshot.category_name(unit.category_id).unwrap_or(UNCATEGORIZED);
            groups.entry(name).or_default().push(unit);
        }
        for members in groups.values_mut() {
            members.sort_by(|a, b| within_category(a, b));
        }
        groups
    }

    /// Render groups as one flat sequence
    pub fn flatten(groups: &BTreeMap<&'a str, Vec<&'a Unit>>) -> Vec<&'a Unit> {
        groups.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uom_core::{CatalogFeed, UnitCategory, UnitId};
    use crate::seed_feed;

    fn seeded() -> CatalogSnapshot {
        CatalogSnapshot::build(&seed_feed())
    }

    fn ids(units: &[&Unit]) -> Vec<u64> {
        units.iter().map(|u| u.id.0).collect()
    }

    #[test]
    fn test_empty_query_returns_all_active() {
        let snapshot = seeded();
        let all = UnitSearch::new(&snapshot).search("", None);
        let active = snapshot.units().iter().filter(|u| u.is_active).count();
        assert_eq!(all.len(), active);
        assert!(all.iter().all(|u| u.is_active));
        assert!(!ids(&all).contains(&44));
    }

    #[test]
    fn test_search_matches_alternate_names() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        // "ser" is not part of "Seer" or "seer"
        assert_eq!(ids(&search.search("ser", None)), vec![8]);
        assert_eq!(ids(&search.search("osy", None)), vec![21]);

        let feed = CatalogFeed::new(
            vec![UnitCategory::new(1, "Weight")],
            vec![
                Unit::new(1, 1, "Kilogram", "kg", 1.0).base().with_alternates(&["kilo"]),
                Unit::new(2, 1, "Gram", "g", 0.001),
            ],
        );
        let snapshot = CatalogSnapshot::build(&feed);
        assert_eq!(ids(&UnitSearch::new(&snapshot).search("kilo", None)), vec![1]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        for query in ["gram", "Kilo", "OZ", "m", "tEx", "pcs", "yd²", ""] {
            let lower: HashSet<u64> = ids(&search.search(&query.to_lowercase(), None)).into_iter().collect();
            let upper: HashSet<u64> = ids(&search.search(&query.to_uppercase(), None)).into_iter().collect();
            let as_is: HashSet<u64> = ids(&search.search(query, None)).into_iter().collect();
            assert_eq!(lower, upper, "{}", query);
            assert_eq!(lower, as_is, "{}", query);
        }
    }

    #[test]
    fn test_whitespace_is_part_of_the_query() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        assert!(search.search("   ", None).is_empty());
        assert!(search.search("g ", None).is_empty());
        assert!(search.search(" kg", None).is_empty());
        // Inner spaces still match multi-word names
        assert_eq!(ids(&search.search("per square", None)), vec![20, 21]);
    }

    #[test]
    fn test_category_filter() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        let grams = search.search("gram", Some("Weight"));
        assert_eq!(ids(&grams), vec![1, 2, 3]);
        assert!(search.search("gram", Some("No Such Category")).is_empty());
        assert_eq!(search.by_category("Quantity").len(), 4);
    }

    #[test]
    fn test_by_type_partitions_active_units() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        let mut seen = HashSet::new();
        let mut total = 0;
        for unit_type in UnitType::ALL {
            for unit in search.by_type(unit_type) {
                assert_eq!(unit.unit_type, unit_type);
                assert!(seen.insert(unit.id), "{} listed twice", unit.name);
                total += 1;
            }
        }
        assert_eq!(total, search.search("", None).len());
        assert_eq!(ids(&search.by_type(UnitType::Desi)), vec![17, 7, 8, 9]);
    }

    #[test]
    fn test_grouping_order() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        let groups = search.group_by_category(&search.search("", None));
        let names: Vec<&str> = groups.keys().copied().collect();
        assert_eq!(
            names,
            vec!["Length", "Quantity", "Textile - Fabric Weight", "Textile - Linear Density", "Weight"]
        );
        assert_eq!(ids(&groups["Textile - Linear Density"]), vec![30, 31, 32]);
    }

    #[test]
    fn test_grouping_ties_break_by_name() {
        let feed = CatalogFeed::new(
            vec![UnitCategory::new(1, "Length")],
            vec![
                Unit::new(3, 1, "Yard", "yd", 0.9144).with_sort_order(1),
                Unit::new(1, 1, "Meter", "m", 1.0).base().with_sort_order(0),
                Unit::new(2, 1, "Gaz", "gaz", 0.9144).with_sort_order(1),
            ],
        );
        let snapshot = CatalogSnapshot::build(&feed);
        let search = UnitSearch::new(&snapshot);
        let units: Vec<&Unit> = snapshot.units().iter().rev().collect();
        let groups = search.group_by_category(&units);
        assert_eq!(ids(&groups["Length"]), vec![1, 2, 3]);
    }

    #[test]
    fn test_grouping_is_complete() {
        let snapshot = seeded();
        let search = UnitSearch::new(&snapshot);
        let all = search.search("", None);
        let groups = search.group_by_category(&all);
        let flat = UnitSearch::flatten(&groups);
        assert_eq!(flat.len(), all.len());
        let a: HashSet<UnitId> = all.iter().map(|u| u.id).collect();
        let b: HashSet<UnitId> = flat.iter().map(|u| u.id).collect();
        assert_eq!(a, b);
        // Canonical search order is already the grouped order
        assert_eq!(ids(&flat), ids(&all));
    }

    #[test]
    fn test_grouping_keeps_foreign_units() {
        let snapshot = seeded();
        let stray = Unit::new(99, 77, "Stray", "st", 1.0);
        let groups = UnitSearch::new(&snapshot).group_by_category(&[&stray]);
        assert_eq!(ids(&groups[UNCATEGORIZED]), vec![99]);
    }
}
