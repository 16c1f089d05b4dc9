//! Catalog data model: categories, units and the raw feed

use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};

/// Globally unique, immutable unit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

/// Opaque category identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification tag of a unit.
///
/// Display styling only: conversion compatibility is decided by
/// `category_id` alone and never looks at this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitType {
    Si,
    International,
    /// Desi / regional (South Asian trade units such as tola, seer, maund)
    Desi,
    Textile,
    English,
    #[default]
    Other,
}

impl UnitType {
    pub const ALL: [UnitType; 6] = [
        UnitType::Si,
        UnitType::International,
        UnitType::Desi,
        UnitType::Textile,
        UnitType::English,
        UnitType::Other,
    ];

    /// Recognised tags only, case-insensitive
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "si" | "metric" => Some(UnitType::Si),
            "international" | "intl" => Some(UnitType::International),
            "desi" | "regional" | "local" => Some(UnitType::Desi),
            "textile" => Some(UnitType::Textile),
            "english" | "imperial" | "us" => Some(UnitType::English),
            "other" => Some(UnitType::Other),
            _ => None,
        }
    }

    /// Parse a feed tag. Unrecognised tags fall back to `Other`.
    pub fn parse(tag: &str) -> Self {
        UnitType::from_tag(tag).unwrap_or(UnitType::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Si => "SI",
            UnitType::International => "International",
            UnitType::Desi => "Desi",
            UnitType::Textile => "Textile",
            UnitType::English => "English",
            UnitType::Other => "Other",
        }
    }
}

impl From<String> for UnitType {
    fn from(tag: String) -> Self {
        UnitType::parse(&tag)
    }
}

impl From<UnitType> for String {
    fn from(t: UnitType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partition of units sharing one measurement dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCategory {
    pub id: CategoryId,
    /// Unique display name (e.g., "Weight", "Textile - Fabric Weight")
    pub name: String,
}

impl UnitCategory {
    pub fn new(id: u64, name: &str) -> Self {
        UnitCategory {
            id: CategoryId(id),
            name: name.to_string(),
        }
    }
}

/// A unit of measure as supplied by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub category_id: CategoryId,
    pub name: String,
    /// Display-unique within a category, not globally
    pub symbol: String,
    /// Synonyms, used for search only
    #[serde(default, deserialize_with = "alternate_names")]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub unit_type: UnitType,
    #[serde(default)]
    pub region: Option<String>,
    /// Multiplier converting one of this unit into the category base unit.
    /// `None` when the feed omitted it or sent something unparsable.
    #[serde(default, deserialize_with = "factor")]
    pub to_base_factor: Option<f64>,
    #[serde(default)]
    pub is_base: bool,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub decimal_places: u32,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub description: Option<String>,
}

fn active_by_default() -> bool {
    true
}

impl Unit {
    /// Create an active, non-base unit with the given factor
    pub fn new(id: u64, category_id: u64, name: &str, symbol: &str, to_base_factor: f64) -> Self {
        Unit {
            id: UnitId(id),
            category_id: CategoryId(category_id),
            name: name.to_string(),
            symbol: symbol.to_string(),
            alternate_names: Vec::new(),
            unit_type: UnitType::Other,
            region: None,
            to_base_factor: Some(to_base_factor),
            is_base: false,
            is_active: true,
            decimal_places: 2,
            sort_order: 0,
            description: None,
        }
    }

    /// Builder: mark as the category base unit
    pub fn base(mut self) -> Self {
        self.is_base = true;
        self
    }

    /// Builder: set alternate names
    pub fn with_alternates(mut self, names: &[&str]) -> Self {
        self.alternate_names = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Builder: set classification tag
    pub fn with_type(mut self, unit_type: UnitType) -> Self {
        self.unit_type = unit_type;
        self
    }

    /// Builder: set regional qualifier
    pub fn in_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Builder: set display precision
    pub fn with_decimals(mut self, decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    /// Builder: set ordering key within the category
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Builder: set description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Builder: deactivate
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// The conversion factor if it is present, positive and finite
    pub fn valid_factor(&self) -> Option<f64> {
        self.to_base_factor.filter(|f| f.is_finite() && *f > 0.0)
    }

    pub fn has_valid_factor(&self) -> bool {
        self.valid_factor().is_some()
    }

    /// Case-insensitive substring match against name, symbol and each
    /// alternate name. `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(needle)
            || self.symbol.to_lowercase().contains(needle)
            || self.alternate_names.iter().any(|alt| alt.to_lowercase().contains(needle))
    }

    /// "Kilogram (kg)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// The two collections delivered by the data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFeed {
    #[serde(default)]
    pub categories: Vec<UnitCategory>,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl CatalogFeed {
    pub fn new(categories: Vec<UnitCategory>, units: Vec<Unit>) -> Self {
        CatalogFeed { categories, units }
    }
}

// ============ lenient feed fields ============

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFactor {
    Number(f64),
    Text(String),
}

/// Factors arrive as JSON numbers or decimal strings ("0.001").
/// Unparsable text becomes `None` so validation can report it.
fn factor<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawFactor>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawFactor::Number(n)) => Some(n),
        Some(RawFactor::Text(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNames {
    List(Vec<String>),
    Text(String),
}

/// Alternate names arrive as a list or as one comma-separated string
fn alternate_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNames>::deserialize(deserializer)?;
    let names = match raw {
        Some(RawNames::List(list)) => list,
        Some(RawNames::Text(text)) => text.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };
    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_type_parse() {
        assert_eq!(UnitType::parse("SI"), UnitType::Si);
        assert_eq!(UnitType::parse("desi"), UnitType::Desi);
        assert_eq!(UnitType::parse("Regional"), UnitType::Desi);
        assert_eq!(UnitType::parse("Imperial"), UnitType::English);
        assert_eq!(UnitType::parse("astronomical"), UnitType::Other);
    }

    #[test]
    fn test_unit_type_from_tag_rejects_unknown() {
        assert_eq!(UnitType::from_tag("Textile"), Some(UnitType::Textile));
        assert_eq!(UnitType::from_tag("other"), Some(UnitType::Other));
        assert_eq!(UnitType::from_tag("dessi"), None);
        assert_eq!(UnitType::from_tag(""), None);
    }

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{
            "id": 2, "category_id": 1, "name": "Gram", "symbol": "g",
            "alternate_names": ["gm", "grams"], "unit_type": "SI",
            "region": null, "to_base_factor": 0.001, "is_base": false,
            "is_active": true, "decimal_places": 2, "sort_order": 2,
            "description": "One thousandth of a kilogram"
        }"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.id, UnitId(2));
        assert_eq!(unit.alternate_names, vec!["gm", "grams"]);
        assert_eq!(unit.unit_type, UnitType::Si);
        assert_eq!(unit.to_base_factor, Some(0.001));
    }

    #[test]
    fn test_deserialize_decimal_string_factor() {
        let json = r#"{"id": 2, "category_id": 1, "name": "Gram", "symbol": "g", "to_base_factor": "0.001000"}"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.to_base_factor, Some(0.001));
        assert!(unit.is_active);
        assert_eq!(unit.unit_type, UnitType::Other);
    }

    #[test]
    fn test_deserialize_missing_or_garbage_factor() {
        let missing = r#"{"id": 3, "category_id": 1, "name": "Lump", "symbol": "lp"}"#;
        let unit: Unit = serde_json::from_str(missing).unwrap();
        assert_eq!(unit.to_base_factor, None);
        assert!(!unit.has_valid_factor());

        let garbage = r#"{"id": 3, "category_id": 1, "name": "Lump", "symbol": "lp", "to_base_factor": "n/a"}"#;
        let unit: Unit = serde_json::from_str(garbage).unwrap();
        assert_eq!(unit.to_base_factor, None);
    }

    #[test]
    fn test_deserialize_comma_separated_alternates() {
        let json = r#"{"id": 1, "category_id": 1, "name": "Kilogram", "symbol": "kg", "to_base_factor": 1, "alternate_names": "kilo, kgs,, "}"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.alternate_names, vec!["kilo", "kgs"]);
    }

    #[test]
    fn test_valid_factor() {
        assert!(Unit::new(1, 1, "a", "a", 1.0).has_valid_factor());
        assert!(!Unit::new(1, 1, "a", "a", 0.0).has_valid_factor());
        assert!(!Unit::new(1, 1, "a", "a", -2.0).has_valid_factor());
        assert!(!Unit::new(1, 1, "a", "a", f64::NAN).has_valid_factor());
        assert!(!Unit::new(1, 1, "a", "a", f64::INFINITY).has_valid_factor());
    }

    #[test]
    fn test_matches_alternate_name_independently() {
        let kg = Unit::new(1, 1, "Kilogram", "kg", 1.0).with_alternates(&["kilo"]);
        assert!(kg.matches("kilo"));
        assert!(kg.matches("gram"));
        assert!(kg.matches(""));
        assert!(!kg.matches("pound"));

        let bale = Unit::new(9, 1, "Bale", "bl", 217.0).with_alternates(&["Gathri"]);
        assert!(bale.matches("gath"));
    }
}
