//! Unit resolution by id, symbol, name or alternate name
//!
//! A pure view over one snapshot: never mutates, never fetches.
//! Against a snapshot that was never loaded every lookup fails with
//! `DATA_UNAVAILABLE`; against a loaded one a miss is
//! `UNKNOWN_UNIT_REFERENCE`.

use uom_core::{CategoryId, ClassifiedError, Operation, Unit, UnitCategory, UnitId};
use crate::snapshot::normalize;
use crate::CatalogSnapshot;

pub struct Resolver<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// Any unit by id, including inactive ones kept for historical display
    pub fn by_id(&self, id: UnitId) -> Result<&'a Unit, ClassifiedError> {
        self.ensure_loaded()?;
        self.snapshot
            .unit(id)
            .ok_or_else(|| not_found(id, "lookup by id"))
    }

    /// Case-insensitive exact symbol match.
    ///
    /// When several categories share a symbol the first by category name,
    /// then `sort_order`, wins.
    pub fn by_symbol(&self, symbol: &str) -> Result<&'a Unit, ClassifiedError> {
        self.ensure_loaded()?;
        self.snapshot
            .units_with_symbol(symbol)
            .next()
            .ok_or_else(|| not_found(symbol.trim(), "lookup by symbol"))
    }

    /// Resolve free text: numeric id, then symbol, then exact name, then
    /// exact alternate name. Name matches ignore case and use the same
    /// tie-break as symbols.
    pub fn resolve(&self, reference: &str) -> Result<&'a Unit, ClassifiedError> {
        self.ensure_loaded()?;
        let reference = reference.trim();

        if let Ok(raw) = reference.parse::<u64>() {
            if let Some(unit) = self.snapshot.unit(UnitId(raw)) {
                return Ok(unit);
            }
        }
        if let Some(unit) = self.snapshot.units_with_symbol(reference).next() {
            return Ok(unit);
        }

        let needle = normalize(reference);
        let units = self.snapshot.units();
        units
            .iter()
            .find(|u| normalize(&u.name) == needle)
            .or_else(|| {
                units
                    .iter()
                    .find(|u| u.alternate_names.iter().any(|alt| normalize(alt) == needle))
            })
            .ok_or_else(|| not_found(reference, "lookup by reference"))
    }

    /// The unit flagged `is_base` in a category, if any
    pub fn base_unit(&self, category_id: CategoryId) -> Option<&'a Unit> {
        self.snapshot
            .units()
            .iter()
            .find(|u| u.category_id == category_id && u.is_base)
    }

    pub fn category(&self, category_id: CategoryId) -> Result<&'a UnitCategory, ClassifiedError> {
        self.ensure_loaded()?;
        self.snapshot.category(category_id).ok_or_else(|| {
            ClassifiedError::unknown_unit(format!("category {}", category_id))
                .with_message(format!("Category '{}' was not found.", category_id))
                .with_operation(Operation::Resolve)
        })
    }

    fn ensure_loaded(&self) -> Result<(), ClassifiedError> {
        if self.snapshot.is_loaded() {
            Ok(())
        } else {
            Err(ClassifiedError::data_unavailable("catalog has not been loaded")
                .with_operation(Operation::Resolve))
        }
    }
}

fn not_found(reference: impl std::fmt::Display, how: &str) -> ClassifiedError {
    ClassifiedError::unknown_unit(reference)
        .with_detail(how)
        .with_operation(Operation::Resolve)
}
