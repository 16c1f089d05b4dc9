//! Conversion between units of one category
//!
//! result = value * (from.to_base_factor / to.to_base_factor)
//!
//! The base unit of a category has factor 1, so the same rule covers
//! base-to-derived, derived-to-base and derived-to-derived.

use serde::Serialize;
use tracing::debug;
use uom_core::{ClassifiedError, Operation, Unit, UnitId};
use crate::{CatalogSnapshot, Resolver, UnitSearch};

/// Largest precision honoured when rounding for display
const MAX_DECIMALS: u32 = 15;

/// Outcome of one conversion. Built fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// The input quantity
    pub value: f64,
    pub from_unit: Unit,
    pub to_unit: Unit,
    /// Unrounded converted value
    pub result: f64,
    /// Ratio applied: from factor / to factor
    pub factor: f64,
    /// Human-readable description of the scaling
    pub formula: Option<String>,
}

impl ConversionResult {
    /// Source and target are the same unit; UIs may show "nothing to convert"
    pub fn is_identity(&self) -> bool {
        self.from_unit.id == self.to_unit.id
    }

    /// `result` rounded to the target unit's `decimal_places`
    pub fn rounded_result(&self) -> f64 {
        round_to(self.result, self.to_unit.decimal_places)
    }

    /// `result` formatted with exactly `decimal_places` digits
    pub fn display_result(&self) -> String {
        let places = self.to_unit.decimal_places.min(MAX_DECIMALS) as usize;
        format!("{:.*}", places, self.result)
    }
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places.min(MAX_DECIMALS) as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

pub struct Converter<'a> {
    snapshot: &'a CatalogSnapshot,
}

impl<'a> Converter<'a> {
    pub fn new(snapshot: &'a CatalogSnapshot) -> Self {
        Self { snapshot }
    }

    /// Convert `value` from one unit to another
    pub fn convert(&self, value: f64, from: UnitId, to: UnitId) -> Result<ConversionResult, ClassifiedError> {
        let resolver = Resolver::new(self.snapshot);
        let from_unit = resolver.by_id(from).map_err(in_conversion)?;
        let to_unit = resolver.by_id(to).map_err(in_conversion)?;

        if from_unit.category_id != to_unit.category_id {
            let name = |u: &Unit| {
                self.snapshot
                    .category_name(u.category_id)
                    .unwrap_or("unknown")
                    .to_string()
            };
            return Err(ClassifiedError::incompatible_categories(&name(from_unit), &name(to_unit))
                .with_detail(format!("{} -> {}", from_unit.label(), to_unit.label()))
                .with_operation(Operation::Convert));
        }

        let from_factor = checked_factor(from_unit)?;
        let to_factor = checked_factor(to_unit)?;
        let factor = from_factor / to_factor;
        let result = value * factor;

        debug!(
            from = %from_unit.symbol,
            to = %to_unit.symbol,
            value = value,
            result = result,
            "Converted"
        );

        let mut conversion = ConversionResult {
            value,
            from_unit: from_unit.clone(),
            to_unit: to_unit.clone(),
            result,
            factor,
            formula: None,
        };
        conversion.formula = Some(formula(&conversion));
        Ok(conversion)
    }

    /// Convert with possibly-unselected units
    pub fn convert_selection(
        &self,
        value: f64,
        from: Option<UnitId>,
        to: Option<UnitId>,
    ) -> Result<ConversionResult, ClassifiedError> {
        let from = from.ok_or_else(|| missing("source unit"))?;
        let to = to.ok_or_else(|| missing("target unit"))?;
        self.convert(value, from, to)
    }

    /// Convert `value` into its category's base unit
    pub fn to_base(&self, value: f64, unit: UnitId) -> Result<ConversionResult, ClassifiedError> {
        let resolver = Resolver::new(self.snapshot);
        let source = resolver.by_id(unit).map_err(in_conversion)?;
        let base = resolver.base_unit(source.category_id).ok_or_else(|| {
            let category = self.snapshot.category_name(source.category_id).unwrap_or("unknown");
            ClassifiedError::new(uom_core::ErrorKind::InvalidData)
                .with_message(format!("Category '{}' has no base unit.", category))
                .with_operation(Operation::Convert)
        })?;
        self.convert(value, source.id, base.id)
    }

    /// Active units `unit` can be converted into, in display order
    pub fn compatible_units(&self, unit: UnitId) -> Result<Vec<&'a Unit>, ClassifiedError> {
        let source = Resolver::new(self.snapshot).by_id(unit).map_err(in_conversion)?;
        Ok(UnitSearch::new(self.snapshot)
            .search("", None)
            .into_iter()
            .filter(|u| u.category_id == source.category_id)
            .collect())
    }
}

fn checked_factor(unit: &Unit) -> Result<f64, ClassifiedError> {
    unit.valid_factor().ok_or_else(|| {
        ClassifiedError::invalid_data(&unit.name, unit.to_base_factor)
            .with_operation(Operation::Convert)
    })
}

fn missing(what: &str) -> ClassifiedError {
    ClassifiedError::missing_selection(what).with_operation(Operation::Convert)
}

fn in_conversion(err: ClassifiedError) -> ClassifiedError {
    err.with_operation(Operation::Convert)
}

/// "1 kg = 1000.00 g (× 1000)"
fn formula(c: &ConversionResult) -> String {
    format!(
        "{} {} = {} {} (× {})",
        c.value,
        c.from_unit.symbol,
        c.display_result(),
        c.to_unit.symbol,
        c.factor
    )
}
