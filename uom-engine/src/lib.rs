//! UoM Engine - Unit catalog, resolution, search and conversion
//!
//! Components, leaves first:
//! - `CatalogSnapshot`: immutable, indexed view of one catalog load
//! - `Resolver`: unit lookup by id, symbol, name or alternate name
//! - `UnitSearch`: filtering, grouping and deterministic ordering
//! - `Converter`: linear scaling through the category base unit
//! - `UnitCatalog`: the shared session catalog with coalesced async loading
//!
//! Every consumer-facing failure is a `uom_core::ClassifiedError`.

mod quality;
mod snapshot;
mod seed;
mod source;
mod catalog;
mod resolve;
mod search;
mod convert;

pub use quality::{DataIssue, inspect};
pub use snapshot::CatalogSnapshot;
pub use seed::seed_feed;
pub use source::{CatalogSource, StaticSource, JsonFileSource};
pub use catalog::{UnitCatalog, CatalogConfig, CatalogStatus};
pub use resolve::Resolver;
pub use search::{UnitSearch, UNCATEGORIZED};
pub use convert::{Converter, ConversionResult, round_to};

pub use uom_core::{
    Unit, UnitCategory, UnitType, UnitId, CategoryId, CatalogFeed,
    ClassifiedError, ErrorKind, Fault, Operation,
};
