//! UoM Core - Fundamental types
//!
//! This crate provides the plain data shared by every part of the engine:
//! - `Unit`, `UnitCategory`, `UnitType`: the catalog data model
//! - `CatalogFeed`: the two collections supplied by the data source
//! - `Fault`: raw low-level failures (network, HTTP, parse, validation)
//! - `ClassifiedError`: the fixed error taxonomy handed to consumers
//! - `classify`: total mapping from `Fault` to `ClassifiedError`

mod model;
mod fault;
mod error;
mod classify;

pub use model::{Unit, UnitCategory, UnitType, UnitId, CategoryId, CatalogFeed};
pub use fault::Fault;
pub use error::{ClassifiedError, ErrorKind, Operation, codes};
pub use classify::{classify, classify_message};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Unit, UnitCategory, UnitType, UnitId, CategoryId, CatalogFeed,
        Fault, ClassifiedError, ErrorKind, Operation, classify,
    };
}
