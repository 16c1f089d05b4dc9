//! Catalog data sources
//!
//! The engine treats the source as an opaque supplier of two collections.
//! Sources report raw `Fault`s; the catalog classifies them.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tracing::debug;
use uom_core::{CatalogFeed, Fault, Unit, UnitCategory};
use crate::seed_feed;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_categories(&self) -> Result<Vec<UnitCategory>, Fault>;

    async fn fetch_units(&self) -> Result<Vec<Unit>, Fault>;

    /// Fetch both collections concurrently
    async fn fetch_feed(&self) -> Result<CatalogFeed, Fault> {
        let (categories, units) = tokio::try_join!(self.fetch_categories(), self.fetch_units())?;
        Ok(CatalogFeed::new(categories, units))
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

// ============ StaticSource ============

/// In-memory source
pub struct StaticSource {
    feed: CatalogFeed,
}

impl StaticSource {
    pub fn new(feed: CatalogFeed) -> Self {
        Self { feed }
    }

    /// The built-in catalog
    pub fn seeded() -> Self {
        Self::new(seed_feed())
    }
}

#[async_trait]
impl CatalogSource for StaticSource {
    async fn fetch_categories(&self) -> Result<Vec<UnitCategory>, Fault> {
        Ok(self.feed.categories.clone())
    }

    async fn fetch_units(&self) -> Result<Vec<Unit>, Fault> {
        Ok(self.feed.units.clone())
    }

    fn describe(&self) -> String {
        format!(
            "static ({} categories, {} units)",
            self.feed.categories.len(),
            self.feed.units.len()
        )
    }
}

// ============ JsonFileSource ============

/// Reads `{"categories": [...], "units": [...]}` from a JSON file
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode a feed document
    pub fn parse(text: &str) -> Result<CatalogFeed, Fault> {
        Ok(serde_json::from_str(text)?)
    }
}

#[async_trait]
impl CatalogSource for JsonFileSource {
    async fn fetch_categories(&self) -> Result<Vec<UnitCategory>, Fault> {
        Ok(self.fetch_feed().await?.categories)
    }

    async fn fetch_units(&self) -> Result<Vec<Unit>, Fault> {
        Ok(self.fetch_feed().await?.units)
    }

    // One read serves both collections
    async fn fetch_feed(&self) -> Result<CatalogFeed, Fault> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        debug!(path = %self.path.display(), bytes = text.len(), "Read catalog file");
        Self::parse(&text)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
