//! Shared session catalog
//!
//! Holds the current `CatalogSnapshot` behind a pointer that is swapped in
//! one step, so readers see either the old or the new snapshot in full.
//!
//! Loading:
//! - `load()` coalesces: a caller arriving while a load is in flight waits
//!   for that load's outcome instead of fetching again
//! - `refresh()` always fetches; whichever fetch completes last owns the
//!   snapshot pointer
//! - a failed fetch leaves the previous snapshot in place

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uom_core::{classify, ClassifiedError, Fault, Operation, Unit, UnitId, UnitType};
use crate::{CatalogSnapshot, CatalogSource, ConversionResult, Converter, Resolver, UnitSearch};

type LoadOutcome = Result<Arc<CatalogSnapshot>, ClassifiedError>;

/// Catalog behaviour switches
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Reject a feed with any data-quality issue instead of recording it
    pub strict: bool,
}

/// Observable load state
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub is_loading: bool,
    pub last_error: Option<ClassifiedError>,
    pub loaded: bool,
    pub version: u64,
    pub category_count: usize,
    pub unit_count: usize,
    pub issue_count: usize,
}

#[derive(Default)]
struct LoadState {
    active: usize,
    last_error: Option<ClassifiedError>,
}

pub struct UnitCatalog {
    source: Arc<dyn CatalogSource>,
    config: CatalogConfig,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    state: Mutex<LoadState>,
    in_flight: Mutex<Option<broadcast::Sender<LoadOutcome>>>,
    versions: AtomicU64,
}

// Lock poisoning only means a panic elsewhere; the guarded data is still whole
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl UnitCatalog {
    pub fn new(source: Arc<dyn CatalogSource>, config: CatalogConfig) -> Self {
        Self {
            source,
            config,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            state: Mutex::new(LoadState::default()),
            in_flight: Mutex::new(None),
            versions: AtomicU64::new(0),
        }
    }

    pub fn with_source<S: CatalogSource + 'static>(source: S) -> Self {
        Self::new(Arc::new(source), CatalogConfig::default())
    }

    /// The current snapshot. Cheap; callers may hold it across a reload.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn status(&self) -> CatalogStatus {
        let snapshot = self.snapshot();
        let state = lock(&self.state);
        CatalogStatus {
            is_loading: state.active > 0,
            last_error: state.last_error.clone(),
            loaded: snapshot.is_loaded(),
            version: snapshot.version(),
            category_count: snapshot.categories().len(),
            unit_count: snapshot.units().len(),
            issue_count: snapshot.issues().len(),
        }
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).active > 0
    }

    pub fn last_error(&self) -> Option<ClassifiedError> {
        lock(&self.state).last_error.clone()
    }

    // ========== Loading ==========

    /// Fetch and install a new snapshot, joining any load already in flight
    pub async fn load(&self) -> LoadOutcome {
        let role = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.as_ref().map(|sender| sender.subscribe()) {
                Some(receiver) => Role::Follower(receiver),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    *in_flight = Some(sender.clone());
                    Role::Leader(sender)
                }
            }
        };

        let sender = match role {
            Role::Leader(sender) => sender,
            Role::Follower(receiver) => {
                debug!("Joining in-flight catalog load");
                return Self::await_coalesced(receiver).await;
            }
        };

        let guard = InFlight { slot: &self.in_flight, completed: false };
        let outcome = self.fetch_and_install().await;
        guard.complete(sender, &outcome);
        outcome
    }

    /// Fetch and install a new snapshot without joining an in-flight load
    pub async fn refresh(&self) -> LoadOutcome {
        self.fetch_and_install().await
    }

    async fn await_coalesced(mut receiver: broadcast::Receiver<LoadOutcome>) -> LoadOutcome {
        match receiver.recv().await {
            Ok(outcome) => outcome,
            // Leader dropped before finishing
            Err(e) => Err(ClassifiedError::unknown(format!("catalog load abandoned: {}", e))
                .with_operation(Operation::Load)),
        }
    }

    async fn fetch_and_install(&self) -> LoadOutcome {
        let _loading = Loading::enter(&self.state);
        let started = Instant::now();

        match self.fetch().await {
            Ok(snapshot) => {
                // Versions are numbered in install order, never fetch order
                let snapshot = {
                    let mut current = self.snapshot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
                    let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
                    let snapshot = Arc::new(snapshot.with_version(version));
                    *current = Arc::clone(&snapshot);
                    snapshot
                };
                let version = snapshot.version();
                lock(&self.state).last_error = None;
                info!(
                    version = version,
                    categories = snapshot.categories().len(),
                    units = snapshot.units().len(),
                    issues = snapshot.issues().len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Catalog snapshot installed"
                );
                Ok(snapshot)
            }
            Err(err) => {
                warn!(
                    kind = %err.kind(),
                    detail = err.detail().unwrap_or(""),
                    source = %self.source.describe(),
                    "Catalog load failed, keeping previous snapshot"
                );
                lock(&self.state).last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<CatalogSnapshot, ClassifiedError> {
        let feed = self
            .source
            .fetch_feed()
            .await
            .map_err(|fault| classify(&fault, Operation::Load))?;

        let snapshot = CatalogSnapshot::build(&feed);
        for issue in snapshot.issues() {
            warn!(issue = %issue, "Catalog data-quality issue");
        }

        if self.config.strict && !snapshot.issues().is_empty() {
            let summary: Vec<String> = snapshot.issues().iter().map(|i| i.to_string()).collect();
            let fault = Fault::DataQuality(summary.join("; "));
            return Err(classify(&fault, Operation::Load));
        }

        Ok(snapshot)
    }

    // ========== Reads over the current snapshot ==========

    pub fn by_id(&self, id: UnitId) -> Result<Unit, ClassifiedError> {
        let snapshot = self.snapshot();
        Resolver::new(&snapshot).by_id(id).cloned()
    }

    pub fn by_symbol(&self, symbol: &str) -> Result<Unit, ClassifiedError> {
        let snapshot = self.snapshot();
        Resolver::new(&snapshot).by_symbol(symbol).cloned()
    }

    /// Resolve an id, symbol, name or alternate name
    pub fn resolve(&self, reference: &str) -> Result<Unit, ClassifiedError> {
        let snapshot = self.snapshot();
        Resolver::new(&snapshot).resolve(reference).cloned()
    }

    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<Unit> {
        let snapshot = self.snapshot();
        UnitSearch::new(&snapshot).search(query, category).into_iter().cloned().collect()
    }

    pub fn by_type(&self, unit_type: UnitType) -> Vec<Unit> {
        let snapshot = self.snapshot();
        UnitSearch::new(&snapshot).by_type(unit_type).into_iter().cloned().collect()
    }

    pub fn by_category(&self, name: &str) -> Vec<Unit> {
        let snapshot = self.snapshot();
        UnitSearch::new(&snapshot).by_category(name).into_iter().cloned().collect()
    }

    /// Search, then group by category name
    pub fn grouped(&self, query: &str, category: Option<&str>) -> Vec<(String, Vec<Unit>)> {
        let snapshot = self.snapshot();
        let search = UnitSearch::new(&snapshot);
        let found = search.search(query, category);
        search
            .group_by_category(&found)
            .into_iter()
            .map(|(name, units)| (name.to_string(), units.into_iter().cloned().collect()))
            .collect()
    }

    pub fn convert(&self, value: f64, from: UnitId, to: UnitId) -> Result<ConversionResult, ClassifiedError> {
        let snapshot = self.snapshot();
        Converter::new(&snapshot).convert(value, from, to)
    }

    pub fn convert_selection(
        &self,
        value: f64,
        from: Option<UnitId>,
        to: Option<UnitId>,
    ) -> Result<ConversionResult, ClassifiedError> {
        let snapshot = self.snapshot();
        Converter::new(&snapshot).convert_selection(value, from, to)
    }
}

enum Role {
    Leader(broadcast::Sender<LoadOutcome>),
    Follower(broadcast::Receiver<LoadOutcome>),
}

/// Counts a running fetch for `is_loading`
struct Loading<'a> {
    state: &'a Mutex<LoadState>,
}

impl<'a> Loading<'a> {
    fn enter(state: &'a Mutex<LoadState>) -> Self {
        lock(state).active += 1;
        Self { state }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        lock(self.state).active -= 1;
    }
}

/// Clears the in-flight slot even if the leading `load()` is dropped
struct InFlight<'a> {
    slot: &'a Mutex<Option<broadcast::Sender<LoadOutcome>>>,
    completed: bool,
}

impl InFlight<'_> {
    fn complete(mut self, sender: broadcast::Sender<LoadOutcome>, outcome: &LoadOutcome) {
        // Clear first: anyone arriving after this starts a new load,
        // anyone who subscribed before receives this outcome
        lock(self.slot).take();
        self.completed = true;
        let waiting = sender.receiver_count();
        if waiting > 0 {
            debug!(waiting = waiting, success = outcome.is_ok(), "Completing coalesced catalog load");
        }
        // No receivers is fine
        let _ = sender.send(outcome.clone());
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            lock(self.slot).take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use uom_core::{CatalogFeed, ErrorKind, UnitCategory};
    use crate::{seed_feed, StaticSource};

    /// Counts fetches and can be switched between failing and serving.
    /// A gated source holds every fetch until the gate is notified.
    struct ScriptedSource {
        fetches: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
        delay: Duration,
        gate: Option<Arc<Notify>>,
        feed: CatalogFeed,
    }

    impl ScriptedSource {
        fn new(feed: CatalogFeed, delay: Duration) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                failing: std::sync::atomic::AtomicBool::new(false),
                delay,
                gate: None,
                feed,
            }
        }

        fn gated(feed: CatalogFeed, gate: Arc<Notify>) -> Self {
            Self { gate: Some(gate), ..Self::new(feed, Duration::ZERO) }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch_categories(&self) -> Result<Vec<UnitCategory>, Fault> {
            Ok(self.feed.categories.clone())
        }

        async fn fetch_units(&self) -> Result<Vec<Unit>, Fault> {
            Ok(self.feed.units.clone())
        }

        async fn fetch_feed(&self) -> Result<CatalogFeed, Fault> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            tokio::time::sleep(self.delay).await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(Fault::Network("connection refused".to_string()));
            }
            Ok(self.feed.clone())
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_installs_snapshot() {
        let catalog = UnitCatalog::with_source(StaticSource::seeded());
        assert!(!catalog.snapshot().is_loaded());

        let snapshot = catalog.load().await.unwrap();
        assert_eq!(snapshot.version(), 1);
        assert!(catalog.snapshot().is_loaded());

        let status = catalog.status();
        assert!(!status.is_loading);
        assert!(status.last_error.is_none());
        assert_eq!(status.unit_count, seed_feed().units.len());
    }

    #[tokio::test]
    async fn test_unreachable_source_on_first_load() {
        let source = ScriptedSource::new(seed_feed(), Duration::from_millis(0));
        source.set_failing(true);
        let catalog = UnitCatalog::new(Arc::new(source), CatalogConfig::default());

        let err = catalog.load().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert!(err.is_retryable());
        assert_eq!(catalog.last_error().map(|e| e.kind()), Some(ErrorKind::DataUnavailable));

        let snapshot = catalog.snapshot();
        assert!(!snapshot.is_loaded());
        assert!(snapshot.is_empty());

        // Lookups against a never-loaded catalog are "data unavailable"
        let lookup = catalog.by_id(UnitId(1)).unwrap_err();
        assert_eq!(lookup.kind(), ErrorKind::DataUnavailable);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let source = Arc::new(ScriptedSource::new(seed_feed(), Duration::from_millis(0)));
        let catalog = UnitCatalog::new(source.clone(), CatalogConfig::default());
        catalog.load().await.unwrap();

        source.set_failing(true);
        let err = catalog.refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert_eq!(catalog.snapshot().version(), 1);
        assert_eq!(catalog.by_id(UnitId(1)).unwrap().symbol, "kg");

        source.set_failing(false);
        catalog.load().await.unwrap();
        assert!(catalog.last_error().is_none());
        assert_eq!(catalog.snapshot().version(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_coalesced() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(ScriptedSource::gated(seed_feed(), gate.clone()));
        let catalog = Arc::new(UnitCatalog::new(source.clone(), CatalogConfig::default()));

        let first = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.load().await }
        });
        while source.fetches.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(catalog.is_loading());

        // The second load subscribes on its first poll, before the gate opens
        let (second, _) = tokio::join!(catalog.load(), async {
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        let a = first.await.unwrap().unwrap();
        let b = second.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!catalog.is_loading());

        // A later load fetches again
        let again = tokio::spawn({
            let catalog = catalog.clone();
            async move { catalog.load().await }
        });
        gate.notify_one();
        again.await.unwrap().unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_install_increasing_versions() {
        let catalog = Arc::new(UnitCatalog::with_source(StaticSource::seeded()));
        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let catalog = catalog.clone();
                tokio::spawn(async move { catalog.refresh().await.map(|s| s.version()) })
            })
            .collect();

        let mut versions = Vec::new();
        for task in tasks {
            versions.push(task.await.unwrap().unwrap());
        }
        versions.sort_unstable();
        assert_eq!(versions, (1..=16).collect::<Vec<u64>>());
        // The snapshot installed last carries the highest version
        assert_eq!(catalog.snapshot().version(), 16);
        assert_eq!(catalog.status().version, 16);
    }

    #[tokio::test]
    async fn test_coalesced_waiters_share_failure() {
        let source = Arc::new(ScriptedSource::new(seed_feed(), Duration::from_millis(50)));
        source.set_failing(true);
        let catalog = Arc::new(UnitCatalog::new(source.clone(), CatalogConfig::default()));

        let (a, b) = tokio::join!(catalog.load(), catalog.load());
        assert_eq!(a.unwrap_err().kind(), ErrorKind::DataUnavailable);
        assert_eq!(b.unwrap_err().kind(), ErrorKind::DataUnavailable);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_does_not_coalesce() {
        let source = Arc::new(ScriptedSource::new(seed_feed(), Duration::from_millis(20)));
        let catalog = UnitCatalog::new(source.clone(), CatalogConfig::default());

        let (a, b) = tokio::join!(catalog.load(), catalog.refresh());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.snapshot().version(), 2);
    }

    #[tokio::test]
    async fn test_dropped_leader_does_not_wedge_loading() {
        let source = Arc::new(ScriptedSource::new(seed_feed(), Duration::from_millis(200)));
        let catalog = UnitCatalog::new(source.clone(), CatalogConfig::default());

        let abandoned = tokio::time::timeout(Duration::from_millis(10), catalog.load()).await;
        assert!(abandoned.is_err());
        assert!(!catalog.is_loading());

        source.set_failing(false);
        let snapshot = tokio::time::timeout(Duration::from_secs(5), catalog.load())
            .await
            .unwrap()
            .unwrap();
        assert!(snapshot.is_loaded());
    }

    fn defective_feed() -> CatalogFeed {
        CatalogFeed::new(
            vec![UnitCategory::new(1, "Weight")],
            vec![
                Unit::new(1, 1, "Kilogram", "kg", 1.0).base(),
                Unit::new(2, 1, "Gram", "g", 0.001),
                Unit::new(3, 1, "Bale", "bale", 0.0),
            ],
        )
    }

    #[tokio::test]
    async fn test_lenient_mode_records_issues() {
        let catalog = UnitCatalog::with_source(StaticSource::new(defective_feed()));
        let snapshot = catalog.load().await.unwrap();
        assert_eq!(snapshot.issues().len(), 1);
        assert_eq!(catalog.status().issue_count, 1);

        // Healthy units still convert, the defective one is reported
        assert_eq!(catalog.convert(1.0, UnitId(1), UnitId(2)).unwrap().result, 1000.0);
        let err = catalog.convert(1.0, UnitId(3), UnitId(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_defective_feed() {
        let catalog = UnitCatalog::new(
            Arc::new(StaticSource::new(defective_feed())),
            CatalogConfig { strict: true },
        );
        let err = catalog.load().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.detail().unwrap_or("").contains("unit 3"));
        assert!(!catalog.snapshot().is_loaded());
    }

    #[tokio::test]
    async fn test_reads_see_refreshed_snapshot() {
        let catalog = UnitCatalog::with_source(StaticSource::seeded());
        catalog.load().await.unwrap();
        let held = catalog.snapshot();
        catalog.refresh().await.unwrap();

        // Old holders keep a complete snapshot, new reads see the new one
        assert_eq!(held.version(), 1);
        assert_eq!(catalog.snapshot().version(), 2);
        assert_eq!(catalog.by_symbol("KG").unwrap().id, UnitId(1));
        assert_eq!(catalog.search("", Some("Weight")).len(), 9);
        assert_eq!(catalog.grouped("", None).len(), 5);
        assert!(catalog.by_type(UnitType::Desi).iter().all(|u| u.unit_type == UnitType::Desi));
    }
}
