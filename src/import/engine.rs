//! Batch scheduler and row upsert engine
//!
//! Drives bounded-concurrency execution over the decoded row sequence while
//! keeping progress accounting on the job record exact. Rows are dispatched
//! a batch at a time: every row of a batch resolves before the next batch
//! starts, which caps in-flight catalog writes at the batch size while still
//! overlapping I/O latency within a batch.
//!
//! Per-row semantics live in the apply functions below, one per
//! [`ImportMode`]. A row failure is recorded on the job and never aborts
//! the run; only a decode failure is run-fatal.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use metrics::{counter, histogram};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::ImportMode;
use super::job::{ImportJob, ImportStatus, RowError};
use super::sheet::{self, SheetRow};
use crate::store::{CatalogStore, ItemPatch, NewItem, StoreError};

/// Successful row outcomes; failures travel as [`RowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Created,
    Updated,
    Ignored,
}

/// Executes one import run against the catalog store.
pub struct ImportRunner {
    store: Arc<dyn CatalogStore>,
    job: Arc<ImportJob>,
    batch_size: usize,
}

impl ImportRunner {
    pub fn new(store: Arc<dyn CatalogStore>, job: Arc<ImportJob>, batch_size: usize) -> Self {
        Self {
            store,
            job,
            batch_size: batch_size.max(1),
        }
    }

    /// Execute the whole run. Spawned detached from the submitting request;
    /// the job record is the only channel back to the HTTP layer.
    #[instrument(skip(self, data), fields(import_id = %self.job.id, mode = %self.job.mode))]
    pub async fn run(self, data: Vec<u8>) {
        let started = std::time::Instant::now();
        let mode = self.job.mode;

        let rows = match sheet::decode_rows(&data) {
            Ok(rows) => rows,
            Err(err) => {
                warn!("Import {} failed to decode upload: {}", self.job.id, err);
                self.job.fail("unreadable file", err.to_string());
                counter!("import_runs_total", "mode" => mode.as_str(), "result" => "failed")
                    .increment(1);
                return;
            }
        };
        drop(data);

        self.job.set_total(rows.len() as u32);
        self.job.advance(ImportStatus::Running);
        info!("Import {} decoded {} rows", self.job.id, rows.len());

        // Working set of codes already claimed in this run. Shared across
        // concurrently resolving rows so two rows carrying the same new code
        // cannot both insert.
        let seen = Arc::new(Mutex::new(HashSet::new()));

        for batch in rows.chunks(self.batch_size) {
            let mut tasks = JoinSet::new();
            for row in batch {
                let store = Arc::clone(&self.store);
                let job = Arc::clone(&self.job);
                let seen = Arc::clone(&seen);
                let row = row.clone();
                tasks.spawn(async move {
                    let outcome = apply_row(store.as_ref(), &seen, job.mode, &row).await;
                    record_outcome(&job, outcome);
                });
            }
            // Batch boundary: every row resolves before the next batch starts
            while let Some(joined) = tasks.join_next().await {
                if let Err(join_err) = joined {
                    error!("Import {} row task aborted: {}", self.job.id, join_err);
                }
            }
        }

        self.job.advance(ImportStatus::Completed);

        let snapshot = self.job.snapshot();
        info!(
            "Import {} completed: {} rows, {} created, {} updated, {} ignored, {} errors in {:.2}s",
            self.job.id,
            snapshot.total,
            snapshot.succeeded,
            snapshot.updated,
            snapshot.ignored,
            snapshot.errors.len(),
            started.elapsed().as_secs_f64()
        );
        counter!("import_runs_total", "mode" => mode.as_str(), "result" => "completed")
            .increment(1);
        histogram!("import_run_seconds", "mode" => mode.as_str())
            .record(started.elapsed().as_secs_f64());
    }
}

fn record_outcome(job: &ImportJob, outcome: Result<RowOutcome, RowError>) {
    let label = match &outcome {
        Ok(RowOutcome::Created) => "created",
        Ok(RowOutcome::Updated) => "updated",
        Ok(RowOutcome::Ignored) => "ignored",
        Err(_) => "errored",
    };
    counter!("import_rows_total", "mode" => job.mode.as_str(), "outcome" => label).increment(1);

    match outcome {
        Ok(RowOutcome::Created) => job.record_created(),
        Ok(RowOutcome::Updated) => job.record_updated(),
        Ok(RowOutcome::Ignored) => job.record_ignored(),
        Err(err) => job.record_error(err),
    }
}

/// Decide the fate of one row and apply it.
async fn apply_row(
    store: &dyn CatalogStore,
    seen: &Mutex<HashSet<String>>,
    mode: ImportMode,
    row: &SheetRow,
) -> Result<RowOutcome, RowError> {
    let code = row.code.trim();
    let description = row.description.trim();

    // Validation happens before any store access
    if code.is_empty() || description.is_empty() {
        return Err(row_error(row.line, code, "missing code/description", None));
    }

    match mode {
        ImportMode::Quantities => apply_quantity_row(store, row, code).await,
        ImportMode::Items => apply_new_item_row(store, seen, row, code, description).await,
        ImportMode::Details => apply_detail_row(store, row, code, description).await,
    }
}

/// Import per-location quantities for an already registered item.
async fn apply_quantity_row(
    store: &dyn CatalogStore,
    row: &SheetRow,
    code: &str,
) -> Result<RowOutcome, RowError> {
    let item = store
        .find_by_code(code)
        .await
        .map_err(|e| store_failure(row.line, code, "catalog lookup failed", e))?;

    let Some(item) = item else {
        return Err(row_error(row.line, code, "not registered", None));
    };

    store
        .update_item(
            code,
            ItemPatch {
                description: None,
                total_quantity: Some(parse_quantity(&row.quantity)),
            },
        )
        .await
        .map_err(|e| store_failure(row.line, code, "item update failed", e))?;

    replace_stocks(store, item.id, row, code, true).await?;

    Ok(RowOutcome::Updated)
}

/// Register a new catalog item; duplicates are skipped, not failed.
async fn apply_new_item_row(
    store: &dyn CatalogStore,
    seen: &Mutex<HashSet<String>>,
    row: &SheetRow,
    code: &str,
    description: &str,
) -> Result<RowOutcome, RowError> {
    // Atomic check-and-insert on the working set: the first row claiming a
    // code wins even when both resolve concurrently in the same batch.
    {
        let mut seen = seen.lock().unwrap_or_else(|e| e.into_inner());
        if !seen.insert(code.to_string()) {
            return Ok(RowOutcome::Ignored);
        }
    }

    let existing = store
        .find_by_code(code)
        .await
        .map_err(|e| store_failure(row.line, code, "catalog lookup failed", e))?;
    if existing.is_some() {
        return Ok(RowOutcome::Ignored);
    }

    let item = match store
        .insert_item(NewItem {
            code: code.to_string(),
            description: description.to_string(),
            total_quantity: parse_quantity(&row.quantity),
        })
        .await
    {
        Ok(item) => item,
        // The store's unique constraint is authoritative: losing an insert
        // race (e.g. against a concurrent unrelated run) is this row's
        // error, never a job crash.
        Err(StoreError::DuplicateCode { .. }) => {
            return Err(row_error(row.line, code, "duplicate code", None));
        }
        Err(e) => return Err(store_failure(row.line, code, "item insert failed", e)),
    };

    // One stock insert per location column, executed independently; the item
    // stays even if some of these fail, surfaced as this row's error.
    replace_stocks(store, item.id, row, code, false).await?;

    Ok(RowOutcome::Created)
}

/// Apply a sparse field update to a registered item.
async fn apply_detail_row(
    store: &dyn CatalogStore,
    row: &SheetRow,
    code: &str,
    description: &str,
) -> Result<RowOutcome, RowError> {
    let item = store
        .find_by_code(code)
        .await
        .map_err(|e| store_failure(row.line, code, "catalog lookup failed", e))?;

    let Some(item) = item else {
        return Err(row_error(row.line, code, "not registered", None));
    };

    // Only columns present and non-blank on the row are applied
    let mut patch = ItemPatch {
        description: Some(description.to_string()),
        total_quantity: None,
    };
    if !row.quantity.trim().is_empty() {
        patch.total_quantity = Some(parse_quantity(&row.quantity));
    }

    store
        .update_item(code, patch)
        .await
        .map_err(|e| store_failure(row.line, code, "item update failed", e))?;

    if !present_locations(row).is_empty() {
        replace_stocks(store, item.id, row, code, true).await?;
    }

    Ok(RowOutcome::Updated)
}

/// Delete-then-reinsert the item's stock set so it exactly mirrors the
/// row's location columns. Inserts are independent: one failing does not
/// stop the rest, but any failure becomes the row's error.
async fn replace_stocks(
    store: &dyn CatalogStore,
    item_id: Uuid,
    row: &SheetRow,
    code: &str,
    clear_first: bool,
) -> Result<(), RowError> {
    if clear_first {
        store
            .clear_location_stocks(item_id)
            .await
            .map_err(|e| store_failure(row.line, code, "stock clear failed", e))?;
    }

    let mut first_failure = None;
    for (location, quantity) in present_locations(row) {
        if let Err(e) = store.insert_location_stock(item_id, &location, quantity).await {
            warn!(
                "Stock write failed for item {} at location {}: {}",
                code, location, e
            );
            if first_failure.is_none() {
                first_failure = Some(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(store_failure(row.line, code, "stock write failed", e)),
        None => Ok(()),
    }
}

fn row_error(line: u64, code: &str, reason: &str, detail: Option<String>) -> RowError {
    RowError {
        row: line,
        code: if code.is_empty() {
            None
        } else {
            Some(code.to_string())
        },
        reason: reason.to_string(),
        detail,
    }
}

fn store_failure(line: u64, code: &str, reason: &str, error: StoreError) -> RowError {
    row_error(line, code, reason, Some(error.to_string()))
}

/// Lenient numeric coercion: bad input never fails a row on its own.
fn parse_quantity(raw: &str) -> i32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed
        .parse::<i32>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|v| v as i32))
        .unwrap_or(0)
}

/// Location columns present and non-blank on this row.
fn present_locations(row: &SheetRow) -> Vec<(String, i32)> {
    row.locations
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(location, value)| (location.clone(), parse_quantity(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportSnapshot;
    use crate::store::CatalogItem;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryInner {
        items: HashMap<String, CatalogItem>,
        stocks: HashMap<Uuid, Vec<(String, i32)>>,
    }

    /// In-memory catalog store with failure injection and concurrency
    /// tracking for scheduler assertions.
    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryInner>,
        failing_locations: HashSet<String>,
        op_delay_ms: u64,
        ops: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn with_failing_location(location: &str) -> Arc<Self> {
            Arc::new(Self {
                failing_locations: HashSet::from([location.to_string()]),
                ..Default::default()
            })
        }

        fn with_op_delay_ms(delay: u64) -> Arc<Self> {
            Arc::new(Self {
                op_delay_ms: delay,
                ..Default::default()
            })
        }

        async fn track<T>(&self, op: impl FnOnce(&mut MemoryInner) -> T) -> T {
            self.ops.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if self.op_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.op_delay_ms)).await;
            }

            let result = {
                let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
                op(&mut inner)
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }

        fn item_count(&self) -> usize {
            self.inner
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .items
                .len()
        }

        fn total_ops(&self) -> usize {
            self.ops.load(Ordering::SeqCst)
        }

        fn max_concurrent_ops(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        /// Catalog state keyed by business code, ids elided so runs can be
        /// compared for idempotency.
        fn dump(&self) -> Vec<(String, String, i32, Vec<(String, i32)>)> {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let mut out: Vec<_> = inner
                .items
                .values()
                .map(|item| {
                    let mut stocks = inner.stocks.get(&item.id).cloned().unwrap_or_default();
                    stocks.sort();
                    (
                        item.code.clone(),
                        item.description.clone(),
                        item.total_quantity,
                        stocks,
                    )
                })
                .collect();
            out.sort();
            out
        }
    }

    #[async_trait]
    impl CatalogStore for MemoryStore {
        async fn find_by_code(&self, code: &str) -> Result<Option<CatalogItem>, StoreError> {
            let code = code.to_string();
            self.track(move |inner| Ok(inner.items.get(&code).cloned()))
                .await
        }

        async fn insert_item(&self, item: NewItem) -> Result<CatalogItem, StoreError> {
            self.track(move |inner| {
                if inner.items.contains_key(&item.code) {
                    return Err(StoreError::DuplicateCode { code: item.code });
                }
                let stored = CatalogItem {
                    id: Uuid::new_v4(),
                    code: item.code.clone(),
                    description: item.description,
                    total_quantity: item.total_quantity,
                    active: true,
                };
                inner.items.insert(item.code, stored.clone());
                Ok(stored)
            })
            .await
        }

        async fn update_item(
            &self,
            code: &str,
            patch: ItemPatch,
        ) -> Result<CatalogItem, StoreError> {
            let code = code.to_string();
            self.track(move |inner| {
                let item = inner
                    .items
                    .get_mut(&code)
                    .ok_or(StoreError::NotFound { code })?;
                if let Some(description) = patch.description {
                    item.description = description;
                }
                if let Some(total_quantity) = patch.total_quantity {
                    item.total_quantity = total_quantity;
                }
                Ok(item.clone())
            })
            .await
        }

        async fn clear_location_stocks(&self, item_id: Uuid) -> Result<(), StoreError> {
            self.track(move |inner| {
                inner.stocks.remove(&item_id);
                Ok(())
            })
            .await
        }

        async fn insert_location_stock(
            &self,
            item_id: Uuid,
            location: &str,
            quantity: i32,
        ) -> Result<(), StoreError> {
            if self.failing_locations.contains(location) {
                return Err(StoreError::Unavailable(format!(
                    "injected failure for location {}",
                    location
                )));
            }
            let location = location.to_string();
            self.track(move |inner| {
                inner.stocks.entry(item_id).or_default().push((location, quantity));
                Ok(())
            })
            .await
        }
    }

    async fn run_import(
        store: Arc<MemoryStore>,
        mode: ImportMode,
        batch_size: usize,
        data: &[u8],
    ) -> ImportSnapshot {
        let job = Arc::new(ImportJob::new(mode));
        let runner = ImportRunner::new(store, Arc::clone(&job), batch_size);
        runner.run(data.to_vec()).await;
        job.snapshot()
    }

    fn assert_accounting(snapshot: &ImportSnapshot) {
        assert_eq!(
            snapshot.processed,
            snapshot.succeeded + snapshot.updated + snapshot.ignored + snapshot.errors.len() as u32
        );
        assert_eq!(snapshot.processed, snapshot.total);
    }

    #[tokio::test]
    async fn test_create_new_three_row_scenario() {
        // A100 new, A100 duplicate within file, blank code
        let data = b"code,description,quantity\nA100,Widget,5\nA100,Widget,5\n,NoCode,3\n";
        let store = MemoryStore::new();

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(snapshot.status, ImportStatus::Completed);
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.processed, 3);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.ignored, 1);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].row, 3);
        assert_eq!(snapshot.errors[0].reason, "missing code/description");
        assert!(snapshot.finished_at.is_some());
        assert_accounting(&snapshot);

        assert_eq!(store.item_count(), 1);
    }

    #[tokio::test]
    async fn test_quantities_unknown_code_records_not_registered() {
        let data = b"code,description,quantity\nB200,Gadget,7\n";
        let store = MemoryStore::new();

        let snapshot = run_import(Arc::clone(&store), ImportMode::Quantities, 25, data).await;

        assert_eq!(snapshot.status, ImportStatus::Completed);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].row, 1);
        assert_eq!(snapshot.errors[0].code.as_deref(), Some("B200"));
        assert_eq!(snapshot.errors[0].reason, "not registered");
        assert_eq!(snapshot.updated, 0);
        assert_accounting(&snapshot);

        // The catalog was never mutated
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn test_create_new_rerun_is_idempotent() {
        let data =
            b"code,description,quantity\nA100,Widget,5\nB200,Gadget,7\nC300,Gizmo,2\n";
        let store = MemoryStore::new();

        let first = run_import(Arc::clone(&store), ImportMode::Items, 2, data).await;
        assert_eq!(first.succeeded, 3);
        assert_eq!(first.ignored, 0);
        assert_accounting(&first);

        let second = run_import(Arc::clone(&store), ImportMode::Items, 2, data).await;
        assert_eq!(second.succeeded, 0);
        assert_eq!(second.ignored, 3);
        assert!(second.errors.is_empty());
        assert_accounting(&second);

        assert_eq!(store.item_count(), 3);
    }

    #[tokio::test]
    async fn test_details_rerun_yields_identical_catalog_state() {
        let store = MemoryStore::new();
        store
            .insert_item(NewItem {
                code: "A100".to_string(),
                description: "Old name".to_string(),
                total_quantity: 1,
            })
            .await
            .unwrap();
        store
            .insert_item(NewItem {
                code: "B200".to_string(),
                description: "Other".to_string(),
                total_quantity: 2,
            })
            .await
            .unwrap();

        let data = b"code,description,quantity,loc_WH1\nA100,New name,9,4\nB200,Renamed,,\n";

        let first = run_import(Arc::clone(&store), ImportMode::Details, 25, data).await;
        assert_eq!(first.updated, 2);
        let state_after_first = store.dump();

        let second = run_import(Arc::clone(&store), ImportMode::Details, 25, data).await;
        assert_eq!(second.updated, 2);
        let state_after_second = store.dump();

        assert_eq!(state_after_first, state_after_second);
    }

    #[tokio::test]
    async fn test_duplicate_code_in_same_batch_inserts_once() {
        // Both rows resolve concurrently in one batch; the working set's
        // check-and-insert lets exactly one through.
        let data = b"code,description,quantity\nA100,Widget,5\nA100,Widget,5\n";
        let store = MemoryStore::with_op_delay_ms(5);

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(store.item_count(), 1);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.ignored + snapshot.errors.len() as u32, 1);
        assert_accounting(&snapshot);
    }

    #[tokio::test]
    async fn test_decode_failure_fails_run_without_rows() {
        let data = b"code,description\nA100,\xff\xfe\n";
        let store = MemoryStore::new();

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(snapshot.status, ImportStatus::Failed);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.processed, 0);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].row, 0);
        assert_eq!(snapshot.errors[0].reason, "unreadable file");
        assert!(snapshot.finished_at.is_some());
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_code_never_reaches_the_store() {
        let data = b"code,description,quantity\n,Widget,5\nA100,,3\n";
        let store = MemoryStore::new();

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(snapshot.errors.len(), 2);
        for error in &snapshot.errors {
            assert_eq!(error.reason, "missing code/description");
        }
        assert_accounting(&snapshot);
        assert_eq!(store.total_ops(), 0);
    }

    #[tokio::test]
    async fn test_partial_stock_failure_is_row_scoped() {
        let data = b"code,description,quantity,loc_BAD,loc_WH1\nA100,Widget,5,3,4\nB200,Gadget,7,,2\n";
        let store = MemoryStore::with_failing_location("BAD");

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(snapshot.status, ImportStatus::Completed);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.errors.len(), 1);
        assert_eq!(snapshot.errors[0].code.as_deref(), Some("A100"));
        assert_eq!(snapshot.errors[0].reason, "stock write failed");
        assert_accounting(&snapshot);

        // A100 was created before its stock write failed; the item stays
        // (accepted inconsistency, not rolled back)
        assert_eq!(store.item_count(), 2);

        // The independent WH1 write for A100 still happened
        let dump = store.dump();
        let a100 = dump.iter().find(|entry| entry.0 == "A100").unwrap();
        assert_eq!(a100.3, vec![("WH1".to_string(), 4)]);
    }

    #[tokio::test]
    async fn test_quantities_updates_item_and_replaces_stocks() {
        let store = MemoryStore::new();
        let item = store
            .insert_item(NewItem {
                code: "A100".to_string(),
                description: "Widget".to_string(),
                total_quantity: 1,
            })
            .await
            .unwrap();
        store
            .insert_location_stock(item.id, "WH1", 99)
            .await
            .unwrap();

        let data = b"code,description,quantity,loc_WH2,loc_WH3\nA100,Widget,12,5,7\n";
        let snapshot = run_import(Arc::clone(&store), ImportMode::Quantities, 25, data).await;

        assert_eq!(snapshot.updated, 1);
        assert!(snapshot.errors.is_empty());

        let dump = store.dump();
        let a100 = dump.iter().find(|entry| entry.0 == "A100").unwrap();
        assert_eq!(a100.2, 12);
        // Old WH1 row is gone; the stock set mirrors the row's columns
        assert_eq!(a100.3, vec![("WH2".to_string(), 5), ("WH3".to_string(), 7)]);
        // Description untouched by the quantities variant
        assert_eq!(a100.1, "Widget");
    }

    #[tokio::test]
    async fn test_details_blank_columns_are_left_untouched() {
        let store = MemoryStore::new();
        store
            .insert_item(NewItem {
                code: "A100".to_string(),
                description: "Widget".to_string(),
                total_quantity: 50,
            })
            .await
            .unwrap();

        // Quantity column is blank: only the description is applied
        let data = b"code,description,quantity\nA100,Widget Mk2,\n";
        let snapshot = run_import(Arc::clone(&store), ImportMode::Details, 25, data).await;

        assert_eq!(snapshot.updated, 1);

        let dump = store.dump();
        let a100 = dump.iter().find(|entry| entry.0 == "A100").unwrap();
        assert_eq!(a100.1, "Widget Mk2");
        assert_eq!(a100.2, 50);
    }

    #[tokio::test]
    async fn test_non_numeric_quantity_coerces_to_zero() {
        let data = b"code,description,quantity\nA100,Widget,lots\n";
        let store = MemoryStore::new();

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 25, data).await;

        assert_eq!(snapshot.succeeded, 1);
        assert!(snapshot.errors.is_empty());

        let dump = store.dump();
        assert_eq!(dump[0].2, 0);
    }

    #[tokio::test]
    async fn test_in_flight_rows_bounded_by_batch_size() {
        let mut data = b"code,description,quantity\n".to_vec();
        for i in 0..6 {
            data.extend_from_slice(format!("X{},Item {},1\n", i, i).as_bytes());
        }
        let store = MemoryStore::with_op_delay_ms(5);

        let snapshot = run_import(Arc::clone(&store), ImportMode::Items, 2, &data).await;

        assert_eq!(snapshot.succeeded, 6);
        assert!(
            store.max_concurrent_ops() <= 2,
            "store saw {} concurrent operations with batch size 2",
            store.max_concurrent_ops()
        );
    }

    #[test]
    fn test_parse_quantity_coercion() {
        assert_eq!(parse_quantity("42"), 42);
        assert_eq!(parse_quantity(" 42 "), 42);
        assert_eq!(parse_quantity("12.7"), 12);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("   "), 0);
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity("-3"), -3);
    }
}
