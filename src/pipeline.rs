use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::{SyncError, SyncResult};
use crate::models::sheet_row::MONEY_COLUMNS;
use crate::services::normalizer::normalize_money_columns;
use crate::services::row_mapper::map_orders;
use crate::services::sheets::{replace_tab_contents, SheetSink};
use crate::services::shopify_orders::OrderSource;

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub cutoff: DateTime<Utc>,
    pub orders_fetched: usize,
    pub rows_written: usize,
    /// Cells that fell back to a default because their input was malformed.
    pub malformed_cells: usize,
    pub tab_name: String,
    pub days_back: u32,
    pub dry_run: bool,
}

impl SyncReport {
    /// One-line human-readable summary for the invoker's logs.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "DRY RUN: {} rows prepared for '{}' (last {} days); sheet not modified.",
                self.orders_fetched, self.tab_name, self.days_back
            )
        } else {
            format!(
                "OK: {} rows written to '{}' (last {} days).",
                self.rows_written, self.tab_name, self.days_back
            )
        }
    }
}

/// Start of the trailing window ending at `now`.
pub fn window_cutoff(now: DateTime<Utc>, days_back: u32) -> SyncResult<DateTime<Utc>> {
    Duration::try_days(i64::from(days_back))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            SyncError::InvalidWindow(format!("{} days before {} is out of range", days_back, now))
        })
}

/// Runs fetch → map → normalize → write once.
///
/// With `sink` set to `None` the sheet is left untouched (dry run). Any
/// upstream failure aborts before the sheet is modified.
#[instrument(skip_all, fields(tab = %config.tab_name, days_back = config.days_back))]
pub async fn run_sync(
    config: &AppConfig,
    source: &dyn OrderSource,
    sink: Option<&dyn SheetSink>,
    now: DateTime<Utc>,
) -> SyncResult<SyncReport> {
    let cutoff = window_cutoff(now, config.days_back)?;
    info!(%cutoff, "Fetching orders");

    let orders = source.fetch_orders_since(cutoff, config.page_size).await?;

    let mut rows = map_orders(&orders);
    normalize_money_columns(&mut rows, &MONEY_COLUMNS);

    let malformed_cells: usize = rows.iter().map(|row| row.defaulted().len()).sum();
    if malformed_cells > 0 {
        warn!(
            malformed_cells,
            "Some order fields were malformed and written as blank or zero"
        );
    }

    let rows_written = match sink {
        Some(sink) => {
            replace_tab_contents(sink, &config.sheet_id, &config.tab_name, &rows).await?
        }
        None => {
            info!(rows = rows.len(), "Dry run; skipping sheet write");
            0
        }
    };

    Ok(SyncReport {
        cutoff,
        orders_fetched: orders.len(),
        rows_written,
        malformed_cells,
        tab_name: config.tab_name.clone(),
        days_back: config.days_back,
        dry_run: sink.is_none(),
    })
}
