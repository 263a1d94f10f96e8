//! Spreadsheet output.
//!
//! [`SheetSink`] is the narrow set of operations the writer needs;
//! [`google::GoogleSheetsClient`] implements it over the Sheets REST API.

pub mod auth;
pub mod google;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::errors::SyncResult;
use crate::models::sheet_row::{Column, Row};

/// Default grid size for newly created tabs.
pub const NEW_TAB_ROWS: u32 = 1000;
pub const NEW_TAB_COLUMNS: u32 = 40;

#[async_trait]
pub trait SheetSink: Send + Sync {
    /// Creates the tab if the spreadsheet has none with this title.
    async fn ensure_tab(&self, spreadsheet_id: &str, tab: &str) -> SyncResult<()>;

    /// Removes every value in the tab.
    async fn clear_tab(&self, spreadsheet_id: &str, tab: &str) -> SyncResult<()>;

    /// Writes `values` starting at the top-left cell, as raw strings.
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        values: &[Vec<String>],
    ) -> SyncResult<()>;
}

/// Header row followed by one display-string row per data row.
pub fn build_values(rows: &[Row]) -> Vec<Vec<String>> {
    let mut values = Vec::with_capacity(rows.len() + 1);
    values.push(Column::headers());
    values.extend(rows.iter().map(Row::display_values));
    values
}

/// Replaces the whole content of `tab` with the header and `rows`.
///
/// Returns the number of data rows written.
#[instrument(skip(sink, rows), fields(rows = rows.len()))]
pub async fn replace_tab_contents(
    sink: &dyn SheetSink,
    spreadsheet_id: &str,
    tab: &str,
    rows: &[Row],
) -> SyncResult<usize> {
    let values = build_values(rows);

    sink.ensure_tab(spreadsheet_id, tab).await?;
    sink.clear_tab(spreadsheet_id, tab).await?;
    sink.write_values(spreadsheet_id, tab, &values).await?;

    info!(tab, rows = rows.len(), "Replaced sheet contents");
    Ok(rows.len())
}

/// A1 reference covering the whole tab, quoted for titles with spaces.
pub fn tab_range(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// A1 reference to the first cell of the tab.
pub fn tab_origin(tab: &str) -> String {
    format!("{}!A1", tab_range(tab))
}
