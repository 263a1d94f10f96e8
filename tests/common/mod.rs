#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use order_sheet_sync::config::{load_config_from, AppConfig};
use order_sheet_sync::services::sheets::SheetSink;
use order_sheet_sync::SyncResult;
use serde_json::{json, Value};

/// In-memory spreadsheet keyed by tab title.
#[derive(Default)]
pub struct MemorySheetSink {
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
    calls: Mutex<Vec<String>>,
}

impl MemorySheetSink {
    pub fn with_tab(tab: &str, values: Vec<Vec<String>>) -> Self {
        let sink = Self::default();
        sink.tabs.lock().unwrap().insert(tab.to_string(), values);
        sink
    }

    pub fn contents(&self, tab: &str) -> Option<Vec<Vec<String>>> {
        self.tabs.lock().unwrap().get(tab).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetSink for MemorySheetSink {
    async fn ensure_tab(&self, _spreadsheet_id: &str, tab: &str) -> SyncResult<()> {
        self.calls.lock().unwrap().push(format!("ensure:{tab}"));
        self.tabs
            .lock()
            .unwrap()
            .entry(tab.to_string())
            .or_default();
        Ok(())
    }

    async fn clear_tab(&self, _spreadsheet_id: &str, tab: &str) -> SyncResult<()> {
        self.calls.lock().unwrap().push(format!("clear:{tab}"));
        if let Some(values) = self.tabs.lock().unwrap().get_mut(tab) {
            values.clear();
        }
        Ok(())
    }

    async fn write_values(
        &self,
        _spreadsheet_id: &str,
        tab: &str,
        values: &[Vec<String>],
    ) -> SyncResult<()> {
        self.calls.lock().unwrap().push(format!("write:{tab}"));
        self.tabs
            .lock()
            .unwrap()
            .insert(tab.to_string(), values.to_vec());
        Ok(())
    }
}

/// Fixed clock used by pipeline tests: 2024-01-08 12:00:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap()
}

/// Cutoff produced by [`fixed_now`] with the default 7-day window.
pub const FIXED_CUTOFF: &str = "2024-01-01T12:00:00+00:00";

pub fn test_config(shopify_base_url: &str) -> AppConfig {
    let vars: HashMap<String, String> = [
        ("SHOP_DOMAIN", "acme.myshopify.com"),
        ("SHOPIFY_TOKEN", "shpat_test"),
        ("SHEET_ID", "sheet-1"),
        ("GOOGLE_CREDS_JSON", "{}"),
        ("SHOPIFY_BASE_URL", shopify_base_url),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    load_config_from(vars).expect("test config should load")
}

pub fn order_json(id: u64, name: &str, total: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "created_at": "2024-01-05T10:00:00-03:00",
        "updated_at": "2024-01-06T08:30:00-03:00",
        "processed_at": "2024-01-05T10:01:00-03:00",
        "financial_status": "paid",
        "fulfillment_status": null,
        "subtotal_price": "100.00",
        "total_price": total,
        "total_discounts": "0.00",
        "total_shipping_price_set": { "shop_money": { "amount": "5.50", "currency_code": "CLP" } },
        "billing_address": { "city": "Santiago", "province": "RM" },
        "shipping_address": { "city": "Santiago" },
        "line_items": [
            { "sku": "A-1", "quantity": 2, "fulfillment_status": null, "requires_shipping": true },
            { "sku": "B-2", "quantity": 1, "fulfillment_status": null, "requires_shipping": true }
        ],
        "shipping_lines": [{ "title": "Despacho" }],
        "fulfillments": [],
        "note_attributes": [
            { "name": "Embalado", "value": "05/01/2024 12:00" }
        ],
        "tags": "web"
    })
}
