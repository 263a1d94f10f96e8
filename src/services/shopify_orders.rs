use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LINK};
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::AppConfig;
use crate::errors::{SyncError, SyncResult};
use crate::models::order::{OrdersPage, ShopifyOrder};

/// Status filter covering open, closed and cancelled orders.
const STATUS_ANY: &str = "any";

/// Source of orders for one sync window.
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Every order created at or after `cutoff`, across all statuses.
    async fn fetch_orders_since(
        &self,
        cutoff: DateTime<Utc>,
        page_size: u32,
    ) -> SyncResult<Vec<ShopifyOrder>>;
}

/// Admin REST client for the `orders.json` listing.
pub struct ShopifyOrderClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl ShopifyOrderClient {
    /// Build a client with a single per-request timeout and no retries.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("order-sheet-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(base_url, access_token, client))
    }

    /// Build a client from an existing reqwest client (useful for testing).
    pub fn with_client(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> SyncResult<Self> {
        Self::new(
            config.shopify_base_url(),
            config.shopify_token.clone(),
            config.request_timeout(),
        )
    }

    fn orders_url(&self) -> String {
        format!("{}/orders.json", self.base_url)
    }

    fn build_headers(&self) -> SyncResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Shopify-Access-Token",
            HeaderValue::from_str(&self.access_token).map_err(|_| {
                SyncError::Credentials("invalid characters in Shopify access token".to_string())
            })?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl OrderSource for ShopifyOrderClient {
    #[instrument(skip(self))]
    async fn fetch_orders_since(
        &self,
        cutoff: DateTime<Utc>,
        page_size: u32,
    ) -> SyncResult<Vec<ShopifyOrder>> {
        let headers = self.build_headers()?;
        let created_at_min = format_cutoff(cutoff);

        // Only the first request carries query parameters; continuation links
        // already embed them.
        let mut request = self.client.get(self.orders_url()).query(&[
            ("limit", page_size.to_string()),
            ("status", STATUS_ANY.to_string()),
            ("created_at_min", created_at_min),
        ]);

        let mut orders = Vec::new();
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let response = request.headers(headers.clone()).send().await?;

            let status = response.status();
            let link_header = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response.bytes().await?;

            if !status.is_success() {
                return Err(SyncError::shopify(status, &String::from_utf8_lossy(&body)));
            }

            let mut page: OrdersPage = serde_json::from_slice(&body)?;
            debug!(
                page = page_number,
                count = page.orders.len(),
                "Fetched Shopify orders page"
            );
            orders.append(&mut page.orders);

            match link_header.as_deref().and_then(parse_next_link) {
                Some(next_url) => request = self.client.get(next_url),
                None => break,
            }
        }

        info!(
            pages = page_number,
            orders = orders.len(),
            "Fetched Shopify orders"
        );
        Ok(orders)
    }
}

/// Cutoff as ISO-8601 with second precision and an explicit `+00:00` offset.
pub fn format_cutoff(cutoff: DateTime<Utc>) -> String {
    cutoff.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Extracts the URL tagged `rel="next"` from a `Link` header.
pub fn parse_next_link(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|segment| {
        let segment = segment.trim();
        if !segment.contains("rel=\"next\"") {
            return None;
        }
        let start = segment.find('<')? + 1;
        let end = segment.find('>')?;
        (start <= end).then(|| segment[start..end].to_string())
    })
}
