use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

use super::auth::{ServiceAccountKey, ServiceAccountTokenProvider, TokenProvider};
use super::{tab_origin, tab_range, SheetSink, NEW_TAB_COLUMNS, NEW_TAB_ROWS};
use crate::config::AppConfig;
use crate::errors::{SyncError, SyncResult};

#[derive(Debug, Default, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: SheetProperties,
}

#[derive(Debug, Default, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
}

/// Sheets REST v4 client authenticated with a bearer token provider.
pub struct GoogleSheetsClient {
    client: Client,
    api_base: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl GoogleSheetsClient {
    pub fn new(
        api_base: &str,
        tokens: Arc<dyn TokenProvider>,
        client: Client,
    ) -> SyncResult<Self> {
        let api_base = Url::parse(api_base)?;
        if api_base.cannot_be_a_base() {
            return Err(SyncError::Internal(format!(
                "Sheets API base '{}' cannot carry a path",
                api_base
            )));
        }
        Ok(Self {
            client,
            api_base,
            tokens,
        })
    }

    /// Parses the service-account credentials and wires the token exchange.
    pub fn from_config(config: &AppConfig) -> SyncResult<Self> {
        let key = ServiceAccountKey::from_json(&config.google_creds_json)?;
        info!(client_email = %key.client_email, "Using service account for Sheets");

        let tokens = ServiceAccountTokenProvider::new(key, config.request_timeout())?;
        let client = Client::builder()
            .user_agent(concat!("order-sheet-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        Self::new(&config.sheets_api_base, Arc::new(tokens), client)
    }

    /// `{base}/spreadsheets/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> SyncResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                SyncError::Internal("Sheets API base cannot carry a path".to_string())
            })?;
            path.pop_if_empty().push("spreadsheets");
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::sheets(status, &body))
    }

    async fn tab_titles(&self, spreadsheet_id: &str) -> SyncResult<Vec<String>> {
        let mut url = self.endpoint(&[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let meta: SpreadsheetMeta = self.send(self.client.get(url)).await?.json().await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }
}

#[async_trait]
impl SheetSink for GoogleSheetsClient {
    #[instrument(skip(self))]
    async fn ensure_tab(&self, spreadsheet_id: &str, tab: &str) -> SyncResult<()> {
        let titles = self.tab_titles(spreadsheet_id).await?;
        if titles.iter().any(|title| title == tab) {
            debug!("Tab already exists");
            return Ok(());
        }

        let url = self.endpoint(&[&format!("{}:batchUpdate", spreadsheet_id)])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": tab,
                        "gridProperties": {
                            "rowCount": NEW_TAB_ROWS,
                            "columnCount": NEW_TAB_COLUMNS
                        }
                    }
                }
            }]
        });
        self.send(self.client.post(url).json(&body)).await?;
        info!(tab, "Created missing tab");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_tab(&self, spreadsheet_id: &str, tab: &str) -> SyncResult<()> {
        let range = tab_range(tab);
        let url = self.endpoint(&[spreadsheet_id, "values", &format!("{}:clear", range)])?;
        self.send(self.client.post(url).json(&json!({}))).await?;
        Ok(())
    }

    #[instrument(skip(self, values), fields(rows = values.len()))]
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        tab: &str,
        values: &[Vec<String>],
    ) -> SyncResult<()> {
        let range = tab_origin(tab);
        let mut url = self.endpoint(&[spreadsheet_id, "values", &range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}
