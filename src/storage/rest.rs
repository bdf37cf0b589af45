//! Client for a PostgREST-style table endpoint (`/rest/v1/<table>`), the
//! interface hosted Postgres services expose.

use crate::errors::StoreError;
use crate::models::{EventRow, NewEvent};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const PAGE_SIZE: usize = 1000;
const MISSING_COLUMN_CODE: &str = "PGRST204";

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    table_url: String,
}

/// Error body PostgREST returns alongside a non-2xx status.
#[derive(Debug, Default, Deserialize)]
pub struct PostgrestError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, key: &str, table: &str, timeout: Duration) -> Result<Self, StoreError> {
        let mut headers = header::HeaderMap::new();
        let api_key = header::HeaderValue::from_str(key).map_err(StoreError::unavailable)?;
        let bearer =
            header::HeaderValue::from_str(&format!("Bearer {key}")).map_err(StoreError::unavailable)?;
        headers.insert("apikey", api_key);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_rows(&self) -> Result<Vec<EventRow>, StoreError> {
        let mut rows = Vec::new();
        loop {
            let offset = rows.len().to_string();
            let limit = PAGE_SIZE.to_string();
            let response = self
                .client
                .get(&self.table_url)
                .query(&[
                    ("select", "*"),
                    ("order", "id.asc"),
                    ("limit", limit.as_str()),
                    ("offset", offset.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(classify_failure(status, &body));
            }

            let page: Vec<EventRow> = response.json().await?;
            let page_len = page.len();
            rows.extend(page);
            debug!(page_len, total = rows.len(), "fetched event page");
            if page_len < PAGE_SIZE {
                return Ok(rows);
            }
        }
    }

    #[instrument(skip(self, event), fields(user = %event.user_name, drink_id = event.drink_id))]
    pub async fn insert(&self, event: &NewEvent) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=minimal")
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

/// Maps an error response to a store error, singling out missing columns.
pub fn classify_failure(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.as_deref().unwrap_or(body);

    if let Some(column) = missing_column(message) {
        return StoreError::SchemaMismatch { column };
    }
    if parsed.code.as_deref() == Some(MISSING_COLUMN_CODE) {
        return StoreError::SchemaMismatch {
            column: "drink_id".to_string(),
        };
    }

    let mut detail = format!("{status}: {message}");
    if let Some(hint) = parsed.hint.or(parsed.details) {
        detail.push_str(&format!(" ({hint})"));
    }
    StoreError::Unavailable(detail)
}

/// Pulls `col` out of "Could not find the 'col' column of 'table' in the schema cache".
fn missing_column(message: &str) -> Option<String> {
    let rest = message.split("Could not find the '").nth(1)?;
    let (column, tail) = rest.split_once('\'')?;
    tail.trim_start()
        .starts_with("column")
        .then(|| column.to_string())
}
