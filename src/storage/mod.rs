pub mod file;
pub mod rest;

use crate::config::StoreSettings;
use crate::errors::StoreError;
use crate::models::{Event, EventRow, NewEvent};
use std::time::Duration;
use tracing::{info, warn};

pub use file::FileStore;
pub use rest::RestStore;

/// Handle to the append-only event table. Built once at startup and passed
/// around explicitly.
#[derive(Debug, Clone)]
pub enum EventStore {
    Rest(RestStore),
    File(FileStore),
}

impl EventStore {
    pub async fn connect(settings: &StoreSettings) -> Result<Self, StoreError> {
        match settings {
            StoreSettings::Rest {
                url,
                key,
                table,
                timeout_seconds,
            } => {
                info!(%url, %table, "using rest event store");
                let store = RestStore::new(url, key, table, Duration::from_secs(*timeout_seconds))?;
                Ok(EventStore::Rest(store))
            }
            StoreSettings::File { path } => {
                info!(path = %path.display(), "using file event store");
                Ok(EventStore::File(FileStore::open(path.clone()).await?))
            }
        }
    }

    /// Every event in the table, validated. Rows that fail validation are
    /// logged and skipped.
    pub async fn fetch_all_events(&self) -> Result<Vec<Event>, StoreError> {
        let rows = match self {
            EventStore::Rest(store) => store.fetch_rows().await?,
            EventStore::File(store) => store.fetch_rows().await?,
        };
        Ok(validate_rows(rows))
    }

    pub async fn insert_event(&self, event: &NewEvent) -> Result<(), StoreError> {
        match self {
            EventStore::Rest(store) => store.insert(event).await,
            EventStore::File(store) => store.insert(event).await,
        }
    }

    /// Read path: a failing store reads as an empty table.
    pub async fn events_or_empty(&self) -> Vec<Event> {
        match self.fetch_all_events().await {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "event fetch failed; showing empty data");
                Vec::new()
            }
        }
    }
}

pub fn validate_rows(rows: Vec<EventRow>) -> Vec<Event> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let user = row.user_name.clone();
            match Event::try_from(row) {
                Ok(event) => Some(event),
                Err(reason) => {
                    warn!(?id, %user, %reason, "skipping invalid event row");
                    None
                }
            }
        })
        .collect()
}
