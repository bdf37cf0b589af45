use crate::aggregate::last_event_map;
use crate::config::Config;
use crate::cooldown::{Gate, may_record};
use crate::errors::StoreError;
use crate::models::{DrinkKind, NewEvent};
use crate::storage::EventStore;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    CooldownActive { remaining_seconds: u64 },
    SchemaMismatch { column: String },
    Failed { message: String },
}

/// Logs one drink for `user` unless the cooldown says no.
///
/// The caller re-reads the table afterwards; nothing here is cached.
pub async fn record_drink(
    store: &EventStore,
    config: &Config,
    now: DateTime<Utc>,
    user: &str,
    kind: DrinkKind,
) -> RecordOutcome {
    let events = match store.fetch_all_events().await {
        Ok(events) => events,
        Err(err) => {
            warn!(%user, %kind, error = %err, "could not read events before insert");
            return RecordOutcome::Failed {
                message: err.to_string(),
            };
        }
    };

    if let Gate::Denied { remaining_seconds } =
        may_record(user, &last_event_map(&events), now, config.cooldown)
    {
        info!(%user, %kind, remaining_seconds, "cooldown active");
        return RecordOutcome::CooldownActive { remaining_seconds };
    }

    match store.insert_event(&NewEvent::new(user, kind, now)).await {
        Ok(()) => {
            info!(%user, %kind, "recorded drink");
            RecordOutcome::Recorded
        }
        Err(StoreError::SchemaMismatch { column }) => {
            warn!(%user, %kind, %column, "insert rejected: table is missing a column");
            RecordOutcome::SchemaMismatch { column }
        }
        Err(err) => {
            warn!(%user, %kind, error = %err, "insert failed");
            RecordOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}

/// What to tell whoever runs the table when an insert hits a missing column.
pub fn remediation(column: &str) -> String {
    if column == "drink_id" {
        format!(
            "Database update required: add a column to the events table. \
             Name: `{column}`, type: `int`, default value: `1`."
        )
    } else {
        format!("Database update required: the events table is missing the `{column}` column.")
    }
}
