use crate::series::CumulativeSeries;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrinkKind {
    #[default]
    Coffee,
    Tea,
}

impl DrinkKind {
    pub const ALL: [DrinkKind; 2] = [DrinkKind::Coffee, DrinkKind::Tea];

    /// Numeric id stored in the `drink_id` column.
    pub fn id(self) -> i64 {
        match self {
            DrinkKind::Coffee => 1,
            DrinkKind::Tea => 2,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(DrinkKind::Coffee),
            2 => Some(DrinkKind::Tea),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coffee" => Some(DrinkKind::Coffee),
            "tea" => Some(DrinkKind::Tea),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrinkKind::Coffee => "coffee",
            DrinkKind::Tea => "tea",
        }
    }
}

impl fmt::Display for DrinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row as the store hands it back. Older rows predate the `drink_id` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_name: String,
    pub value: i64,
    #[serde(default)]
    pub drink_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_name: String,
    pub value: u64,
    pub drink_kind: DrinkKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejected {
    NegativeValue(i64),
    UnknownDrink(i64),
}

impl fmt::Display for RowRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejected::NegativeValue(value) => write!(f, "negative value {value}"),
            RowRejected::UnknownDrink(id) => write!(f, "unknown drink_id {id}"),
        }
    }
}

impl TryFrom<EventRow> for Event {
    type Error = RowRejected;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let value = u64::try_from(row.value).map_err(|_| RowRejected::NegativeValue(row.value))?;
        let drink_kind = match row.drink_id {
            None => DrinkKind::Coffee,
            Some(id) => DrinkKind::from_id(id).ok_or(RowRejected::UnknownDrink(id))?,
        };

        Ok(Event {
            id: row.id,
            user_name: row.user_name,
            value,
            drink_kind,
            created_at: row.created_at,
        })
    }
}

/// Payload for a single insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub user_name: String,
    pub value: u64,
    pub drink_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewEvent {
    pub fn new(user_name: impl Into<String>, kind: DrinkKind, created_at: DateTime<Utc>) -> Self {
        Self {
            user_name: user_name.into(),
            value: 1,
            drink_id: kind.id(),
            created_at,
        }
    }

    pub fn into_row(self, id: i64) -> EventRow {
        EventRow {
            id: Some(id),
            user_name: self.user_name,
            value: i64::try_from(self.value).unwrap_or(i64::MAX),
            drink_id: Some(self.drink_id),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    pub user: String,
    pub drink: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserScore {
    pub user: String,
    pub coffee: u64,
    pub tea: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresResponse {
    pub users: Vec<UserScore>,
    pub total_coffee: u64,
    pub total_tea: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClickResponse {
    Recorded { scores: ScoresResponse },
    CooldownActive { remaining_seconds: u64 },
    SchemaMismatch { column: String, remediation: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareSlice {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowSeries {
    pub period: &'static str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub series: CumulativeSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrinkStats {
    pub drink: DrinkKind,
    pub share: Vec<ShareSlice>,
    pub windows: Vec<WindowSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub generated_at: DateTime<Utc>,
    pub coffee: Option<DrinkStats>,
    pub tea: Option<DrinkStats>,
}
