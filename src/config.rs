use crate::errors::ConfigError;
use chrono::{Duration, FixedOffset};
use std::{env, path::PathBuf};

const DEFAULT_USERS: &str = "Cris,Bea,Fer";
const DEFAULT_TEA_WITH_COFFEE: &str = "Bea";
const DEFAULT_DATA_PATH: &str = "data/events.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Rest {
        url: String,
        key: String,
        table: String,
        timeout_seconds: u64,
    },
    File {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub users: Vec<String>,
    /// Users whose tea also shows up as `<name>(tea)` next to the coffee drinkers.
    pub tea_with_coffee: Vec<String>,
    pub cooldown: Duration,
    pub utc_offset: FixedOffset,
    pub store: StoreSettings,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let users = split_names(&get("TRACKED_USERS").unwrap_or_else(|| DEFAULT_USERS.to_string()));
        if users.is_empty() {
            return Err(ConfigError::Invalid {
                var: "TRACKED_USERS",
                value: String::new(),
            });
        }
        // An empty value turns the pseudo-users off.
        let tea_with_coffee = split_names(
            &lookup("TEA_WITH_COFFEE").unwrap_or_else(|| DEFAULT_TEA_WITH_COFFEE.to_string()),
        );

        let cooldown_seconds: i64 = parse_or("COOLDOWN_SECONDS", get("COOLDOWN_SECONDS"), 60)?;
        let cooldown = Duration::try_seconds(cooldown_seconds)
            .filter(|cooldown| *cooldown >= Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                var: "COOLDOWN_SECONDS",
                value: cooldown_seconds.to_string(),
            })?;

        let offset_minutes: i32 = parse_or("UTC_OFFSET_MINUTES", get("UTC_OFFSET_MINUTES"), 0)?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                var: "UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
            })?;

        let backend = get("STORE_BACKEND").unwrap_or_else(|| "rest".to_string());
        let store = match backend.trim().to_ascii_lowercase().as_str() {
            "rest" => StoreSettings::Rest {
                url: get("STORE_URL")
                    .ok_or(ConfigError::Missing("STORE_URL"))?
                    .trim_end_matches('/')
                    .to_string(),
                key: get("STORE_KEY").ok_or(ConfigError::Missing("STORE_KEY"))?,
                table: get("STORE_TABLE").unwrap_or_else(|| "clicks".to_string()),
                timeout_seconds: parse_or(
                    "STORE_TIMEOUT_SECONDS",
                    get("STORE_TIMEOUT_SECONDS"),
                    10,
                )?,
            },
            "file" => StoreSettings::File {
                path: PathBuf::from(
                    get("APP_DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
                ),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: backend,
                });
            }
        };

        let port = parse_or("PORT", get("PORT"), 8080)?;

        Ok(Self {
            users,
            tea_with_coffee,
            cooldown,
            utc_offset,
            store,
            port,
        })
    }

    pub fn is_tracked(&self, user: &str) -> bool {
        self.users.iter().any(|name| name == user)
    }
}

fn split_names(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn parse_or<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}
