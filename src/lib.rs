pub mod actions;
pub mod aggregate;
pub mod app;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod series;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::EventStore;
