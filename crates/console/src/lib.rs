//! `bistro-console` — the assembled console: configuration, store wiring,
//! navigation and persisted preferences.

pub mod config;
pub mod console;
pub mod preferences;
pub mod routes;

pub use config::{ConfigError, ConsoleConfig, LatencyProfile};
pub use console::Console;
pub use preferences::{Preferences, Theme};
pub use routes::{MENU_DELETERS, MENU_EDITORS, RouteTable};
