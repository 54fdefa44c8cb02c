//! agora-watch - Supermarket price watcher for sklavenitis.gr
//!
//! Scrapes product pages with TLS fingerprint emulation, keeps a SQLite
//! watchlist, and raises alerts when watched prices drop.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod identity;
pub mod renderer;
pub mod retry;
pub mod sklavenitis;
pub mod throttle;
pub mod watch;

pub use config::Config;
pub use error::ScrapeError;
pub use renderer::ExecutionEnvironment;
pub use sklavenitis::models::{Currency, ScrapeResult};
