//! Watchlist management commands.

use crate::config::Config;
use crate::format::Formatter;
use crate::watch::store::SqliteStore;
use anyhow::{Context, Result};

/// Manages the persistent watchlist and its price history.
pub struct WatchlistCommand {
    config: Config,
}

impl WatchlistCommand {
    /// Creates a new watchlist command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.config.db_path).context("Failed to open database")
    }

    /// Adds a URL to the watchlist, or updates it if already watched.
    pub fn add(
        &self,
        url: &str,
        name: Option<&str>,
        target_price: Option<f64>,
        paused: bool,
    ) -> Result<String> {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("Invalid URL: '{}'. Expected an absolute http(s) product page URL.", url);
        }
        if let Some(target) = target_price {
            if target <= 0.0 {
                anyhow::bail!("Invalid target price: {}. Must be positive.", target);
            }
        }

        let store = self.open_store()?;
        let item = store.upsert_item(url, name, target_price, !paused)?;

        Ok(format!("Watching {} (id {})", item.url, item.id))
    }

    /// Lists every watchlist entry.
    pub fn list(&self) -> Result<String> {
        let store = self.open_store()?;
        let items = store.list_items()?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_items(&items))
    }

    /// Removes an entry by id.
    pub fn remove(&self, id: i64) -> Result<String> {
        let store = self.open_store()?;

        if store.remove_item(id)? {
            Ok(format!("Removed watch item {}", id))
        } else {
            anyhow::bail!("No watch item with id {}", id)
        }
    }

    /// Shows recently captured prices, newest first.
    pub fn history(&self, product: Option<&str>, limit: u32) -> Result<String> {
        let store = self.open_store()?;
        let observations = store.history(product, limit)?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_history(&observations))
    }
}
