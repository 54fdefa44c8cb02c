//! SQLite persistence for the watchlist and captured price history.

use crate::sklavenitis::models::Currency;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// A watched product page.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WatchItem {
    pub id: i64,
    pub url: String,
    pub name: Option<String>,
    pub target_price: Option<f64>,
    pub last_notified_price: Option<f64>,
    pub active: bool,
}

/// One captured price, as stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product: String,
    pub price: f64,
    pub currency: String,
    pub captured_at: String,
}

/// Persistence seam for the watch cycle - enables in-memory fakes for tests.
pub trait WatchStore {
    /// Watched pages due for scraping, in insertion order.
    fn list_active(&self) -> Result<Vec<WatchItem>, StoreError>;

    /// Records a confirmed capture in the price history.
    fn append_observation(&self, product: &str, price: f64, currency: Currency) -> Result<(), StoreError>;

    /// Remembers the price an item was last alerted at.
    fn update_last_notified(&self, id: i64, price: f64) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS watchlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_url TEXT NOT NULL UNIQUE,
    product_name TEXT,
    target_price REAL,
    last_notified_price REAL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS price_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product TEXT NOT NULL,
    price REAL NOT NULL,
    currency TEXT NOT NULL,
    captured_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_price_history_product_time
    ON price_history (product, captured_at);
";

/// File-backed store. One connection, used from the single watch loop.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens the database at `path`, creating it and its schema as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        debug!("Opening database at {}", path.as_ref().display());
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Adds a URL to the watchlist, refreshing name and target on conflict.
    pub fn upsert_item(
        &self,
        url: &str,
        name: Option<&str>,
        target_price: Option<f64>,
        active: bool,
    ) -> Result<WatchItem, StoreError> {
        self.conn.execute(
            "INSERT INTO watchlist (product_url, product_name, target_price, active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(product_url) DO UPDATE SET
                 product_name = excluded.product_name,
                 target_price = excluded.target_price,
                 active = excluded.active",
            params![url, name, target_price, active],
        )?;
        self.item_by_url(url)
    }

    fn item_by_url(&self, url: &str) -> Result<WatchItem, StoreError> {
        let item = self.conn.query_row(
            "SELECT id, product_url, product_name, target_price, last_notified_price, active
             FROM watchlist WHERE product_url = ?1",
            params![url],
            row_to_item,
        )?;
        Ok(item)
    }

    /// Every watchlist entry, active or not.
    pub fn list_items(&self) -> Result<Vec<WatchItem>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_url, product_name, target_price, last_notified_price, active
             FROM watchlist ORDER BY id",
        )?;
        let mapped = stmt.query_map([], row_to_item)?;

        let mut items = Vec::new();
        for item in mapped {
            items.push(item?);
        }
        Ok(items)
    }

    /// Deletes a watchlist entry; false when the id did not exist.
    pub fn remove_item(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self.conn.execute("DELETE FROM watchlist WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Recent observations, newest first, optionally filtered by product name.
    pub fn history(&self, product: Option<&str>, limit: u32) -> Result<Vec<PriceObservation>, StoreError> {
        let mut rows = Vec::new();

        match product {
            Some(product) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, product, price, currency, captured_at FROM price_history
                     WHERE product = ?1 ORDER BY id DESC LIMIT ?2",
                )?;
                let mapped = stmt.query_map(params![product, limit], row_to_observation)?;
                for row in mapped {
                    rows.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, product, price, currency, captured_at FROM price_history
                     ORDER BY id DESC LIMIT ?1",
                )?;
                let mapped = stmt.query_map(params![limit], row_to_observation)?;
                for row in mapped {
                    rows.push(row?);
                }
            }
        }

        Ok(rows)
    }
}

impl WatchStore for SqliteStore {
    fn list_active(&self) -> Result<Vec<WatchItem>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product_url, product_name, target_price, last_notified_price, active
             FROM watchlist WHERE active = 1 ORDER BY id",
        )?;
        let mapped = stmt.query_map([], row_to_item)?;

        let mut items = Vec::new();
        for item in mapped {
            items.push(item?);
        }
        Ok(items)
    }

    fn append_observation(&self, product: &str, price: f64, currency: Currency) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO price_history (product, price, currency) VALUES (?1, ?2, ?3)",
            params![product, price, currency.code()],
        )?;
        Ok(())
    }

    fn update_last_notified(&self, id: i64, price: f64) -> Result<(), StoreError> {
        self.conn
            .execute("UPDATE watchlist SET last_notified_price = ?1 WHERE id = ?2", params![price, id])?;
        Ok(())
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<WatchItem> {
    Ok(WatchItem {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        target_price: row.get(3)?,
        last_notified_price: row.get(4)?,
        active: row.get::<_, i64>(5)? != 0,
    })
}

fn row_to_observation(row: &Row<'_>) -> rusqlite::Result<PriceObservation> {
    Ok(PriceObservation {
        id: row.get(0)?,
        product: row.get(1)?,
        price: row.get(2)?,
        currency: row.get(3)?,
        captured_at: row.get(4)?,
    })
}
