//! Output formatting for captures, watch items, and price history (table, JSON).

use crate::config::OutputFormat;
use crate::sklavenitis::models::ScrapeResult;
use crate::watch::store::{PriceObservation, WatchItem};

/// Formats command output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single capture.
    pub fn format_result(&self, result: &ScrapeResult) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => {
                let mut lines = Vec::new();
                lines.push(format!("Product:  {}", result.product));
                lines.push(format!("Price:    {:.2} {}", result.price, result.currency));
                lines.join("\n")
            }
        }
    }

    /// Formats the watchlist.
    pub fn format_items(&self, items: &[WatchItem]) -> String {
        if items.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Table => "No watch items.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.items_table(items),
        }
    }

    /// Formats captured price history.
    pub fn format_history(&self, observations: &[PriceObservation]) -> String {
        if observations.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Table => "No price history.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(observations).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.history_table(observations),
        }
    }

    fn items_table(&self, items: &[WatchItem]) -> String {
        let id_width = 4;
        let name_width = 30;
        let target_width = 8;
        let last_width = 8;
        let active_width = 6;
        let url_width = 50;

        let mut lines = Vec::new();

        // Header
        lines.push(format!(
            "{:<id_width$}  {:<name_width$}  {:<target_width$}  {:<last_width$}  {:<active_width$}  {}",
            "ID", "Name", "Target", "Last", "Active", "URL"
        ));
        lines.push(format!(
            "{:-<id_width$}  {:-<name_width$}  {:-<target_width$}  {:-<last_width$}  {:-<active_width$}  {:-<url_width$}",
            "", "", "", "", "", ""
        ));

        // Rows
        for item in items {
            let name = truncate(item.name.as_deref().unwrap_or("-"), name_width);
            let target =
                item.target_price.map(|t| format!("{t:.2}")).unwrap_or_else(|| "-".to_string());
            let last = item
                .last_notified_price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "-".to_string());
            let active = if item.active { "yes" } else { "no" };

            lines.push(format!(
                "{:<id_width$}  {:<name_width$}  {:>target_width$}  {:>last_width$}  {:<active_width$}  {}",
                item.id, name, target, last, active, item.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} items", items.len()));

        lines.join("\n")
    }

    fn history_table(&self, observations: &[PriceObservation]) -> String {
        let id_width = 6;
        let price_width = 10;
        let captured_width = 19;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<id_width$}  {:>price_width$}  {:<captured_width$}  {}",
            "ID", "Price", "Captured", "Product"
        ));
        lines.push(format!(
            "{:-<id_width$}  {:-<price_width$}  {:-<captured_width$}  {:-<30}",
            "", "", "", ""
        ));

        for observation in observations {
            let price = format!("{:.2} {}", observation.price, observation.currency);
            lines.push(format!(
                "{:<id_width$}  {:>price_width$}  {:<captured_width$}  {}",
                observation.id, price, observation.captured_at, observation.product
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} observations", observations.len()));

        lines.join("\n")
    }
}

/// Shortens on character boundaries; product names are Greek.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max - 3).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}
