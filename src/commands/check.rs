//! One-off product check command.

use crate::config::Config;
use crate::format::Formatter;
use crate::renderer::ExecutionEnvironment;
use crate::sklavenitis::scraper::{ProductScrape, ProductScraper};
use anyhow::{Context, Result};
use tracing::info;

/// Scrapes a single product page and prints the capture.
pub struct CheckCommand {
    config: Config,
}

impl CheckCommand {
    /// Creates a new check command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Scrapes the page and returns formatted output.
    pub async fn execute(&self, url: &str, env: &ExecutionEnvironment) -> Result<String> {
        let scraper = ProductScraper::new(&self.config).context("Failed to create scraper")?;
        self.execute_with_scraper(&scraper, url, env).await
    }

    /// Scrapes with a provided scraper (for testing).
    pub async fn execute_with_scraper(
        &self,
        scraper: &impl ProductScrape,
        url: &str,
        env: &ExecutionEnvironment,
    ) -> Result<String> {
        let url = url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("Invalid URL: '{}'. Expected an absolute http(s) product page URL.", url);
        }

        info!("Checking product page: {}", url);

        match scraper.scrape(url, env).await? {
            Some(result) => {
                let formatter = Formatter::new(self.config.format);
                Ok(formatter.format_result(&result))
            }
            None => Ok(format!("No product captured from {}.", url)),
        }
    }
}
