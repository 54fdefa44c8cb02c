//! Watch cycle command implementation.

use crate::config::Config;
use crate::renderer::ExecutionEnvironment;
use crate::sklavenitis::scraper::{ProductScrape, ProductScraper};
use crate::watch::cycle::{run_cycle, CycleReport};
use crate::watch::notify::{Notifier, NullNotifier, TelegramNotifier};
use crate::watch::store::{SqliteStore, WatchStore};
use anyhow::{Context, Result};
use tracing::warn;

/// Runs one check cycle over the whole watchlist.
pub struct RunCommand {
    config: Config,
}

impl RunCommand {
    /// Creates a new run command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens the store, picks the notifier, and runs one cycle.
    pub async fn execute(&self, env: &ExecutionEnvironment) -> Result<String> {
        let store = SqliteStore::open(&self.config.db_path).context("Failed to open database")?;
        let scraper = ProductScraper::new(&self.config).context("Failed to create scraper")?;

        match &self.config.telegram {
            Some(telegram) => {
                let notifier =
                    TelegramNotifier::new(telegram.bot_token.clone(), telegram.chat_id.clone())
                        .context("Failed to create Telegram notifier")?;
                self.execute_with_parts(&scraper, &store, &notifier, env).await
            }
            None => {
                warn!("Telegram is not configured; alerts will be logged, not delivered");
                self.execute_with_parts(&scraper, &store, &NullNotifier, env).await
            }
        }
    }

    /// Runs one cycle with provided collaborators (for testing).
    pub async fn execute_with_parts(
        &self,
        scraper: &impl ProductScrape,
        store: &impl WatchStore,
        notifier: &impl Notifier,
        env: &ExecutionEnvironment,
    ) -> Result<String> {
        let mut throttle = self.config.throttle();

        let report = run_cycle(
            scraper,
            store,
            notifier,
            env,
            &mut throttle,
            self.config.notify_policy,
        )
        .await?;

        Ok(summary(&report))
    }
}

fn summary(report: &CycleReport) -> String {
    format!(
        "Cycle complete: {} captured, {} missed, {} notified, {} failed",
        report.scraped, report.misses, report.notified, report.failures
    )
}
