//! One pass over the watchlist: scrape, record, alert.

use crate::renderer::ExecutionEnvironment;
use crate::sklavenitis::models::ScrapeResult;
use crate::sklavenitis::scraper::ProductScrape;
use crate::throttle::ThrottleState;
use crate::watch::notify::Notifier;
use crate::watch::store::{StoreError, WatchItem, WatchStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Why an alert went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyReason {
    /// No alert has ever been recorded for this item.
    FirstCapture,
    /// The captured price is at or below the configured target.
    TargetMet,
    /// The captured price is below the last remembered one.
    PriceDrop,
}

impl fmt::Display for NotifyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyReason::FirstCapture => write!(f, "first capture"),
            NotifyReason::TargetMet => write!(f, "target met"),
            NotifyReason::PriceDrop => write!(f, "price drop"),
        }
    }
}

/// When the remembered price on a watch item advances.
///
/// `OnNotify` makes "price drop" mean below the last alerted price; `Always`
/// makes it mean below the last captured price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyPolicy {
    /// Advance only after a successfully delivered alert.
    #[default]
    OnNotify,
    /// Advance after every confirmed capture.
    Always,
}

impl FromStr for NotifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on-notify" => Ok(NotifyPolicy::OnNotify),
            "always" => Ok(NotifyPolicy::Always),
            _ => Err(format!("Invalid notify policy: {s} (expected on-notify or always)")),
        }
    }
}

impl fmt::Display for NotifyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyPolicy::OnNotify => write!(f, "on-notify"),
            NotifyPolicy::Always => write!(f, "always"),
        }
    }
}

/// Tally of one watch cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub scraped: usize,
    pub misses: usize,
    pub notified: usize,
    pub failures: usize,
}

/// Decides which alerts a capture earns.
pub fn notify_reasons(item: &WatchItem, price: f64) -> Vec<NotifyReason> {
    let mut reasons = Vec::new();

    if let Some(target) = item.target_price {
        if price <= target {
            reasons.push(NotifyReason::TargetMet);
        }
    }

    match item.last_notified_price {
        None => reasons.push(NotifyReason::FirstCapture),
        Some(last) if price < last => reasons.push(NotifyReason::PriceDrop),
        Some(_) => {}
    }

    reasons
}

/// Scrapes every active watch item in order, recording captures and sending
/// alerts. Scrape failures and delivery failures are logged per item and never
/// abort the cycle; only storage failures do.
pub async fn run_cycle(
    scraper: &impl ProductScrape,
    store: &impl WatchStore,
    notifier: &impl Notifier,
    env: &ExecutionEnvironment,
    throttle: &mut ThrottleState,
    policy: NotifyPolicy,
) -> Result<CycleReport, StoreError> {
    let items = store.list_active()?;
    info!("Checking {} watched page(s)", items.len());

    let mut report = CycleReport::default();

    for item in items {
        throttle.pace().await;

        let outcome = match scraper.scrape(&item.url, env).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Scrape failed for {}: {}", item.url, err);
                report.failures += 1;
                continue;
            }
        };

        let Some(result) = outcome else {
            debug!("No capture for {}", item.url);
            report.misses += 1;
            continue;
        };

        store.append_observation(&result.product, result.price, result.currency)?;
        report.scraped += 1;

        let reasons = notify_reasons(&item, result.price);
        let mut alerted = false;

        if !reasons.is_empty() {
            let message = alert_message(&item, &result, &reasons);
            match notifier.send(&message).await {
                Ok(()) => {
                    alerted = true;
                    report.notified += 1;
                }
                Err(err) => warn!("Notification failed for {}: {}", result.product, err),
            }
        }

        if alerted || policy == NotifyPolicy::Always {
            store.update_last_notified(item.id, result.price)?;
        }
    }

    info!(
        "Cycle done: {} captured, {} missed, {} notified, {} failed",
        report.scraped, report.misses, report.notified, report.failures
    );
    Ok(report)
}

fn alert_message(item: &WatchItem, result: &ScrapeResult, reasons: &[NotifyReason]) -> String {
    let reasons: Vec<String> = reasons.iter().map(NotifyReason::to_string).collect();
    format!(
        "{} is now {:.2} {} ({}): {}",
        result.product,
        result.price,
        result.currency,
        reasons.join(", "),
        item.url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::sklavenitis::models::Currency;
    use crate::watch::notify::NotifyError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    fn item(id: i64, target: Option<f64>, last_notified: Option<f64>) -> WatchItem {
        WatchItem {
            id,
            url: format!("https://example.gr/p/{id}"),
            name: None,
            target_price: target,
            last_notified_price: last_notified,
            active: true,
        }
    }

    fn capture(product: &str, price: f64) -> ScrapeResult {
        ScrapeResult { product: product.to_string(), price, currency: Currency::Eur }
    }

    #[derive(Default)]
    struct MemoryStore {
        items: Vec<WatchItem>,
        observations: Mutex<Vec<(String, f64)>>,
        notified: Mutex<Vec<(i64, f64)>>,
    }

    impl WatchStore for MemoryStore {
        fn list_active(&self) -> Result<Vec<WatchItem>, StoreError> {
            Ok(self.items.iter().filter(|item| item.active).cloned().collect())
        }

        fn append_observation(
            &self,
            product: &str,
            price: f64,
            _currency: Currency,
        ) -> Result<(), StoreError> {
            self.observations.lock().unwrap().push((product.to_string(), price));
            Ok(())
        }

        fn update_last_notified(&self, id: i64, price: f64) -> Result<(), StoreError> {
            self.notified.lock().unwrap().push((id, price));
            Ok(())
        }
    }

    /// Hands out scripted outcomes, one per scrape call.
    struct StubScraper {
        outcomes: Mutex<VecDeque<Result<Option<ScrapeResult>, ScrapeError>>>,
    }

    impl StubScraper {
        fn new(outcomes: Vec<Result<Option<ScrapeResult>, ScrapeError>>) -> Self {
            Self { outcomes: Mutex::new(outcomes.into()) }
        }
    }

    #[async_trait]
    impl ProductScrape for StubScraper {
        async fn scrape(
            &self,
            _url: &str,
            _env: &ExecutionEnvironment,
        ) -> Result<Option<ScrapeResult>, ScrapeError> {
            self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.to_string());
            if self.fail {
                Err(NotifyError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    fn no_throttle() -> ThrottleState {
        ThrottleState::new(Duration::ZERO, Duration::ZERO)
    }

    // Reason rules

    #[test]
    fn test_first_capture_is_the_only_reason_without_history() {
        let item = item(1, None, None);
        assert_eq!(notify_reasons(&item, 1.58), vec![NotifyReason::FirstCapture]);
    }

    #[test]
    fn test_target_met_combines_with_price_drop() {
        let item = item(1, Some(2.0), Some(2.5));
        assert_eq!(
            notify_reasons(&item, 1.9),
            vec![NotifyReason::TargetMet, NotifyReason::PriceDrop]
        );
    }

    #[test]
    fn test_target_met_without_drop() {
        let item = item(1, Some(2.0), Some(1.9));
        assert_eq!(notify_reasons(&item, 1.95), vec![NotifyReason::TargetMet]);
    }

    #[test]
    fn test_price_drop_without_target() {
        let item = item(1, None, Some(2.0));
        assert_eq!(notify_reasons(&item, 1.8), vec![NotifyReason::PriceDrop]);
    }

    #[test]
    fn test_steady_price_earns_no_reasons() {
        let item = item(1, None, Some(1.5));
        assert!(notify_reasons(&item, 1.58).is_empty());
    }

    // Cycle behavior

    #[tokio::test]
    async fn test_cycle_alerts_with_joined_reasons() {
        let store =
            MemoryStore { items: vec![item(1, Some(2.0), Some(2.5))], ..Default::default() };
        let scraper = StubScraper::new(vec![Ok(Some(capture("Γάλα Φρέσκο 1L", 1.49)))]);
        let notifier = RecordingNotifier::default();

        let report = run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::OnNotify,
        )
        .await
        .unwrap();

        assert_eq!(report, CycleReport { scraped: 1, misses: 0, notified: 1, failures: 0 });

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(
            sent[0],
            "Γάλα Φρέσκο 1L is now 1.49 EUR (target met, price drop): https://example.gr/p/1"
        );

        let notified = store.notified.lock().unwrap();
        assert_eq!(*notified, vec![(1, 1.49)]);
    }

    #[tokio::test]
    async fn test_steady_price_records_but_stays_quiet() {
        let store = MemoryStore { items: vec![item(1, None, Some(1.5))], ..Default::default() };
        let scraper = StubScraper::new(vec![Ok(Some(capture("Γάλα", 1.58)))]);
        let notifier = RecordingNotifier::default();

        let report = run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::OnNotify,
        )
        .await
        .unwrap();

        assert_eq!(report.scraped, 1);
        assert_eq!(report.notified, 0);
        assert_eq!(store.observations.lock().unwrap().len(), 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(store.notified.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_failure_skips_item_but_not_cycle() {
        let store = MemoryStore {
            items: vec![item(1, None, None), item(2, None, None)],
            ..Default::default()
        };
        let scraper = StubScraper::new(vec![
            Err(ScrapeError::Status { status: 500, url: "https://example.gr/p/1".to_string() }),
            Ok(Some(capture("Φέτα ΠΟΠ", 9.2))),
        ]);
        let notifier = RecordingNotifier::default();

        let report = run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::OnNotify,
        )
        .await
        .unwrap();

        assert_eq!(report, CycleReport { scraped: 1, misses: 0, notified: 1, failures: 1 });
        assert_eq!(store.observations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_miss_is_counted_not_recorded() {
        let store = MemoryStore { items: vec![item(1, None, None)], ..Default::default() };
        let scraper = StubScraper::new(vec![Ok(None)]);
        let notifier = RecordingNotifier::default();

        let report = run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::OnNotify,
        )
        .await
        .unwrap();

        assert_eq!(report, CycleReport { scraped: 0, misses: 1, notified: 0, failures: 0 });
        assert!(store.observations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_leaves_last_notified_alone() {
        let store = MemoryStore { items: vec![item(1, None, None)], ..Default::default() };
        let scraper = StubScraper::new(vec![Ok(Some(capture("Γάλα", 1.58)))]);
        let notifier = RecordingNotifier { fail: true, ..Default::default() };

        let report = run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::OnNotify,
        )
        .await
        .unwrap();

        assert_eq!(report.notified, 0);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert!(store.notified.lock().unwrap().is_empty());
        assert_eq!(store.observations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_always_policy_advances_without_alert() {
        let store = MemoryStore { items: vec![item(1, None, Some(1.5))], ..Default::default() };
        let scraper = StubScraper::new(vec![Ok(Some(capture("Γάλα", 1.58)))]);
        let notifier = RecordingNotifier::default();

        run_cycle(
            &scraper,
            &store,
            &notifier,
            &ExecutionEnvironment::HttpOnly,
            &mut no_throttle(),
            NotifyPolicy::Always,
        )
        .await
        .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(*store.notified.lock().unwrap(), vec![(1, 1.58)]);
    }

    #[test]
    fn test_notify_policy_parsing() {
        assert_eq!("on-notify".parse::<NotifyPolicy>().unwrap(), NotifyPolicy::OnNotify);
        assert_eq!("always".parse::<NotifyPolicy>().unwrap(), NotifyPolicy::Always);
        assert!("sometimes".parse::<NotifyPolicy>().is_err());
    }
}
