//! Scrape orchestration: transport selection, retry, extraction, assembly.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::identity::IdentityPool;
use crate::renderer::{ExecutionEnvironment, Renderer};
use crate::retry::{with_retry, RetryPolicy};
use crate::sklavenitis::assemble::assemble;
use crate::sklavenitis::client::PageFetcher;
use crate::sklavenitis::extract::extract;
use crate::sklavenitis::models::{ScrapeResult, TransportKind};
use crate::sklavenitis::rendered::{render_product_page, RenderWaits};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Transport choice when a renderer is available. Without one, direct is the
/// only transport and a failed direct fetch is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportPolicy {
    /// Try the cheap direct fetch, fall back to the renderer when it fails or
    /// parses nothing.
    #[default]
    DirectFirst,
    /// Go straight to the renderer.
    RenderedOnly,
}

impl FromStr for TransportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct-first" => Ok(TransportPolicy::DirectFirst),
            "rendered-only" => Ok(TransportPolicy::RenderedOnly),
            _ => Err(format!("Invalid transport policy: {s} (expected direct-first or rendered-only)")),
        }
    }
}

impl fmt::Display for TransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportPolicy::DirectFirst => write!(f, "direct-first"),
            TransportPolicy::RenderedOnly => write!(f, "rendered-only"),
        }
    }
}

/// Everything that shapes one scrape.
#[derive(Debug, Clone, Copy)]
pub struct ScrapePolicy {
    pub retry: RetryPolicy,
    pub transport: TransportPolicy,
    pub price_fallthrough: bool,
    pub render: RenderWaits,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            transport: TransportPolicy::DirectFirst,
            price_fallthrough: false,
            render: RenderWaits::default(),
        }
    }
}

/// Trait for product scraping - enables mocking for tests.
#[async_trait]
pub trait ProductScrape: Send + Sync {
    /// Scrapes one product page. `Ok(None)` is a miss (page answered but no
    /// capture), not a failure.
    async fn scrape(
        &self,
        url: &str,
        env: &ExecutionEnvironment,
    ) -> Result<Option<ScrapeResult>, ScrapeError>;
}

/// The production scraper over the storefront's product pages.
pub struct ProductScraper {
    fetcher: PageFetcher,
    identities: IdentityPool,
    policy: ScrapePolicy,
}

impl ProductScraper {
    /// Creates a scraper from the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            identities: IdentityPool::new(),
            policy: config.scrape_policy(),
        })
    }

    /// Assembles a scraper from explicit parts (for testing).
    pub fn with_parts(fetcher: PageFetcher, identities: IdentityPool, policy: ScrapePolicy) -> Self {
        Self { fetcher, identities, policy }
    }

    /// Direct transport: retried fetch with a fresh identity per attempt.
    async fn scrape_direct(&self, url: &str) -> Result<Option<ScrapeResult>, ScrapeError> {
        let fetcher = &self.fetcher;
        let html = with_retry(&self.policy.retry, &self.identities, |identity, _attempt| {
            async move { fetcher.fetch(url, &identity).await }
        })
        .await?;

        Ok(self.read_product(url, &html, TransportKind::Direct))
    }

    /// Rendered transport: a single choreographed capture, never retried.
    async fn scrape_rendered(
        &self,
        url: &str,
        renderer: &dyn Renderer,
    ) -> Result<Option<ScrapeResult>, ScrapeError> {
        let capture = render_product_page(renderer, url, &self.policy.render).await?;
        Ok(self.read_product(url, &capture.html, TransportKind::Rendered))
    }

    fn read_product(&self, url: &str, html: &str, transport: TransportKind) -> Option<ScrapeResult> {
        let extraction = extract(html, transport);

        match assemble(&extraction, self.policy.price_fallthrough) {
            Ok(result) => {
                info!(
                    "Captured {} at {:.2} {} via {} transport",
                    result.product, result.price, result.currency, transport
                );
                Some(result)
            }
            Err(reason) => {
                warn!("No capture from {} via {} transport: {}", url, transport, reason);
                None
            }
        }
    }
}

#[async_trait]
impl ProductScrape for ProductScraper {
    async fn scrape(
        &self,
        url: &str,
        env: &ExecutionEnvironment,
    ) -> Result<Option<ScrapeResult>, ScrapeError> {
        match env {
            ExecutionEnvironment::HttpOnly => self.scrape_direct(url).await,
            ExecutionEnvironment::WithRenderer(renderer) => match self.policy.transport {
                TransportPolicy::RenderedOnly => self.scrape_rendered(url, renderer.as_ref()).await,
                TransportPolicy::DirectFirst => match self.scrape_direct(url).await {
                    Ok(Some(result)) => Ok(Some(result)),
                    Ok(None) => {
                        debug!("Direct transport parsed nothing for {}, trying renderer", url);
                        self.scrape_rendered(url, renderer.as_ref()).await
                    }
                    Err(err) => {
                        warn!("Direct transport gave up on {}: {}. Trying renderer.", url, err);
                        self.scrape_rendered(url, renderer.as_ref()).await
                    }
                },
            },
        }
    }
}
