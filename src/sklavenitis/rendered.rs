//! Rendered transport: drives a headless page through the product-page
//! choreography and captures the settled DOM.
//!
//! Consent dismissal and price readiness are best effort; their outcomes are
//! reported on the capture but never abort it. The page handle is released on
//! every exit path.

use crate::error::ScrapeError;
use crate::renderer::{RenderedPage, Renderer, RendererError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Wait budgets for the rendered choreography.
#[derive(Debug, Clone, Copy)]
pub struct RenderWaits {
    pub nav_timeout: Duration,
    pub price_timeout: Duration,
    pub settle: Duration,
}

impl Default for RenderWaits {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(60),
            price_timeout: Duration::from_secs(15),
            settle: Duration::from_secs(2),
        }
    }
}

/// How often the price-readiness predicate is polled.
const PRICE_POLL: Duration = Duration::from_millis(250);

/// One rendered capture. The booleans report how the best-effort steps went.
#[derive(Debug)]
pub struct RenderedCapture {
    pub html: String,
    pub consent_dismissed: bool,
    pub price_ready: bool,
}

/// Clicks the consent button through known selectors.
const CONSENT_SELECTOR_JS: &str = r#"
(() => {
    const selectors = [
        '#onetrust-accept-btn-handler',
        'button.cookie-accept',
        'button[aria-label="Αποδοχή όλων"]',
        'button[aria-label="Accept all"]',
        '.cookie-banner button.accept',
    ];
    for (const selector of selectors) {
        const el = document.querySelector(selector);
        if (el) {
            el.click();
            return true;
        }
    }
    return false;
})()
"#;

/// Clicks the consent button by its visible label when no selector matched.
const CONSENT_TEXT_JS: &str = r#"
(() => {
    const phrases = ['Αποδοχή όλων', 'Αποδοχή', 'Συμφωνώ', 'Accept All', 'Accept', 'Allow All', 'Agree'];
    const buttons = document.querySelectorAll('button, a[role="button"]');
    for (const button of buttons) {
        const text = (button.textContent || '').trim();
        if (phrases.some((phrase) => text === phrase || text.startsWith(phrase + ' '))) {
            button.click();
            return true;
        }
    }
    return false;
})()
"#;

/// Truthy once a price element carries an amount.
const PRICE_READY_JS: &str = r#"
(() => {
    const el = document.querySelector('[data-price], .main-price .price, .price, .product-price');
    return !!(el && (el.getAttribute('data-price') || (el.textContent || '').trim()));
})()
"#;

const SCROLL_JS: &str = "window.scrollBy(0, 800); true";
const OUTER_HTML_JS: &str = "document.documentElement.outerHTML";

/// Captures a product page through the renderer.
pub async fn render_product_page(
    renderer: &dyn Renderer,
    url: &str,
    waits: &RenderWaits,
) -> Result<RenderedCapture, ScrapeError> {
    let mut page = renderer.open_page().await?;

    let outcome = drive(page.as_mut(), url, waits).await;

    // Release the page before inspecting the outcome.
    if let Err(close_err) = page.close().await {
        warn!("Failed to release rendered page: {}", close_err);
    }

    Ok(outcome?)
}

async fn drive(
    page: &mut dyn RenderedPage,
    url: &str,
    waits: &RenderWaits,
) -> Result<RenderedCapture, RendererError> {
    page.goto(url, waits.nav_timeout).await?;

    let consent_dismissed = dismiss_consent(page).await;
    if consent_dismissed {
        debug!("Dismissed consent banner");
    }

    let price_ready = match page.wait_for(PRICE_READY_JS, waits.price_timeout, PRICE_POLL).await {
        Ok(ready) => ready,
        Err(err) => {
            warn!("Price readiness poll failed: {}", err);
            false
        }
    };
    if !price_ready {
        debug!("Price element not confirmed within budget, capturing anyway");
    }

    // Nudge lazy content into loading, then let the page settle.
    if let Err(err) = page.evaluate(SCROLL_JS).await {
        warn!("Scroll nudge failed: {}", err);
    }
    tokio::time::sleep(waits.settle).await;

    let html = match page.evaluate(OUTER_HTML_JS).await? {
        Value::String(html) => html,
        other => other.to_string(),
    };

    Ok(RenderedCapture { html, consent_dismissed, price_ready })
}

/// Selector sweep first, label sweep second. Failures count as "not dismissed".
async fn dismiss_consent(page: &mut dyn RenderedPage) -> bool {
    match page.evaluate(CONSENT_SELECTOR_JS).await {
        Ok(Value::Bool(true)) => return true,
        Ok(_) => {}
        Err(err) => {
            warn!("Consent selector sweep failed: {}", err);
            return false;
        }
    }

    match page.evaluate(CONSENT_TEXT_JS).await {
        Ok(Value::Bool(true)) => true,
        Ok(_) => false,
        Err(err) => {
            warn!("Consent label sweep failed: {}", err);
            false
        }
    }
}
