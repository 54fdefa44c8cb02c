//! Chromium adapter for the rendered transport, driven over CDP via chromiumoxide.

use super::{RenderedPage, Renderer, RendererError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

/// A headless Chromium instance.
pub struct ChromiumRenderer {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launches a headless browser and starts draining its CDP event stream.
    pub async fn launch() -> Result<Self, RendererError> {
        let config = BrowserConfig::builder().build().map_err(RendererError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RendererError::Launch(e.to_string()))?;

        // The browser makes no progress unless the handler stream is polled.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        debug!("chromium launched");
        Ok(Self { browser, handler_task })
    }

    /// Closes the browser process and stops the event task.
    pub async fn shutdown(mut self) -> Result<(), RendererError> {
        self.browser.close().await.map_err(|e| RendererError::Close(e.to_string()))?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>, RendererError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RendererError::OpenPage(e.to_string()))?;

        Ok(Box::new(ChromiumPage { page }))
    }
}

struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl RenderedPage for ChromiumPage {
    async fn goto(&mut self, url: &str, limit: Duration) -> Result<(), RendererError> {
        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                Err(RendererError::Navigation { url: url.to_string(), reason: e.to_string() })
            }
            Err(_) => Err(RendererError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {}s", limit.as_secs()),
            }),
        }
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, RendererError> {
        let evaluation = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| RendererError::Evaluate(e.to_string()))?;

        // `undefined` has no JSON representation; map it to null.
        Ok(evaluation.into_value().unwrap_or(Value::Null))
    }

    async fn wait_for(
        &mut self,
        predicate: &str,
        limit: Duration,
        poll: Duration,
    ) -> Result<bool, RendererError> {
        let deadline = tokio::time::Instant::now() + limit;

        loop {
            if self.evaluate(predicate).await?.as_bool() == Some(true) {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn close(&mut self) -> Result<(), RendererError> {
        self.page.clone().close().await.map_err(|e| RendererError::Close(e.to_string()))
    }
}
