//! Page-rendering collaborator interface.
//!
//! The rendered transport depends on an external browser-automation engine.
//! The pipeline only talks to it through the narrow trait pair below, so any
//! engine that can navigate, evaluate a script, and close a page is
//! interchangeable - and tests can substitute a scripted fake.

#[cfg(feature = "headless")]
pub mod chromium;

#[cfg(feature = "headless")]
pub use chromium::ChromiumRenderer;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures of the rendering collaborator itself.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open page: {0}")]
    OpenPage(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    #[error("failed to close page: {0}")]
    Close(String),
}

/// A running rendering engine able to hand out pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open_page(&self) -> Result<Box<dyn RenderedPage>, RendererError>;
}

/// One live page inside the rendering engine.
///
/// Pages are scoped acquisitions: whoever opens one must call `close` on every
/// exit path before handing control back.
#[async_trait]
pub trait RenderedPage: Send {
    /// Navigates to `url`, bounded by `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), RendererError>;

    /// Evaluates a script in the page and returns its JSON-converted result.
    async fn evaluate(&mut self, script: &str) -> Result<Value, RendererError>;

    /// Polls `predicate` (a script returning a boolean) every `poll` interval
    /// until it holds or `timeout` elapses. Returns whether it was met.
    async fn wait_for(
        &mut self,
        predicate: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<bool, RendererError>;

    /// Closes the page, releasing the engine-side resources.
    async fn close(&mut self) -> Result<(), RendererError>;
}

/// What the host can do for us, injected by the caller.
///
/// Never derived from ambient process state: the capability travels with the
/// call, so the same code path serves rendering-capable and HTTP-only hosts.
#[derive(Clone)]
pub enum ExecutionEnvironment {
    /// Plain HTTP only; the rendered transport is unavailable.
    HttpOnly,
    /// A rendering engine is on hand for script-heavy pages.
    WithRenderer(Arc<dyn Renderer>),
}

impl ExecutionEnvironment {
    /// Whether the rendered transport can be selected at all.
    pub fn can_render(&self) -> bool {
        matches!(self, ExecutionEnvironment::WithRenderer(_))
    }
}

impl std::fmt::Debug for ExecutionEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionEnvironment::HttpOnly => write!(f, "HttpOnly"),
            ExecutionEnvironment::WithRenderer(_) => write!(f, "WithRenderer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_only_cannot_render() {
        assert!(!ExecutionEnvironment::HttpOnly.can_render());
    }

    #[test]
    fn test_navigation_error_message() {
        let err = RendererError::Navigation {
            url: "https://example.gr/p/1".to_string(),
            reason: "timed out after 60s".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("example.gr"));
        assert!(message.contains("timed out"));
    }
}
