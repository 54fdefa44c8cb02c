//! Error taxonomy for the scraping pipeline.

use crate::renderer::RendererError;
use thiserror::Error;

/// Failures the scraping pipeline surfaces to its caller.
///
/// Transport-class failures are transient: a retry with a fresh identity has a
/// real chance of succeeding, so the retry controller keeps those in-house until
/// its attempt budget runs out. Renderer failures surface on first occurrence.
/// A page that yields no usable name/price is *not* represented here - that is
/// a result (`Ok(None)` at the pipeline boundary), not an error.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network-level failure: DNS, TLS, connect or read timeout.
    #[error("request failed: {0}")]
    Transport(#[from] wreq::Error),

    /// The server answered, but not with a page worth parsing.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The page-rendering collaborator failed to do its job.
    #[error("renderer failure: {0}")]
    Renderer(#[from] RendererError),

    /// Every attempt failed; carries the terminal attempt's error.
    #[error("all {attempts} fetch attempts failed: {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ScrapeError>,
    },
}

impl ScrapeError {
    /// Whether retrying with a fresh identity could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::Transport(_) | ScrapeError::Status { .. })
    }
}
