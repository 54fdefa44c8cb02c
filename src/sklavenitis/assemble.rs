//! Turns a raw extraction into a confirmed capture, or a descriptive miss.

use crate::sklavenitis::models::{Currency, Extraction, PriceStrategy, ScrapeResult};
use crate::sklavenitis::price;
use thiserror::Error;

/// Why a page yielded no capture. A miss is an outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissReason {
    #[error("no product name found")]
    NoName,
    #[error("no price candidate found")]
    NoPrice,
    #[error("price text {raw:?} from {strategy} did not normalize to a positive amount")]
    UnparsablePrice { raw: String, strategy: PriceStrategy },
}

/// Builds a [`ScrapeResult`] when the extraction carries a usable name and a
/// price that normalizes to a positive amount.
///
/// With `price_fallthrough` off, only the top-ranked price candidate is
/// consulted; with it on, lower-ranked candidates get a chance when the
/// winner's text fails to normalize.
pub fn assemble(extraction: &Extraction, price_fallthrough: bool) -> Result<ScrapeResult, MissReason> {
    let name = extraction.name.as_ref().ok_or(MissReason::NoName)?;
    let top = extraction.price().ok_or(MissReason::NoPrice)?;

    let candidates: &[_] = if price_fallthrough {
        &extraction.price_candidates
    } else {
        std::slice::from_ref(top)
    };

    for candidate in candidates {
        if let Some(amount) = price::normalize(&candidate.text).filter(|amount| *amount > 0.0) {
            return Ok(ScrapeResult {
                product: name.text.clone(),
                price: amount,
                currency: Currency::Eur,
            });
        }
    }

    Err(MissReason::UnparsablePrice { raw: top.text.clone(), strategy: top.strategy })
}
