//! Data types for product-page scraping.

use serde::{Deserialize, Serialize};

/// The storefront's currency. Fixed for this extractor, never parsed off the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How page content was obtained. The terminal cascade strategy differs
/// between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Direct,
    Rendered,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Direct => write!(f, "direct"),
            TransportKind::Rendered => write!(f, "rendered"),
        }
    }
}

/// Where a product name was found, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NameStrategy {
    ProductTitle,
    ItemPropName,
    Heading,
    OgTitle,
    DocumentTitle,
}

impl NameStrategy {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            NameStrategy::ProductTitle => "product-title",
            NameStrategy::ItemPropName => "itemprop-name",
            NameStrategy::Heading => "heading",
            NameStrategy::OgTitle => "og-title",
            NameStrategy::DocumentTitle => "document-title",
        }
    }
}

/// Where a price was found, in cascade order. The last two are terminal
/// fallbacks: `RawMarkup` only runs on direct fetches, `ScriptScan` only on
/// rendered captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriceStrategy {
    DataPriceAttr,
    PriceMeta,
    JsonLd,
    PriceElementText,
    EuroPattern,
    ScriptScan,
    RawMarkup,
}

impl PriceStrategy {
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceStrategy::DataPriceAttr => "data-price-attr",
            PriceStrategy::PriceMeta => "price-meta",
            PriceStrategy::JsonLd => "json-ld",
            PriceStrategy::PriceElementText => "price-element",
            PriceStrategy::EuroPattern => "euro-pattern",
            PriceStrategy::ScriptScan => "script-scan",
            PriceStrategy::RawMarkup => "raw-markup",
        }
    }
}

impl std::fmt::Display for PriceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The first non-empty text one cascade strategy produced for a field.
/// Discarded after normalization; the strategy tag survives into logs.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch<S> {
    pub text: String,
    pub strategy: S,
}

impl<S> FieldMatch<S> {
    /// Builds a match, treating empty or whitespace-only text as "strategy did
    /// not match" so the cascade keeps going.
    pub fn new(text: impl Into<String>, strategy: S) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self { text: trimmed.to_string(), strategy })
        }
    }
}

/// Raw cascade output for one page, before normalization.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub name: Option<FieldMatch<NameStrategy>>,
    /// One candidate per matching price strategy, in cascade order.
    pub price_candidates: Vec<FieldMatch<PriceStrategy>>,
}

impl Extraction {
    /// The winning price candidate under first-match-wins.
    pub fn price(&self) -> Option<&FieldMatch<PriceStrategy>> {
        self.price_candidates.first()
    }
}

/// Normalized, validated output of one successful extraction.
/// Immutable once built; only the assembler constructs one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub product: String,
    pub price: f64,
    pub currency: Currency,
}
