//! CSS selectors and text patterns for product pages, centralized so markup
//! drift is a one-file fix.

use regex_lite::Regex;
use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the product-name cascade, in cascade order.
pub mod name {
    use super::*;

    /// Dedicated product-title heading.
    pub static PRODUCT_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1.product-title").unwrap());

    /// Microdata name on the main heading.
    pub static ITEMPROP_NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1[itemprop='name']").unwrap());

    /// Any top-level heading.
    pub static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

    /// Open Graph title.
    pub static OG_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[property='og:title']").unwrap());

    /// Document title, the cascade's last resort.
    pub static DOCUMENT_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").unwrap());
}

/// Selectors for the price cascade, in cascade order.
pub mod price {
    use super::*;

    /// Price elements carrying a machine-readable amount.
    pub static DATA_PRICE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(".main-price .price[data-price], .price[data-price]").unwrap()
    });

    /// Broad sweep: anything carrying a data-price attribute.
    pub static DATA_PRICE_ANY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-price]").unwrap());

    /// Structured price metadata tags.
    pub static PRICE_META: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("meta[property='product:price:amount'], meta[itemprop='price']").unwrap()
    });

    /// Embedded structured-data blocks.
    pub static JSON_LD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script[type='application/ld+json']").unwrap());

    /// Price-styled elements read as display text.
    pub static PRICE_TEXT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[data-testid='product-price'], .main-price .price, .price, .product-price, span[itemprop='price']",
        )
        .unwrap()
    });

    /// Elements worth scanning for a euro-suffixed amount.
    pub static EURO_HOSTS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span, div, p, b, strong").unwrap());

    /// Inline scripts, scanned as the rendered transport's last resort.
    pub static SCRIPTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
}

/// Text patterns shared by the regex-based strategies.
pub mod patterns {
    use super::*;

    /// A euro-suffixed amount, e.g. `3,49 €`.
    pub static EURO_AMOUNT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\d+[\d.,]*\s*€").unwrap());

    /// A value that is a bare amount and nothing else.
    pub static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[\d.,]*$").unwrap());

    /// A data-price attribute in raw markup.
    pub static RAW_DATA_PRICE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"data-price\s*=\s*"([0-9.,]+)""#).unwrap());

    /// A JSON-ish "price" key in raw markup or script bodies.
    pub static RAW_PRICE_KEY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#""price"\s*:\s*"?([0-9.,]+)"?"#).unwrap());
}
