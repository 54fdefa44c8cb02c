//! Storefront-specific modules for fetching, rendering, and field extraction.

pub mod assemble;
pub mod client;
pub mod extract;
pub mod models;
pub mod price;
pub mod rendered;
pub mod scraper;
pub mod selectors;

pub use assemble::{assemble, MissReason};
pub use client::PageFetcher;
pub use extract::extract;
pub use models::{Currency, Extraction, FieldMatch, NameStrategy, PriceStrategy, ScrapeResult, TransportKind};
pub use rendered::{render_product_page, RenderWaits, RenderedCapture};
pub use scraper::{ProductScrape, ProductScraper, ScrapePolicy, TransportPolicy};
