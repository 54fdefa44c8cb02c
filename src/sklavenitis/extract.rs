//! Field extraction cascades over product-page markup.
//!
//! Each field has an ordered list of strategies; the first one producing
//! non-empty text wins the field. The price cascade records every matching
//! strategy's candidate so the assembler can optionally fall through when the
//! winner fails to normalize.

use crate::sklavenitis::models::{
    Extraction, FieldMatch, NameStrategy, PriceStrategy, TransportKind,
};
use crate::sklavenitis::selectors::{name, patterns, price};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Runs both field cascades over one page capture.
pub fn extract(html: &str, transport: TransportKind) -> Extraction {
    let document = Html::parse_document(html);

    let name = extract_name(&document);
    let price_candidates = price_candidates(&document, html, transport);

    match (&name, price_candidates.first()) {
        (Some(n), Some(p)) => {
            debug!("Matched name via {} and price via {}", n.strategy.label(), p.strategy.label())
        }
        (Some(n), None) => debug!("Matched name via {} but no price", n.strategy.label()),
        (None, Some(p)) => debug!("Matched price via {} but no name", p.strategy.label()),
        (None, None) => debug!("No extraction strategy matched"),
    }

    Extraction { name, price_candidates }
}

/// Name cascade: first non-empty wins.
fn extract_name(document: &Html) -> Option<FieldMatch<NameStrategy>> {
    element_text(document, &name::PRODUCT_TITLE)
        .and_then(|t| FieldMatch::new(t, NameStrategy::ProductTitle))
        .or_else(|| {
            element_text(document, &name::ITEMPROP_NAME)
                .and_then(|t| FieldMatch::new(t, NameStrategy::ItemPropName))
        })
        .or_else(|| {
            element_text(document, &name::HEADING)
                .and_then(|t| FieldMatch::new(t, NameStrategy::Heading))
        })
        .or_else(|| {
            meta_content(document, &name::OG_TITLE)
                .and_then(|t| FieldMatch::new(t, NameStrategy::OgTitle))
        })
        .or_else(|| {
            element_text(document, &name::DOCUMENT_TITLE)
                .and_then(|t| FieldMatch::new(t, NameStrategy::DocumentTitle))
        })
}

/// Price cascade: one candidate per matching strategy, in cascade order.
fn price_candidates(
    document: &Html,
    raw_html: &str,
    transport: TransportKind,
) -> Vec<FieldMatch<PriceStrategy>> {
    let mut candidates = Vec::new();

    push(&mut candidates, data_price_attr(document), PriceStrategy::DataPriceAttr);
    push(&mut candidates, meta_content(document, &price::PRICE_META), PriceStrategy::PriceMeta);
    push(&mut candidates, json_ld_price(document), PriceStrategy::JsonLd);
    push(
        &mut candidates,
        element_text(document, &price::PRICE_TEXT),
        PriceStrategy::PriceElementText,
    );
    push(&mut candidates, euro_pattern(document), PriceStrategy::EuroPattern);

    // Terminal fallback depends on how the content was obtained.
    match transport {
        TransportKind::Direct => {
            push(&mut candidates, raw_markup_price(raw_html), PriceStrategy::RawMarkup)
        }
        TransportKind::Rendered => {
            push(&mut candidates, script_scan(document), PriceStrategy::ScriptScan)
        }
    }

    candidates
}

fn push(candidates: &mut Vec<FieldMatch<PriceStrategy>>, text: Option<String>, strategy: PriceStrategy) {
    if let Some(found) = text.and_then(|t| FieldMatch::new(t, strategy)) {
        candidates.push(found);
    }
}

/// First non-blank text among the selector's matches, whitespace collapsed.
fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| {
        let text: String = el.text().collect();
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(collapse_whitespace(text))
        }
    })
}

/// First non-blank `content` attribute among the selector's matches.
fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| {
        el.value()
            .attr("content")
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    })
}

/// Machine-readable amount on a price element, then the broad data-price sweep.
fn data_price_attr(document: &Html) -> Option<String> {
    let dedicated = document
        .select(&price::DATA_PRICE)
        .find_map(|el| el.value().attr("data-price").map(str::trim).filter(|v| !v.is_empty()));
    if let Some(value) = dedicated {
        return Some(value.to_string());
    }

    // Anything else carrying a data-price, as long as the value is an amount
    // and not a SKU or similar.
    document
        .select(&price::DATA_PRICE_ANY)
        .find_map(|el| {
            el.value().attr("data-price").map(str::trim).filter(|v| patterns::NUMERIC.is_match(v))
        })
        .map(str::to_string)
}

/// Walks embedded JSON-LD blocks for an offer price.
fn json_ld_price(document: &Html) -> Option<String> {
    for script in document.select(&price::JSON_LD) {
        let body: String = script.text().collect();
        let Ok(data) = serde_json::from_str::<Value>(&body) else {
            debug!("Skipping unparseable JSON-LD block");
            continue;
        };

        if let Some(found) = offer_price_in(&data) {
            return Some(found);
        }
    }
    None
}

/// Hunts for `offers.price` (or `lowPrice`/`highPrice`) in a structured-data
/// node, descending through arrays and `@graph` containers.
fn offer_price_in(node: &Value) -> Option<String> {
    match node {
        Value::Array(items) => items.iter().find_map(offer_price_in),
        Value::Object(map) => {
            if let Some(found) = map.get("@graph").and_then(offer_price_in) {
                return Some(found);
            }
            map.get("offers").and_then(offers_price)
        }
        _ => None,
    }
}

fn offers_price(offers: &Value) -> Option<String> {
    match offers {
        Value::Array(items) => items.iter().find_map(offers_price),
        Value::Object(map) => ["price", "lowPrice", "highPrice"]
            .iter()
            .find_map(|key| map.get(*key).and_then(price_value)),
        _ => None,
    }
}

/// JSON-LD price values arrive as strings or numbers.
fn price_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Any element whose text carries a euro-suffixed amount; keeps the matched
/// slice, not the whole element text.
fn euro_pattern(document: &Html) -> Option<String> {
    document.select(&price::EURO_HOSTS).find_map(|el| {
        let text: String = el.text().collect();
        patterns::EURO_AMOUNT.find(&text).map(|m| m.as_str().to_string())
    })
}

/// Rendered-mode last resort: a "price" key inside inline script bodies.
fn script_scan(document: &Html) -> Option<String> {
    document.select(&price::SCRIPTS).find_map(|el| {
        let body: String = el.text().collect();
        patterns::RAW_PRICE_KEY.captures(&body).map(|caps| caps[1].to_string())
    })
}

/// Direct-fetch last resort: loose patterns over the raw markup.
fn raw_markup_price(raw_html: &str) -> Option<String> {
    if let Some(caps) = patterns::RAW_DATA_PRICE.captures(raw_html) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = patterns::RAW_PRICE_KEY.captures(raw_html) {
        return Some(caps[1].to_string());
    }
    patterns::EURO_AMOUNT.find(raw_html).map(|m| m.as_str().to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
