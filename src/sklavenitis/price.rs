//! Price text normalization.

/// Converts locale-formatted price text into a canonical decimal.
///
/// Assumes Greek/European formatting: `.` is a thousands separator, `,` the
/// decimal separator. Everything except digits and separators is stripped
/// first, so currency symbols and surrounding labels are fine. Returns `None`
/// when no parseable amount remains.
///
/// Known limitation: a bare `"1.234"` reads as one thousand two hundred
/// thirty-four. Without a decimal comma in the text the thousands
/// interpretation wins, and nothing in the input can disambiguate.
pub fn normalize(raw: &str) -> Option<f64> {
    let kept: String =
        raw.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',').collect();
    if kept.is_empty() {
        return None;
    }

    let canonical = kept.replace('.', "").replace(',', ".");
    canonical.parse::<f64>().ok().filter(|value| value.is_finite())
}
