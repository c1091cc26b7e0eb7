use chrono::{
    format::{
        Item,
        StrftimeItems,
    },
    NaiveDate,
};

pub const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns `format` when chrono can render it, otherwise the ISO fallback.
pub fn checked_format(format: &str) -> &str {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        warn!(format, "invalid date format, falling back to {FALLBACK_DATE_FORMAT}");
        FALLBACK_DATE_FORMAT
    } else {
        format
    }
}

/// Rewrites every standalone `YYYY-MM-DD` in `text` with `format`.
/// Dates glued to other word characters (`2024-01-01T00:00`) are left alone.
pub fn reformat_dates(text: &str, format: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i + 10 <= bytes.len() {
        let candidate = &bytes[i..i + 10];
        let bounded = (i == 0 || !is_word(bytes[i - 1])) && bytes.get(i + 10).map_or(true, |b| !is_word(*b));
        if bounded && looks_like_iso_date(candidate) {
            if let Ok(date) = NaiveDate::parse_from_str(&text[i..i + 10], "%Y-%m-%d") {
                out.push_str(&text[copied..i]);
                out.push_str(&date.format(format).to_string());
                i += 10;
                copied = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&text[copied..]);
    out
}

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn looks_like_iso_date(candidate: &[u8]) -> bool {
    candidate.iter().enumerate().all(|(index, b)| match index {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}
