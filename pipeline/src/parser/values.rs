use chrono::{
    DateTime,
    NaiveDate,
};

/// Reads a non-negative count. Accepts thousands separators (`1,234`) and integral decimals (`12.0`).
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned = unquote(raw)
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(count) = cleaned.parse::<u64>() {
        return Some(count);
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Some(value as u64)
        }
        _ => None,
    }
}

/// Reads a hit ratio as a fraction. `80%` and `80` mean 0.8, `0.8` is taken as is.
///
/// `Ok(None)` for blanks and placeholders like `--`, `Err(())` for anything else that is not a ratio.
pub fn parse_ratio(raw: &str) -> Result<Option<f64>, ()> {
    let value = unquote(raw);
    if matches!(value, "" | "-" | "--" | "n/a" | "N/A" | "null" | "None") {
        return Ok(None);
    }
    let (number, percent) = match value.strip_suffix('%') {
        Some(number) => (number.trim(), true),
        None => (value, false),
    };
    let number = number.parse::<f64>().map_err(|_| ())?;
    if !number.is_finite() || number < 0.0 {
        return Err(());
    }
    let fraction = if percent || number > 1.0 { number / 100.0 } else { number };
    if fraction > 1.0 {
        return Err(());
    }
    Ok(Some(fraction))
}

/// Recovers the calendar date from a bucket label: ISO dates (optionally followed by a time), US style
/// `MM-DD-YYYY` / `MM/DD/YYYY`, or unix timestamps.
pub fn parse_date(label: &str) -> Option<NaiveDate> {
    let label = unquote(label);
    if let Some(iso) = label.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
            return Some(date);
        }
    }
    for format in ["%m-%d-%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(label, format) {
            return Some(date);
        }
    }
    if label.len() >= 9 && label.chars().all(|c| c.is_ascii_digit()) {
        let secs = label.parse::<i64>().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive());
    }
    None
}

pub fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner.trim();
        }
    }
    trimmed
}
