//! Turns a [`crate::MetricsReport`] into something a person reads: summary lines, a cache efficiency gauge,
//! SVG line charts, and the HTML dashboard. The CSV export lives in [`crate::csv`].

mod chart;
mod dates;
mod gauge;
mod html;
mod summary;

pub use chart::{
    LineChart,
    Scale,
    Series,
};
pub use dates::reformat_dates;
pub use gauge::{
    Band,
    Gauge,
};
pub use html::{
    FormState,
    View,
};
pub use summary::{
    Breakdown,
    SummaryLine,
};

use crate::MetricRow;
use terminus_metrics_config::{
    BandThresholds,
    DashboardConfig,
};

/// Rendering settings shared by every view.
#[derive(Debug, Clone, PartialEq)]
pub struct Presenter {
    date_format: String,
    bands: BandThresholds,
}

impl Presenter {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            date_format: dates::checked_format(&config.date_format).to_string(),
            bands: config.bands,
        }
    }

    pub fn bands(&self) -> BandThresholds {
        self.bands
    }

    /// The row's date in the configured format, or its period text when it has no date.
    pub fn label(&self, row: &MetricRow) -> String {
        match row.date {
            Some(date) => date.format(&self.date_format).to_string(),
            None => row.period.clone(),
        }
    }

    /// Raw terminus stdout with its ISO dates in the configured format.
    pub fn raw_output(&self, stdout: &str) -> String {
        reformat_dates(stdout, &self.date_format)
    }
}

/// `1234567` as `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, c) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}%")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
