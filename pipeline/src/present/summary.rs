use super::{
    format_count,
    format_percent,
    gauge::Band,
    Presenter,
};
use crate::{
    MetricsRequest,
    MetricsTable,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
}

impl SummaryLine {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Per-bucket cache hit ratios as reported (or derived when terminus left the column out).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub entries: Vec<(String, f64)>,
    pub mean_percent: Option<f64>,
    pub band: Band,
}

impl Breakdown {
    pub fn note(&self, high: f64) -> String {
        match self.mean_percent {
            None => "Unable to extract cache hit ratios from the output.".to_string(),
            Some(mean) if mean < high => format!(
                "The average cache hit ratio is {mean:.2}%, below the {high:.0}% target. Review the caching \
                 configuration and make sure cacheable pages send cache-friendly headers."
            ),
            Some(mean) => format!(
                "The average cache hit ratio is {mean:.2}%, at or above the {high:.0}% target. Caching is \
                 performing well."
            ),
        }
    }
}

impl Presenter {
    pub fn summary_lines(&self, request: &MetricsRequest, table: &MetricsTable) -> Vec<SummaryLine> {
        let summary = table.summary();
        let rows = table.rows();
        let mut lines = vec![
            SummaryLine::new("Site", request.site()),
            SummaryLine::new("Environment", request.environment()),
            SummaryLine::new("Period", request.period().to_string()),
        ];

        let range = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) if rows.len() > 1 => {
                format!("{} to {}", self.label(first), self.label(last))
            }
            (Some(first), _) => self.label(first),
            _ => "none".to_string(),
        };
        lines.push(SummaryLine::new("Buckets", format!("{} ({range})", rows.len())));
        lines.push(SummaryLine::new("Visits", format_count(summary.total_visits)));
        if let Some(pages) = summary.total_pages_served {
            lines.push(SummaryLine::new("Pages served", format_count(pages)));
        }
        lines.push(SummaryLine::new("Cache hits", format_count(summary.total_cache_hits)));
        lines.push(SummaryLine::new("Cache misses", format_count(summary.total_cache_misses)));

        let percent = summary.hit_ratio.map(|r| r * 100.0);
        let band = Band::classify(percent, &self.bands);
        let ratio = match percent {
            Some(p) => format!("{} ({band})", format_percent(p)),
            None => "n/a (no cacheable requests)".to_string(),
        };
        lines.push(SummaryLine::new("Cache hit ratio", ratio));

        if let Some(peak) = &summary.peak {
            let label = rows
                .iter()
                .find(|row| row.period == peak.period)
                .map(|row| self.label(row))
                .unwrap_or_else(|| peak.period.clone());
            lines.push(SummaryLine::new(
                "Busiest bucket",
                format!("{label} ({} visits)", format_count(peak.visits)),
            ));
        }
        if summary.unreconciled_rows > 0 {
            lines.push(SummaryLine::new(
                "Unreconciled buckets",
                format!(
                    "{} where cache hits + misses differ from pages served",
                    summary.unreconciled_rows
                ),
            ));
        }
        lines
    }

    /// One paragraph describing the report, for logs and plain-text output.
    pub fn summary_text(&self, request: &MetricsRequest, table: &MetricsTable) -> String {
        if table.is_empty() {
            return format!("No metrics were returned for {request}.");
        }
        self.summary_lines(request, table)
            .iter()
            .map(|line| format!("{}: {}", line.label, line.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn breakdown(&self, table: &MetricsTable) -> Breakdown {
        let entries = table
            .rows()
            .iter()
            .filter_map(|row| {
                row.reported_ratio
                    .or_else(|| row.hit_ratio())
                    .map(|ratio| (self.label(row), ratio * 100.0))
            })
            .collect::<Vec<_>>();
        let mean_percent = if entries.is_empty() {
            None
        } else {
            Some(entries.iter().map(|(_, percent)| percent).sum::<f64>() / entries.len() as f64)
        };
        Breakdown {
            band: Band::classify(mean_percent, &self.bands),
            entries,
            mean_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parse_metrics,
        Period,
    };
    use pretty_assertions::assert_eq;

    fn presenter() -> Presenter {
        Presenter::new(&terminus_metrics_config::Config::default().dashboard)
    }

    fn request() -> MetricsRequest {
        MetricsRequest::new("acme", "live", Period::Day).unwrap()
    }

    const OUT: &str = "Period,Visits,Pages Served,Cache Hits,Cache Misses,Cache Hit Ratio\n\
                       2024-01-01,10,10,8,2,80%\n\
                       2024-01-02,5,5,4,1,80%\n";

    #[test]
    fn summary_for_two_days() {
        let table = parse_metrics(OUT).unwrap();
        let lines = presenter().summary_lines(&request(), &table);
        let find = |label: &str| lines.iter().find(|l| l.label == label).map(|l| l.value.clone());
        assert_eq!(find("Buckets").as_deref(), Some("2 (01-01-2024 to 01-02-2024)"));
        assert_eq!(find("Visits").as_deref(), Some("15"));
        assert_eq!(find("Cache hits").as_deref(), Some("12"));
        assert_eq!(find("Cache misses").as_deref(), Some("3"));
        assert_eq!(find("Cache hit ratio").as_deref(), Some("80.00% (high)"));
        assert_eq!(find("Busiest bucket").as_deref(), Some("01-01-2024 (10 visits)"));
        assert_eq!(find("Unreconciled buckets"), None);
    }

    #[test]
    fn summary_without_cacheable_requests() {
        let table = parse_metrics("Period,Visits,Cache Hits,Cache Misses\n2024-01-01,3,0,0\n").unwrap();
        let text = presenter().summary_text(&request(), &table);
        assert!(text.contains("Cache hit ratio: n/a"), "{text}");
        assert!(!text.contains("Pages served"));
    }

    #[test]
    fn empty_summary() {
        let text = presenter().summary_text(&request(), &MetricsTable::default());
        assert_eq!(text, "No metrics were returned for acme.live (day).");
    }

    #[test]
    fn breakdown_averages_reported_ratios() {
        let out = "Period,Visits,Cache Hits,Cache Misses,Cache Hit Ratio\n\
                   2024-01-01,10,6,4,60%\n\
                   2024-01-02,10,7,3,70%\n";
        let breakdown = presenter().breakdown(&parse_metrics(out).unwrap());
        assert_eq!(breakdown.entries.len(), 2);
        assert_eq!(breakdown.entries[0].0, "01-01-2024");
        let mean = breakdown.mean_percent.unwrap();
        assert!((mean - 65.0).abs() < 1e-9);
        assert_eq!(breakdown.band, Band::Medium);
        assert!(breakdown.note(70.0).contains("below the 70% target"));
    }

    #[test]
    fn breakdown_without_ratios() {
        let breakdown = presenter().breakdown(&MetricsTable::default());
        assert_eq!(breakdown.mean_percent, None);
        assert_eq!(breakdown.band, Band::Unknown);
        assert!(breakdown.note(70.0).starts_with("Unable"));
    }
}
