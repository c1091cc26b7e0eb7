use chrono::NaiveDate;
use serde::{
    Deserialize,
    Serialize,
};

/// One time bucket as reported by terminus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Bucket label exactly as terminus printed it.
    pub period: String,
    /// Calendar date recovered from the label, when it holds one.
    pub date: Option<NaiveDate>,
    pub visits: u64,
    pub pages_served: Option<u64>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// The tool's own hit ratio as a fraction in `[0, 1]`.
    pub reported_ratio: Option<f64>,
}

impl MetricRow {
    /// Hits plus misses, saturating at `u64::MAX`.
    pub fn requests(&self) -> u64 {
        self.cache_hits.saturating_add(self.cache_misses)
    }

    pub fn hit_ratio(&self) -> Option<f64> {
        ratio(self.cache_hits, self.cache_misses)
    }

    /// False when terminus reported pages served that differ from hits plus misses.
    pub fn reconciles(&self) -> bool {
        self.pages_served.map_or(true, |pages| pages == self.requests())
    }
}

/// `hits / (hits + misses)`, undefined when nothing was requested.
pub fn ratio(hits: u64, misses: u64) -> Option<f64> {
    match u128::from(hits) + u128::from(misses) {
        0 => None,
        total => Some((hits as f64 / total as f64).clamp(0.0, 1.0)),
    }
}

fn total(counts: impl Iterator<Item = u64>) -> u64 {
    counts.fold(0, u64::saturating_add)
}

/// A field that could not be read. Counts fall back to zero, ratios to none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based line (or record) number in the terminus output.
    pub line: usize,
    pub column: String,
    pub value: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: could not read {} value {:?}",
            self.line, self.column, self.value
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub period: String,
    pub visits: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_visits: u64,
    pub total_pages_served: Option<u64>,
    pub total_cache_hits: u64,
    pub total_cache_misses: u64,
    pub hit_ratio: Option<f64>,
    /// Mean of the per-bucket ratios terminus reported.
    pub mean_reported_ratio: Option<f64>,
    pub peak: Option<Peak>,
    pub unreconciled_rows: usize,
}

impl Summary {
    fn compute(rows: &[MetricRow]) -> Self {
        let total_cache_hits = total(rows.iter().map(|row| row.cache_hits));
        let total_cache_misses = total(rows.iter().map(|row| row.cache_misses));
        let pages = rows.iter().filter_map(|row| row.pages_served).collect::<Vec<_>>();
        let reported = rows.iter().filter_map(|row| row.reported_ratio).collect::<Vec<_>>();

        Self {
            total_visits: total(rows.iter().map(|row| row.visits)),
            total_pages_served: (!pages.is_empty()).then(|| total(pages.iter().copied())),
            total_cache_hits,
            total_cache_misses,
            hit_ratio: ratio(total_cache_hits, total_cache_misses),
            mean_reported_ratio: (!reported.is_empty()).then(|| reported.iter().sum::<f64>() / reported.len() as f64),
            // first bucket wins ties
            peak: rows
                .iter()
                .rev()
                .max_by_key(|row| row.visits)
                .map(|row| Peak {
                    period: row.period.clone(),
                    visits: row.visits,
                }),
            unreconciled_rows: rows.iter().filter(|row| !row.reconciles()).count(),
        }
    }
}

/// Parsed terminus output. An empty table is the "no data" state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    rows: Vec<MetricRow>,
    summary: Summary,
    warnings: Vec<ParseWarning>,
}

impl MetricsTable {
    /// Orders the rows chronologically (when every row carries a date) and computes the summary.
    pub fn new(mut rows: Vec<MetricRow>, warnings: Vec<ParseWarning>) -> Self {
        if rows.iter().all(|row| row.date.is_some()) {
            rows.sort_by_key(|row| row.date);
        }
        let summary = Summary::compute(&rows);
        for row in rows.iter().filter(|row| !row.reconciles()) {
            warn!(
                period = %row.period,
                pages_served = ?row.pages_served,
                hits = row.cache_hits,
                misses = row.cache_misses,
                "cache hits and misses do not add up to pages served"
            );
        }
        Self {
            rows,
            summary,
            warnings,
        }
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when at least one row carries a pages served count.
    pub fn has_pages_served(&self) -> bool {
        self.summary.total_pages_served.is_some()
    }
}
