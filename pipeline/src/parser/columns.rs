use strum::{
    Display,
    EnumIter,
};

/// Fields terminus can print for `env:metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Column {
    Period,
    Visits,
    #[strum(to_string = "Pages Served")]
    PagesServed,
    #[strum(to_string = "Cache Hits")]
    CacheHits,
    #[strum(to_string = "Cache Misses")]
    CacheMisses,
    #[strum(to_string = "Cache Hit Ratio")]
    CacheHitRatio,
}

impl Column {
    /// Recognises a header cell or key regardless of case, spacing, underscores and dashes.
    pub fn from_header(cell: &str) -> Option<Self> {
        let normalized = cell
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        let column = match normalized.as_str() {
            "period" | "date" | "datetime" | "timestamp" | "time" | "bucket" => Column::Period,
            "visits" | "visit" => Column::Visits,
            "pagesserved" | "pages" | "pageviews" => Column::PagesServed,
            "cachehits" | "hits" => Column::CacheHits,
            "cachemisses" | "misses" => Column::CacheMisses,
            "cachehitratio" | "hitratio" | "cacheratio" | "ratio" => Column::CacheHitRatio,
            _ => return None,
        };
        Some(column)
    }

    pub fn is_metric(self) -> bool {
        self != Column::Period
    }
}

/// Maps header cells to columns, or `None` if the line is not a metrics header.
pub fn header_columns(cells: &[String]) -> Option<Vec<Option<Column>>> {
    let columns = cells.iter().map(|cell| Column::from_header(cell)).collect::<Vec<_>>();
    let has_period = columns.contains(&Some(Column::Period));
    let has_metric = columns.iter().flatten().any(|column| column.is_metric());
    (has_period && has_metric).then_some(columns)
}

/// Column order for rows without a header, by number of cells after the label. Follows terminus' default
/// field order, except that three values are read as visits, hits and misses.
pub fn positional_columns(values: usize) -> &'static [Column] {
    use Column::*;
    match values {
        0 => &[],
        1 => &[Visits],
        2 => &[Visits, PagesServed],
        3 => &[Visits, CacheHits, CacheMisses],
        4 => &[Visits, PagesServed, CacheHits, CacheMisses],
        _ => &[Visits, PagesServed, CacheHits, CacheMisses, CacheHitRatio],
    }
}
