//! Turns terminus `env:metrics` output into a [`MetricsTable`].
//!
//! terminus can print csv, console tables, json, yaml-ish key/value lists, and a bare export may not carry a
//! header at all, so the parser tries these shapes in order:
//!
//! 1. JSON (`{...}` / `[...]`), possibly after `[notice]` lines
//! 2. a header line naming a period column and at least one metric column
//! 3. `key: value` records
//! 4. headerless rows, mapped positionally
//!
//! Individual cells that are not numbers become zero and are reported as [`ParseWarning`]s. Output that
//! yields no row at all is a [`MetricsError::Parse`].

mod columns;
mod json;
mod key_value;
mod layout;
mod values;

use crate::{
    MetricRow,
    MetricsError,
    MetricsTable,
    ParseWarning,
};
pub use columns::Column;
use columns::{
    header_columns,
    positional_columns,
};
use layout::{
    is_decoration,
    is_message,
    Layout,
};
pub use values::{
    parse_count,
    parse_date,
    parse_ratio,
};

pub fn parse_metrics(stdout: &str) -> Result<MetricsTable, MetricsError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(MetricsError::Parse("terminus printed no output".to_string()));
    }

    let mut warnings = Vec::new();
    let rows = if let Some(document) = json_document(trimmed) {
        json::parse(document, &mut warnings)?
    } else if let Some(rows) = parse_with_header(stdout, &mut warnings) {
        rows
    } else if let Some(rows) = key_value::parse(stdout, &mut warnings) {
        rows
    } else {
        parse_headerless(stdout, &mut warnings)
    };

    if rows.is_empty() {
        return Err(MetricsError::Parse("no metric rows found".to_string()));
    }
    debug!(rows = rows.len(), warnings = warnings.len(), "parsed terminus output");
    Ok(MetricsTable::new(rows, warnings))
}

/// The JSON document in the output once leading terminus messages are skipped, if it is JSON at all.
fn json_document(stdout: &str) -> Option<&str> {
    let mut rest = stdout.trim();
    while is_message(rest.lines().next()?) {
        rest = rest.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
    }
    rest.starts_with(['{', '[']).then_some(rest)
}

fn parse_with_header(stdout: &str, warnings: &mut Vec<ParseWarning>) -> Option<Vec<MetricRow>> {
    let mut lines = stdout.lines().enumerate().filter(|(_, line)| !is_decoration(line));

    let (layout, header) = lines.by_ref().find_map(|(_, line)| {
        let layout = Layout::detect(line);
        header_columns(&layout.split(line)).map(|columns| (layout, columns))
    })?;
    debug!(?layout, ?header, "found header");

    let mut rows = Vec::new();
    for (index, line) in lines {
        let cells = layout.split(line);
        if header_columns(&cells).is_some() {
            continue;
        }
        if cells.len() < 2 {
            debug!(line = index + 1, "skipping line with a single cell");
            continue;
        }
        let fields = header
            .iter()
            .enumerate()
            .filter_map(|(i, column)| column.map(|column| (column, cells.get(i).map(String::as_str))))
            .collect::<Vec<_>>();
        if let Some(row) = build_row(index + 1, &fields, warnings) {
            rows.push(row);
        }
    }
    Some(rows)
}

fn parse_headerless(stdout: &str, warnings: &mut Vec<ParseWarning>) -> Vec<MetricRow> {
    let mut lines = stdout
        .lines()
        .enumerate()
        .filter(|(_, line)| !is_decoration(line))
        .peekable();
    let Some(layout) = lines.peek().map(|(_, line)| Layout::detect(line)) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for (index, line) in lines {
        let cells = layout.split(line);
        let Some((label, values)) = split_label(layout, &cells) else {
            continue;
        };
        let columns = positional_columns(values.len());
        // Without a header, a line only counts as data if something in it is a number.
        if !values.iter().any(|value| parse_count(value).is_some()) {
            debug!(line = index + 1, "skipping line without numbers");
            continue;
        }
        let mut fields = vec![(Column::Period, Some(label.as_str()))];
        fields.extend(columns.iter().zip(values).map(|(column, value)| (*column, Some(value.as_str()))));
        if let Some(row) = build_row(index + 1, &fields, warnings) {
            rows.push(row);
        }
    }
    rows
}

/// Splits a headerless line into its label and the value cells after it. Space separated labels can span
/// several cells: a run of words (`Last week 10 8 2`), and a month name with the day and year that follow
/// it (`Jan 1 2024 10 8 2`).
fn split_label(layout: Layout, cells: &[String]) -> Option<(String, &[String])> {
    let first = cells.first()?;
    let mut end = 1;
    if layout == Layout::Whitespace && is_word(first) {
        while cells.get(end).is_some_and(|cell| is_word(cell)) {
            end += 1;
        }
        if cells[end - 1].parse::<chrono::Month>().is_ok() && cells.get(end).is_some_and(|cell| is_day(cell)) {
            end += 1;
            if cells.get(end).is_some_and(|cell| is_year(cell)) {
                end += 1;
            }
        }
    }
    let values = &cells[end..];
    (!values.is_empty()).then(|| (cells[..end].join(" "), values))
}

fn is_word(cell: &str) -> bool {
    cell.chars().all(|c| c.is_alphabetic())
}

fn is_day(cell: &str) -> bool {
    cell.trim_end_matches(',').parse::<u8>().is_ok_and(|day| (1..=31).contains(&day))
}

fn is_year(cell: &str) -> bool {
    cell.len() == 4 && cell.parse::<u16>().is_ok_and(|year| (1970..=2100).contains(&year))
}

/// Builds one row from `(column, cell)` pairs. A `None` cell means the column was expected but the line
/// ended early. Returns `None` when the row has no period label.
fn build_row(line: usize, fields: &[(Column, Option<&str>)], warnings: &mut Vec<ParseWarning>) -> Option<MetricRow> {
    let label = fields
        .iter()
        .find(|(column, _)| *column == Column::Period)
        .and_then(|(_, cell)| *cell)
        .map(values::unquote)
        .filter(|label| !label.is_empty())?;

    let mut row = MetricRow {
        period: label.to_string(),
        date: parse_date(label),
        ..Default::default()
    };

    let mut count = |column: Column, cell: Option<&str>| -> u64 {
        let cell = cell.unwrap_or_default();
        parse_count(cell).unwrap_or_else(|| {
            warn!(line, %column, value = cell, "not a number, using 0");
            warnings.push(ParseWarning {
                line,
                column: column.to_string(),
                value: cell.to_string(),
            });
            0
        })
    };

    let mut ratio_cell = None;
    for &(column, cell) in fields {
        match column {
            Column::Period => {}
            Column::Visits => row.visits = count(column, cell),
            Column::CacheHits => row.cache_hits = count(column, cell),
            Column::CacheMisses => row.cache_misses = count(column, cell),
            Column::PagesServed => {
                row.pages_served = match cell.map(values::unquote) {
                    Some("") => None,
                    cell => Some(count(column, cell)),
                }
            }
            Column::CacheHitRatio => ratio_cell = Some(cell.unwrap_or_default()),
        }
    }

    if let Some(cell) = ratio_cell {
        row.reported_ratio = parse_ratio(cell).unwrap_or_else(|()| {
            warn!(line, value = cell, "unreadable cache hit ratio");
            warnings.push(ParseWarning {
                line,
                column: Column::CacheHitRatio.to_string(),
                value: cell.to_string(),
            });
            None
        });
    }

    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn headerless_csv_scenario() {
        let table = parse_metrics("2024-01-01,10,8,2\n2024-01-02,5,4,1").unwrap();
        assert_eq!(
            table.rows(),
            &[
                MetricRow {
                    period: "2024-01-01".to_string(),
                    date: date(2024, 1, 1),
                    visits: 10,
                    cache_hits: 8,
                    cache_misses: 2,
                    ..Default::default()
                },
                MetricRow {
                    period: "2024-01-02".to_string(),
                    date: date(2024, 1, 2),
                    visits: 5,
                    cache_hits: 4,
                    cache_misses: 1,
                    ..Default::default()
                },
            ]
        );
        assert_eq!(table.summary().total_cache_hits, 12);
        assert_eq!(table.summary().total_cache_misses, 3);
        assert_eq!(table.summary().hit_ratio, Some(0.8));
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn empty_output_is_a_parse_error() {
        assert!(matches!(parse_metrics(""), Err(MetricsError::Parse(_))));
        assert!(matches!(parse_metrics("  \n\n "), Err(MetricsError::Parse(_))));
    }

    #[test]
    fn header_without_rows_is_a_parse_error() {
        let out = "Period,Visits,Pages Served,Cache Hits,Cache Misses,Cache Hit Ratio\n";
        assert!(matches!(parse_metrics(out), Err(MetricsError::Parse(_))));
    }

    #[test]
    fn prose_is_a_parse_error() {
        let out = "You are not logged in.\nRun terminus auth:login to continue";
        assert!(matches!(parse_metrics(out), Err(MetricsError::Parse(_))));
    }

    #[test]
    fn terminus_console_table() {
        let out = "\
 ------------ -------- -------------- ------------ -------------- -----------------
  Period       Visits   Pages Served   Cache Hits   Cache Misses   Cache Hit Ratio
 ------------ -------- -------------- ------------ -------------- -----------------
  2024-01-01   1,234    5,678          4,000        1,678          70.5%
  2024-01-02   987      3,000          2,900        100            96.67%
 ------------ -------- -------------- ------------ -------------- -----------------
";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.visits, 1234);
        assert_eq!(first.pages_served, Some(5678));
        assert_eq!(first.cache_hits, 4000);
        assert_eq!(first.cache_misses, 1678);
        assert_eq!(first.reported_ratio, Some(0.705));
        assert!(first.reconciles());
        assert_eq!(table.summary().total_visits, 2221);
        assert_eq!(table.summary().total_pages_served, Some(8678));
        assert_eq!(table.summary().unreconciled_rows, 0);
    }

    #[test]
    fn terminus_csv_with_quoted_headers() {
        let out = "Period,Visits,\"Pages Served\",\"Cache Hits\",\"Cache Misses\",\"Cache Hit Ratio\"\n\
                   2024-03-01,100,90,80,10,88.89%\n\
                   2024-03-02,\"1,100\",900,800,100,88.89%\n";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].visits, 1100);
        assert_eq!(table.summary().total_cache_hits, 880);
    }

    #[test]
    fn header_order_is_respected() {
        let out = "Cache Misses\tPeriod\tCache Hits\n2\t2024-01-01\t8\n";
        let table = parse_metrics(out).unwrap();
        let row = &table.rows()[0];
        assert_eq!((row.cache_hits, row.cache_misses, row.visits), (8, 2, 0));
    }

    #[test]
    fn malformed_cell_becomes_zero_with_warning() {
        let out = "Period,Visits,Cache Hits,Cache Misses\n\
                   2024-01-01,10,8,2\n\
                   2024-01-02,lots,4,1\n\
                   2024-01-03,7,3\n";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1].visits, 0);
        assert_eq!(table.rows()[1].cache_hits, 4);
        assert_eq!(table.rows()[2].cache_misses, 0);
        assert_eq!(
            table.warnings(),
            &[
                ParseWarning {
                    line: 3,
                    column: "Visits".to_string(),
                    value: "lots".to_string(),
                },
                ParseWarning {
                    line: 4,
                    column: "Cache Misses".to_string(),
                    value: "".to_string(),
                },
            ]
        );
    }

    #[test]
    fn notices_before_the_table_are_ignored() {
        let out = " [notice] Fetching metrics for acme.live\n\
                   Period  Visits  Cache Hits  Cache Misses\n\
                   2024-01-01  10  8  2\n";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].visits, 10);
    }

    #[test]
    fn notices_before_headerless_rows_are_ignored() {
        let out = "[notice] Fetching metrics for acme.live\n\
                   [warning] Datapoints capped at 28\n\
                   2024-01-01,10,8,2\n\
                   2024-01-02,5,4,1\n";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.summary().total_cache_hits, 12);
        assert!(table.warnings().is_empty());
    }

    #[test]
    fn notices_before_json_are_ignored() {
        let out = " [notice] Fetching metrics for acme.live\n\
                   [{\"period\": \"2024-01-01\", \"visits\": 10, \"cache_hits\": 8, \"cache_misses\": 2}]\n";
        let table = parse_metrics(out).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].cache_misses, 2);
    }

    #[test]
    fn counts_near_u64_max_keep_the_ratio_bounded() {
        let table = parse_metrics("2024-01-01,1,18446744073709551615,2\n").unwrap();
        assert_eq!(table.rows()[0].cache_hits, u64::MAX);
        let ratio = table.rows()[0].hit_ratio().unwrap();
        assert!((0.0..=1.0).contains(&ratio), "{ratio}");

        let table = parse_metrics("2024-01-01,18446744073709551615,1,1\n2024-01-02,1,1,1\n").unwrap();
        assert_eq!(table.summary().total_visits, u64::MAX);
        assert_eq!(table.summary().hit_ratio, Some(0.5));
    }

    #[test]
    fn multi_word_labels_in_space_separated_rows() {
        let table = parse_metrics("Jan 1 10 8 2\nJan 2 5 4 1\n").unwrap();
        let first = &table.rows()[0];
        assert_eq!(first.period, "Jan 1");
        assert_eq!((first.visits, first.cache_hits, first.cache_misses), (10, 8, 2));
        assert_eq!(first.pages_served, None);

        let table = parse_metrics("Jan 1 2024 10 8 2\nLast week 70 60 10\n").unwrap();
        let periods = table.rows().iter().map(|row| row.period.as_str()).collect::<Vec<_>>();
        assert_eq!(periods, vec!["Jan 1 2024", "Last week"]);
        assert_eq!(table.rows()[1].visits, 70);
    }

    #[test]
    fn headerless_positional_with_terminus_field_order() {
        let out = "2024-01-01  1,000  900  850  50  94.5%\n";
        let table = parse_metrics(out).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.visits, 1000);
        assert_eq!(row.pages_served, Some(900));
        assert_eq!(row.cache_hits, 850);
        assert_eq!(row.cache_misses, 50);
        assert_eq!(row.reported_ratio, Some(0.945));
    }

    #[test]
    fn parsing_is_idempotent() {
        let out = "2024-01-01,10,8,2\n2024-01-02,x,4,1\n";
        assert_eq!(parse_metrics(out).unwrap(), parse_metrics(out).unwrap());
    }

    #[test]
    fn totals_equal_sum_of_rows() {
        let lines = (1..=28)
            .map(|day| format!("2024-02-{day:02},{},{},{}", day * 3, day * 2, day))
            .collect::<Vec<_>>()
            .join("\n");
        let table = parse_metrics(&lines).unwrap();
        assert_eq!(table.len(), 28);
        let summary = table.summary();
        assert_eq!(summary.total_visits, table.rows().iter().map(|r| r.visits).sum::<u64>());
        assert_eq!(summary.total_cache_hits, (1..=28u64).map(|d| d * 2).sum::<u64>());
        assert_eq!(summary.total_cache_misses, (1..=28u64).sum::<u64>());
        let ratio = summary.hit_ratio.unwrap();
        assert!((0.0..=1.0).contains(&ratio));
    }
}
