//! RFC 4180 CSV, enough for terminus' `--format=csv` output and for the dashboard export.

use crate::MetricsTable;

pub const EXPORT_HEADER: [&str; 6] = [
    "period",
    "visits",
    "pages_served",
    "cache_hits",
    "cache_misses",
    "cache_hit_ratio",
];

/// Splits one CSV record. Quoted fields may contain commas and doubled quotes; a field is never trimmed
/// inside quotes.
pub fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut field).trim().to_string());
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Reads a whole CSV document. Quoted fields spanning several lines are joined back together.
pub fn read_records(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut pending = String::new();

    for line in input.lines() {
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(line);
        if pending.chars().filter(|c| *c == '"').count() % 2 == 1 {
            continue;
        }
        if !pending.trim().is_empty() {
            records.push(split_record(&pending, ','));
        }
        pending.clear();
    }
    if !pending.trim().is_empty() {
        records.push(split_record(&pending, ','));
    }
    records
}

pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The table as downloadable CSV: a header row, then one row per bucket.
pub fn export(table: &MetricsTable) -> String {
    let mut out = EXPORT_HEADER.join(",");
    out.push('\n');
    for row in table.rows() {
        let fields = [
            escape_field(&row.period),
            row.visits.to_string(),
            row.pages_served.map(|p| p.to_string()).unwrap_or_default(),
            row.cache_hits.to_string(),
            row.cache_misses.to_string(),
            row.hit_ratio().map(|r| r.to_string()).unwrap_or_default(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parse_metrics,
        MetricRow,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(
            split_record(r#"Name,"Pages Served","say ""hi"", ok", 1,234"#, ','),
            vec!["Name", "Pages Served", r#"say "hi", ok"#, "1", "234"]
        );
        assert_eq!(split_record("a,,b,", ','), vec!["a", "", "b", ""]);
    }

    #[test]
    fn reads_multiline_quoted_records() {
        let records = read_records("name,label\nacme,\"two\nlines\"\n\nbeta,x\n");
        assert_eq!(
            records,
            vec![
                vec!["name".to_string(), "label".to_string()],
                vec!["acme".to_string(), "two\nlines".to_string()],
                vec!["beta".to_string(), "x".to_string()],
            ]
        );
    }

    #[test]
    fn escapes_only_when_needed() {
        assert_eq!(escape_field("2024-01-01"), "2024-01-01");
        assert_eq!(escape_field("Jan 1, 2024"), "\"Jan 1, 2024\"");
        assert_eq!(escape_field("a \"b\""), "\"a \"\"b\"\"\"");
    }

    #[test]
    fn export_has_header_and_one_line_per_row() {
        let table = parse_metrics("2024-01-01,10,8,2\n2024-01-02,5,4,1").unwrap();
        assert_eq!(
            export(&table),
            "period,visits,pages_served,cache_hits,cache_misses,cache_hit_ratio\n\
             2024-01-01,10,,8,2,0.8\n\
             2024-01-02,5,,4,1,0.8\n"
        );
    }

    #[test]
    fn export_round_trips_through_parser() {
        let rows = vec![
            MetricRow {
                period: "2024-02-01".to_string(),
                visits: 1_234_567,
                pages_served: Some(9_000),
                cache_hits: 8_999,
                cache_misses: 1,
                ..Default::default()
            },
            MetricRow {
                period: "2024-02-02".to_string(),
                visits: 0,
                pages_served: Some(0),
                cache_hits: 0,
                cache_misses: 0,
                ..Default::default()
            },
            MetricRow {
                period: "2024-02-03".to_string(),
                visits: 42,
                pages_served: Some(30),
                cache_hits: 10,
                cache_misses: 20,
                ..Default::default()
            },
        ];
        let original = crate::MetricsTable::new(rows, vec![]);
        let reparsed = parse_metrics(&export(&original)).unwrap();

        assert_eq!(reparsed.len(), original.len());
        for (a, b) in original.rows().iter().zip(reparsed.rows()) {
            assert_eq!(a.period, b.period);
            assert_eq!(a.visits, b.visits);
            assert_eq!(a.pages_served, b.pages_served);
            assert_eq!(a.cache_hits, b.cache_hits);
            assert_eq!(a.cache_misses, b.cache_misses);
            assert_eq!(a.hit_ratio(), b.reported_ratio);
        }
        assert_eq!(original.summary().total_visits, reparsed.summary().total_visits);
        assert_eq!(original.summary().hit_ratio, reparsed.summary().hit_ratio);
    }

    #[test]
    fn quoted_labels_round_trip() {
        let rows = vec![
            MetricRow {
                period: "Jan 1, 2024".to_string(),
                visits: 10,
                cache_hits: 8,
                cache_misses: 2,
                ..Default::default()
            },
            MetricRow {
                period: "week \"2\"".to_string(),
                visits: 5,
                cache_hits: 4,
                cache_misses: 1,
                ..Default::default()
            },
        ];
        let original = crate::MetricsTable::new(rows, vec![]);
        let exported = export(&original);
        assert!(exported.contains("\"Jan 1, 2024\",10,,8,2,0.8\n"), "{exported}");

        let reparsed = parse_metrics(&exported).unwrap();
        let periods = reparsed.rows().iter().map(|row| row.period.as_str()).collect::<Vec<_>>();
        assert_eq!(periods, vec!["Jan 1, 2024", "week \"2\""]);
        assert_eq!(reparsed.summary().total_cache_hits, 12);
        assert_eq!(reparsed.summary().total_cache_misses, 3);
    }
}
