use super::{
    build_row,
    values::unquote,
    Column,
};
use crate::{
    MetricRow,
    ParseWarning,
};

/// `Period: 2024-01-01` / `visits = 10` style records, as printed by terminus' list and yaml formats.
/// A record ends at a blank line or when its period key repeats.
///
/// Returns `None` when the output does not look like key/value records at all.
pub(super) fn parse(stdout: &str, warnings: &mut Vec<ParseWarning>) -> Option<Vec<MetricRow>> {
    let lines = stdout
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim().is_empty(), key_value(line)))
        .collect::<Vec<_>>();
    if lines.iter().filter(|(_, _, pair)| pair.is_some()).count() < 2 {
        return None;
    }

    let mut records: Vec<(usize, Vec<(Column, &str)>)> = Vec::new();
    let mut current: Option<(usize, Vec<(Column, &str)>)> = None;
    for (line, blank, pair) in lines {
        match pair {
            None if blank => records.extend(current.take()),
            None => {}
            Some(pair) => {
                if pair.0 == Column::Period && current.as_ref().is_some_and(|(_, fields)| has_period(fields)) {
                    records.extend(current.take());
                }
                current.get_or_insert_with(|| (line, Vec::new())).1.push(pair);
            }
        }
    }
    records.extend(current);

    let mut rows = Vec::new();
    for (index, (line, fields)) in records.into_iter().enumerate() {
        if !fields.iter().any(|(column, _)| column.is_metric()) {
            continue;
        }
        let label = (index + 1).to_string();
        let mut cells = fields
            .iter()
            .map(|(column, value)| (*column, Some(*value)))
            .collect::<Vec<_>>();
        if !has_period(&fields) {
            cells.push((Column::Period, Some(label.as_str())));
        }
        rows.extend(build_row(line, &cells, warnings));
    }
    Some(rows)
}

fn has_period(fields: &[(Column, &str)]) -> bool {
    fields.iter().any(|(column, _)| *column == Column::Period)
}

fn key_value(line: &str) -> Option<(Column, &str)> {
    let split = line.find([':', '='])?;
    let (key, value) = (line[..split].trim(), &line[split + 1..]);
    if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let column = Column::from_header(key)?;
    Some((column, unquote(value)))
}
