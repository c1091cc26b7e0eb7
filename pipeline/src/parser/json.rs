use super::{
    build_row,
    Column,
};
use crate::{
    MetricRow,
    MetricsError,
    ParseWarning,
};
use serde_json::{
    Map,
    Value,
};

/// `terminus env:metrics --format=json` prints an object keyed by bucket timestamp; arrays of records are
/// accepted as well.
pub(super) fn parse(input: &str, warnings: &mut Vec<ParseWarning>) -> Result<Vec<MetricRow>, MetricsError> {
    let value: Value =
        serde_json::from_str(input).map_err(|err| MetricsError::Parse(format!("malformed JSON: {err}")))?;

    let records: Vec<(Option<String>, &Map<String, Value>)> = match &value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|object| (None, object))
            .collect(),
        Value::Object(object) if object.values().all(Value::is_object) => object
            .iter()
            .filter_map(|(key, value)| value.as_object().map(|object| (Some(key.clone()), object)))
            .collect(),
        Value::Object(object) => vec![(None, object)],
        _ => return Err(MetricsError::Parse("JSON output is neither an object nor an array".to_string())),
    };

    let mut rows = Vec::new();
    for (index, (key, object)) in records.into_iter().enumerate() {
        let record = index + 1;
        let mut cells = object
            .iter()
            .filter_map(|(name, value)| Column::from_header(name).map(|column| (column, scalar(value))))
            .collect::<Vec<_>>();

        if !cells.iter().any(|(column, _)| column.is_metric()) {
            debug!(record, "skipping JSON record without metrics");
            continue;
        }
        if !cells.iter().any(|(column, _)| *column == Column::Period) {
            cells.push((Column::Period, key.unwrap_or_else(|| record.to_string())));
        }

        let fields = cells
            .iter()
            .map(|(column, cell)| (*column, Some(cell.as_str())))
            .collect::<Vec<_>>();
        if let Some(row) = build_row(record, &fields, warnings) {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
