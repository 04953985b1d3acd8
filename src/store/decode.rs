//! Decoding recordings from JSON.
//!
//! Layout conventions:
//! - object → container of named children
//! - `{"columns": {name: [..], ..}}` → table, columns in declared order
//! - array of scalars → series
//! - array of equal-width arrays of scalars → table; three-wide rows become
//!   columns `x`, `y`, `z`, other widths `0`, `1`, ...
//! - scalar → scalar leaf
//!
//! Decoding never fails: values that fit no convention degrade to text.

use crate::signal::{Column, Recording, Sample, Series, SignalNode, Table};
use serde_json::{Map, Value};

pub(crate) const TABLE_KEY: &str = "columns";

/// Decode one node of a signal tree.
pub fn decode_node(value: &Value) -> SignalNode {
    match value {
        Value::Object(map) => match decode_column_table(map) {
            Some(table) => SignalNode::Table(table),
            None => SignalNode::Container(
                map.iter()
                    .map(|(name, child)| (name.clone(), decode_node(child)))
                    .collect(),
            ),
        },
        Value::Array(items) => match decode_row_table(items) {
            Some(table) => SignalNode::Table(table),
            None => SignalNode::Series(Series::new(items.iter().map(degrade).collect())),
        },
        scalar => SignalNode::Scalar(degrade(scalar)),
    }
}

/// Decode a whole recording document.
///
/// `subject`, `signal` and `label` are picked out of a top-level object; any
/// other key is kept as metadata. A document that is not an object is taken
/// to be the signal tree itself.
pub fn decode_recording(value: &Value) -> Recording {
    let Value::Object(map) = value else {
        return Recording::new(decode_node(value));
    };

    let mut recording = Recording::new(
        map.get("signal")
            .map(decode_node)
            .unwrap_or_else(SignalNode::container),
    );
    recording.subject = map.get("subject").and_then(subject_string);
    recording.label = map.get("label").map(decode_node);
    recording.extra = map
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "subject" | "signal" | "label"))
        .map(|(key, value)| (key.clone(), decode_node(value)))
        .collect();
    recording
}

/// Subject identifier as text; numbers are accepted.
pub fn subject_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn degrade(value: &Value) -> Sample {
    Sample::from_json(value).unwrap_or_else(|| Sample::Text(value.to_string()))
}

fn scalars(items: &[Value]) -> Option<Vec<Sample>> {
    items.iter().map(Sample::from_json).collect()
}

fn decode_column_table(map: &Map<String, Value>) -> Option<Table> {
    if map.len() != 1 {
        return None;
    }
    let Value::Object(columns) = map.get(TABLE_KEY)? else {
        return None;
    };

    let columns = columns
        .iter()
        .map(|(name, values)| match values {
            Value::Array(items) => Some(Column {
                name: name.clone(),
                values: scalars(items)?,
            }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Table::new(columns))
}

fn decode_row_table(items: &[Value]) -> Option<Table> {
    let rows = items
        .iter()
        .map(|item| match item {
            Value::Array(row) => scalars(row),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let width = rows.first()?.len();
    if width == 0 || rows.iter().any(|row| row.len() != width) {
        return None;
    }

    let names: Vec<String> = if width == 3 {
        ["x", "y", "z"].iter().map(|s| s.to_string()).collect()
    } else {
        (0..width).map(|i| i.to_string()).collect()
    };

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column {
            name,
            values: rows.iter().map(|row| row[i].clone()).collect(),
        })
        .collect();
    Some(Table::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_series_and_container() {
        let node = decode_node(&json!({"chest": {"EDA": [0.1, 0.2], "Resp": [1, 2]}}));
        let chest = &node.children().unwrap()["chest"];
        assert_eq!(chest.children().unwrap()["EDA"], SignalNode::series([0.1, 0.2]));
        assert_eq!(chest.children().unwrap()["Resp"], SignalNode::series([1i64, 2]));
    }

    #[test]
    fn test_decode_three_wide_rows_as_axes() {
        let node = decode_node(&json!([[1, 2, 3], [4, 5, 6]]));
        let SignalNode::Table(table) = node else {
            panic!("expected table");
        };
        assert_eq!(table.column_names(), vec!["x", "y", "z"]);
        assert_eq!(table.column("y").unwrap().values, vec![Sample::Int(2), Sample::Int(5)]);
    }

    #[test]
    fn test_decode_ragged_rows_as_series() {
        let node = decode_node(&json!([[1, 2], [3]]));
        let SignalNode::Series(series) = node else {
            panic!("expected series");
        };
        assert_eq!(series.values[1], Sample::Text("[3]".into()));
    }

    #[test]
    fn test_decode_column_table_keeps_order() {
        let node = decode_node(&json!({"columns": {"TEMP": [31.2], "EDA": [0.4]}}));
        let SignalNode::Table(table) = node else {
            panic!("expected table");
        };
        assert_eq!(table.column_names(), vec!["TEMP", "EDA"]);
    }

    #[test]
    fn test_decode_recording_fields() {
        let recording = decode_recording(&json!({
            "subject": "S2",
            "signal": {"wrist": {"EDA": [0.5]}},
            "label": [0, 1, 1],
            "rate": 700
        }));
        assert_eq!(recording.subject.as_deref(), Some("S2"));
        assert_eq!(recording.label, Some(SignalNode::series([0i64, 1, 1])));
        assert_eq!(recording.extra.len(), 1);
        assert_eq!(recording.extra["rate"], SignalNode::Scalar(Sample::Int(700)));
    }

    #[test]
    fn test_decode_bare_signal_document() {
        let recording = decode_recording(&json!([1, 2, 3]));
        assert_eq!(recording.subject, None);
        assert_eq!(recording.signal, SignalNode::series([1i64, 2, 3]));
    }
}
