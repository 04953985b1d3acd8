//! Uniform sequence access over signal nodes.
//!
//! Every representation a channel can take (series, table, scalar, or a
//! whole container of them) answers the same four questions here, so the
//! summarizer and the windowing engine never branch on node kinds
//! themselves.

use crate::signal::types::{Series, SignalNode, Table};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Half-open sample index range `[start, end)`.
///
/// Missing bounds mean "from the beginning" and "to the end". Bounds past
/// the sequence clamp; an inverted range yields an empty slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Parse `start:end` or `start,end`; either bound may be left empty.
    ///
    /// Anything else (negative numbers, garbage, a single number) yields
    /// `None`, which callers treat as "no range".
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (start, end) = s.split_once(':').or_else(|| s.split_once(','))?;
        let bound = |b: &str| -> Result<Option<usize>, ()> {
            let b = b.trim();
            if b.is_empty() {
                Ok(None)
            } else {
                b.parse::<usize>().map(Some).map_err(|_| ())
            }
        };
        Some(Self {
            start: bound(start).ok()?,
            end: bound(end).ok()?,
        })
    }

    /// Concrete `(start, end)` for a sequence of `len` items.
    pub fn clamp(&self, len: usize) -> (usize, usize) {
        let end = self.end.unwrap_or(len).min(len);
        let start = self.start.unwrap_or(0).min(end);
        (start, end)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<usize>| b.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", bound(self.start), bound(self.end))
    }
}

/// Sequence operations shared by every node kind.
pub trait SequenceAccess {
    /// Number of items, or `None` when the value has no meaningful length.
    fn length(&self) -> Option<usize>;

    /// Same-kind value restricted to `range`.
    fn slice(&self, range: IndexRange) -> Self
    where
        Self: Sized;

    /// First `n` items in plain form.
    fn take(&self, n: usize) -> Vec<Value>;

    /// All items in plain form: row records for tables, a flat list otherwise.
    fn to_plain(&self) -> Vec<Value>;
}

impl SequenceAccess for Series {
    fn length(&self) -> Option<usize> {
        Some(self.values.len())
    }

    fn slice(&self, range: IndexRange) -> Self {
        let (start, end) = range.clamp(self.values.len());
        Series::new(self.values[start..end].to_vec())
    }

    fn take(&self, n: usize) -> Vec<Value> {
        self.values.iter().take(n).map(|s| s.to_json()).collect()
    }

    fn to_plain(&self) -> Vec<Value> {
        self.take(self.values.len())
    }
}

impl Table {
    fn row(&self, index: usize) -> Value {
        let record: Map<String, Value> = self
            .columns
            .iter()
            .map(|c| {
                let cell = c.values.get(index).map_or(Value::Null, |s| s.to_json());
                (c.name.clone(), cell)
            })
            .collect();
        Value::Object(record)
    }
}

impl SequenceAccess for Table {
    fn length(&self) -> Option<usize> {
        Some(self.row_count())
    }

    fn slice(&self, range: IndexRange) -> Self {
        let mut sliced = Table::default();
        for column in &self.columns {
            let (start, end) = range.clamp(column.values.len());
            sliced = sliced.with_column(column.name.clone(), column.values[start..end].to_vec());
        }
        sliced
    }

    fn take(&self, n: usize) -> Vec<Value> {
        (0..self.row_count().min(n)).map(|i| self.row(i)).collect()
    }

    fn to_plain(&self) -> Vec<Value> {
        self.take(self.row_count())
    }
}

impl SequenceAccess for SignalNode {
    fn length(&self) -> Option<usize> {
        match self {
            SignalNode::Series(series) => series.length(),
            SignalNode::Table(table) => table.length(),
            SignalNode::Container(_) | SignalNode::Scalar(_) => None,
        }
    }

    /// Containers slice every descendant leaf to the same range; scalars
    /// have no index and are returned as they are.
    fn slice(&self, range: IndexRange) -> Self {
        match self {
            SignalNode::Series(series) => SignalNode::Series(series.slice(range)),
            SignalNode::Table(table) => SignalNode::Table(table.slice(range)),
            SignalNode::Container(children) => SignalNode::Container(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), child.slice(range)))
                    .collect(),
            ),
            SignalNode::Scalar(sample) => SignalNode::Scalar(sample.clone()),
        }
    }

    fn take(&self, n: usize) -> Vec<Value> {
        match self {
            SignalNode::Series(series) => series.take(n),
            SignalNode::Table(table) => table.take(n),
            _ => self.to_plain().into_iter().take(n).collect(),
        }
    }

    fn to_plain(&self) -> Vec<Value> {
        match self {
            SignalNode::Series(series) => series.to_plain(),
            SignalNode::Table(table) => table.to_plain(),
            SignalNode::Scalar(sample) => vec![sample.to_json()],
            SignalNode::Container(children) => {
                let names: Vec<&str> = children.keys().map(String::as_str).collect();
                vec![Value::String(format!("<container: {}>", names.join(", ")))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::types::Sample;
    use serde_json::json;

    #[test]
    fn test_range_parse() {
        assert_eq!(IndexRange::parse("10:20"), Some(IndexRange::new(10, 20)));
        assert_eq!(IndexRange::parse(" 5 , 7 "), Some(IndexRange::new(5, 7)));
        assert_eq!(
            IndexRange::parse(":30"),
            Some(IndexRange {
                start: None,
                end: Some(30)
            })
        );
        assert_eq!(IndexRange::parse("abc"), None);
        assert_eq!(IndexRange::parse("-5:10"), None);
        assert_eq!(IndexRange::parse("12"), None);
    }

    #[test]
    fn test_range_clamps() {
        assert_eq!(IndexRange::new(5, 100).clamp(10), (5, 10));
        assert_eq!(IndexRange::new(50, 100).clamp(10), (10, 10));
        assert_eq!(IndexRange::new(8, 3).clamp(10), (3, 3));
        assert_eq!(IndexRange::default().clamp(4), (0, 4));
    }

    #[test]
    fn test_series_access() {
        let series: Series = (0..10i64).collect();
        assert_eq!(series.length(), Some(10));
        assert_eq!(series.take(3), vec![json!(0), json!(1), json!(2)]);
        assert_eq!(series.slice(IndexRange::new(7, 50)).to_plain(), vec![json!(7), json!(8), json!(9)]);
    }

    #[test]
    fn test_empty_series_does_not_fail() {
        let series = Series::default();
        assert_eq!(series.length(), Some(0));
        assert!(series.take(5).is_empty());
        assert!(series.slice(IndexRange::new(3, 9)).values.is_empty());
    }

    #[test]
    fn test_table_to_plain_gives_row_records() {
        let table = Table::default()
            .with_column("a", vec![Sample::Int(1), Sample::Int(2), Sample::Int(3)])
            .with_column("subject", vec![Sample::Text("S1".into()), Sample::Text("S2".into())]);

        let rows = table.take(2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"a": 1, "subject": "S1"}));

        let plain = table.to_plain();
        assert_eq!(plain.len(), 3);
        assert_eq!(plain[2], json!({"a": 3, "subject": null}));
    }

    #[test]
    fn test_scalar_wraps_single_value() {
        let node = SignalNode::Scalar(Sample::Float(700.0));
        assert_eq!(node.length(), None);
        assert_eq!(node.take(20), vec![json!(700.0)]);
        assert_eq!(node.slice(IndexRange::new(0, 0)), node);
    }

    #[test]
    fn test_take_zero_is_empty_for_every_kind() {
        let scalar = SignalNode::Scalar(Sample::Int(700));
        let container = SignalNode::container().with_child("EDA", SignalNode::series([1.0]));
        assert!(scalar.take(0).is_empty());
        assert!(container.take(0).is_empty());
        assert!(SignalNode::series([1.0, 2.0]).take(0).is_empty());
        assert_eq!(container.take(1).len(), 1);
    }

    #[test]
    fn test_container_slice_reaches_every_leaf() {
        let node = SignalNode::container()
            .with_child("chest", SignalNode::container().with_child("EDA", SignalNode::series([1.0, 2.0, 3.0])))
            .with_child("wrist", SignalNode::series([4.0, 5.0, 6.0]));

        let sliced = node.slice(IndexRange::new(1, 2));
        let children = sliced.children().unwrap();
        assert_eq!(children["wrist"], SignalNode::series([5.0]));
        assert_eq!(
            children["chest"].children().unwrap()["EDA"],
            SignalNode::series([2.0])
        );
        assert_eq!(node.length(), None);
        assert_eq!(node.to_plain(), vec![json!("<container: chest, wrist>")]);
    }
}
