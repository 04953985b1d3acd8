//! Signal tree types.
//!
//! A recording is a tree of named nodes. Inner nodes group children by name
//! (body location, device, ...), leaves carry the actual measurements as a
//! flat series, a table of named columns, or a single scalar.
//!
//! The tree is read-only for every engine in this crate: slicing produces a
//! new tree, nothing mutates the loaded recording.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single sample as it appears in a recording.
///
/// Recordings are loosely structured, so a channel may contain text or
/// missing entries next to numbers. Only numeric samples take part in
/// feature aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Sample {
    /// Numeric view of the sample, if it has one.
    ///
    /// Text is accepted when it parses as a number. Booleans, nulls and
    /// non-finite floats have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Sample::Int(i) => *i as f64,
            Sample::Float(f) => *f,
            Sample::Text(s) => s.trim().parse::<f64>().ok()?,
            Sample::Bool(_) | Sample::Null => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Plain JSON form used in summaries.
    pub fn to_json(&self) -> Value {
        match self {
            Sample::Int(i) => Value::from(*i),
            // NaN and infinities become null
            Sample::Float(f) => Value::from(*f),
            Sample::Bool(b) => Value::Bool(*b),
            Sample::Text(s) => Value::String(s.clone()),
            Sample::Null => Value::Null,
        }
    }

    /// Element kind name (`int`, `float`, `bool`, `text`, `null`).
    pub fn kind(&self) -> &'static str {
        match self {
            Sample::Int(_) => "int",
            Sample::Float(_) => "float",
            Sample::Bool(_) => "bool",
            Sample::Text(_) => "text",
            Sample::Null => "null",
        }
    }

    /// Build a sample from a JSON scalar. Arrays and objects have no sample form.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Sample::Null),
            Value::Bool(b) => Some(Sample::Bool(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Sample::Int(i),
                None => Sample::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(Sample::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Serialize for Sample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample::Float(value)
    }
}

impl From<i64> for Sample {
    fn from(value: i64) -> Self {
        Sample::Int(value)
    }
}

/// A flat sequence of samples for one channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub values: Vec<Sample>,
}

impl Series {
    pub fn new(values: Vec<Sample>) -> Self {
        Self { values }
    }

    /// Numeric samples only, in order.
    pub fn numeric(&self) -> Vec<f64> {
        numeric_samples(&self.values)
    }

    /// Element kind shared by the samples.
    ///
    /// Nulls are ignored and integers widen to `float` next to floats. Any
    /// other mix is `mixed`. An empty series has no element kind.
    pub fn dtype(&self) -> Option<&'static str> {
        let mut kinds = self.values.iter().map(Sample::kind).filter(|k| *k != "null");
        let Some(first) = kinds.next() else {
            return (!self.values.is_empty()).then_some("null");
        };
        Some(kinds.fold(first, |acc, kind| match (acc, kind) {
            (a, b) if a == b => a,
            ("int", "float") | ("float", "int") => "float",
            _ => "mixed",
        }))
    }
}

impl<T: Into<Sample>> FromIterator<T> for Series {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// A named column of a table leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Sample>,
}

/// A small table of named columns sharing a row index.
///
/// Columns keep their declared order. Ragged columns are allowed; the row
/// count is the length of the longest column and short columns read as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Add a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Sample>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            values,
        });
        self
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).max().unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A node of the signal tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalNode {
    /// Named children. Iteration is in key order, which fixes the traversal
    /// order used by every first-match-wins rule.
    Container(BTreeMap<String, SignalNode>),
    /// Table of named numeric columns.
    Table(Table),
    /// Flat channel.
    Series(Series),
    /// Degenerate leaf holding one opaque value.
    Scalar(Sample),
}

impl SignalNode {
    /// Empty container.
    pub fn container() -> Self {
        SignalNode::Container(BTreeMap::new())
    }

    /// Add a named child, builder style. Non-container nodes are returned unchanged.
    pub fn with_child(mut self, name: impl Into<String>, child: SignalNode) -> Self {
        if let SignalNode::Container(children) = &mut self {
            children.insert(name.into(), child);
        }
        self
    }

    /// Series leaf built from anything convertible into samples.
    pub fn series<T: Into<Sample>>(values: impl IntoIterator<Item = T>) -> Self {
        SignalNode::Series(values.into_iter().collect())
    }

    /// Short label for the node kind, reported as `type` in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SignalNode::Container(_) => "container",
            SignalNode::Table(_) => "table",
            SignalNode::Series(_) => "series",
            SignalNode::Scalar(_) => "scalar",
        }
    }

    /// Children of a container node.
    pub fn children(&self) -> Option<&BTreeMap<String, SignalNode>> {
        match self {
            SignalNode::Container(children) => Some(children),
            _ => None,
        }
    }
}

/// A loaded recording for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// Subject identifier stored in the recording, if any.
    pub subject: Option<String>,
    /// The signal tree.
    pub signal: SignalNode,
    /// Per-sample condition labels, if any.
    pub label: Option<SignalNode>,
    /// Remaining top-level entries, kept for metadata previews.
    pub extra: BTreeMap<String, SignalNode>,
}

impl Recording {
    pub fn new(signal: SignalNode) -> Self {
        Self {
            subject: None,
            signal,
            label: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_label(mut self, label: SignalNode) -> Self {
        self.label = Some(label);
        self
    }
}

/// Numeric samples of a slice, non-numeric entries dropped.
pub fn numeric_samples(samples: &[Sample]) -> Vec<f64> {
    samples.iter().filter_map(Sample::as_f64).collect()
}
