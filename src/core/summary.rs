//! Bounded summaries of signal nodes.
//!
//! A summary is either a preview (length plus the first `n` items) or a full
//! export capped at a fixed number of items. Oversized exports are never an
//! error: they are cut at the cap and marked as truncated, with the true
//! length reported so the caller can ask for a sub-range instead.

use crate::signal::{IndexRange, SequenceAccess, SignalNode};
use serde::Serialize;
use serde_json::Value;

/// Maximum number of items a full export may carry.
pub const MAX_FULL_IN_SUMMARY: usize = 100_000;

/// Default preview size.
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

/// Payload of a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryView {
    Preview {
        length: Option<usize>,
        sample: Vec<Value>,
    },
    Full {
        data: Vec<Value>,
        truncated: bool,
        total_length: usize,
    },
}

/// Summary of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Node kind (`series`, `table`, `scalar`, `container`)
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Element kind, for series and scalars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<&'static str>,
    /// Column names, for tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Range applied before summarizing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<IndexRange>,
    #[serde(flatten)]
    pub view: SummaryView,
}

/// Summarize a node.
///
/// The optional `range` is applied first. Without `include_full` the result
/// is a preview of at most `n` items; with it, a full export of at most `cap`
/// items.
pub fn summarize(
    node: &SignalNode,
    n: usize,
    include_full: bool,
    range: Option<IndexRange>,
    cap: usize,
) -> Summary {
    let sliced;
    let node = match range {
        Some(range) => {
            sliced = node.slice(range);
            &sliced
        }
        None => node,
    };

    let view = if include_full {
        full_view(node, cap)
    } else {
        SummaryView::Preview {
            length: node.length(),
            sample: node.take(n),
        }
    };

    Summary {
        kind: node.kind(),
        dtype: match node {
            SignalNode::Series(series) => series.dtype(),
            SignalNode::Scalar(sample) => Some(sample.kind()),
            _ => None,
        },
        columns: match node {
            SignalNode::Table(table) => Some(table.column_names()),
            _ => None,
        },
        range,
        view,
    }
}

fn full_view(node: &SignalNode, cap: usize) -> SummaryView {
    match node.length() {
        Some(total_length) if total_length > cap => SummaryView::Full {
            data: node.take(cap),
            truncated: true,
            total_length,
        },
        _ => {
            let mut data = node.to_plain();
            let total_length = data.len();
            let truncated = total_length > cap;
            data.truncate(cap);
            SummaryView::Full {
                data,
                truncated,
                total_length,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{Sample, Series, Table};
    use serde_json::json;

    fn numbers(len: i64) -> SignalNode {
        SignalNode::series(0..len)
    }

    #[test]
    fn test_preview() {
        let summary = summarize(&numbers(50), 5, false, None, MAX_FULL_IN_SUMMARY);
        assert_eq!(summary.kind, "series");
        assert_eq!(
            summary.view,
            SummaryView::Preview {
                length: Some(50),
                sample: (0..5).map(|i| json!(i)).collect()
            }
        );
    }

    #[test]
    fn test_preview_of_short_series() {
        let summary = summarize(&numbers(3), 20, false, None, MAX_FULL_IN_SUMMARY);
        match summary.view {
            SummaryView::Preview { length, sample } => {
                assert_eq!(length, Some(3));
                assert_eq!(sample.len(), 3);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_full_export_within_cap() {
        let summary = summarize(&numbers(10), 2, true, None, 100);
        assert_eq!(
            summary.view,
            SummaryView::Full {
                data: (0..10).map(|i| json!(i)).collect(),
                truncated: false,
                total_length: 10
            }
        );
    }

    #[test]
    fn test_full_export_truncates_at_cap() {
        let summary = summarize(&numbers(250), 2, true, None, 100);
        match summary.view {
            SummaryView::Full {
                data,
                truncated,
                total_length,
            } => {
                assert_eq!(data.len(), 100);
                assert!(truncated);
                assert_eq!(total_length, 250);
                assert_eq!(data[99], json!(99));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_range_then_full_export() {
        let summary = summarize(&numbers(1000), 2, true, Some(IndexRange::new(200, 260)), 100);
        match summary.view {
            SummaryView::Full {
                data,
                truncated,
                total_length,
            } => {
                assert!(!truncated);
                assert_eq!(data.len(), 60);
                assert_eq!(total_length, 60);
                assert_eq!(data[0], json!(200));
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_range_clamped_to_length() {
        let summary = summarize(&numbers(30), 2, true, Some(IndexRange::new(20, 90)), 100);
        match summary.view {
            SummaryView::Full { data, .. } => assert_eq!(data.len(), 10),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn test_resummarizing_sample_is_idempotent() {
        let first = summarize(&numbers(40), 7, false, None, MAX_FULL_IN_SUMMARY);
        let SummaryView::Preview { sample, .. } = first.view else {
            panic!("expected preview");
        };

        let rebuilt = SignalNode::Series(Series::new(
            sample.iter().filter_map(Sample::from_json).collect(),
        ));
        let second = summarize(&rebuilt, sample.len(), false, None, MAX_FULL_IN_SUMMARY);
        let SummaryView::Preview { sample: again, .. } = second.view else {
            panic!("expected preview");
        };
        assert_eq!(sample, again);
    }

    #[test]
    fn test_table_summary_reports_columns() {
        let table = Table::default()
            .with_column("a", vec![Sample::Int(1), Sample::Int(2), Sample::Int(3)])
            .with_column("subject", vec![
                Sample::Text("S1".into()),
                Sample::Text("S2".into()),
                Sample::Text("S3".into()),
            ]);
        let summary = summarize(&SignalNode::Table(table), 2, false, None, MAX_FULL_IN_SUMMARY);

        assert_eq!(summary.kind, "table");
        assert_eq!(summary.columns, Some(vec!["a".to_string(), "subject".to_string()]));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["length"], json!(3));
        assert_eq!(json["sample"].as_array().unwrap().len(), 2);
        assert_eq!(json["sample"][1], json!({"a": 2, "subject": "S2"}));
    }

    #[test]
    fn test_scalar_summary() {
        let summary = summarize(
            &SignalNode::Scalar(Sample::Float(4.0)),
            20,
            true,
            None,
            MAX_FULL_IN_SUMMARY,
        );
        assert_eq!(
            summary.view,
            SummaryView::Full {
                data: vec![json!(4.0)],
                truncated: false,
                total_length: 1
            }
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], json!("scalar"));
        assert_eq!(json["dtype"], json!("float"));
    }

    #[test]
    fn test_zero_item_preview_of_scalar_and_container() {
        let scalar = summarize(&SignalNode::Scalar(Sample::Int(700)), 0, false, None, MAX_FULL_IN_SUMMARY);
        assert_eq!(
            scalar.view,
            SummaryView::Preview {
                length: None,
                sample: Vec::new()
            }
        );

        let container = SignalNode::container().with_child("EDA", numbers(4));
        let summary = summarize(&container, 0, false, None, MAX_FULL_IN_SUMMARY);
        match summary.view {
            SummaryView::Preview { sample, .. } => assert!(sample.is_empty()),
            other => panic!("unexpected view {other:?}"),
        }
        assert_eq!(summary.dtype, None);
    }

    #[test]
    fn test_series_summary_reports_dtype() {
        let summary = summarize(&numbers(3), 2, false, None, MAX_FULL_IN_SUMMARY);
        assert_eq!(summary.dtype, Some("int"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dtype"], json!("int"));
    }
}
