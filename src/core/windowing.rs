//! Windowed stress history.
//!
//! The tail of a recording is cut into fixed-size, non-overlapping sample
//! windows. Each window is scored on its own, and the two most recent
//! scores give the trend.

use crate::core::classifier::stress_score;
use crate::core::features::extract_features;
use crate::signal::{IndexRange, SequenceAccess, SignalNode};
use serde::{Deserialize, Serialize};

/// Score difference beyond which the trend is no longer stable.
pub const TREND_THRESHOLD: i32 = 5;

/// Default window size in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 300;

/// One scored window, `[start, end)` in sample indices of the scored node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredWindow {
    pub start: usize,
    pub end: usize,
    pub score: Option<u8>,
}

/// Direction of the most recent score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

/// Scored windows in chronological order plus the derived trend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResult {
    pub windows: Vec<ScoredWindow>,
    pub trend: Option<Trend>,
}

/// Sample count of a tree, taken from the first leaf with a known length.
///
/// Leaves are visited in the same order as feature extraction. Scalars and
/// empty containers have no length.
pub fn total_length(node: &SignalNode) -> Option<usize> {
    match node {
        SignalNode::Container(children) => children.values().find_map(total_length),
        leaf => leaf.length(),
    }
}

/// Window bounds covering the last `count * size` samples.
///
/// Windows start at `max(0, total - count * size)` and advance by `size`;
/// a window that would run past `total` is not produced.
pub fn window_bounds(total: usize, count: usize, size: usize) -> Vec<(usize, usize)> {
    if count == 0 || size == 0 {
        return Vec::new();
    }

    let start = total.saturating_sub(count.saturating_mul(size));
    (start..)
        .step_by(size)
        .take_while(|idx| idx + size <= total)
        .map(|idx| (idx, idx + size))
        .collect()
}

/// Trend from the two most recent known window scores.
pub fn derive_trend(windows: &[ScoredWindow]) -> Option<Trend> {
    let mut known = windows.iter().rev().filter_map(|w| w.score);
    let latest = i32::from(known.next()?);
    let previous = i32::from(known.next()?);

    let diff = latest - previous;
    Some(if diff > TREND_THRESHOLD {
        Trend::Rising
    } else if diff < -TREND_THRESHOLD {
        Trend::Falling
    } else {
        Trend::Stable
    })
}

/// Score the tail of `node` in `window_count` windows of `window_size` samples.
pub fn history(node: &SignalNode, window_count: usize, window_size: usize) -> HistoryResult {
    let overall = stress_score(&extract_features(node));
    history_with_overall(node, window_count, window_size, overall)
}

/// Same as [`history`], reusing an already computed overall score.
///
/// The trend is only reported when the overall score is known.
pub fn history_with_overall(
    node: &SignalNode,
    window_count: usize,
    window_size: usize,
    overall_score: Option<u8>,
) -> HistoryResult {
    let total = match total_length(node) {
        Some(total) if total > 0 => total,
        _ => return HistoryResult::default(),
    };

    let windows: Vec<ScoredWindow> = window_bounds(total, window_count, window_size)
        .into_iter()
        .map(|(start, end)| {
            let slice = node.slice(IndexRange::new(start, end));
            ScoredWindow {
                start,
                end,
                score: stress_score(&extract_features(&slice)),
            }
        })
        .collect();

    let trend = overall_score.and_then(|_| derive_trend(&windows));
    HistoryResult { windows, trend }
}
