//! Stress assessment of a recording.
//!
//! Combines feature extraction, classification and windowed history into the
//! response of the stress-state query.

use crate::core::{
    classify, extract_features, history_with_overall, stress_score, total_length, FeatureRecord,
    ScoredWindow, StressLabel, Trend, DEFAULT_WINDOW_SIZE,
};
use crate::signal::{IndexRange, Recording, SequenceAccess};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters of a stress-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    /// Restrict the assessment to this sample range
    pub range: Option<IndexRange>,
    /// Number of history windows; zero disables history
    pub windows: usize,
    /// Samples per history window
    pub window_size: usize,
}

impl Default for AssessmentRequest {
    fn default() -> Self {
        Self {
            range: None,
            windows: 0,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Result of a stress-state query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressAssessment {
    pub subject: String,
    pub features: FeatureRecord,
    pub state: StressLabel,
    pub score: Option<u8>,
    pub trend: Option<Trend>,
    pub history: Vec<ScoredWindow>,
    pub generated_at: DateTime<Utc>,
}

/// Assess the stress state of one recording.
pub fn evaluate(recording: &Recording, subject: &str, request: &AssessmentRequest) -> StressAssessment {
    let sliced;
    let (signal, offset) = match request.range {
        Some(range) => {
            sliced = recording.signal.slice(range);
            let total = total_length(&recording.signal).unwrap_or(0);
            (&sliced, range.clamp(total).0)
        }
        None => (&recording.signal, 0),
    };

    let features = extract_features(signal);
    let state = classify(&features);
    let score = stress_score(&features);
    let mut history = history_with_overall(signal, request.windows, request.window_size, score);

    // Report windows in recording indices rather than slice indices
    for window in &mut history.windows {
        window.start += offset;
        window.end += offset;
    }

    tracing::debug!(
        "Assessed {}: state={} score={:?} windows={}",
        subject,
        state,
        score,
        history.windows.len()
    );

    StressAssessment {
        subject: subject.to_string(),
        features,
        state,
        score,
        trend: history.trend,
        history: history.windows,
        generated_at: Utc::now(),
    }
}
