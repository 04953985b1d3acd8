//! Core engines of the Synheart Barometer.
//!
//! This module contains:
//! - Channel name matching into feature categories
//! - Feature extraction from signal trees
//! - Threshold-based stress classification and scoring
//! - Windowed stress history with trend detection
//! - Bounded summaries for data inspection

pub mod classifier;
pub mod features;
pub mod matcher;
pub mod summary;
pub mod windowing;

// Re-export commonly used types
pub use classifier::{classify, stress_score, StressLabel};
pub use features::{extract_features, FeatureRecord};
pub use matcher::{match_channel, match_column, Axis, ChannelCategory};
pub use summary::{summarize, Summary, SummaryView, DEFAULT_SAMPLE_SIZE, MAX_FULL_IN_SUMMARY};
pub use windowing::{
    history, history_with_overall, total_length, HistoryResult, ScoredWindow, Trend,
    DEFAULT_WINDOW_SIZE,
};
