//! Synheart Barometer - stress state estimation from physiological recordings.
//!
//! This library reads hierarchical recordings (body locations holding
//! named channels such as EDA, heart rate or accelerometer axes), reduces
//! them to a small feature vector and classifies the subject's state as
//! stress, pleasure, neutral or indeterminate from fixed thresholds.
//!
//! # Guarantees
//!
//! - **Best effort**: missing or non-numeric channels leave a feature empty, they never fail a request
//! - **Bounded payloads**: previews and full exports are capped, oversized exports are marked as truncated
//! - **Read-only**: recordings are never modified and nothing computed is persisted
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Synheart Barometer                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Store    │──▶│  Features   │──▶│ Classifier  │       │
//! │  │   (JSON)    │   │  (matcher)  │   │  (bands)    │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                 ▲                  │              │
//! │         ▼                 │                  ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Summary    │   │  Windowing  │◀──│ Assessment  │       │
//! │  │ (previews)  │   │  (history)  │   │  (+ trend)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use synheart_barometer::{assessment, config::Config, store::DataSource};
//!
//! let source = DataSource::from_config(&Config::default());
//! let recording = source.load_subject("S2").expect("Failed to load recording");
//!
//! let request = assessment::AssessmentRequest { windows: 5, ..Default::default() };
//! let result = assessment::evaluate(&recording, "S2", &request);
//! println!("{} ({:?})", result.state, result.score);
//! ```

pub mod assessment;
pub mod config;
pub mod core;
pub mod inspect;
pub mod signal;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use assessment::{evaluate, AssessmentRequest, StressAssessment};
pub use config::{Config, ConfigError};
pub use core::{classify, extract_features, stress_score, FeatureRecord, StressLabel, Trend};
pub use inspect::{inspect, InspectRequest, ParamSelection, ParticipantInfo};
pub use signal::{IndexRange, Recording, Sample, SignalNode};
pub use store::{DataSource, LoadError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
