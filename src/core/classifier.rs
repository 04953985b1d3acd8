//! Threshold-based stress classification.
//!
//! Each feature has a band between its "pleasure" and "stress" thresholds.
//! Leaving the band on the stress side is a stress condition; staying on
//! the calm side for all five features is pleasure; sitting inside every
//! band is neutral.

use crate::core::features::FeatureRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a band indicates stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressSide {
    Above,
    Below,
}

/// Threshold band for one feature. `low <= high` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low: f64,
    pub high: f64,
    pub stress_side: StressSide,
}

impl Band {
    pub fn is_stress(&self, value: f64) -> bool {
        match self.stress_side {
            StressSide::Above => value > self.high,
            StressSide::Below => value < self.low,
        }
    }

    pub fn is_pleasure(&self, value: f64) -> bool {
        match self.stress_side {
            StressSide::Above => value < self.low,
            StressSide::Below => value > self.high,
        }
    }

    pub fn is_neutral(&self, value: f64) -> bool {
        (self.low..=self.high).contains(&value)
    }
}

pub const EDA_BAND: Band = Band {
    low: 0.557787,
    high: 0.761343,
    stress_side: StressSide::Above,
};

pub const HR_BAND: Band = Band {
    low: 59.803059,
    high: 66.870546,
    stress_side: StressSide::Above,
};

pub const HRV_BAND: Band = Band {
    low: 325.906461,
    high: 371.946967,
    stress_side: StressSide::Below,
};

pub const TEMP_BAND: Band = Band {
    low: 31.217497,
    high: 31.238812,
    stress_side: StressSide::Below,
};

pub const ACC_BAND: Band = Band {
    low: 1.011331,
    high: 1.015106,
    stress_side: StressSide::Above,
};

/// Affective state label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLabel {
    Stress,
    Pleasure,
    Neutral,
    Indeterminate,
}

impl StressLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLabel::Stress => "stress",
            StressLabel::Pleasure => "pleasure",
            StressLabel::Neutral => "neutral",
            StressLabel::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for StressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn readings(features: &FeatureRecord) -> [(Band, Option<f64>); 5] {
    [
        (EDA_BAND, features.mean_eda),
        (HR_BAND, features.hr),
        (HRV_BAND, features.hrv),
        (TEMP_BAND, features.temp),
        (ACC_BAND, features.acc_rms),
    ]
}

/// Classify a feature record.
///
/// Stress is checked first and fires on any single known feature, so it
/// wins even when the record would also count as neutral or pleasure.
/// Pleasure and neutral need all five features.
pub fn classify(features: &FeatureRecord) -> StressLabel {
    let readings = readings(features);

    let any = |pred: fn(&Band, f64) -> bool| {
        readings
            .iter()
            .any(|(band, value)| value.is_some_and(|v| pred(band, v)))
    };
    let all = |pred: fn(&Band, f64) -> bool| {
        readings
            .iter()
            .all(|(band, value)| value.is_some_and(|v| pred(band, v)))
    };

    if any(Band::is_stress) {
        StressLabel::Stress
    } else if all(Band::is_pleasure) {
        StressLabel::Pleasure
    } else if all(Band::is_neutral) {
        StressLabel::Neutral
    } else {
        StressLabel::Indeterminate
    }
}

/// Share of known features in a stress condition, as a 0-100 score.
///
/// `None` when no feature is known.
pub fn stress_score(features: &FeatureRecord) -> Option<u8> {
    let known: Vec<bool> = readings(features)
        .iter()
        .filter_map(|(band, value)| value.map(|v| band.is_stress(v)))
        .collect();

    if known.is_empty() {
        return None;
    }

    let satisfied = known.iter().filter(|&&s| s).count();
    Some((100.0 * satisfied as f64 / known.len() as f64).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(eda: f64, hr: f64, hrv: f64, temp: f64, acc: f64) -> FeatureRecord {
        FeatureRecord {
            mean_eda: Some(eda),
            hr: Some(hr),
            hrv: Some(hrv),
            temp: Some(temp),
            acc_rms: Some(acc),
        }
    }

    #[test]
    fn test_classify_stress() {
        let features = record(0.9, 70.0, 300.0, 30.9, 1.02);
        assert_eq!(classify(&features), StressLabel::Stress);
        assert_eq!(stress_score(&features), Some(100));
    }

    #[test]
    fn test_classify_pleasure() {
        let features = record(0.4, 55.0, 380.0, 31.3, 1.0);
        assert_eq!(classify(&features), StressLabel::Pleasure);
        assert_eq!(stress_score(&features), Some(0));
    }

    #[test]
    fn test_classify_neutral() {
        let features = record(0.65, 63.0, 350.0, 31.225, 1.013);
        assert_eq!(classify(&features), StressLabel::Neutral);
        assert_eq!(stress_score(&features), Some(0));
    }

    #[test]
    fn test_band_edges_are_neutral() {
        let low = record(0.557787, 59.803059, 325.906461, 31.217497, 1.011331);
        let high = record(0.761343, 66.870546, 371.946967, 31.238812, 1.015106);
        assert_eq!(classify(&low), StressLabel::Neutral);
        assert_eq!(classify(&high), StressLabel::Neutral);
    }

    #[test]
    fn test_stress_wins_over_neutral() {
        // Four features neutral, heart rate just past the stress threshold.
        let features = record(0.65, 66.9, 350.0, 31.225, 1.013);
        assert_eq!(classify(&features), StressLabel::Stress);
        assert_eq!(stress_score(&features), Some(20));
    }

    #[test]
    fn test_single_known_feature_can_trigger_stress() {
        let features = FeatureRecord {
            mean_eda: Some(0.9),
            ..Default::default()
        };
        assert_eq!(classify(&features), StressLabel::Stress);
        assert_eq!(stress_score(&features), Some(100));
    }

    #[test]
    fn test_partial_calm_record_is_indeterminate() {
        let features = FeatureRecord {
            mean_eda: Some(0.4),
            hr: Some(55.0),
            ..Default::default()
        };
        assert_eq!(classify(&features), StressLabel::Indeterminate);
        assert_eq!(stress_score(&features), Some(0));
    }

    #[test]
    fn test_empty_record() {
        let features = FeatureRecord::default();
        assert_eq!(classify(&features), StressLabel::Indeterminate);
        assert_eq!(stress_score(&features), None);
    }

    #[test]
    fn test_mixed_record_is_indeterminate() {
        // Pleasure on some features, neutral on others, no stress.
        let features = record(0.4, 63.0, 350.0, 31.3, 1.0);
        assert_eq!(classify(&features), StressLabel::Indeterminate);
    }

    #[test]
    fn test_score_rounds_share_of_known_features() {
        let features = FeatureRecord {
            mean_eda: Some(0.9),
            hr: Some(55.0),
            hrv: Some(350.0),
            ..Default::default()
        };
        assert_eq!(stress_score(&features), Some(33));

        let features = FeatureRecord {
            mean_eda: Some(0.9),
            hr: Some(70.0),
            hrv: Some(350.0),
            ..Default::default()
        };
        assert_eq!(stress_score(&features), Some(67));
    }

    #[test]
    fn test_classify_is_total_over_presence_patterns() {
        let full = record(0.65, 63.0, 350.0, 31.225, 1.013);
        for mask in 0u8..32 {
            let pick = |bit: u8, v: Option<f64>| if mask & (1 << bit) != 0 { v } else { None };
            let features = FeatureRecord {
                mean_eda: pick(0, full.mean_eda),
                hr: pick(1, full.hr),
                hrv: pick(2, full.hrv),
                temp: pick(3, full.temp),
                acc_rms: pick(4, full.acc_rms),
            };
            let label = classify(&features);
            if mask == 31 {
                assert_eq!(label, StressLabel::Neutral);
            } else {
                assert_eq!(label, StressLabel::Indeterminate);
            }
            assert_eq!(stress_score(&features).is_none(), mask == 0);
        }
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(
            serde_json::to_string(&StressLabel::Pleasure).unwrap(),
            "\"pleasure\""
        );
        assert_eq!(StressLabel::Indeterminate.to_string(), "indeterminate");
    }
}
