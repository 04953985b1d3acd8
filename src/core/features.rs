//! Feature extraction from signal trees.
//!
//! This module walks a recording, recognises channels by name and reduces
//! them to the five physiological features the stress classifier consumes.
//! Missing or unusable channels leave their feature empty; extraction never
//! fails.

use crate::core::matcher::{match_channel, match_column, ChannelCategory};
use crate::signal::{numeric_samples, Sample, SignalNode};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Feature vector for one recording or window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Mean electrodermal activity (microsiemens)
    pub mean_eda: Option<f64>,
    /// Mean heart rate (bpm)
    pub hr: Option<f64>,
    /// Heart rate variability (ms); SDNN of RR intervals when only those exist
    pub hrv: Option<f64>,
    /// Mean skin temperature (°C)
    pub temp: Option<f64>,
    /// Accelerometer root-mean-square magnitude
    pub acc_rms: Option<f64>,
}

impl FeatureRecord {
    /// Whether no feature could be computed at all.
    pub fn is_empty(&self) -> bool {
        self.mean_eda.is_none()
            && self.hr.is_none()
            && self.hrv.is_none()
            && self.temp.is_none()
            && self.acc_rms.is_none()
    }
}

/// First channel found per category, in traversal order.
#[derive(Debug, Default)]
struct ChannelHits<'a> {
    eda: Option<&'a [Sample]>,
    hr: Option<&'a [Sample]>,
    hrv: Option<&'a [Sample]>,
    rr: Option<&'a [Sample]>,
    temp: Option<&'a [Sample]>,
    acc: Option<&'a [Sample]>,
    axes: [Option<&'a [Sample]>; 3],
}

impl<'a> ChannelHits<'a> {
    fn offer(&mut self, category: ChannelCategory, samples: &'a [Sample]) {
        let slot = match category {
            ChannelCategory::Eda => &mut self.eda,
            ChannelCategory::Hr => &mut self.hr,
            ChannelCategory::Hrv => &mut self.hrv,
            ChannelCategory::Rr => &mut self.rr,
            ChannelCategory::Temp => &mut self.temp,
            ChannelCategory::Acc(None) => &mut self.acc,
            ChannelCategory::Acc(Some(axis)) => &mut self.axes[axis.index()],
        };
        // First match wins; later channels of the same category are ignored.
        if slot.is_none() {
            *slot = Some(samples);
        }
    }

    fn into_record(self) -> FeatureRecord {
        let hrv = match (self.hrv, self.rr) {
            (Some(hrv), _) => mean(&numeric_samples(hrv)),
            (None, Some(rr)) => sample_std_dev(&numeric_samples(rr)),
            (None, None) => None,
        };

        let axes: Vec<&[Sample]> = self.axes.iter().flatten().copied().collect();
        let acc_rms = if axes.len() >= 2 {
            axis_rms(&axes)
        } else if let Some(combined) = self.acc {
            rms(&numeric_samples(combined))
        } else {
            // A lone axis is read as a combined channel.
            axes.first().and_then(|axis| rms(&numeric_samples(axis)))
        };

        FeatureRecord {
            mean_eda: self.eda.and_then(|s| mean(&numeric_samples(s))),
            hr: self.hr.and_then(|s| mean(&numeric_samples(s))),
            hrv,
            temp: self.temp.and_then(|s| mean(&numeric_samples(s))),
            acc_rms,
        }
    }
}

/// Compute the feature record of a signal tree.
///
/// Containers are walked depth-first with children in key order, building a
/// slash-joined path that is matched at every leaf; table leaves contribute
/// each column as its own candidate. A table at the root is treated as a flat
/// feature table and matched by exact column name instead.
pub fn extract_features(node: &SignalNode) -> FeatureRecord {
    let mut hits = ChannelHits::default();

    match node {
        SignalNode::Table(table) => {
            for column in &table.columns {
                if let Some(category) = match_column(&column.name) {
                    hits.offer(category, &column.values);
                }
            }
        }
        _ => collect_channels(node, "", &mut hits),
    }

    hits.into_record()
}

fn collect_channels<'a>(node: &'a SignalNode, path: &str, hits: &mut ChannelHits<'a>) {
    match node {
        SignalNode::Container(children) => {
            for (name, child) in children {
                collect_channels(child, &join_path(path, name), hits);
            }
        }
        SignalNode::Table(table) => {
            for column in &table.columns {
                if let Some(category) = match_channel(&join_path(path, &column.name)) {
                    hits.offer(category, &column.values);
                }
            }
        }
        SignalNode::Series(series) => {
            if let Some(category) = match_channel(path) {
                hits.offer(category, &series.values);
            }
        }
        SignalNode::Scalar(sample) => {
            if let Some(category) = match_channel(path) {
                hits.offer(category, std::slice::from_ref(sample));
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().mean())
}

/// Bessel-corrected standard deviation; needs at least two samples.
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    (values.len() >= 2).then(|| values.iter().std_dev())
}

fn rms(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().quadratic_mean())
}

/// Mean over time of the per-sample RMS across axes.
///
/// Samples are aligned by index up to the shortest axis. An axis with a
/// non-numeric sample at some index simply sits that index out.
fn axis_rms(axes: &[&[Sample]]) -> Option<f64> {
    let len = axes.iter().map(|axis| axis.len()).min()?;
    let per_sample: Vec<f64> = (0..len)
        .filter_map(|i| {
            let present: Vec<f64> = axes.iter().filter_map(|axis| axis[i].as_f64()).collect();
            rms(&present)
        })
        .collect();
    mean(&per_sample)
}
