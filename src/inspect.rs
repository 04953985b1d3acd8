//! Participant inspection.
//!
//! Builds bounded previews of a recording: every channel per body location,
//! a label sample and a short look at the remaining metadata. Callers may
//! restrict the output to named channels and give each its own sample size.

use crate::core::{summarize, Summary, SummaryView, DEFAULT_SAMPLE_SIZE, MAX_FULL_IN_SUMMARY};
use crate::signal::{IndexRange, Recording, SignalNode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Sample size of metadata previews.
pub const METADATA_PREVIEW_SIZE: usize = 5;

/// Key used when the signal is not grouped by location.
const WHOLE_SIGNAL_KEY: &str = "signal_container";

/// One requested channel name with an optional sample size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamRequest {
    /// Lower-cased channel name
    pub name: String,
    pub count: Option<usize>,
}

/// Allow-list of channel names, e.g. `TEMP:5,EDA`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSelection {
    requests: Vec<ParamRequest>,
}

impl ParamSelection {
    /// Parse a comma-separated list of `name` or `name:count` entries.
    ///
    /// Names compare case-insensitively. A count that is not a number falls
    /// back to the request's default sample size. A repeated name keeps its
    /// first position and its last count.
    pub fn parse(spec: &str) -> Self {
        let mut selection = Self::default();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, count) = match part.split_once(':') {
                Some((name, count)) => (name, count.trim().parse::<usize>().ok()),
                None => (part, None),
            };
            let name = name.trim().to_lowercase();

            match selection.requests.iter_mut().find(|r| r.name == name) {
                Some(existing) => existing.count = count,
                None => selection.requests.push(ParamRequest { name, count }),
            }
        }
        selection
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// The request for a channel, if it was asked for.
    pub fn get(&self, name: &str) -> Option<&ParamRequest> {
        let name = name.to_lowercase();
        self.requests.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|r| r.name.as_str())
    }
}

/// Parameters of an inspection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectRequest {
    /// Preview sample size
    pub n: usize,
    /// Export full data (capped) instead of a preview
    pub full: bool,
    pub range: Option<IndexRange>,
    /// Only report these channels; `None` reports everything
    pub params: Option<ParamSelection>,
}

impl Default for InspectRequest {
    fn default() -> Self {
        Self {
            n: DEFAULT_SAMPLE_SIZE,
            full: false,
            range: None,
            params: None,
        }
    }
}

/// Summaries under one top-level signal key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalView {
    /// A body location with its channels
    Location(BTreeMap<String, Summary>),
    /// A top-level channel not grouped by location
    Channel(Summary),
}

/// Short description of a metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataPreview {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub preview: Vec<Value>,
}

/// Result of an inspection query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantInfo {
    pub subject: String,
    pub available_signals: BTreeMap<String, SignalView>,
    pub labels_sample: Vec<Value>,
    pub metadata_preview: BTreeMap<String, MetadataPreview>,
    /// Requested channels that were not found, in request order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_params: Vec<String>,
}

/// Inspect a recording.
///
/// `fallback_subject` names the participant when the recording carries no
/// subject of its own.
pub fn inspect(recording: &Recording, fallback_subject: &str, request: &InspectRequest) -> ParticipantInfo {
    let params = request.params.as_ref().filter(|p| !p.is_empty());
    let mut found: Vec<String> = Vec::new();

    let summary_for = |node: &SignalNode, name: &str, found: &mut Vec<String>| -> Option<Summary> {
        let n = match params {
            Some(params) => params.get(name)?.count.unwrap_or(request.n),
            None => request.n,
        };
        found.push(name.to_lowercase());
        Some(summarize(node, n, request.full, request.range, MAX_FULL_IN_SUMMARY))
    };

    let mut available_signals = BTreeMap::new();
    match &recording.signal {
        SignalNode::Container(locations) => {
            for (location, node) in locations {
                let view = match node {
                    SignalNode::Container(channels) => {
                        let summaries: BTreeMap<String, Summary> = channels
                            .iter()
                            .filter_map(|(channel, child)| {
                                summary_for(child, channel, &mut found).map(|s| (channel.clone(), s))
                            })
                            .collect();
                        if summaries.is_empty() && params.is_some() {
                            continue;
                        }
                        SignalView::Location(summaries)
                    }
                    leaf => match summary_for(leaf, location, &mut found) {
                        Some(summary) => SignalView::Channel(summary),
                        None => continue,
                    },
                };
                available_signals.insert(location.clone(), view);
            }
        }
        other if params.is_none() => {
            available_signals.insert(
                WHOLE_SIGNAL_KEY.to_string(),
                SignalView::Channel(summarize(other, request.n, request.full, request.range, MAX_FULL_IN_SUMMARY)),
            );
        }
        _ => {}
    }

    let missing_params = params
        .map(|p| {
            p.names()
                .filter(|name| !found.iter().any(|f| f == name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ParticipantInfo {
        subject: recording
            .subject
            .clone()
            .unwrap_or_else(|| fallback_subject.to_string()),
        available_signals,
        labels_sample: recording
            .label
            .as_ref()
            .map(|label| preview(label, request.n))
            .unwrap_or_default(),
        metadata_preview: recording
            .extra
            .iter()
            .map(|(key, node)| {
                (
                    key.clone(),
                    MetadataPreview {
                        kind: node.kind(),
                        preview: preview(node, METADATA_PREVIEW_SIZE),
                    },
                )
            })
            .collect(),
        missing_params,
    }
}

fn preview(node: &SignalNode, n: usize) -> Vec<Value> {
    match summarize(node, n, false, None, MAX_FULL_IN_SUMMARY).view {
        SummaryView::Preview { sample, .. } => sample,
        SummaryView::Full { data, .. } => data,
    }
}
