//! Channel name matching.
//!
//! Recordings carry no schema, so feature categories are recognised from
//! channel paths: the slash-joined container names down to a leaf, plus the
//! column name for table leaves. The rules are an ordered table; the first
//! rule that fires decides the category, so a leaf maps to at most one.

use regex::Regex;
use std::sync::OnceLock;

/// Accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Feature category a channel contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCategory {
    /// Electrodermal activity
    Eda,
    /// Heart rate
    Hr,
    /// Heart rate variability
    Hrv,
    /// RR intervals, used to approximate HRV when no HRV channel exists
    Rr,
    /// Skin temperature
    Temp,
    /// Accelerometer; `None` for a single pre-combined channel
    Acc(Option<Axis>),
}

/// One entry of the rule table.
pub struct MatchRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<ChannelCategory>,
}

/// Rules in priority order. Paths are lower-cased before evaluation.
pub const RULES: [MatchRule; 6] = [
    MatchRule {
        name: "eda",
        apply: match_eda,
    },
    MatchRule {
        name: "hr",
        apply: match_hr,
    },
    MatchRule {
        name: "hrv",
        apply: match_hrv,
    },
    MatchRule {
        name: "rr",
        apply: match_rr,
    },
    MatchRule {
        name: "temp",
        apply: match_temp,
    },
    MatchRule {
        name: "acc",
        apply: match_acc,
    },
];

fn match_eda(path: &str) -> Option<ChannelCategory> {
    path.contains("eda").then_some(ChannelCategory::Eda)
}

fn match_hr(path: &str) -> Option<ChannelCategory> {
    hr_pattern().is_match(path).then_some(ChannelCategory::Hr)
}

fn match_hrv(path: &str) -> Option<ChannelCategory> {
    path.contains("hrv").then_some(ChannelCategory::Hrv)
}

fn match_rr(path: &str) -> Option<ChannelCategory> {
    rr_pattern().is_match(path).then_some(ChannelCategory::Rr)
}

fn match_temp(path: &str) -> Option<ChannelCategory> {
    path.contains("temp").then_some(ChannelCategory::Temp)
}

fn match_acc(path: &str) -> Option<ChannelCategory> {
    path.contains("acc").then(|| ChannelCategory::Acc(axis_of(path)))
}

// "hr" as a whole segment or after a separator, never the start of "hrv".
fn hr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?:^|[/:])hr(?:[^v]|$)").expect("valid hr pattern"))
}

fn rr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|[^a-z0-9])rr(?:[^a-z0-9]|$)").expect("valid rr pattern")
    })
}

fn axis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"acc[^a-z0-9]?([xyz])").expect("valid axis pattern"))
}

/// Axis named by the path, taking the match closest to the leaf.
fn axis_of(path: &str) -> Option<Axis> {
    axis_pattern()
        .captures_iter(path)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| Axis::from_letter(m.as_str()))
}

/// Classify a slash-joined channel path.
pub fn match_channel(path: &str) -> Option<ChannelCategory> {
    let path = path.to_lowercase();
    RULES.iter().find_map(|rule| (rule.apply)(&path))
}

/// Classify a column of a top-level table by its exact name.
///
/// Tables at the root are already flat, so only the canonical column names
/// count: `eda`, `hr`, `hrv`, `rr`, `temp`, and anything starting with `acc`.
pub fn match_column(name: &str) -> Option<ChannelCategory> {
    let name = name.to_lowercase();
    match name.as_str() {
        "eda" => Some(ChannelCategory::Eda),
        "hr" => Some(ChannelCategory::Hr),
        "hrv" => Some(ChannelCategory::Hrv),
        "rr" => Some(ChannelCategory::Rr),
        "temp" => Some(ChannelCategory::Temp),
        n if n.starts_with("acc") => Some(ChannelCategory::Acc(axis_of(n))),
        _ => None,
    }
}
