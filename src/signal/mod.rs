//! Signal tree model for the Synheart Barometer.
//!
//! This module contains:
//! - The tagged node types a recording is made of
//! - Uniform sequence access (length, slicing, sampling, plain export)

pub mod access;
pub mod types;

// Re-export commonly used types
pub use access::{IndexRange, SequenceAccess};
pub use types::{numeric_samples, Column, Recording, Sample, Series, SignalNode, Table};
