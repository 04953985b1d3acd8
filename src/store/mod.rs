//! Recording storage.
//!
//! Recordings are JSON documents in a data directory. This module resolves
//! that directory, finds the document for a subject and decodes it into a
//! [`Recording`](crate::signal::Recording).

pub mod decode;
pub mod error;
pub mod source;

pub use decode::{decode_node, decode_recording};
pub use error::LoadError;
pub use source::{discover_subjects, subject_id, subject_label, DataSource};
