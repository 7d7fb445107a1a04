//! Handle to a disk-backed result set

use serde::{Deserialize, Serialize};

/// Identifies a streamed result: where its parts live and how many exist.
///
/// Immutable once created. The directory belongs to the transport; holders
/// of an index only read through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamIndex {
    directory: String,
    part_count: usize,
}

impl StreamIndex {
    /// Creates a new stream index
    pub fn new(directory: impl Into<String>, part_count: usize) -> Self {
        Self {
            directory: directory.into(),
            part_count,
        }
    }

    /// Location of the parts, opaque outside the transport
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Total number of addressable parts (equals the record count)
    pub fn part_count(&self) -> usize {
        self.part_count
    }
}
