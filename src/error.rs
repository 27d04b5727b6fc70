// src/error.rs

use thiserror::Error;

/// Errors raised while reconstructing or merging taxonomy trees.
///
/// Parse-level problems (a header, a comment, a non-numeric count field)
/// are not errors: those lines are skipped and counted. This enum covers
/// the structural cases where the rest of a source cannot be trusted.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indentation depth increased by more than one level, so the record
    /// has no attachable parent. Fatal for the source being read.
    #[error(
        "line {line}: depth jumps from {cursor_depth} to {depth} (taxid {taxid}); \
         report indentation is malformed"
    )]
    DepthJump {
        line: usize,
        taxid: u32,
        depth: usize,
        cursor_depth: usize,
    },

    /// A depth > 0 record arrived before any root line established depth 0.
    #[error("line {line}: record at depth {depth} (taxid {taxid}) before any root record")]
    MissingRoot {
        line: usize,
        taxid: u32,
        depth: usize,
    },

    /// A source contributed no usable data records at all.
    #[error("{path}: no data records found")]
    EmptySource { path: String },
}
