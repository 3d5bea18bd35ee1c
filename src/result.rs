//! The outcome of a chunking run (spec §3.6, §4.4, §7).

use crate::id::ChunkId;
use crate::model::Chunk;
use crate::statistics::Statistics;
use crate::validator::ValidationResult;

/// Severity of a [`ChunkingWarning`] (spec §7 taxonomy policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal deviation surfaced to the caller instead of a thrown error
/// (spec §7 "every fault is surfaced as a ChunkingWarning").
#[derive(Debug, Clone)]
pub struct ChunkingWarning {
    pub level: WarningLevel,
    pub message: String,
    pub chunk_id: Option<ChunkId>,
}

impl ChunkingWarning {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Error,
            message: message.into(),
            chunk_id: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Warning,
            message: message.into(),
            chunk_id: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Info,
            message: message.into(),
            chunk_id: None,
        }
    }

    pub fn with_chunk(mut self, chunk_id: ChunkId) -> Self {
        self.chunk_id = Some(chunk_id);
        self
    }

    /// A `CANCELLED` warning (spec §5 "Cancellation").
    pub fn cancelled() -> Self {
        Self::error("operation cancelled")
    }
}

/// The full outcome of a single [`crate::engine`] call.
#[derive(Debug, Clone)]
pub struct ChunkingResult {
    pub chunks: Vec<Chunk>,
    pub statistics: Statistics,
    pub warnings: Vec<ChunkingWarning>,
    pub validation: Option<ValidationResult>,
    pub success: bool,
}

impl ChunkingResult {
    /// `success = true` iff there are zero Error-level warnings (spec §7
    /// "success = true requires zero Error-level warnings").
    pub fn success_from_warnings(
        chunks: Vec<Chunk>,
        statistics: Statistics,
        warnings: Vec<ChunkingWarning>,
        validation: Option<ValidationResult>,
    ) -> Self {
        let success = !warnings.iter().any(|w| w.level == WarningLevel::Error);
        Self {
            chunks,
            statistics,
            warnings,
            validation,
            success,
        }
    }

    /// An empty, failed result (spec §4.4 "the engine catches, wraps into a
    /// warning ... returns a result with success = false, empty chunks").
    pub fn failed(statistics: Statistics, warning: ChunkingWarning) -> Self {
        Self {
            chunks: Vec::new(),
            statistics,
            warnings: vec![warning],
            validation: None,
            success: false,
        }
    }
}
