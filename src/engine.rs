//! Engine Entry Point (spec §4.4): the one public surface that turns bytes
//! plus [`ChunkingOptions`] into a [`ChunkingResult`]. Wires the Chunker
//! Registry, a Format Chunker, the Hierarchy Builder, the optional Chunk
//! Validator, and Statistics together, and is the single place that catches a
//! chunker's faults and folds them into warnings instead of propagating them.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use tracing::{instrument, warn};

use crate::cancel::CancellationToken;
use crate::chunkers::ChunkerContext;
use crate::error::ChunkingError;
use crate::hierarchy::build_hierarchy;
use crate::id::IdGenerator;
use crate::model::{Chunk, DocumentType};
use crate::options::ChunkingOptions;
use crate::registry::ChunkerRegistry;
use crate::result::{ChunkingResult, ChunkingWarning};
use crate::statistics::compute_statistics;
use crate::tokenizer::{build_counter_or_fallback, TokenCounter};
use crate::validator::{self, ValidationOptions};

/// Chunk an already-materialized document whose format is known (spec §4.4
/// `chunk`).
#[instrument(skip(stream, options, cancel), fields(document_type = ?document_type))]
pub fn chunk(
    mut stream: impl Read,
    document_type: DocumentType,
    options: &ChunkingOptions,
    cancel: &CancellationToken,
) -> Result<ChunkingResult, ChunkingError> {
    let started = Instant::now();
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;

    let registry = ChunkerRegistry::new();
    let format_chunker = registry.resolve(document_type).ok_or_else(|| {
        ChunkingError::UnsupportedFormat(format!("no chunker registered for {document_type:?}"))
    })?;

    Ok(run_chunker(format_chunker, &bytes, options, cancel, started))
}

/// Chunk an already-materialized document whose format is not known up
/// front, resolving it first by `file_name_hint`'s extension and falling back
/// to content sniffing (spec §4.5 "by file-name hint, else by content
/// sniffing").
#[instrument(skip(stream, options, cancel), fields(file_name_hint = ?file_name_hint))]
pub fn chunk_auto(
    mut stream: impl Read,
    file_name_hint: Option<&str>,
    options: &ChunkingOptions,
    cancel: &CancellationToken,
) -> Result<ChunkingResult, ChunkingError> {
    let started = Instant::now();
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;

    let registry = ChunkerRegistry::new();
    let by_extension = file_name_hint.and_then(|name| registry.resolve_by_extension(name));
    let format_chunker = match by_extension {
        Some(chunker) => chunker,
        None => registry.resolve_by_sniffing(&bytes)?,
    };

    Ok(run_chunker(format_chunker, &bytes, options, cancel, started))
}

/// Chunk a file on disk, using its extension as the format hint (spec §4.4
/// `chunk_file`, a convenience wrapper over [`chunk_auto`]).
pub fn chunk_file(
    path: impl AsRef<Path>,
    options: &ChunkingOptions,
    cancel: &CancellationToken,
) -> Result<ChunkingResult, ChunkingError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    chunk_auto(file, file_name, options, cancel)
}

/// The shared tail of every entry point: build a token counter, run the
/// chosen [`crate::chunkers::FormatChunker`], then the Hierarchy Builder,
/// optional Validator, and Statistics. A chunker `Err` never reaches the
/// caller here — it's folded into an Error-level warning and the run still
/// returns `Ok` with `success = false` (spec §4.4 "the engine catches, wraps
/// into a warning ... returns a result with success = false, empty chunks").
fn run_chunker(
    format_chunker: &dyn crate::chunkers::FormatChunker,
    bytes: &[u8],
    options: &ChunkingOptions,
    cancel: &CancellationToken,
    started: Instant,
) -> ChunkingResult {
    let (fallback_counter, fell_back) = match &options.token_counter {
        Some(_) => (None, false),
        None => {
            let (counter, fell_back) = build_counter_or_fallback(options.token_counting_method);
            (Some(counter), fell_back)
        }
    };
    let counter: &dyn TokenCounter = match (&options.token_counter, &fallback_counter) {
        (Some(counter), _) => counter.as_ref(),
        (None, Some(counter)) => counter.as_ref(),
        (None, None) => unreachable!("one of the two counter sources is always populated"),
    };

    let mut warnings = Vec::new();
    if fell_back {
        warnings.push(ChunkingWarning::warning(format!(
            "requested encoding {} was unavailable; counted tokens with {} instead",
            options.token_counting_method,
            counter.encoding()
        )));
    }

    let mut ids = match &options.id_seed {
        Some(seed) => IdGenerator::seeded(seed.clone()),
        None => IdGenerator::random(),
    };

    let chunks = {
        let mut ctx = ChunkerContext {
            options,
            counter,
            ids: &mut ids,
            cancel,
            warnings: &mut warnings,
        };
        format_chunker.chunk(bytes, &mut ctx)
    };

    let chunks = match chunks {
        Ok(chunks) => chunks,
        Err(err) => {
            warn!(error = %err, "format chunker failed");
            warnings.push(ChunkingWarning::error(err.to_string()));
            let statistics = compute_statistics(&[], started.elapsed());
            return ChunkingResult::success_from_warnings(Vec::new(), statistics, warnings, None);
        }
    };

    finish(chunks, warnings, options, started)
}

/// Hierarchy resolution, optional validation, and statistics — split out from
/// [`run_chunker`] so both [`chunk`]/[`chunk_auto`] and any future streaming
/// entry point share the exact same tail.
fn finish(
    chunks: Vec<Chunk>,
    mut warnings: Vec<ChunkingWarning>,
    options: &ChunkingOptions,
    started: Instant,
) -> ChunkingResult {
    let report = match build_hierarchy(chunks) {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "hierarchy builder failed");
            warnings.push(ChunkingWarning::error(err.to_string()));
            let statistics = compute_statistics(&[], started.elapsed());
            return ChunkingResult::success_from_warnings(Vec::new(), statistics, warnings, None);
        }
    };
    for issue in report.issues {
        warnings.push(ChunkingWarning::warning(issue.message).with_chunk(issue.chunk_id));
    }

    let validation = if options.validate_chunks {
        let validation_options = ValidationOptions {
            max_tokens: options.max_tokens,
            oversize_tolerance: options.oversize_tolerance,
            min_tokens: options.min_tokens,
        };
        Some(validator::validate(&report.chunks, validation_options))
    } else {
        None
    };

    let statistics = compute_statistics(&report.chunks, started.elapsed());
    ChunkingResult::success_from_warnings(report.chunks, statistics, warnings, validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ChunkingOptionsBuilder;

    #[test]
    fn chunk_auto_resolves_markdown_by_extension() {
        let options = ChunkingOptionsBuilder::new().build();
        let cancel = CancellationToken::new();
        let text = "# Title\n\nSome body text.\n";
        let result = chunk_auto(text.as_bytes(), Some("doc.md"), &options, &cancel).unwrap();
        assert!(result.success);
        assert!(!result.chunks.is_empty());
    }

    #[test]
    fn chunk_auto_falls_back_to_sniffing_without_a_hint() {
        let options = ChunkingOptionsBuilder::new().build();
        let cancel = CancellationToken::new();
        let text = "just some ordinary prose with no markup at all.\n";
        let result = chunk_auto(text.as_bytes(), None, &options, &cancel).unwrap();
        assert!(result.success);
        assert_eq!(result.statistics.total_chunks, result.chunks.len());
    }

    #[test]
    fn chunk_with_explicit_document_type_bypasses_detection() {
        let options = ChunkingOptionsBuilder::new().build();
        let cancel = CancellationToken::new();
        let text = "a,b,c\n1,2,3\n";
        let result = chunk(text.as_bytes(), DocumentType::Csv, &options, &cancel).unwrap();
        assert!(result.success);
    }

    #[test]
    fn unsupported_extension_falls_back_to_sniffing_rather_than_failing() {
        let options = ChunkingOptionsBuilder::new().build();
        let cancel = CancellationToken::new();
        let text = "# Heading\n\nBody.\n";
        // ".xyz" has no registered extension mapping, so this exercises the
        // content-sniffing path even though a (useless) hint was supplied.
        let result = chunk_auto(text.as_bytes(), Some("doc.xyz"), &options, &cancel).unwrap();
        assert!(result.success);
    }
}
