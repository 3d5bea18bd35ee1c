//! doc-chunker: a format-aware document chunking engine for
//! retrieval-augmented generation pipelines.
//!
//! Turns a document (Markdown, HTML, plain text, DOCX, PPTX, XLSX, CSV, or
//! PDF text) into a flat, hierarchy-aware list of typed, token-budgeted
//! chunks. See [`engine`] for the entry points.
//!
//! # Example
//!
//! ```ignore
//! use doc_chunker::{engine, options::ChunkingOptionsBuilder, cancel::CancellationToken};
//!
//! let options = ChunkingOptionsBuilder::new().max_tokens(256).build();
//! let cancel = CancellationToken::new();
//! let result = engine::chunk_file("report.md", &options, &cancel)?;
//! for chunk in &result.chunks {
//!     println!("{:?}", chunk.header.specific_type);
//! }
//! # Ok::<(), doc_chunker::error::ChunkingError>(())
//! ```

pub mod cancel;
pub mod chunkers;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod id;
pub mod model;
pub mod options;
pub mod providers;
pub mod registry;
pub mod result;
pub mod statistics;
pub mod tokenizer;
pub mod validator;

pub use engine::{chunk, chunk_auto, chunk_file};
pub use error::ChunkingError;
pub use options::{ChunkingOptions, ChunkingOptionsBuilder};
pub use result::ChunkingResult;
