//! # Voynich Chunker
//!
//! Groups structured records into bounded analysis units ("chunks").
//!
//! Two modes share one output shape:
//! - transcription mode windows parsed manuscript rows within each folio;
//! - corpus mode takes flat `(language, source, text)` records, hard-cuts
//!   oversized texts at a character budget into numbered sections, then
//!   windows within each language.
//!
//! A chunk never mixes two grouping keys, and chunking the same input
//! with the same configuration is exactly reproducible.

mod chunker;
mod config;
mod corpus;
mod error;
mod store;
mod types;

pub use chunker::chunk_records;
pub use config::ChunkConfig;
pub use corpus::{
    chunk_corpus, lines_to_records, read_corpus_jsonl, split_text_sections, write_corpus_jsonl,
    CorpusRecord,
};
pub use error::{ChunkerError, Result};
pub use store::ChunkStore;
pub use types::{Chunk, ChunkMeta};
