//! # Voynich Transcript
//!
//! Parser for line-oriented manuscript transcription files.
//!
//! The input format carries two kinds of lines this crate cares about:
//! folio/section declarations (`<f1r> {$I=H ...`) and transcription rows
//! (`<f1r.P1.1;H> fachys.ykal...`). Parsing is two-pass: the first pass
//! builds the folio -> section mapping, the second extracts the rows for
//! one transcriber tag, cleans the text and tokenizes it.
//!
//! Malformed rows are tolerated and skipped; only a missing input file is
//! fatal.

mod error;
mod parser;
mod record;

pub use error::{Result, TranscriptError};
pub use parser::{build_section_map, parse_file, parse_records, SectionMap};
pub use record::{Section, SectionVocabulary, TranscriptionRecord};
