use serde::{Deserialize, Serialize};
use voynich_transcript::{Section, TranscriptionRecord};

/// An analysis unit: a bounded group of records sharing one grouping key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Grouping key: folio id for transcription chunks, language name for
    /// corpus chunks
    pub page: String,

    /// Per-record descriptors, in record order
    pub metadata: Vec<ChunkMeta>,

    /// Space-joined concatenation of the constituent records' text
    pub text: String,
}

/// Descriptor of one record inside a chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkMeta {
    /// A transcription row
    Row {
        page: String,
        paragraph: String,
        row: String,
        section: Section,
    },

    /// A reference-corpus sub-record; `section` numbers the piece of a
    /// character-budget split, starting at "1"
    Corpus {
        language: String,
        source: String,
        row: String,
        section: String,
    },
}

impl ChunkMeta {
    pub(crate) fn from_record(rec: &TranscriptionRecord) -> Self {
        Self::Row {
            page: rec.page.clone(),
            paragraph: rec.paragraph.clone(),
            row: rec.row.clone(),
            section: rec.section,
        }
    }
}

impl Chunk {
    /// Number of records in this chunk
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// Check if the chunk holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}
