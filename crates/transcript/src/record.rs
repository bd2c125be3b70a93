use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thematic classification of a folio, drawn from a closed vocabulary.
///
/// Distinct from the "section" field on corpus sub-records, which numbers
/// the pieces of a character-budget split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Section {
    Herbal,
    Astronomical,
    Zodiac,
    Biological,
    Cosmological,
    Pharmaceutical,
    Stars,
    Text,
    #[default]
    Unknown,
}

impl Section {
    /// Get human-readable label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Herbal => "Herbal",
            Self::Astronomical => "Astronomical",
            Self::Zodiac => "Zodiac",
            Self::Biological => "Biological",
            Self::Cosmological => "Cosmological",
            Self::Pharmaceutical => "Pharmaceutical",
            Self::Stars => "Stars",
            Self::Text => "Text",
            Self::Unknown => "Unknown",
        }
    }
}

/// Mapping from single-letter section codes to section labels.
///
/// Passed explicitly into the parser rather than living in module-level
/// state, so alternate transcription schemes can supply their own table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionVocabulary {
    codes: BTreeMap<char, Section>,
}

impl Default for SectionVocabulary {
    fn default() -> Self {
        let codes = BTreeMap::from([
            ('T', Section::Text),
            ('H', Section::Herbal),
            ('A', Section::Astronomical),
            ('Z', Section::Zodiac),
            ('B', Section::Biological),
            ('C', Section::Cosmological),
            ('P', Section::Pharmaceutical),
            ('S', Section::Stars),
        ]);
        Self { codes }
    }
}

impl SectionVocabulary {
    /// Classify a section code; unrecognized codes map to `Unknown`
    #[must_use]
    pub fn classify(&self, code: char) -> Section {
        self.codes.get(&code).copied().unwrap_or_default()
    }
}

/// One transcribed manuscript row, immutable once parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    /// Folio identifier (e.g. "f1r")
    pub page: String,

    /// Paragraph identifier within the folio (e.g. "P2")
    pub paragraph: String,

    /// Row number within the paragraph
    pub row: String,

    /// Transcriber/variant tag this row was read from
    pub transcriber: String,

    /// Section label of the folio, `Unknown` when undeclared
    pub section: Section,

    /// Cleaned whitespace-joined text
    pub raw: String,

    /// Normalized word tokens, trailing `-`/`?` stripped
    pub tokens: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_classifies_known_codes() {
        let vocab = SectionVocabulary::default();
        assert_eq!(vocab.classify('H'), Section::Herbal);
        assert_eq!(vocab.classify('A'), Section::Astronomical);
        assert_eq!(vocab.classify('Z'), Section::Zodiac);
        assert_eq!(vocab.classify('S'), Section::Stars);
    }

    #[test]
    fn test_unrecognized_code_maps_to_unknown() {
        let vocab = SectionVocabulary::default();
        assert_eq!(vocab.classify('X'), Section::Unknown);
        assert_eq!(vocab.classify('h'), Section::Unknown);
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(Section::Herbal.as_str(), "Herbal");
        assert_eq!(Section::Unknown.as_str(), "Unknown");
    }
}
