//! Indicator Lexicon
//!
//! Parses the predicate-trigger rule file into indicator records and
//! annotates harmonized sentences with them. The rule file is XML; every
//! record declares a surface string, a lexeme shape (single lemma+POS, an
//! ordered multiword sequence, or a two-part gapped sequence), and one or
//! more senses. Parsing is strict: a malformed record is fatal at load time,
//! never at document time.
//!
//! Matching preference is gapped > multiword > single when several shapes
//! could apply to the same word. Multiword matching is not implemented; the
//! affected rules are counted and reported at load so the gap is visible.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use relex_core::{RelexError, Result};

use crate::harmonizer::{Sentence, Word};

/// Index of an [`Indicator`] in its lexicon.
pub type IndicatorId = usize;

/// Lexeme shape of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeType {
    Single,
    Multiword,
    Gapped,
}

/// One lemma+POS element of an indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub lemma: String,
    pub pos: String,
}

/// One sense of an indicator: the candidate relation category plus its
/// argument cue constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sense {
    pub category: String,
    /// `"object_cue"` or `"object_cue-subject_cue"`; `None` when the sense
    /// requires cue-less arguments
    pub cue: Option<String>,
    pub inverse: bool,
    pub negated: bool,
}

/// A parsed predicate trigger. Immutable once parsed; shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub string: String,
    pub lexeme_type: LexemeType,
    pub lexemes: Vec<Lexeme>,
    pub senses: Vec<Sense>,
    pub verified: bool,
    pub gap_type: String,
}

// ============================================================================
// Rule file records
// ============================================================================

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(rename = "SRIndicator", default)]
    indicators: Vec<RuleRecord>,
}

#[derive(Debug, Deserialize)]
struct RuleRecord {
    #[serde(rename = "@string")]
    string: String,
    #[serde(rename = "@gapType", default)]
    gap_type: String,
    #[serde(rename = "@verified")]
    verified: String,
    #[serde(rename = "Lexeme", default)]
    lexemes: Vec<LexemeRecord>,
    #[serde(rename = "GappedLexeme")]
    gapped: Option<GappedRecord>,
    #[serde(rename = "SemInfo", default)]
    senses: Vec<SenseRecord>,
}

#[derive(Debug, Deserialize)]
struct LexemeRecord {
    #[serde(rename = "@lemma")]
    lemma: String,
    #[serde(rename = "@pos")]
    pos: String,
}

#[derive(Debug, Deserialize)]
struct GappedRecord {
    #[serde(rename = "Part", default)]
    parts: Vec<PartRecord>,
}

#[derive(Debug, Deserialize)]
struct PartRecord {
    #[serde(rename = "Lexeme", default)]
    lexemes: Vec<LexemeRecord>,
}

#[derive(Debug, Deserialize)]
struct SenseRecord {
    #[serde(rename = "@category")]
    category: String,
    #[serde(rename = "@cue", default)]
    cue: String,
    #[serde(rename = "@inverse")]
    inverse: String,
    #[serde(rename = "@negated")]
    negated: String,
}

fn parse_flag(value: &str, field: &str, indicator: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(RelexError::Indicator(format!(
            "indicator '{indicator}': {field} must be true or false, got '{other}'"
        ))),
    }
}

impl RuleRecord {
    fn into_indicator(self) -> Result<Indicator> {
        let verified = parse_flag(&self.verified, "verified", &self.string)?;

        let (lexeme_type, lexemes) = if !self.lexemes.is_empty() {
            let shape = if self.lexemes.len() == 1 {
                LexemeType::Single
            } else {
                LexemeType::Multiword
            };
            (shape, self.lexemes)
        } else if let Some(gapped) = self.gapped {
            let lexemes: Vec<LexemeRecord> =
                gapped.parts.into_iter().flat_map(|p| p.lexemes).collect();
            if lexemes.len() < 2 {
                return Err(RelexError::Indicator(format!(
                    "indicator '{}': gapped lexeme needs two parts",
                    self.string
                )));
            }
            (LexemeType::Gapped, lexemes)
        } else {
            return Err(RelexError::Indicator(format!(
                "indicator '{}': no lexeme declared",
                self.string
            )));
        };

        let mut senses = Vec::with_capacity(self.senses.len());
        for sense in self.senses {
            senses.push(Sense {
                inverse: parse_flag(&sense.inverse, "inverse", &self.string)?,
                negated: parse_flag(&sense.negated, "negated", &self.string)?,
                cue: (!sense.cue.is_empty()).then_some(sense.cue),
                category: sense.category,
            });
        }

        Ok(Indicator {
            string: self.string,
            lexeme_type,
            lexemes: lexemes
                .into_iter()
                .map(|l| Lexeme {
                    lemma: l.lemma,
                    pos: l.pos,
                })
                .collect(),
            senses,
            verified,
            gap_type: self.gap_type,
        })
    }
}

// ============================================================================
// Lexicon
// ============================================================================

/// The full parsed rule set, ordered for matching.
#[derive(Debug, Clone, Default)]
pub struct IndicatorLexicon {
    /// Ordered by lexeme count descending, then surface string ascending
    indicators: Vec<Indicator>,
}

impl IndicatorLexicon {
    /// Load and validate the rule file. Any malformed record is fatal.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_xml(&content)
    }

    /// Parse rules from an XML string.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let file: RuleFile = quick_xml::de::from_str(xml)
            .map_err(|e| RelexError::Indicator(e.to_string()))?;

        let mut indicators = file
            .indicators
            .into_iter()
            .map(RuleRecord::into_indicator)
            .collect::<Result<Vec<_>>>()?;

        indicators.sort_by(|a, b| {
            b.lexemes
                .len()
                .cmp(&a.lexemes.len())
                .then_with(|| a.string.cmp(&b.string))
        });

        let multiword = indicators
            .iter()
            .filter(|i| i.lexeme_type == LexemeType::Multiword)
            .count();
        if multiword > 0 {
            warn!(
                count = multiword,
                "multiword indicator matching is not implemented; these rules will not fire"
            );
        }

        Ok(Self { indicators })
    }

    /// Build a lexicon from already-parsed indicators (used by tests).
    pub fn from_indicators(mut indicators: Vec<Indicator>) -> Self {
        indicators.sort_by(|a, b| {
            b.lexemes
                .len()
                .cmp(&a.lexemes.len())
                .then_with(|| a.string.cmp(&b.string))
        });
        Self { indicators }
    }

    pub fn get(&self, id: IndicatorId) -> &Indicator {
        &self.indicators[id]
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorId, &Indicator)> {
        self.indicators.iter().enumerate()
    }

    /// Attach indicators to the words they trigger on.
    ///
    /// Shapes are tried in preference order gapped > multiword > single so a
    /// more specific shape claims its word first; words de-duplicate the
    /// attached ids. Gapped matching never crosses a sentence boundary.
    pub fn annotate(&self, sentences: &mut [Sentence]) {
        for pass in [LexemeType::Gapped, LexemeType::Multiword, LexemeType::Single] {
            for (id, indicator) in self.iter() {
                if indicator.lexeme_type != pass {
                    continue;
                }
                match pass {
                    // reported at load; nothing to match here
                    LexemeType::Multiword => continue,
                    LexemeType::Single => {
                        for sentence in sentences.iter_mut() {
                            annotate_single(sentence, id, &indicator.lexemes[0]);
                        }
                    }
                    LexemeType::Gapped => {
                        for sentence in sentences.iter_mut() {
                            annotate_gapped(sentence, id, &indicator.lexemes);
                        }
                    }
                }
            }
        }
    }
}

fn word_matches(word: &Word, lexeme: &Lexeme) -> bool {
    word.text.eq_ignore_ascii_case(&lexeme.lemma) || word.lemma.eq_ignore_ascii_case(&lexeme.lemma)
}

fn annotate_single(sentence: &mut Sentence, id: IndicatorId, lexeme: &Lexeme) {
    for position in sentence.word_positions() {
        if word_matches(sentence.word(position), lexeme) {
            sentence.word_mut(position).attach_indicator(id);
        }
    }
}

fn annotate_gapped(sentence: &mut Sentence, id: IndicatorId, lexemes: &[Lexeme]) {
    let positions = sentence.word_positions();
    let Some(first) = positions
        .iter()
        .position(|&p| word_matches(sentence.word(p), &lexemes[0]))
    else {
        return;
    };

    // the indicator attaches to the second part
    if let Some(&second) = positions[first + 1..]
        .iter()
        .find(|&&p| word_matches(sentence.word(p), &lexemes[1]))
    {
        sentence.word_mut(second).attach_indicator(id);
    }
}

// ============================================================================
// Tests
// ============================================================================
