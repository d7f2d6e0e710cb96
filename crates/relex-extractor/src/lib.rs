//! RELEX Extractor - the concept merger and relation extraction engine
//!
//! The pipeline runs per document:
//! 1. tag the text (external tagger), fan recognizer sources out
//!    concurrently, and merge their annotations into a non-overlapping
//!    concept set ([`merger`])
//! 2. per sentence, fold tokens, chunk boundaries, concepts, and lexicon
//!    matches into word/chunk structures with head and modifier roles
//!    ([`harmonizer`])
//! 3. attach lexical indicators to words ([`indicator`])
//! 4. detect hypernym relations over noun phrases ([`hypernymy`])
//! 5. verify indicator-driven predications against the ontology table
//!    ([`relational`])
//!
//! Everything after the recognizer join runs sequentially in sentence and
//! chunk/word position order: the analyzers stop at the first successful
//! match, so later matches must never override earlier emissions.

pub mod harmonizer;
pub mod hypernymy;
pub mod indicator;
pub mod merger;
pub mod pipeline;
pub mod relational;

pub use harmonizer::{
    harmonize_sentence, is_passive, Chunk, ChunkRole, LexiconMatch, Sentence, Word,
};
pub use hypernymy::{HypernymAnalyzer, InterveningPhrase};
pub use indicator::{Indicator, IndicatorId, IndicatorLexicon, Lexeme, LexemeType, Sense};
pub use merger::{align_to_tokens, merge_annotations};
pub use pipeline::Pipeline;
pub use relational::{CandidatePair, RelationalAnalyzer};
