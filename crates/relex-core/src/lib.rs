//! RELEX Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the RELEX system:
//! - Text primitives (spans, tokens, tagged sentences, chunk boundaries)
//! - Concept models (scored concepts, merged concept records)
//! - Relation output types
//! - Common error types
//! - Shared traits for the external collaborator services
//! - Configuration management
//! - The ontology triple table

pub mod config;
pub mod ontology;

pub use config::{AppConfig, ConfigError, LoggingConfig, ResourceConfig, ServerConfig, SourceKind};
pub use ontology::OntologyIndex;

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for RELEX operations
#[derive(Error, Debug)]
pub enum RelexError {
    #[error("recognizer '{source_name}' failed: {message}")]
    Recognizer { source_name: String, message: String },

    #[error("hierarchy oracle failed: {0}")]
    Oracle(String),

    #[error("tagger failed: {0}")]
    Tagger(String),

    #[error("chunker failed: {0}")]
    Chunker(String),

    #[error("lexicon lookup failed: {0}")]
    Lexicon(String),

    #[error("indicator rule file invalid: {0}")]
    Indicator(String),

    #[error("ontology table invalid: {0}")]
    Ontology(String),

    #[error("concept span {start}..{end} maps to no token")]
    SpanAlignment { start: usize, end: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RelexError>;

// ============================================================================
// Text Primitives
// ============================================================================

/// Half-open index range, over either character or token indices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if the two half-open ranges share at least one index.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `index` falls inside the range.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// True if `other` lies entirely inside this range.
    pub fn subsumes(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A single token produced by the tagger service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text
    pub text: String,
    /// Lemmatized form
    pub lemma: String,
    /// Penn Treebank part-of-speech tag
    pub tag: String,
    /// Byte offset of the token in the document text
    pub offset: usize,
}

impl Token {
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        tag: impl Into<String>,
        offset: usize,
    ) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            tag: tag.into(),
            offset,
        }
    }

    /// Character span covered by this token in the document text.
    pub fn char_span(&self) -> Span {
        Span::new(self.offset, self.offset + self.text.len())
    }

    /// True if the token contains at least one alphanumeric character.
    pub fn is_alphanumeric(&self) -> bool {
        self.text.chars().any(|c| c.is_alphanumeric())
    }

    /// True if the token is a single punctuation mark.
    pub fn is_punctuation(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_punctuation())
    }
}

/// One sentence of tagger output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    /// Character span of the sentence in the document text
    pub span: Span,
    /// Tokens in document order
    pub tokens: Vec<Token>,
}

impl TaggedSentence {
    /// Build a sentence from its tokens, deriving the character span.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let span = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => Span::new(first.offset, last.char_span().end),
            _ => Span::new(0, 0),
        };
        Self { span, tokens }
    }
}

/// Phrase chunk labels produced by the chunker service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChunkLabel {
    Np,
    Vp,
    Adjp,
    Pp,
    Advp,
}

impl ChunkLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Np => "NP",
            Self::Vp => "VP",
            Self::Adjp => "ADJP",
            Self::Pp => "PP",
            Self::Advp => "ADVP",
        }
    }

    /// Parse a chunker label; unknown labels return `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NP" => Some(Self::Np),
            "VP" => Some(Self::Vp),
            "ADJP" => Some(Self::Adjp),
            "PP" => Some(Self::Pp),
            "ADVP" => Some(Self::Advp),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChunkLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A phrase chunk boundary over one sentence's tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub label: ChunkLabel,
    /// Sentence-local token range
    pub tokens: Span,
}

impl ChunkSpan {
    pub fn new(label: ChunkLabel, tokens: Span) -> Self {
        Self { label, tokens }
    }
}

// ============================================================================
// Concept Models
// ============================================================================

/// A single concept candidate returned by a recognition source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredConcept {
    /// Concept unique identifier (e.g. a UMLS CUI)
    pub cui: String,
    /// Preferred name in the source vocabulary
    pub name: String,
    /// Matched text as reported by the source
    pub concept_string: String,
    /// Source-specific match score
    pub score: f32,
    /// Fine-grained semantic types, in source order
    pub semtypes: Vec<String>,
    /// Coarse-grained semantic groups
    pub semgroups: BTreeSet<String>,
}

impl ScoredConcept {
    pub fn has_semtype(&self, semtype: &str) -> bool {
        self.semtypes.iter().any(|s| s == semtype)
    }

    /// Last whitespace-separated token of the preferred name, lowercased.
    pub fn final_name_token(&self) -> Option<String> {
        self.name
            .split_whitespace()
            .last()
            .map(|t| t.to_lowercase())
    }
}

/// Raw output of one recognition source: concept candidates keyed by
/// `(start, length)` character span.
pub type SourceSpans = HashMap<(usize, usize), Vec<ScoredConcept>>;

/// Index of a [`Concept`] in its owning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptId(pub usize);

/// A merged, non-overlapping concept mention.
///
/// Concepts are owned by the document; words and relations refer to them by
/// [`ConceptId`]. When two sources propose the identical span, both source
/// annotation lists live on the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Character span in the document text
    pub span: Span,
    /// Token span in the document token stream, filled by span alignment
    pub token_span: Span,
    /// Per-source annotations, in configured source order
    pub annotations: Vec<(String, Vec<ScoredConcept>)>,
}

impl Concept {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            token_span: Span::new(0, 0),
            annotations: Vec::new(),
        }
    }

    /// Attach one source's candidate list. Repeated sources are merged.
    pub fn add_source(&mut self, source: impl Into<String>, concepts: Vec<ScoredConcept>) {
        let source = source.into();
        if let Some((_, existing)) = self.annotations.iter_mut().find(|(s, _)| *s == source) {
            existing.extend(concepts);
        } else {
            self.annotations.push((source, concepts));
        }
    }

    /// The primary scored concept: first candidate of the first source.
    pub fn primary(&self) -> Option<&ScoredConcept> {
        self.annotations
            .first()
            .and_then(|(_, concepts)| concepts.first())
    }

    /// All scored concepts across all sources, in source order.
    pub fn scored(&self) -> impl Iterator<Item = &ScoredConcept> {
        self.annotations.iter().flat_map(|(_, c)| c.iter())
    }
}

/// A lexicon record returned by the lexicon lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexRecord {
    /// Base (citation) form
    pub base: String,
    /// Unique lexicon entry id
    pub eui: String,
    /// Syntactic category (noun, verb, adj, ...)
    pub category: String,
}

// ============================================================================
// Relation Output
// ============================================================================

/// The syntactic construction an indicator match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorType {
    /// Noun-compound modifier/head pair (no explicit indicator word)
    #[serde(rename = "MODHEAD")]
    ModHead,
    Adjective,
    Verb,
    Preposition,
    Nominal,
}

impl IndicatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModHead => "MODHEAD",
            Self::Adjective => "ADJECTIVE",
            Self::Verb => "VERB",
            Self::Preposition => "PREPOSITION",
            Self::Nominal => "NOMINAL",
        }
    }
}

impl std::fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed semantic relation between two merged concepts.
///
/// Append-only output: relations are never mutated after creation, and the
/// per-document list preserves emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub subject: ConceptId,
    pub predicate: String,
    pub object: ConceptId,
    /// Construction the relation came from; `None` for hypernym relations
    pub indicator: Option<IndicatorType>,
}

impl Relation {
    pub fn new(
        subject: ConceptId,
        predicate: impl Into<String>,
        object: ConceptId,
        indicator: IndicatorType,
    ) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
            indicator: Some(indicator),
        }
    }

    /// Build an `IS-A` relation from the hypernymy analyzer.
    pub fn hypernym(subject: ConceptId, object: ConceptId) -> Self {
        Self {
            subject,
            predicate: "IS-A".to_string(),
            object,
            indicator: None,
        }
    }
}

/// Pipeline output for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedDocument {
    /// Document identity assigned at extraction time
    pub id: Uuid,
    /// Merged concept table; relations index into it
    pub concepts: Vec<Concept>,
    /// Extracted relations in emission order
    pub relations: Vec<Relation>,
    /// Extraction timestamp
    pub extracted_at: DateTime<Utc>,
}

impl AnalyzedDocument {
    pub fn new(concepts: Vec<Concept>, relations: Vec<Relation>) -> Self {
        Self {
            id: Uuid::new_v4(),
            concepts,
            relations,
            extracted_at: Utc::now(),
        }
    }

    pub fn concept(&self, id: ConceptId) -> &Concept {
        &self.concepts[id.0]
    }

    /// Render relations as flat output records, resolving concept ids to
    /// their primary CUIs and names.
    pub fn predications(&self) -> Vec<Predication> {
        self.relations
            .iter()
            .filter_map(|r| {
                let subject = self.concept(r.subject).primary()?;
                let object = self.concept(r.object).primary()?;
                Some(Predication {
                    document_id: self.id,
                    subject_cui: subject.cui.clone(),
                    subject_name: subject.name.clone(),
                    predicate: r.predicate.clone(),
                    object_cui: object.cui.clone(),
                    object_name: object.name.clone(),
                    indicator: r.indicator,
                    extracted_at: self.extracted_at,
                })
            })
            .collect()
    }
}

/// Flat, serializable form of one extracted relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predication {
    pub document_id: Uuid,
    pub subject_cui: String,
    pub subject_name: String,
    pub predicate: String,
    pub object_cui: String,
    pub object_name: String,
    pub indicator: Option<IndicatorType>,
    pub extracted_at: DateTime<Utc>,
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// A concept recognition service.
///
/// Implementations block (asynchronously) on one annotate call per document;
/// the pipeline fans sources out concurrently and joins before merging.
#[async_trait::async_trait]
pub trait ConceptRecognizer: Send + Sync {
    /// Annotate raw document text with concept candidates.
    async fn annotate(&self, text: &str) -> Result<SourceSpans>;

    /// Source name for logging and per-source annotation keys.
    fn name(&self) -> &str;
}

/// The hierarchy ("is-a") oracle service.
#[async_trait::async_trait]
pub trait HierarchyOracle: Send + Sync {
    /// True if `child` is a descendant of `ancestor` in the hierarchy.
    async fn is_a(&self, child: &str, ancestor: &str) -> Result<bool>;
}

/// The lexicon lookup service.
#[async_trait::async_trait]
pub trait LexiconSource: Send + Sync {
    /// Look up the lexicon records for a surface string.
    async fn lookup(&self, text: &str) -> Result<Vec<LexRecord>>;
}

/// The tokenizer / POS tagger / lemmatizer / sentence segmenter service.
#[async_trait::async_trait]
pub trait Tagger: Send + Sync {
    /// Split text into sentences of tagged tokens.
    async fn tag(&self, text: &str) -> Result<Vec<TaggedSentence>>;
}

/// The phrase chunker service.
#[async_trait::async_trait]
pub trait Chunker: Send + Sync {
    /// Chunk one sentence of tagged tokens into phrase boundaries.
    async fn chunk(&self, tokens: &[Token]) -> Result<Vec<ChunkSpan>>;
}

// ============================================================================
// Tests
// ============================================================================
