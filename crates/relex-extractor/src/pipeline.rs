//! Per-document pipeline
//!
//! Orchestrates one document end to end: tag, fan recognizer sources out
//! concurrently (join-before-merge barrier), merge and align concepts, then
//! run the sentence loop strictly in order: chunk, harmonize, hypernymy,
//! relational analysis. Documents are independent; the pipeline itself is
//! `Send + Sync`, so callers may process documents on a worker pool, but
//! everything inside a document stays sequential because the analyzers'
//! first-match-wins semantics are order-sensitive.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use relex_core::{
    AnalyzedDocument, Chunker, ConceptRecognizer, HierarchyOracle, LexiconSource,
    OntologyIndex, Relation, RelexError, Result, SourceSpans, Span, TaggedSentence, Tagger,
};

use crate::harmonizer::{harmonize_sentence, LexiconMatch};
use crate::hypernymy::HypernymAnalyzer;
use crate::indicator::IndicatorLexicon;
use crate::merger::{align_to_tokens, merge_annotations};
use crate::relational::RelationalAnalyzer;

/// The document analysis pipeline. All collaborators and resources are
/// injected at construction; the pipeline holds no mutable state.
pub struct Pipeline {
    tagger: Arc<dyn Tagger>,
    chunker: Arc<dyn Chunker>,
    recognizers: Vec<Arc<dyn ConceptRecognizer>>,
    oracle: Arc<dyn HierarchyOracle>,
    ontology: Arc<OntologyIndex>,
    indicators: Arc<IndicatorLexicon>,
    lexicon: Option<Arc<dyn LexiconSource>>,
    skip_failed_sources: bool,
}

impl Pipeline {
    pub fn new(
        tagger: Arc<dyn Tagger>,
        chunker: Arc<dyn Chunker>,
        recognizers: Vec<Arc<dyn ConceptRecognizer>>,
        oracle: Arc<dyn HierarchyOracle>,
        ontology: Arc<OntologyIndex>,
        indicators: Arc<IndicatorLexicon>,
    ) -> Self {
        Self {
            tagger,
            chunker,
            recognizers,
            oracle,
            ontology,
            indicators,
            lexicon: None,
            skip_failed_sources: false,
        }
    }

    /// Enable lexicon lookups for chunk-role disambiguation.
    pub fn with_lexicon(mut self, lexicon: Arc<dyn LexiconSource>) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    /// Degrade by skipping a failed recognizer source instead of failing
    /// the whole document.
    pub fn with_skip_failed_sources(mut self, skip: bool) -> Self {
        self.skip_failed_sources = skip;
        self
    }

    /// Process one document and return its ordered relation list.
    pub async fn process(&self, text: &str) -> Result<AnalyzedDocument> {
        if text.trim().is_empty() {
            return Ok(AnalyzedDocument::new(Vec::new(), Vec::new()));
        }

        let tagged = self.tagger.tag(text).await?;
        let annotations = self.annotate_sources(text).await?;

        let mut concepts = merge_annotations(&annotations);
        align_to_tokens(&mut concepts, &tagged)?;
        debug!(concepts = concepts.len(), "merged concept set");

        // harmonize every sentence before indicator annotation: gapped
        // indicators scan whole sentences
        let mut sentences = Vec::with_capacity(tagged.len());
        let mut token_base = 0;
        for (index, sentence) in tagged.iter().enumerate() {
            let chunk_spans = self.chunker.chunk(&sentence.tokens).await?;
            let lexicon_matches = self.lexicon_matches(sentence).await?;
            sentences.push(harmonize_sentence(
                index,
                token_base,
                sentence,
                &chunk_spans,
                &concepts,
                &lexicon_matches,
            ));
            token_base += sentence.tokens.len();
        }

        self.indicators.annotate(&mut sentences);

        let mut relations: Vec<Relation> = Vec::new();
        let hypernymy = HypernymAnalyzer::new(self.oracle.as_ref(), &concepts);
        let relational =
            RelationalAnalyzer::new(&self.ontology, &self.indicators, &concepts);
        for sentence in &sentences {
            hypernymy.analyze(sentence, &mut relations).await?;
            relational.analyze(sentence, &mut relations);
        }

        info!(
            sentences = sentences.len(),
            concepts = concepts.len(),
            relations = relations.len(),
            "document processed"
        );
        Ok(AnalyzedDocument::new(concepts, relations))
    }

    /// Query every recognizer source concurrently and join before merging.
    ///
    /// Results come back in configured source order regardless of completion
    /// order, so the merge stays deterministic.
    async fn annotate_sources(&self, text: &str) -> Result<Vec<(String, SourceSpans)>> {
        let handles: Vec<_> = self
            .recognizers
            .iter()
            .map(|recognizer| {
                let recognizer = Arc::clone(recognizer);
                let text = text.to_string();
                let name = recognizer.name().to_string();
                (
                    name,
                    tokio::spawn(async move { recognizer.annotate(&text).await }),
                )
            })
            .collect();

        let names: Vec<String> = handles.iter().map(|(n, _)| n.clone()).collect();
        let joined = join_all(handles.into_iter().map(|(_, h)| h)).await;

        let mut annotations = Vec::with_capacity(joined.len());
        for (name, joined) in names.into_iter().zip(joined) {
            match joined {
                Ok(Ok(spans)) => annotations.push((name, spans)),
                Ok(Err(e)) if self.skip_failed_sources => {
                    warn!(source = %name, error = %e, "skipping failed recognizer source");
                    annotations.push((name, SourceSpans::new()));
                }
                Ok(Err(e)) => return Err(e),
                Err(join_error) => {
                    return Err(RelexError::Recognizer {
                        source_name: name,
                        message: join_error.to_string(),
                    })
                }
            }
        }
        Ok(annotations)
    }

    /// Single-token lexicon lookups for one sentence; the records only feed
    /// chunk-role disambiguation.
    async fn lexicon_matches(&self, sentence: &TaggedSentence) -> Result<Vec<LexiconMatch>> {
        let Some(lexicon) = &self.lexicon else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        for (i, token) in sentence.tokens.iter().enumerate() {
            if !token.is_alphanumeric() {
                continue;
            }
            let records = lexicon.lookup(&token.text).await?;
            if !records.is_empty() {
                matches.push(LexiconMatch {
                    tokens: Span::new(i, i + 1),
                    records,
                });
            }
        }
        Ok(matches)
    }
}
