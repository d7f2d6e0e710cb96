//! Word/Chunk Harmonizer
//!
//! Folds tagger output, chunker boundaries, merged concepts, and lexicon
//! matches into the sentence → chunk → word structure the analyzers run
//! over. A word covers a single token or a whole multi-token concept mention
//! (mentions are atomic for chunk-role purposes). Words are not mutated once
//! their chunk roles are assigned, except for indicator attachment during
//! the same harmonization pass.

use relex_core::{
    ChunkLabel, ChunkSpan, Concept, ConceptId, LexRecord, Span, TaggedSentence, Token,
};

use crate::indicator::IndicatorId;

/// Coarse categories that can head a word, matched by tag prefix.
const PREDICATIVE_PREFIXES: [&str; 5] = ["NN", "VB", "JJ", "RB", "PR"];

/// Function/relative tags that terminate the right-to-left head scan.
const FUNCTION_BOUNDARY_TAGS: [&str; 4] = ["IN", "WDT", "WP", "WP$"];

const DETERMINER_TAG: &str = "DT";

/// Verbs whose passive agent may be introduced by "with".
const AGENTIVE_WITH_VERBS: [&str; 6] =
    ["treat", "associate", "correlate", "manage", "diagnose", "prevent"];

// ============================================================================
// Sentence Structure
// ============================================================================

/// Role of a word inside its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRole {
    Head,
    Modifier,
}

/// A surface word: one token, or one multi-token concept mention.
#[derive(Debug, Clone)]
pub struct Word {
    /// Sentence-local token spans; gapped forms would carry more than one
    pub spans: Vec<Span>,
    /// Surface text (tokens joined by single spaces)
    pub text: String,
    /// Lemma of the head token
    pub lemma: String,
    /// Sentence-local index of the head token
    pub head_token: usize,
    /// Tag of the head token
    pub pos_tag: String,
    /// Role assigned by [`set_chunk_roles`]
    pub chunk_role: Option<ChunkRole>,
    /// Concept attached to this word, if any
    pub concept: Option<ConceptId>,
    /// Indicators matched on this word, de-duplicated by id
    pub indicators: Vec<IndicatorId>,
    /// Lexicon records for this exact span
    pub lexemes: Vec<LexRecord>,
}

impl Word {
    fn from_tokens(
        tokens: &[Token],
        span: Span,
        concept: Option<ConceptId>,
        lexicon_matches: &[LexiconMatch],
    ) -> Self {
        let head_token = head_token_index(tokens, span);
        let text = tokens[span.start..span.end]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let lexemes = lexicon_matches
            .iter()
            .filter(|m| m.tokens == span)
            .flat_map(|m| m.records.iter().cloned())
            .collect();

        Self {
            spans: vec![span],
            text,
            lemma: tokens[head_token].lemma.clone(),
            head_token,
            pos_tag: tokens[head_token].tag.clone(),
            chunk_role: None,
            concept,
            indicators: Vec::new(),
            lexemes,
        }
    }

    /// Full token range, from the first span's start to the last span's end.
    pub fn span(&self) -> Span {
        let start = self.spans.first().map_or(0, |s| s.start);
        let end = self.spans.last().map_or(0, |s| s.end);
        Span::new(start, end)
    }

    pub fn is_head(&self) -> bool {
        self.chunk_role == Some(ChunkRole::Head)
    }

    pub fn is_modifier(&self) -> bool {
        self.chunk_role == Some(ChunkRole::Modifier)
    }

    /// True if the surface text has at least one alphanumeric character.
    pub fn is_alphanumeric(&self) -> bool {
        self.text.chars().any(|c| c.is_alphanumeric())
    }

    /// Attach an indicator, de-duplicating by identity.
    pub fn attach_indicator(&mut self, id: IndicatorId) {
        if !self.indicators.contains(&id) {
            self.indicators.push(id);
        }
    }
}

/// A phrase chunk with role-assigned words.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub label: ChunkLabel,
    /// Sentence-local token range
    pub tokens: Span,
    pub words: Vec<Word>,
    /// Index of the head word
    pub head: usize,
    /// Modifier word indices in left-to-right order
    pub modifiers: Vec<usize>,
    /// Chunk index in the sentence
    pub position: usize,
}

impl Chunk {
    pub fn head_word(&self) -> &Word {
        &self.words[self.head]
    }

    pub fn leftmost_modifier(&self) -> Option<&Word> {
        self.modifiers.first().map(|&i| &self.words[i])
    }

    /// True if any word in the chunk carries a concept.
    pub fn has_concept_word(&self) -> bool {
        self.words.iter().any(|w| w.concept.is_some())
    }
}

/// One harmonized sentence.
#[derive(Debug, Clone)]
pub struct Sentence {
    pub index: usize,
    /// Character span in the document
    pub span: Span,
    /// Document-global index of token 0
    pub token_base: usize,
    pub tokens: Vec<Token>,
    pub chunks: Vec<Chunk>,
}

impl Sentence {
    /// Nearest chunk of `label` strictly before `position`.
    pub fn prev_chunk_of(&self, label: ChunkLabel, position: usize) -> Option<usize> {
        self.chunks[..position]
            .iter()
            .rposition(|c| c.label == label)
    }

    /// Nearest chunk of `label` strictly after `position`.
    pub fn next_chunk_of(&self, label: ChunkLabel, position: usize) -> Option<usize> {
        self.chunks
            .iter()
            .skip(position + 1)
            .position(|c| c.label == label)
            .map(|offset| position + 1 + offset)
    }

    /// Nearest NP after `position` that contains a concept-bearing word.
    pub fn next_concept_bearing_np(&self, position: usize) -> Option<usize> {
        self.chunks
            .iter()
            .skip(position + 1)
            .position(|c| c.label == ChunkLabel::Np && c.has_concept_word())
            .map(|offset| position + 1 + offset)
    }

    /// All `(chunk, word)` positions in sentence order.
    pub fn word_positions(&self) -> Vec<(usize, usize)> {
        self.chunks
            .iter()
            .enumerate()
            .flat_map(|(c, chunk)| (0..chunk.words.len()).map(move |w| (c, w)))
            .collect()
    }

    pub fn word(&self, position: (usize, usize)) -> &Word {
        &self.chunks[position.0].words[position.1]
    }

    pub fn word_mut(&mut self, position: (usize, usize)) -> &mut Word {
        &mut self.chunks[position.0].words[position.1]
    }
}

/// Lexicon records for one token span, produced by the lexicon lookup.
#[derive(Debug, Clone)]
pub struct LexiconMatch {
    /// Sentence-local token span
    pub tokens: Span,
    pub records: Vec<LexRecord>,
}

// ============================================================================
// Harmonization
// ============================================================================

/// Build one [`Sentence`] from tagger, chunker, merger, and lexicon output.
///
/// `token_base` is the document-global index of the sentence's first token;
/// merged concepts carry document-global token spans and are localized here.
pub fn harmonize_sentence(
    index: usize,
    token_base: usize,
    tagged: &TaggedSentence,
    chunk_spans: &[ChunkSpan],
    concepts: &[Concept],
    lexicon_matches: &[LexiconMatch],
) -> Sentence {
    let mut chunks = Vec::with_capacity(chunk_spans.len());

    for (position, chunk_span) in chunk_spans.iter().enumerate() {
        let mut words = build_words(tagged, chunk_span, token_base, concepts, lexicon_matches);
        let (head, modifiers) = set_chunk_roles(chunk_span.label, &mut words);
        chunks.push(Chunk {
            label: chunk_span.label,
            tokens: chunk_span.tokens,
            words,
            head,
            modifiers,
            position,
        });
    }

    Sentence {
        index,
        span: tagged.span,
        token_base,
        tokens: tagged.tokens.clone(),
        chunks,
    }
}

fn build_words(
    tagged: &TaggedSentence,
    chunk: &ChunkSpan,
    token_base: usize,
    concepts: &[Concept],
    lexicon_matches: &[LexiconMatch],
) -> Vec<Word> {
    let mut words = Vec::new();
    let mut i = chunk.tokens.start;

    while i < chunk.tokens.end && i < tagged.tokens.len() {
        let global = token_base + i;
        let mention = concepts
            .iter()
            .enumerate()
            .find(|(_, c)| c.token_span.start == global && c.token_span.len() > 0);

        let (span, concept) = match mention {
            Some((id, c))
                if i + c.token_span.len() <= chunk.tokens.end
                    && i + c.token_span.len() <= tagged.tokens.len() =>
            {
                (Span::new(i, i + c.token_span.len()), Some(ConceptId(id)))
            }
            // a mention crossing the chunk boundary is not split into an
            // atomic word; fall back to a plain token, no attachment
            _ => (Span::new(i, i + 1), None),
        };

        words.push(Word::from_tokens(&tagged.tokens, span, concept, lexicon_matches));
        i = span.end;
    }

    words
}

/// Head token of a word: scanning right to left, the first token in a
/// predicative category; a function/relative tag ends the scan. Defaults to
/// the last token.
fn head_token_index(tokens: &[Token], span: Span) -> usize {
    for i in (span.start..span.end).rev() {
        let tag = tokens[i].tag.as_str();
        if FUNCTION_BOUNDARY_TAGS.contains(&tag) {
            break;
        }
        if PREDICATIVE_PREFIXES.iter().any(|p| tag.starts_with(p)) {
            return i;
        }
    }
    span.end - 1
}

/// Tag prefixes that can head a chunk of the given label.
fn head_prefixes(label: ChunkLabel) -> &'static [&'static str] {
    match label {
        ChunkLabel::Np => &["NN", "JJ", "VBG"],
        ChunkLabel::Vp => &["VB"],
        ChunkLabel::Adjp => &["JJ"],
        ChunkLabel::Pp => &["IN"],
        ChunkLabel::Advp => &["RB"],
    }
}

fn eligible_as_head(word: &Word, label: ChunkLabel) -> bool {
    if head_prefixes(label)
        .iter()
        .any(|p| word.pos_tag.starts_with(p))
    {
        return true;
    }
    // the lexicon may license a noun reading the tagger missed
    label == ChunkLabel::Np && word.lexemes.iter().any(|r| r.category == "noun")
}

/// Assign head and modifier roles to the chunk's words.
///
/// Scans right to left: the first word eligible for the chunk label becomes
/// the head; every remaining alphanumeric non-determiner word becomes a
/// modifier. Modifier order is restored to left-to-right. Exactly one word
/// ends up with the head role.
pub fn set_chunk_roles(label: ChunkLabel, words: &mut [Word]) -> (usize, Vec<usize>) {
    if words.is_empty() {
        return (0, Vec::new());
    }
    if words.len() == 1 {
        words[0].chunk_role = Some(ChunkRole::Head);
        return (0, Vec::new());
    }

    let mut head: Option<usize> = None;
    let mut modifiers = Vec::new();

    for i in (0..words.len()).rev() {
        if head.is_none() {
            if eligible_as_head(&words[i], label) {
                words[i].chunk_role = Some(ChunkRole::Head);
                head = Some(i);
            }
        } else if words[i].is_alphanumeric() && words[i].pos_tag != DETERMINER_TAG {
            words[i].chunk_role = Some(ChunkRole::Modifier);
            modifiers.push(i);
        }
    }

    let head = match head {
        Some(i) => i,
        None => {
            let last = words.len() - 1;
            words[last].chunk_role = Some(ChunkRole::Head);
            last
        }
    };

    modifiers.reverse();
    (head, modifiers)
}

/// Passive-voice test for a VP chunk.
///
/// True iff the head word is a past participle and, skipping any immediately
/// following ADVP chunks, the next chunk is (a) a PP headed by "by", or by
/// "with" when the verb lemma takes an agentive "with", or (b) a VP chunk
/// immediately followed by the literal word "using".
pub fn is_passive(sentence: &Sentence, chunk_index: usize) -> bool {
    let chunk = &sentence.chunks[chunk_index];
    if chunk.label != ChunkLabel::Vp || chunk.head_word().pos_tag != "VBN" {
        return false;
    }

    let mut next = chunk_index + 1;
    while next < sentence.chunks.len() && sentence.chunks[next].label == ChunkLabel::Advp {
        next += 1;
    }
    let Some(next_chunk) = sentence.chunks.get(next) else {
        return false;
    };

    match next_chunk.label {
        ChunkLabel::Pp => {
            let preposition = next_chunk.head_word().text.to_lowercase();
            preposition == "by"
                || (preposition == "with"
                    && AGENTIVE_WITH_VERBS.contains(&chunk.head_word().lemma.as_str()))
        }
        ChunkLabel::Vp => sentence
            .tokens
            .get(next_chunk.tokens.end)
            .is_some_and(|t| t.text.eq_ignore_ascii_case("using")),
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(specs: &[(&str, &str, &str)]) -> TaggedSentence {
        let mut offset = 0;
        let mut tokens = Vec::new();
        for (text, lemma, tag) in specs {
            tokens.push(Token::new(*text, *lemma, *tag, offset));
            offset += text.len() + 1;
        }
        TaggedSentence::from_tokens(tokens)
    }

    fn np(range: (usize, usize)) -> ChunkSpan {
        ChunkSpan::new(ChunkLabel::Np, Span::new(range.0, range.1))
    }

    fn chunk(label: ChunkLabel, range: (usize, usize)) -> ChunkSpan {
        ChunkSpan::new(label, Span::new(range.0, range.1))
    }

    fn harmonize(tagged: &TaggedSentence, chunk_spans: &[ChunkSpan]) -> Sentence {
        harmonize_sentence(0, 0, tagged, chunk_spans, &[], &[])
    }

    #[test]
    fn test_every_chunk_has_exactly_one_head() {
        let sentence = harmonize(
            &tagged(&[
                ("The", "the", "DT"),
                ("analgesic", "analgesic", "JJ"),
                ("aspirin", "aspirin", "NN"),
                ("rapidly", "rapidly", "RB"),
                ("treats", "treat", "VBZ"),
                ("headaches", "headache", "NNS"),
            ]),
            &[
                np((0, 3)),
                chunk(ChunkLabel::Advp, (3, 4)),
                chunk(ChunkLabel::Vp, (4, 5)),
                np((5, 6)),
            ],
        );

        for chunk in &sentence.chunks {
            let heads = chunk.words.iter().filter(|w| w.is_head()).count();
            assert_eq!(heads, 1, "chunk {} has {} heads", chunk.position, heads);
        }
    }

    #[test]
    fn test_np_head_and_modifier_order() {
        let sentence = harmonize(
            &tagged(&[
                ("The", "the", "DT"),
                ("severe", "severe", "JJ"),
                ("migraine", "migraine", "NN"),
                ("headache", "headache", "NN"),
            ]),
            &[np((0, 4))],
        );

        let chunk = &sentence.chunks[0];
        // rightmost noun is the head
        assert_eq!(chunk.head, 3);
        // determiner excluded, modifiers left-to-right
        assert_eq!(chunk.modifiers, vec![1, 2]);
        assert_eq!(chunk.leftmost_modifier().unwrap().text, "severe");
    }

    #[test]
    fn test_single_word_chunk_is_trivially_head() {
        let sentence = harmonize(&tagged(&[("aspirin", "aspirin", "NN")]), &[np((0, 1))]);
        assert!(sentence.chunks[0].words[0].is_head());
        assert!(sentence.chunks[0].modifiers.is_empty());
    }

    #[test]
    fn test_vp_head_prefers_verb() {
        let sentence = harmonize(
            &tagged(&[
                ("has", "have", "VBZ"),
                ("been", "be", "VBN"),
                ("treated", "treat", "VBN"),
            ]),
            &[chunk(ChunkLabel::Vp, (0, 3))],
        );
        // rightmost verb wins
        assert_eq!(sentence.chunks[0].head, 2);
        assert_eq!(sentence.chunks[0].head_word().lemma, "treat");
    }

    #[test]
    fn test_head_token_skips_function_boundary() {
        let sentence = tagged(&[
            ("risk", "risk", "NN"),
            ("of", "of", "IN"),
            ("infection", "infection", "NN"),
        ]);
        // boundary tag stops the scan before "of"; "infection" is predicative
        assert_eq!(head_token_index(&sentence.tokens, Span::new(0, 3)), 2);
        // scan limited to the first two tokens finds "risk" first? no:
        // right-to-left hits the IN boundary immediately and falls back
        assert_eq!(head_token_index(&sentence.tokens, Span::new(0, 2)), 1);
    }

    #[test]
    fn test_concept_mention_becomes_atomic_word() {
        let tagged_sentence = tagged(&[
            ("sex", "sex", "NN"),
            ("hormone", "hormone", "NN"),
            ("levels", "level", "NNS"),
        ]);
        let mut concept = Concept::new(Span::new(0, 11));
        concept.token_span = Span::new(0, 2);
        let concepts = vec![concept];

        let sentence =
            harmonize_sentence(0, 0, &tagged_sentence, &[np((0, 3))], &concepts, &[]);
        let chunk = &sentence.chunks[0];

        assert_eq!(chunk.words.len(), 2);
        assert_eq!(chunk.words[0].text, "sex hormone");
        assert_eq!(chunk.words[0].concept, Some(ConceptId(0)));
        assert_eq!(chunk.words[1].text, "levels");
        // multi-token word heads on its last noun
        assert_eq!(chunk.words[0].head_token, 1);
    }

    #[test]
    fn test_concept_crossing_chunk_boundary_not_attached() {
        let tagged_sentence = tagged(&[
            ("sex", "sex", "NN"),
            ("hormone", "hormone", "NN"),
        ]);
        let mut concept = Concept::new(Span::new(0, 11));
        concept.token_span = Span::new(0, 2);
        let concepts = vec![concept];

        // chunk covers only the first token, mention would cross its edge
        let sentence =
            harmonize_sentence(0, 0, &tagged_sentence, &[np((0, 1))], &concepts, &[]);
        assert_eq!(sentence.chunks[0].words.len(), 1);
        assert_eq!(sentence.chunks[0].words[0].concept, None);
    }

    #[test]
    fn test_lexicon_noun_reading_can_head_np() {
        let tagged_sentence = tagged(&[
            ("the", "the", "DT"),
            ("swelling", "swell", "VBD"),
            ("there", "there", "EX"),
        ]);
        let matches = vec![LexiconMatch {
            tokens: Span::new(1, 2),
            records: vec![LexRecord {
                base: "swelling".to_string(),
                eui: "E0059321".to_string(),
                category: "noun".to_string(),
            }],
        }];

        let sentence =
            harmonize_sentence(0, 0, &tagged_sentence, &[np((0, 3))], &[], &matches);
        assert_eq!(sentence.chunks[0].head, 1);
    }

    #[test]
    fn test_passive_by_agent() {
        let sentence = harmonize(
            &tagged(&[
                ("Headaches", "headache", "NNS"),
                ("are", "be", "VBP"),
                ("relieved", "relieve", "VBN"),
                ("by", "by", "IN"),
                ("aspirin", "aspirin", "NN"),
            ]),
            &[
                np((0, 1)),
                chunk(ChunkLabel::Vp, (1, 3)),
                chunk(ChunkLabel::Pp, (3, 4)),
                np((4, 5)),
            ],
        );
        assert!(is_passive(&sentence, 1));
        assert!(!is_passive(&sentence, 0));
    }

    #[test]
    fn test_passive_skips_advp_and_checks_with_agent() {
        let sentence = harmonize(
            &tagged(&[
                ("Migraines", "migraine", "NNS"),
                ("are", "be", "VBP"),
                ("treated", "treat", "VBN"),
                ("successfully", "successfully", "RB"),
                ("with", "with", "IN"),
                ("aspirin", "aspirin", "NN"),
            ]),
            &[
                np((0, 1)),
                chunk(ChunkLabel::Vp, (1, 3)),
                chunk(ChunkLabel::Advp, (3, 4)),
                chunk(ChunkLabel::Pp, (4, 5)),
                np((5, 6)),
            ],
        );
        // "treat" is in the agentive-with list
        assert!(is_passive(&sentence, 1));
    }

    #[test]
    fn test_with_agent_requires_agentive_verb() {
        let sentence = harmonize(
            &tagged(&[
                ("Samples", "sample", "NNS"),
                ("were", "be", "VBD"),
                ("mixed", "mix", "VBN"),
                ("with", "with", "IN"),
                ("saline", "saline", "NN"),
            ]),
            &[
                np((0, 1)),
                chunk(ChunkLabel::Vp, (1, 3)),
                chunk(ChunkLabel::Pp, (3, 4)),
                np((4, 5)),
            ],
        );
        // "mix" does not take an agentive "with"
        assert!(!is_passive(&sentence, 1));
    }

    #[test]
    fn test_chunk_traversal_helpers() {
        let sentence = harmonize(
            &tagged(&[
                ("Aspirin", "aspirin", "NN"),
                ("treats", "treat", "VBZ"),
                ("severe", "severe", "JJ"),
                ("headaches", "headache", "NNS"),
            ]),
            &[
                np((0, 1)),
                chunk(ChunkLabel::Vp, (1, 2)),
                np((2, 4)),
            ],
        );

        assert_eq!(sentence.prev_chunk_of(ChunkLabel::Np, 1), Some(0));
        assert_eq!(sentence.next_chunk_of(ChunkLabel::Np, 1), Some(2));
        assert_eq!(sentence.prev_chunk_of(ChunkLabel::Np, 0), None);
        // no concepts attached anywhere
        assert_eq!(sentence.next_concept_bearing_np(0), None);
    }
}
