//! Hypernymy Analyzer
//!
//! Detects `IS-A` relations between noun-phrase concepts, both inside one NP
//! (head against its immediate left modifier) and across NP pairs, where the
//! intervening phrase decides whether a relation is attempted and in which
//! directions. Runs per sentence with no state carried across sentences.

use relex_core::{
    ChunkLabel, Concept, ConceptId, HierarchyOracle, Relation, Result, ScoredConcept, Token,
};

use crate::harmonizer::{Chunk, Sentence};

/// CUIs that never act as a hypernym candidate; the Symptom concept drags in
/// too many false positives.
const NON_HYPERNYM_CUIS: [&str; 1] = ["C1457887"];

/// Semantic groups whose shared membership alone does not justify a
/// hierarchy query.
const EXCLUDED_SEMGROUPS: [&str; 2] = ["anat", "conc"];

/// Semantic type marking geographic areas.
const GEO_SEMTYPE: &str = "geoa";

/// Place kinds a geographic hypernym's name must end with.
const GEO_HYPERNYM_NAMES: [&str; 12] = [
    "continent",
    "continents",
    "country",
    "countries",
    "state",
    "states",
    "region",
    "regions",
    "city",
    "cities",
    "island",
    "islands",
];

const APPOSITIVE_MARKERS: [&str; 4] = ["such as", "particularly", "in particular", "including"];

/// How many chunks past an NP to scan for its partner NP.
const INTER_NP_WINDOW: usize = 5;

/// Classification of the token span strictly between two noun phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterveningPhrase {
    /// Appositive marker; both directions are attempted
    Appositive,
    /// Unbalanced bracket sequence; both directions are attempted
    Parenthetical,
    /// Copular verb; only the forward direction is attempted
    Copular,
    /// Coordination with an "other"-modified partner; forward only
    Other,
}

/// Per-sentence hypernym detection over NP chunks.
pub struct HypernymAnalyzer<'a> {
    oracle: &'a dyn HierarchyOracle,
    concepts: &'a [Concept],
}

impl<'a> HypernymAnalyzer<'a> {
    pub fn new(oracle: &'a dyn HierarchyOracle, concepts: &'a [Concept]) -> Self {
        Self { oracle, concepts }
    }

    /// Run intra-NP and inter-NP analysis over one sentence, appending any
    /// detected relations in order.
    pub async fn analyze(&self, sentence: &Sentence, out: &mut Vec<Relation>) -> Result<()> {
        for chunk in sentence.chunks.iter().filter(|c| c.label == ChunkLabel::Np) {
            self.intra_np(chunk, out).await?;
        }
        self.inter_np(sentence, out).await?;
        Ok(())
    }

    /// Head concept against the concept of the word immediately to its left.
    async fn intra_np(&self, chunk: &Chunk, out: &mut Vec<Relation>) -> Result<()> {
        if chunk.words.len() < 2 || chunk.head == 0 {
            return Ok(());
        }

        let head = chunk.words[chunk.head].concept;
        let modifier = chunk.words[chunk.head - 1].concept;
        if let (Some(head), Some(modifier)) = (head, modifier) {
            self.hypernymy(head, modifier, true, out).await?;
        }
        Ok(())
    }

    /// NP pairs within the chunk window, gated by the intervening phrase.
    async fn inter_np(&self, sentence: &Sentence, out: &mut Vec<Relation>) -> Result<()> {
        for i in 0..sentence.chunks.len() {
            if sentence.chunks[i].label != ChunkLabel::Np {
                continue;
            }

            let window_end = (i + INTER_NP_WINDOW + 1).min(sentence.chunks.len());
            let Some(j) = (i + 1..window_end)
                .find(|&j| sentence.chunks[j].label == ChunkLabel::Np)
            else {
                continue;
            };

            let (Some(c1), Some(c2)) = (
                sentence.chunks[i].head_word().concept,
                sentence.chunks[j].head_word().concept,
            ) else {
                continue;
            };

            let phrase =
                &sentence.tokens[sentence.chunks[i].tokens.end..sentence.chunks[j].tokens.start];
            let after = sentence.tokens.get(sentence.chunks[j].tokens.end);
            let Some(kind) = classify_intervening(phrase, after, &sentence.chunks[j]) else {
                continue;
            };

            let both_directions = matches!(
                kind,
                InterveningPhrase::Appositive | InterveningPhrase::Parenthetical
            );
            self.hypernymy(c1, c2, both_directions, out).await?;
        }
        Ok(())
    }

    /// Test `c1 IS-A c2`, then the swapped direction when requested. At most
    /// one relation is emitted per call.
    pub async fn hypernymy(
        &self,
        c1: ConceptId,
        c2: ConceptId,
        both_directions: bool,
        out: &mut Vec<Relation>,
    ) -> Result<bool> {
        let (Some(p1), Some(p2)) = (
            self.concepts[c1.0].primary(),
            self.concepts[c2.0].primary(),
        ) else {
            return Ok(false);
        };

        if NON_HYPERNYM_CUIS.contains(&p2.cui.as_str()) {
            return Ok(false);
        }
        if both_directions && NON_HYPERNYM_CUIS.contains(&p1.cui.as_str()) {
            return Ok(false);
        }
        if p1.cui == p2.cui {
            return Ok(false);
        }

        // the shared groups must include something beyond anatomy/conceptual
        let informative_shared = p1
            .semgroups
            .intersection(&p2.semgroups)
            .any(|g| !EXCLUDED_SEMGROUPS.contains(&g.as_str()));
        if !informative_shared {
            return Ok(false);
        }

        if self.directed(c1, p1, c2, p2, out).await? {
            return Ok(true);
        }
        if both_directions && self.directed(c2, p2, c1, p1, out).await? {
            return Ok(true);
        }
        Ok(false)
    }

    async fn directed(
        &self,
        hyponym_id: ConceptId,
        hyponym: &ScoredConcept,
        hypernym_id: ConceptId,
        hypernym: &ScoredConcept,
        out: &mut Vec<Relation>,
    ) -> Result<bool> {
        if !self.oracle.is_a(&hyponym.cui, &hypernym.cui).await? {
            return Ok(false);
        }
        if !geo_filter_passes(hyponym, hypernym) {
            return Ok(false);
        }

        out.push(Relation::hypernym(hyponym_id, hypernym_id));
        Ok(true)
    }
}

/// Between two geographic areas, only canonical place kinds may act as the
/// hypernym; everything else passes unfiltered.
fn geo_filter_passes(hyponym: &ScoredConcept, hypernym: &ScoredConcept) -> bool {
    if !hyponym.has_semtype(GEO_SEMTYPE) || !hypernym.has_semtype(GEO_SEMTYPE) {
        return true;
    }
    hypernym
        .final_name_token()
        .is_some_and(|t| GEO_HYPERNYM_NAMES.contains(&t.as_str()))
}

/// Classify the token span strictly between two NPs.
///
/// A lone bracket is classified parenthetical before the appositive bracket
/// test could see it: an unmatched bracket means the second NP lives inside
/// a parenthesis opened against the first.
pub fn classify_intervening(
    phrase: &[Token],
    after: Option<&Token>,
    next_chunk: &Chunk,
) -> Option<InterveningPhrase> {
    if is_appositive(phrase, after) {
        return Some(InterveningPhrase::Appositive);
    }
    if !has_balanced_brackets(phrase) {
        return Some(InterveningPhrase::Parenthetical);
    }
    if is_copular(phrase) {
        return Some(InterveningPhrase::Copular);
    }
    if is_other_coordination(phrase, next_chunk) {
        return Some(InterveningPhrase::Other);
    }
    None
}

fn is_appositive(phrase: &[Token], after: Option<&Token>) -> bool {
    if phrase.len() == 1
        && phrase[0].text == ","
        && after.is_some_and(|t| t.is_punctuation())
    {
        return true;
    }

    let text = phrase
        .iter()
        .map(|t| t.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    APPOSITIVE_MARKERS.contains(&text.as_str())
}

/// Stack match over `(){}[]`; any leftover or mismatch is unbalanced.
fn has_balanced_brackets(phrase: &[Token]) -> bool {
    let mut stack = Vec::new();
    for c in phrase.iter().flat_map(|t| t.text.chars()) {
        match c {
            '(' | '{' | '[' => stack.push(c),
            ')' | '}' | ']' => {
                let expected = match c {
                    ')' => '(',
                    '}' => '{',
                    _ => '[',
                };
                if stack.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

fn is_copular(phrase: &[Token]) -> bool {
    for (i, token) in phrase.iter().enumerate() {
        if !token.tag.starts_with("VB") {
            continue;
        }
        if token.lemma == "remain" {
            return true;
        }
        if token.lemma == "be" {
            match phrase.get(i + 1) {
                // trailing bare "be"
                None => return true,
                Some(next) if next.tag != "VBN" => return true,
                // "be <participle> as" marks renaming and plain
                // "be <participle>" is passive voice; neither qualifies
                Some(_) => {}
            }
        }
    }
    false
}

fn is_other_coordination(phrase: &[Token], next_chunk: &Chunk) -> bool {
    if phrase.len() != 1 {
        return false;
    }
    let text = phrase[0].text.to_lowercase();
    if text != "and" && text != "or" {
        return false;
    }
    next_chunk
        .leftmost_modifier()
        .is_some_and(|w| w.text.eq_ignore_ascii_case("other"))
}

// ============================================================================
// Tests
// ============================================================================
