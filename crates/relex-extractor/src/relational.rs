//! Relational Analyzer
//!
//! Turns indicator matches into typed relations by pairing argument
//! concepts around the predicate word and verifying each candidate against
//! the ontology triple table. Every interpretation stops at its first
//! verified candidate: the search order (predicates in attachment order,
//! senses in declared order, pairs in order, semantic types in order) is the
//! contract, and later matches never override earlier emissions.

use relex_core::{
    ChunkLabel, Concept, ConceptId, IndicatorType, OntologyIndex, Relation, ScoredConcept,
};

use crate::harmonizer::{is_passive, Chunk, Sentence, Word};
use crate::indicator::{IndicatorId, IndicatorLexicon};

/// Implicit noun-compound categories, in fixed priority order. The flag
/// marks categories tested (and emitted) with the arguments swapped.
const MODHEAD_CATEGORIES: [(&str, bool); 5] = [
    ("process_of", false),
    ("uses", true),
    ("location_of", false),
    ("part_of", true),
    ("process_of", true),
];

/// Cue words that put a nominal argument in subject position.
const NOMINAL_SUBJECT_CUES: [&str; 3] = ["by", "with", "via"];

/// Cue words that put a nominal argument in object position.
const NOMINAL_OBJECT_CUES: [&str; 1] = ["of"];

/// Argument role a nominal cue word selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalRole {
    Subject,
    Object,
}

/// Role selected by a nominal cue word, if it is one.
pub fn nominal_candidate_role(cue: &str) -> Option<NominalRole> {
    if NOMINAL_SUBJECT_CUES.contains(&cue) {
        Some(NominalRole::Subject)
    } else if NOMINAL_OBJECT_CUES.contains(&cue) {
        Some(NominalRole::Object)
    } else {
        None
    }
}

/// One argument pairing: a subject candidate and an object candidate drawn
/// from the cross product of the two words' scored concepts, with the cue
/// word (if any) that introduced each argument.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub subject_id: ConceptId,
    pub subject: ScoredConcept,
    pub subject_cue: Option<String>,
    pub object_id: ConceptId,
    pub object: ScoredConcept,
    pub object_cue: Option<String>,
}

/// Indicator-driven relation extraction over one sentence.
pub struct RelationalAnalyzer<'a> {
    ontology: &'a OntologyIndex,
    lexicon: &'a IndicatorLexicon,
    concepts: &'a [Concept],
}

impl<'a> RelationalAnalyzer<'a> {
    pub fn new(
        ontology: &'a OntologyIndex,
        lexicon: &'a IndicatorLexicon,
        concepts: &'a [Concept],
    ) -> Self {
        Self {
            ontology,
            lexicon,
            concepts,
        }
    }

    /// Run all interpretations over one sentence in chunk/word order.
    pub fn analyze(&self, sentence: &Sentence, out: &mut Vec<Relation>) {
        for index in 0..sentence.chunks.len() {
            let chunk = &sentence.chunks[index];

            if chunk.label == ChunkLabel::Np {
                self.noun_compound(chunk, out);
            }

            for word in &chunk.words {
                if word.indicators.is_empty() {
                    continue;
                }
                let predicates = word.indicators.as_slice();
                match chunk.label {
                    ChunkLabel::Vp => {
                        let passive = is_passive(sentence, index);
                        self.verbal(sentence, index, predicates, passive, IndicatorType::Verb, out);
                    }
                    ChunkLabel::Adjp => self.verbal(
                        sentence,
                        index,
                        predicates,
                        false,
                        IndicatorType::Adjective,
                        out,
                    ),
                    ChunkLabel::Pp => self.prepositional(sentence, index, predicates, out),
                    ChunkLabel::Np => self.nominal(sentence, index, predicates, out),
                    ChunkLabel::Advp => {}
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Interpretations
    // ------------------------------------------------------------------

    /// Implicit relation between a modifier and the word to its right inside
    /// an NP. Scans right to left and stops at the first chunk-level success.
    fn noun_compound(&self, chunk: &Chunk, out: &mut Vec<Relation>) -> bool {
        for w in (1..chunk.words.len()).rev() {
            let word = &chunk.words[w];
            if word.chunk_role.is_none() || word.concept.is_none() {
                continue;
            }
            let left = &chunk.words[w - 1];
            if !left.is_modifier() || left.concept.is_none() {
                continue;
            }

            let pairs = self.generate_pairs(left, None, word, None);
            if self.verify_and_generate(None, &pairs, IndicatorType::ModHead, out) {
                return true;
            }
        }
        false
    }

    /// Verbal (and adjectival) interpretation: alternate a bounded search
    /// over the nearest following concept-bearing NPs, walking backward
    /// through the preceding NPs for each. Argument roles flip under passive
    /// voice. First success ends the whole search.
    fn verbal(
        &self,
        sentence: &Sentence,
        chunk_index: usize,
        predicates: &[IndicatorId],
        passive: bool,
        indicator_type: IndicatorType,
        out: &mut Vec<Relation>,
    ) {
        let first_prev = sentence.prev_chunk_of(ChunkLabel::Np, chunk_index);
        let mut next = sentence.next_concept_bearing_np(chunk_index);

        while let Some(n) = next {
            let right = sentence.chunks[n].head_word();
            let cue = argument_cue(sentence, n);

            if right.concept.is_some() {
                let mut prev = first_prev;
                while let Some(p) = prev {
                    let left = sentence.chunks[p].head_word();
                    if left.concept.is_some() {
                        let pairs = if passive {
                            self.generate_pairs(right, cue.as_deref(), left, None)
                        } else {
                            self.generate_pairs(left, None, right, cue.as_deref())
                        };
                        if self.verify_and_generate(Some(predicates), &pairs, indicator_type, out)
                        {
                            return;
                        }
                    }
                    prev = sentence.prev_chunk_of(ChunkLabel::Np, p);
                }
            }

            next = sentence.next_concept_bearing_np(n);
        }
    }

    /// Prepositional interpretation: single hop around the PP chunk, no
    /// passive flip, no multi-hop loop.
    fn prepositional(
        &self,
        sentence: &Sentence,
        chunk_index: usize,
        predicates: &[IndicatorId],
        out: &mut Vec<Relation>,
    ) {
        let Some(p) = sentence.prev_chunk_of(ChunkLabel::Np, chunk_index) else {
            return;
        };
        let Some(n) = sentence.next_concept_bearing_np(chunk_index) else {
            return;
        };

        let left = sentence.chunks[p].head_word();
        let right = sentence.chunks[n].head_word();
        let pairs = self.generate_pairs(left, None, right, None);
        self.verify_and_generate(Some(predicates), &pairs, IndicatorType::Preposition, out);
    }

    /// Nominal interpretation: cue words on following PP chunks decide which
    /// argument is subject and which is object. The subject falls back to
    /// the nearest preceding NP when no subject-cue PP exists.
    fn nominal(
        &self,
        sentence: &Sentence,
        chunk_index: usize,
        predicates: &[IndicatorId],
        out: &mut Vec<Relation>,
    ) {
        let mut subject: Option<(usize, String)> = None;
        let mut object: Option<(usize, String)> = None;

        for k in chunk_index + 1..sentence.chunks.len() {
            if subject.is_some() && object.is_some() {
                break;
            }
            if sentence.chunks[k].label != ChunkLabel::Pp {
                continue;
            }
            let cue = sentence.chunks[k].head_word().text.to_lowercase();
            let Some(role) = nominal_candidate_role(&cue) else {
                continue;
            };
            // the cue governs the NP directly after it
            if k + 1 >= sentence.chunks.len()
                || sentence.chunks[k + 1].label != ChunkLabel::Np
            {
                continue;
            }
            match role {
                NominalRole::Subject if subject.is_none() => subject = Some((k + 1, cue)),
                NominalRole::Object if object.is_none() => object = Some((k + 1, cue)),
                _ => {}
            }
        }

        let Some((object_np, object_cue)) = object else {
            return;
        };
        let object_word = sentence.chunks[object_np].head_word();

        let (subject_word, subject_cue) = match subject {
            Some((np, cue)) => (sentence.chunks[np].head_word(), Some(cue)),
            None => {
                let Some(p) = sentence.prev_chunk_of(ChunkLabel::Np, chunk_index) else {
                    return;
                };
                (sentence.chunks[p].head_word(), None)
            }
        };

        let pairs = self.generate_pairs(
            subject_word,
            subject_cue.as_deref(),
            object_word,
            Some(&object_cue),
        );
        self.verify_and_generate(Some(predicates), &pairs, IndicatorType::Nominal, out);
    }

    // ------------------------------------------------------------------
    // Candidate generation and verification
    // ------------------------------------------------------------------

    /// Cross product of the two argument words' scored concepts. Words
    /// without a concept contribute nothing (abstain, not an error).
    pub fn generate_pairs(
        &self,
        subject: &Word,
        subject_cue: Option<&str>,
        object: &Word,
        object_cue: Option<&str>,
    ) -> Vec<CandidatePair> {
        let (Some(subject_id), Some(object_id)) = (subject.concept, object.concept) else {
            return Vec::new();
        };

        let mut pairs = Vec::new();
        for s in self.concepts[subject_id.0].scored() {
            for o in self.concepts[object_id.0].scored() {
                pairs.push(CandidatePair {
                    subject_id,
                    subject: s.clone(),
                    subject_cue: subject_cue.map(str::to_string),
                    object_id,
                    object: o.clone(),
                    object_cue: object_cue.map(str::to_string),
                });
            }
        }
        pairs
    }

    /// Verify candidate pairs and emit the first allowed relation.
    ///
    /// With `predicates = None` the fixed noun-compound category list is
    /// searched instead; the first category any pair satisfies wins, and the
    /// emitted relation is oriented by that category's inverse flag.
    pub fn verify_and_generate(
        &self,
        predicates: Option<&[IndicatorId]>,
        pairs: &[CandidatePair],
        indicator_type: IndicatorType,
        out: &mut Vec<Relation>,
    ) -> bool {
        match predicates {
            None => self.verify_implicit(pairs, indicator_type, out),
            Some(predicates) => self.verify_predicates(predicates, pairs, indicator_type, out),
        }
    }

    fn verify_implicit(
        &self,
        pairs: &[CandidatePair],
        indicator_type: IndicatorType,
        out: &mut Vec<Relation>,
    ) -> bool {
        for (category, inverse) in MODHEAD_CATEGORIES {
            for pair in pairs {
                let allowed = if inverse {
                    self.types_allow(&pair.object, category, &pair.subject)
                } else {
                    self.types_allow(&pair.subject, category, &pair.object)
                };
                if allowed {
                    let relation = if inverse {
                        Relation::new(pair.object_id, category, pair.subject_id, indicator_type)
                    } else {
                        Relation::new(pair.subject_id, category, pair.object_id, indicator_type)
                    };
                    out.push(relation);
                    return true;
                }
            }
        }
        false
    }

    fn verify_predicates(
        &self,
        predicates: &[IndicatorId],
        pairs: &[CandidatePair],
        indicator_type: IndicatorType,
        out: &mut Vec<Relation>,
    ) -> bool {
        for &predicate in predicates {
            let indicator = self.lexicon.get(predicate);
            for sense in &indicator.senses {
                for pair in pairs {
                    let found = if sense.inverse {
                        cue_satisfied(
                            sense.cue.as_deref(),
                            pair.subject_cue.as_deref(),
                            pair.object_cue.as_deref(),
                        ) && self.types_allow(&pair.object, &sense.category, &pair.subject)
                    } else {
                        cue_satisfied(
                            sense.cue.as_deref(),
                            pair.object_cue.as_deref(),
                            pair.subject_cue.as_deref(),
                        ) && self.types_allow(&pair.subject, &sense.category, &pair.object)
                    };
                    if found {
                        let relation = if sense.inverse {
                            Relation::new(
                                pair.object_id,
                                &sense.category,
                                pair.subject_id,
                                indicator_type,
                            )
                        } else {
                            Relation::new(
                                pair.subject_id,
                                &sense.category,
                                pair.object_id,
                                indicator_type,
                            )
                        };
                        out.push(relation);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Test every (subject semtype, object semtype) combination against the
    /// ontology table, in declared order.
    fn types_allow(&self, subject: &ScoredConcept, category: &str, object: &ScoredConcept) -> bool {
        subject.semtypes.iter().any(|s| {
            object
                .semtypes
                .iter()
                .any(|o| self.ontology.contains(s, category, o))
        })
    }
}

/// Cue word introducing an argument NP: the head of the PP chunk directly
/// before it, when the two chunks are adjacent.
fn argument_cue(sentence: &Sentence, np_index: usize) -> Option<String> {
    if np_index == 0 {
        return None;
    }
    let pp = &sentence.chunks[np_index - 1];
    if pp.label == ChunkLabel::Pp && pp.tokens.end == sentence.chunks[np_index].tokens.start {
        Some(pp.head_word().text.to_lowercase())
    } else {
        None
    }
}

/// Decode a sense cue against the pair's argument cues.
///
/// A hyphen splits `"object_cue-subject_cue"`; otherwise the cue constrains
/// the object side only. A side with a declared cue must match it; a sense
/// with no cue requires a cue-less object.
fn cue_satisfied(
    sense_cue: Option<&str>,
    object_cue: Option<&str>,
    subject_cue: Option<&str>,
) -> bool {
    match sense_cue {
        None => object_cue.is_none(),
        Some(cue) => match cue.split_once('-') {
            Some((object_required, subject_required)) => {
                cue_eq(object_required, object_cue) && cue_eq(subject_required, subject_cue)
            }
            None => cue_eq(cue, object_cue),
        },
    }
}

fn cue_eq(required: &str, actual: Option<&str>) -> bool {
    actual.is_some_and(|a| a.eq_ignore_ascii_case(required))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use relex_core::{ChunkSpan, Span, TaggedSentence, Token};

    use crate::harmonizer::harmonize_sentence;
    use crate::indicator::IndicatorLexicon;

    fn scored(cui: &str, semtypes: &[&str]) -> ScoredConcept {
        ScoredConcept {
            cui: cui.to_string(),
            name: cui.to_string(),
            concept_string: cui.to_string(),
            score: 900.0,
            semtypes: semtypes.iter().map(|s| s.to_string()).collect(),
            semgroups: BTreeSet::from(["any".to_string()]),
        }
    }

    /// Concept over document-global token span with one candidate.
    fn concept_at(tokens: (usize, usize), cui: &str, semtypes: &[&str]) -> Concept {
        let mut c = Concept::new(Span::new(tokens.0 * 10, tokens.1 * 10));
        c.token_span = Span::new(tokens.0, tokens.1);
        c.add_source("umls", vec![scored(cui, semtypes)]);
        c
    }

    fn tagged(specs: &[(&str, &str, &str)]) -> TaggedSentence {
        let mut offset = 0;
        let mut tokens = Vec::new();
        for (text, lemma, tag) in specs {
            tokens.push(Token::new(*text, *lemma, *tag, offset));
            offset += text.len() + 1;
        }
        TaggedSentence::from_tokens(tokens)
    }

    fn chunk(label: ChunkLabel, range: (usize, usize)) -> ChunkSpan {
        ChunkSpan::new(label, Span::new(range.0, range.1))
    }

    const TREAT_RULES: &str = r#"
        <SRIndicators>
            <SRIndicator string="treat" gapType="none" type="l" verified="true">
                <Lexeme lemma="treat" pos="VB"/>
                <SemInfo category="treats" cue="" inverse="false" negated="false"/>
            </SRIndicator>
            <SRIndicator string="treatment" gapType="none" type="l" verified="true">
                <Lexeme lemma="treatment" pos="NN"/>
                <SemInfo category="treats" cue="of-with" inverse="false" negated="false"/>
            </SRIndicator>
            <SRIndicator string="of" gapType="none" type="l" verified="true">
                <Lexeme lemma="of" pos="IN"/>
                <SemInfo category="part_of" cue="" inverse="false" negated="false"/>
            </SRIndicator>
        </SRIndicators>
    "#;

    fn analyze(
        specs: &[(&str, &str, &str)],
        chunk_spans: &[ChunkSpan],
        concepts: &[Concept],
        ontology: &OntologyIndex,
        lexicon: &IndicatorLexicon,
    ) -> Vec<Relation> {
        let mut sentence = harmonize_sentence(0, 0, &tagged(specs), chunk_spans, concepts, &[]);
        lexicon.annotate(std::slice::from_mut(&mut sentence));

        let analyzer = RelationalAnalyzer::new(ontology, lexicon, concepts);
        let mut out = Vec::new();
        analyzer.analyze(&sentence, &mut out);
        out
    }

    #[test]
    fn test_noun_compound_priority_order() {
        // both process_of and location_of would verify; the fixed priority
        // list must pick process_of
        let concepts = vec![
            concept_at((0, 1), "C1", &["bact"]),
            concept_at((1, 2), "C2", &["hlca"]),
        ];
        let ontology = OntologyIndex::from_triples([
            "bact-process_of-hlca",
            "bact-location_of-hlca",
        ]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[("bacterial", "bacterial", "JJ"), ("screening", "screening", "NN")],
            &[chunk(ChunkLabel::Np, (0, 2))],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].predicate, "process_of");
        assert_eq!(out[0].subject, ConceptId(0));
        assert_eq!(out[0].object, ConceptId(1));
        assert_eq!(out[0].indicator, Some(IndicatorType::ModHead));
    }

    #[test]
    fn test_noun_compound_inverse_orientation() {
        // only the inverse "uses" category verifies: right type uses left type
        let concepts = vec![
            concept_at((0, 1), "C1", &["topp"]),
            concept_at((1, 2), "C2", &["hlca"]),
        ];
        let ontology = OntologyIndex::from_triples(["hlca-uses-topp"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[("laser", "laser", "NN"), ("surgery", "surgery", "NN")],
            &[chunk(ChunkLabel::Np, (0, 2))],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].predicate, "uses");
        // orientation follows the inverse flag: head uses modifier
        assert_eq!(out[0].subject, ConceptId(1));
        assert_eq!(out[0].object, ConceptId(0));
    }

    #[test]
    fn test_verbal_active_voice() {
        let concepts = vec![
            concept_at((0, 1), "C_ASP", &["phsu"]),
            concept_at((2, 3), "C_HA", &["dsyn"]),
        ];
        let ontology = OntologyIndex::from_triples(["phsu-treats-dsyn"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[
                ("Aspirin", "aspirin", "NN"),
                ("treats", "treat", "VBZ"),
                ("headaches", "headache", "NNS"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Vp, (1, 2)),
                chunk(ChunkLabel::Np, (2, 3)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, ConceptId(0));
        assert_eq!(out[0].predicate, "treats");
        assert_eq!(out[0].object, ConceptId(1));
        assert_eq!(out[0].indicator, Some(IndicatorType::Verb));
    }

    #[test]
    fn test_verbal_passive_flips_roles() {
        let concepts = vec![
            concept_at((0, 1), "C_HA", &["dsyn"]),
            concept_at((4, 5), "C_ASP", &["phsu"]),
        ];
        let ontology = OntologyIndex::from_triples(["phsu-treats-dsyn"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[
                ("Headaches", "headache", "NNS"),
                ("are", "be", "VBP"),
                ("treated", "treat", "VBN"),
                ("by", "by", "IN"),
                ("aspirin", "aspirin", "NN"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Vp, (1, 3)),
                chunk(ChunkLabel::Pp, (3, 4)),
                chunk(ChunkLabel::Np, (4, 5)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
        // aspirin is the subject despite following the verb
        assert_eq!(out[0].subject, ConceptId(1));
        assert_eq!(out[0].object, ConceptId(0));
        assert_eq!(out[0].predicate, "treats");
    }

    #[test]
    fn test_verbal_abstains_without_concepts() {
        let concepts = vec![concept_at((0, 1), "C_ASP", &["phsu"])];
        let ontology = OntologyIndex::from_triples(["phsu-treats-dsyn"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        // object NP has no concept: abstain, no error, no relation
        let out = analyze(
            &[
                ("Aspirin", "aspirin", "NN"),
                ("treats", "treat", "VBZ"),
                ("discomfort", "discomfort", "NN"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Vp, (1, 2)),
                chunk(ChunkLabel::Np, (2, 3)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn test_prepositional_single_hop() {
        let concepts = vec![
            concept_at((0, 1), "C_MEM", &["celc"]),
            concept_at((2, 3), "C_CELL", &["cell"]),
        ];
        let ontology = OntologyIndex::from_triples(["celc-part_of-cell"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[
                ("membrane", "membrane", "NN"),
                ("of", "of", "IN"),
                ("neurons", "neuron", "NNS"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Pp, (1, 2)),
                chunk(ChunkLabel::Np, (2, 3)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].predicate, "part_of");
        assert_eq!(out[0].indicator, Some(IndicatorType::Preposition));
    }

    #[test]
    fn test_nominal_with_cued_arguments() {
        // "treatment of headaches with aspirin": the cue words assign
        // aspirin ("with") to subject position and headaches ("of") to
        // object position, and the sense cue "of-with" confirms both sides
        let concepts = vec![
            concept_at((2, 3), "C_HA", &["dsyn"]),
            concept_at((4, 5), "C_ASP", &["phsu"]),
        ];
        let ontology = OntologyIndex::from_triples(["phsu-treats-dsyn"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[
                ("treatment", "treatment", "NN"),
                ("of", "of", "IN"),
                ("headaches", "headache", "NNS"),
                ("with", "with", "IN"),
                ("aspirin", "aspirin", "NN"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Pp, (1, 2)),
                chunk(ChunkLabel::Np, (2, 3)),
                chunk(ChunkLabel::Pp, (3, 4)),
                chunk(ChunkLabel::Np, (4, 5)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        // the "of" preposition itself also triggers; the nominal reading
        // comes from the "treatment" word in the first NP
        let nominal: Vec<_> = out
            .iter()
            .filter(|r| r.indicator == Some(IndicatorType::Nominal))
            .collect();
        assert_eq!(nominal.len(), 1);
        assert_eq!(nominal[0].predicate, "treats");
        assert_eq!(nominal[0].subject, ConceptId(1));
        assert_eq!(nominal[0].object, ConceptId(0));
    }

    #[test]
    fn test_cue_decode() {
        assert!(cue_satisfied(None, None, None));
        assert!(!cue_satisfied(None, Some("of"), None));
        assert!(cue_satisfied(Some("of"), Some("of"), None));
        assert!(!cue_satisfied(Some("of"), None, None));
        assert!(cue_satisfied(Some("of-with"), Some("of"), Some("with")));
        assert!(!cue_satisfied(Some("of-with"), Some("of"), None));
        assert!(!cue_satisfied(Some("of-with"), Some("with"), Some("of")));
    }

    #[test]
    fn test_nominal_candidate_role() {
        assert_eq!(nominal_candidate_role("by"), Some(NominalRole::Subject));
        assert_eq!(nominal_candidate_role("with"), Some(NominalRole::Subject));
        assert_eq!(nominal_candidate_role("via"), Some(NominalRole::Subject));
        assert_eq!(nominal_candidate_role("of"), Some(NominalRole::Object));
        assert_eq!(nominal_candidate_role("under"), None);
    }

    #[test]
    fn test_first_success_stops_search() {
        // two candidate triples verify; only the first pair in order emits
        let mut c1 = Concept::new(Span::new(0, 10));
        c1.token_span = Span::new(0, 1);
        c1.add_source("umls", vec![scored("C_A1", &["phsu"]), scored("C_A2", &["orch"])]);
        let concepts = vec![c1, concept_at((2, 3), "C_B", &["dsyn"])];

        let ontology =
            OntologyIndex::from_triples(["phsu-treats-dsyn", "orch-treats-dsyn"]);
        let lexicon = IndicatorLexicon::from_xml(TREAT_RULES).unwrap();

        let out = analyze(
            &[
                ("Aspirin", "aspirin", "NN"),
                ("treats", "treat", "VBZ"),
                ("headaches", "headache", "NNS"),
            ],
            &[
                chunk(ChunkLabel::Np, (0, 1)),
                chunk(ChunkLabel::Vp, (1, 2)),
                chunk(ChunkLabel::Np, (2, 3)),
            ],
            &concepts,
            &ontology,
            &lexicon,
        );

        assert_eq!(out.len(), 1);
    }
}
