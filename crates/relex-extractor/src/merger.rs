//! Concept Merger
//!
//! Fuses the per-source concept annotations into a single non-overlapping
//! concept set. Candidate spans are bucketed by length and processed longest
//! first; within a bucket spans are visited in start order, and a candidate
//! is accepted only when it overlaps no previously accepted span. Two
//! sources proposing the identical span are not a conflict: their candidate
//! lists merge onto one concept record. No other priority is consulted.

use std::collections::BTreeMap;

use tracing::debug;

use relex_core::{
    Concept, RelexError, Result, ScoredConcept, SourceSpans, Span, TaggedSentence,
};

/// Merge per-source annotations into disjoint concepts.
///
/// `sources` must be in configured source order; that order decides which
/// source's candidates come first on records shared by several sources, and
/// with it the concept's primary candidate.
pub fn merge_annotations(sources: &[(String, SourceSpans)]) -> Vec<Concept> {
    // bucket: length -> span -> per-source candidate lists (source order)
    let mut buckets: BTreeMap<usize, BTreeMap<Span, Vec<(String, Vec<ScoredConcept>)>>> =
        BTreeMap::new();

    for (source, spans) in sources {
        for (&(start, length), concepts) in spans {
            if length == 0 || concepts.is_empty() {
                debug!(source, start, length, "skipping empty candidate record");
                continue;
            }
            buckets
                .entry(length)
                .or_default()
                .entry(Span::new(start, start + length))
                .or_default()
                .push((source.clone(), concepts.clone()));
        }
    }

    let mut accepted: Vec<Concept> = Vec::new();
    for (_, spans) in buckets.iter().rev() {
        for (span, per_source) in spans {
            if accepted.iter().any(|c| c.span.overlaps(span)) {
                continue;
            }
            let mut concept = Concept::new(*span);
            for (source, concepts) in per_source {
                concept.add_source(source.clone(), concepts.clone());
            }
            accepted.push(concept);
        }
    }

    // document order for everything downstream
    accepted.sort_by_key(|c| c.span);
    accepted
}

/// Map each merged concept's character span back to token offsets over the
/// document token stream.
///
/// A span that cannot be located inside any token is a typed error; the
/// merge result would otherwise silently detach that concept from the text.
pub fn align_to_tokens(concepts: &mut [Concept], sentences: &[TaggedSentence]) -> Result<()> {
    let tokens: Vec<_> = sentences.iter().flat_map(|s| s.tokens.iter()).collect();

    for concept in concepts {
        let span = concept.span;
        let start_token = tokens
            .iter()
            .rposition(|t| t.offset <= span.start)
            .ok_or(RelexError::SpanAlignment {
                start: span.start,
                end: span.end,
            })?;
        if tokens[start_token].char_span().end <= span.start {
            // the span begins in the gap after the located token
            return Err(RelexError::SpanAlignment {
                start: span.start,
                end: span.end,
            });
        }

        let end_token = tokens
            .iter()
            .position(|t| t.offset >= span.end)
            .unwrap_or(tokens.len());
        if end_token <= start_token {
            return Err(RelexError::SpanAlignment {
                start: span.start,
                end: span.end,
            });
        }

        concept.token_span = Span::new(start_token, end_token);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    use std::collections::BTreeSet;

    fn scored(cui: String) -> ScoredConcept {
        ScoredConcept {
            cui: cui.clone(),
            name: cui.clone(),
            concept_string: cui,
            score: 1.0,
            semtypes: vec!["dsyn".to_string()],
            semgroups: BTreeSet::from(["diso".to_string()]),
        }
    }

    proptest! {
        #[test]
        fn merged_spans_never_overlap(
            candidates in proptest::collection::vec((0usize..200, 1usize..30), 0..40)
        ) {
            let mut spans = SourceSpans::new();
            for (i, (start, length)) in candidates.iter().enumerate() {
                spans
                    .entry((*start, *length))
                    .or_default()
                    .push(scored(format!("C{i}")));
            }
            let merged = merge_annotations(&[("umls".to_string(), spans)]);

            for (i, a) in merged.iter().enumerate() {
                for b in merged.iter().skip(i + 1) {
                    prop_assert!(!a.span.overlaps(&b.span));
                }
            }
        }
    }
}
