//! Chunker client
//!
//! The chunker service takes one sentence as space-joined `text_TAG` pairs
//! and replies with a bracketed chunk string, e.g.
//! `[NP Analgesic_JJ aspirin_NN] [VP treats_VBZ] [NP headaches_NNS] ._.`.
//! Tokens outside brackets are unchunked; bracket groups with labels outside
//! the known set still consume their tokens but produce no chunk.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use relex_core::{ChunkLabel, ChunkSpan, Chunker, RelexError, Result, Span, Token};

use crate::socket::LineClient;

fn chunk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[([A-Z]+)([^\[\]]*)\]|([^\s\[\]]+)").expect("chunk pattern is valid")
    })
}

/// Client for the phrase chunker service.
pub struct ChunkerClient {
    client: LineClient,
}

impl ChunkerClient {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Chunker for ChunkerClient {
    async fn chunk(&self, tokens: &[Token]) -> Result<Vec<ChunkSpan>> {
        let request = tokens
            .iter()
            .map(|t| format!("{}_{}", t.text, t.tag))
            .collect::<Vec<_>>()
            .join(" ");

        let response = self
            .client
            .request(&request)
            .await
            .map_err(|e| RelexError::Chunker(e.to_string()))?;

        Ok(parse_chunk_string(&response))
    }
}

/// Decode the bracketed chunk string into sentence-local token ranges.
pub fn parse_chunk_string(response: &str) -> Vec<ChunkSpan> {
    let mut chunks = Vec::new();
    let mut token_index = 0usize;

    for capture in chunk_pattern().captures_iter(response) {
        if let (Some(label), Some(body)) = (capture.get(1), capture.get(2)) {
            let count = body.as_str().split_whitespace().count();
            if count == 0 {
                continue;
            }
            let span = Span::new(token_index, token_index + count);
            token_index += count;

            match ChunkLabel::from_str(label.as_str()) {
                Some(label) => chunks.push(ChunkSpan::new(label, span)),
                None => debug!(label = label.as_str(), "ignoring unknown chunk label"),
            }
        } else {
            // bare token outside any bracket group
            token_index += 1;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_string() {
        let response = "[NP Analgesic_JJ aspirin_NN] [VP treats_VBZ] [NP headaches_NNS] ._.";
        let chunks = parse_chunk_string(response);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].label, ChunkLabel::Np);
        assert_eq!(chunks[0].tokens, Span::new(0, 2));
        assert_eq!(chunks[1].label, ChunkLabel::Vp);
        assert_eq!(chunks[1].tokens, Span::new(2, 3));
        assert_eq!(chunks[2].tokens, Span::new(3, 4));
    }

    #[test]
    fn test_parse_advances_past_unchunked_tokens() {
        let response = "[NP Patients_NNS] however_RB ,_, [VP take_VBP] [NP aspirin_NN]";
        let chunks = parse_chunk_string(response);

        assert_eq!(chunks.len(), 3);
        // the two unchunked tokens shift later ranges
        assert_eq!(chunks[1].tokens, Span::new(3, 4));
        assert_eq!(chunks[2].tokens, Span::new(4, 5));
    }

    #[test]
    fn test_parse_ignores_unknown_labels_but_counts_tokens() {
        let response = "[SBAR that_IN] [NP aspirin_NN]";
        let chunks = parse_chunk_string(response);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].label, ChunkLabel::Np);
        assert_eq!(chunks[0].tokens, Span::new(1, 2));
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_chunk_string("").is_empty());
    }
}
