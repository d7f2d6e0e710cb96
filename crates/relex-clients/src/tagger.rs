//! Tagger client
//!
//! The tagger service tokenizes, tags, lemmatizes, and sentence-splits a
//! document in one call. The response carries one token per line as
//! `text<TAB>lemma<TAB>tag<TAB>char_start`, with a blank line between
//! sentences.

use tracing::debug;

use relex_core::{RelexError, Result, TaggedSentence, Tagger, Token};

use crate::socket::LineClient;

/// Client for the tagger / sentence segmenter service.
pub struct TaggerClient {
    client: LineClient,
}

impl TaggerClient {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tagger for TaggerClient {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedSentence>> {
        let response = self
            .client
            .request(text)
            .await
            .map_err(|e| RelexError::Tagger(e.to_string()))?;

        Ok(parse_tagged_sentences(&response))
    }
}

/// Decode the token stream. Malformed token lines are skipped.
pub fn parse_tagged_sentences(response: &str) -> Vec<TaggedSentence> {
    let mut sentences = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();

    for line in response.lines() {
        if line.trim().is_empty() {
            if !tokens.is_empty() {
                sentences.push(TaggedSentence::from_tokens(std::mem::take(&mut tokens)));
            }
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            debug!(record = line, "skipping short token record");
            continue;
        }
        let Ok(offset) = fields[3].parse::<usize>() else {
            debug!(record = line, "skipping token record with bad offset");
            continue;
        };

        tokens.push(Token::new(fields[0], fields[1], fields[2], offset));
    }

    if !tokens.is_empty() {
        sentences.push(TaggedSentence::from_tokens(tokens));
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_sentences_on_blank_lines() {
        let response = "Aspirin\taspirin\tNN\t0\nworks\twork\tVBZ\t8\n.\t.\t.\t13\n\n\
                        It\tit\tPRP\t15\nhelps\thelp\tVBZ\t18\n";
        let sentences = parse_tagged_sentences(response);

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens.len(), 3);
        assert_eq!(sentences[0].tokens[1].lemma, "work");
        assert_eq!(sentences[1].tokens[0].tag, "PRP");
        assert_eq!(sentences[0].span.start, 0);
        assert_eq!(sentences[1].span.start, 15);
    }

    #[test]
    fn test_parse_skips_malformed_token_lines() {
        let response = "Aspirin\taspirin\tNN\t0\nbroken line\nworks\twork\tVBZ\tx\n";
        let sentences = parse_tagged_sentences(response);

        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].tokens.len(), 1);
    }
}
