//! Lexicon lookup client
//!
//! The lexicon service maps a surface string to a small set of records,
//! one per line, pipe-delimited: `base|eui|category`. An empty response
//! means the string is unknown to the lexicon.

use tracing::debug;

use relex_core::{LexRecord, LexiconSource, RelexError, Result};

use crate::socket::LineClient;

/// Client for the lexicon lookup service.
pub struct LexiconClient {
    client: LineClient,
}

impl LexiconClient {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl LexiconSource for LexiconClient {
    async fn lookup(&self, text: &str) -> Result<Vec<LexRecord>> {
        let response = self
            .client
            .request(text)
            .await
            .map_err(|e| RelexError::Lexicon(e.to_string()))?;

        Ok(parse_lex_records(&response))
    }
}

/// Decode the pipe-delimited response. Malformed lines are skipped.
pub fn parse_lex_records(response: &str) -> Vec<LexRecord> {
    let mut records = Vec::new();

    for line in response.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('|');
        let (Some(base), Some(eui), Some(category)) =
            (fields.next(), fields.next(), fields.next())
        else {
            debug!(record = line, "skipping short lexicon record");
            continue;
        };
        if base.is_empty() || category.is_empty() {
            debug!(record = line, "skipping empty lexicon record");
            continue;
        }

        records.push(LexRecord {
            base: base.to_string(),
            eui: eui.to_string(),
            category: category.to_string(),
        });
    }

    records
}
