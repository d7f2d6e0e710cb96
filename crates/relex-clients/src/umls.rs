//! UMLS concept recognizer client
//!
//! The concept tagger replies with `;;`-separated records. Each record is a
//! `,,`-separated field list: the span as `start,,length`, then one or more
//! six-field candidate groups `cui,,name,,concept_string,,score,,semtypes,,
//! semgroups`, the two list fields `::`-separated. A malformed record (or a
//! malformed candidate group inside one) is skipped without failing the
//! document.

use std::collections::BTreeSet;

use tracing::debug;

use relex_core::{ConceptRecognizer, RelexError, Result, ScoredConcept, SourceSpans};

use crate::socket::LineClient;

const SOURCE_NAME: &str = "umls";
const CONCEPT_FIELDS: usize = 6;

/// Client for the UMLS concept tagger service.
pub struct UmlsRecognizer {
    client: LineClient,
}

impl UmlsRecognizer {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ConceptRecognizer for UmlsRecognizer {
    async fn annotate(&self, text: &str) -> Result<SourceSpans> {
        let response = self
            .client
            .request(text)
            .await
            .map_err(|e| RelexError::Recognizer {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(parse_umls_records(&response))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Decode the delimited response. Malformed records are skipped, not fatal.
pub fn parse_umls_records(response: &str) -> SourceSpans {
    let mut spans = SourceSpans::new();

    for record in response.split(";;") {
        let record = record.strip_suffix(",,").unwrap_or(record);
        if record.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.split(",,").collect();
        if fields.len() < 2 + CONCEPT_FIELDS {
            debug!(record, "skipping short concept record");
            continue;
        }

        let (Ok(start), Ok(length)) = (fields[0].parse::<usize>(), fields[1].parse::<usize>())
        else {
            debug!(record, "skipping concept record with bad span fields");
            continue;
        };
        if length == 0 {
            debug!(record, "skipping empty-span concept record");
            continue;
        }

        let mut concepts = Vec::new();
        for group in fields[2..].chunks(CONCEPT_FIELDS) {
            match parse_concept_group(group) {
                Some(concept) => concepts.push(concept),
                None => debug!(record, "skipping malformed candidate group"),
            }
        }
        if concepts.is_empty() {
            continue;
        }

        spans
            .entry((start, length))
            .or_insert_with(Vec::new)
            .extend(concepts);
    }

    spans
}

fn parse_concept_group(group: &[&str]) -> Option<ScoredConcept> {
    if group.len() < CONCEPT_FIELDS {
        return None;
    }

    let cui = group[0].trim();
    if cui.is_empty() {
        return None;
    }
    let score = group[3].trim().parse::<f32>().ok()?;

    let semtypes: Vec<String> = group[4]
        .split("::")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    let semgroups: BTreeSet<String> = group[5]
        .split("::")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Some(ScoredConcept {
        cui: cui.to_string(),
        name: group[1].to_string(),
        concept_string: group[2].to_string(),
        score,
        semtypes,
        semgroups,
    })
}
