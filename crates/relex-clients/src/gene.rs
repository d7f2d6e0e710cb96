//! Gene recognizer client
//!
//! The gene tagger replies with one TSV record per mention:
//! `start<TAB>end<TAB>id<TAB>name<TAB>type`. Only `Gene` records are kept;
//! family names and other mention types are discarded. Gene mentions carry
//! the fixed `gngm` semantic type so the relational analyzer can verify them
//! against the ontology table.

use std::collections::BTreeSet;

use tracing::debug;

use relex_core::{ConceptRecognizer, RelexError, Result, ScoredConcept, SourceSpans};

use crate::socket::LineClient;

const SOURCE_NAME: &str = "gene";
const GENE_SEMTYPE: &str = "gngm";
const GENE_SEMGROUP: &str = "gene";

/// Client for the gene/protein tagger service.
pub struct GeneRecognizer {
    client: LineClient,
}

impl GeneRecognizer {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ConceptRecognizer for GeneRecognizer {
    async fn annotate(&self, text: &str) -> Result<SourceSpans> {
        let response = self
            .client
            .request(text)
            .await
            .map_err(|e| RelexError::Recognizer {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(parse_gene_records(&response))
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

/// Decode the TSV response. Malformed records are skipped, not fatal.
pub fn parse_gene_records(response: &str) -> SourceSpans {
    let mut spans = SourceSpans::new();

    for line in response.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            debug!(record = line, "skipping short gene record");
            continue;
        }
        if fields[4] != "Gene" {
            continue;
        }

        let (Ok(start), Ok(end)) = (fields[0].parse::<usize>(), fields[1].parse::<usize>())
        else {
            debug!(record = line, "skipping gene record with bad offsets");
            continue;
        };
        if end <= start || fields[2].is_empty() {
            debug!(record = line, "skipping empty gene record");
            continue;
        }

        let concept = ScoredConcept {
            cui: fields[2].to_string(),
            name: fields[3].to_string(),
            concept_string: fields[3].to_string(),
            score: 1000.0,
            semtypes: vec![GENE_SEMTYPE.to_string()],
            semgroups: BTreeSet::from([GENE_SEMGROUP.to_string()]),
        };

        spans
            .entry((start, end - start))
            .or_insert_with(Vec::new)
            .push(concept);
    }

    spans
}
