//! Ontology triple table
//!
//! The ontology of allowed `(semantic type, relation, semantic type)` triples
//! is loaded once from a pipe-delimited flat file and answers membership
//! queries only. It is shared read-only across the whole run.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::{RelexError, Result};

/// In-memory set of allowed `"semtype-relation-semtype"` triples.
#[derive(Debug, Clone, Default)]
pub struct OntologyIndex {
    triples: HashSet<String>,
}

impl OntologyIndex {
    /// Load the table from a pipe-delimited flat file.
    ///
    /// The first field of each row is the triple string; remaining fields are
    /// ignored. Blank lines are skipped. An empty table is an error: the
    /// relational analyzer would silently verify nothing against it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut triples = HashSet::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let triple = line.split('|').next().unwrap_or_default().trim();
            if !triple.is_empty() {
                triples.insert(triple.to_string());
            }
        }

        if triples.is_empty() {
            return Err(RelexError::Ontology(format!(
                "no triples loaded from {}",
                path.display()
            )));
        }

        info!(triples = triples.len(), path = %path.display(), "ontology table loaded");
        Ok(Self { triples })
    }

    /// Build a table from triple strings directly (used by tests and stubs).
    pub fn from_triples<I, S>(triples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            triples: triples.into_iter().map(Into::into).collect(),
        }
    }

    /// True if `subject_type --relation--> object_type` is an allowed triple.
    pub fn contains(&self, subject_type: &str, relation: &str, object_type: &str) -> bool {
        let key = format!("{subject_type}-{relation}-{object_type}");
        self.triples.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}
