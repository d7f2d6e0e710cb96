//! RELEX Clients - collaborator service transport and wire decoding
//!
//! Every collaborator (tagger, chunker, concept recognizers, hierarchy
//! oracle, lexicon) speaks a newline-terminated request/response protocol
//! over TCP. This crate wraps that transport in [`socket::LineClient`] and
//! implements the relex-core collaborator traits on top of it, one module
//! per service, each owning its wire-format decoder.

pub mod chunker;
pub mod gene;
pub mod hierarchy;
pub mod lexicon;
pub mod socket;
pub mod tagger;
pub mod umls;

pub use chunker::ChunkerClient;
pub use gene::GeneRecognizer;
pub use hierarchy::HierarchyClient;
pub use lexicon::LexiconClient;
pub use socket::LineClient;
pub use tagger::TaggerClient;
pub use umls::UmlsRecognizer;

use std::sync::Arc;

use relex_core::{ConceptRecognizer, ServerConfig, SourceKind};

/// Resolve the configured source set to concrete recognizer clients.
///
/// The source list is a closed enum decided at configuration time; this is
/// the only place a [`SourceKind`] maps to a transport.
pub fn build_recognizers(
    sources: &[SourceKind],
    servers: &ServerConfig,
) -> Vec<Arc<dyn ConceptRecognizer>> {
    sources
        .iter()
        .map(|kind| match kind {
            SourceKind::Gene => {
                Arc::new(GeneRecognizer::new(client_for(servers, servers.gene_port)))
                    as Arc<dyn ConceptRecognizer>
            }
            SourceKind::Umls => {
                Arc::new(UmlsRecognizer::new(client_for(servers, servers.umls_port)))
                    as Arc<dyn ConceptRecognizer>
            }
        })
        .collect()
}

/// A [`LineClient`] for one endpoint, honoring the configured timeout and
/// retry budget.
pub fn client_for(servers: &ServerConfig, port: u16) -> LineClient {
    LineClient::new(&servers.host, port)
        .with_timeout(std::time::Duration::from_secs(servers.timeout_secs))
        .with_retries(servers.retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_recognizers_resolves_sources_in_order() {
        let servers = ServerConfig::default();
        let recognizers =
            build_recognizers(&[SourceKind::Gene, SourceKind::Umls], &servers);

        assert_eq!(recognizers.len(), 2);
        assert_eq!(recognizers[0].name(), "gene");
        assert_eq!(recognizers[1].name(), "umls");
    }
}
