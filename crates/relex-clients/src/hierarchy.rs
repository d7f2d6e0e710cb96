//! Hierarchy oracle client
//!
//! The hierarchy service answers ancestry queries: the request is the two
//! CUIs concatenated, the response is the literal `true` or `false`.

use relex_core::{HierarchyOracle, RelexError, Result};

use crate::socket::LineClient;

/// Client for the "is-a" hierarchy oracle.
pub struct HierarchyClient {
    client: LineClient,
}

impl HierarchyClient {
    pub fn new(client: LineClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HierarchyOracle for HierarchyClient {
    async fn is_a(&self, child: &str, ancestor: &str) -> Result<bool> {
        let query = format!("{child}{ancestor}");
        let response = self
            .client
            .request(&query)
            .await
            .map_err(|e| RelexError::Oracle(e.to_string()))?;

        match response.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(RelexError::Oracle(format!(
                "unexpected reply '{other}' for query {query}"
            ))),
        }
    }
}
