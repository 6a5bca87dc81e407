//! Europe PMC literature connector (PubMed coverage).

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Connector, limit_arg, required_str};
use crate::types::{AppError, Capability, Result};

const EUROPE_PMC_API: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest";

/// Searches Europe PMC, which mirrors PubMed plus full-text content.
///
/// Arguments: `{"query": string, "genes": [string]?, "diseases": [string]?,
/// "limit": int?}`. Gene and disease filters are folded into the query the
/// way PubMed field tags expect.
pub struct EuropePmcConnector {
    client: reqwest::Client,
    base_url: String,
}

impl EuropePmcConnector {
    pub fn new() -> Self {
        Self::with_base_url(EUROPE_PMC_API)
    }

    /// Point the connector at a different endpoint (tests use a local mock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn build_query(args: &Value, query: &str) -> String {
        let mut parts = vec![query.to_string()];
        if let Some(genes) = args.get("genes").and_then(Value::as_array) {
            parts.extend(
                genes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|g| format!("{}[Gene]", g)),
            );
        }
        if let Some(diseases) = args.get("diseases").and_then(Value::as_array) {
            parts.extend(
                diseases
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|d| format!("{}[Disease]", d)),
            );
        }
        parts.join(" AND ")
    }
}

impl Default for EuropePmcConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for EuropePmcConnector {
    fn name(&self) -> &str {
        "search_pubmed"
    }

    fn capability(&self) -> Capability {
        Capability::Literature
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let query = required_str(arguments, "query")?;
        let limit = limit_arg(arguments, 20, 100);
        let full_query = Self::build_query(arguments, query);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("query", full_query.as_str()),
                ("format", "json"),
                ("pageSize", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Europe PMC search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let results: Vec<Value> = data
            .pointer("/resultList/result")
            .and_then(Value::as_array)
            .map(|articles| {
                articles
                    .iter()
                    .map(|article| {
                        json!({
                            "pmid": article.get("pmid"),
                            "title": article.get("title"),
                            "authors": article.get("authorString"),
                            "abstract": article.get("abstractText"),
                            "journal": article.get("journalTitle"),
                            "year": article.get("pubYear"),
                            "doi": article.get("doi"),
                            "source": "PubMed"
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(json!({"results": results, "total": results.len()}))
    }
}
