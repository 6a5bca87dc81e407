//! Semantic Scholar + Crossref scholarly literature connector.
//!
//! One invocation queries both indexes and keeps their hits separated in the
//! payload so per-source provenance survives normalization.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Connector, limit_arg, required_str};
use crate::types::{AppError, Capability, Result};

const SEMANTIC_SCHOLAR_API: &str = "https://api.semanticscholar.org/graph/v1";
const CROSSREF_API: &str = "https://api.crossref.org";

const SEMANTIC_SCHOLAR_FIELDS: &str =
    "title,abstract,authors,year,citationCount,externalIds,url,venue";

/// Broad scholarly search across Semantic Scholar and Crossref.
///
/// Arguments: `{"query": string, "limit": int?}`. The limit applies per
/// source.
pub struct ScholarlySearchConnector {
    client: reqwest::Client,
    semantic_scholar_base: String,
    crossref_base: String,
}

impl ScholarlySearchConnector {
    pub fn new() -> Self {
        Self::with_base_urls(SEMANTIC_SCHOLAR_API, CROSSREF_API)
    }

    pub fn with_base_urls(
        semantic_scholar: impl Into<String>,
        crossref: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            semantic_scholar_base: semantic_scholar.into(),
            crossref_base: crossref.into(),
        }
    }

    async fn fetch_semantic_scholar(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(format!("{}/paper/search", self.semantic_scholar_base))
            .query(&[
                ("query", query),
                ("limit", &limit.to_string()),
                ("fields", SEMANTIC_SCHOLAR_FIELDS),
            ])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Semantic Scholar search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let hits = data
            .get("data")
            .and_then(Value::as_array)
            .map(|papers| {
                papers
                    .iter()
                    .map(|paper| {
                        json!({
                            "title": paper.get("title"),
                            "abstract": paper.get("abstract"),
                            // {"name": "..."} objects, handled by the normalizer
                            "authors": paper.get("authors"),
                            "year": paper.get("year"),
                            "citations": paper.get("citationCount"),
                            "doi": paper.pointer("/externalIds/DOI"),
                            "url": paper.get("url"),
                            "venue": paper.get("venue"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    async fn fetch_crossref(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(format!("{}/works", self.crossref_base))
            .query(&[("query", query), ("rows", &limit.to_string())])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Crossref search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let hits = data
            .pointer("/message/items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        json!({
                            "title": item.pointer("/title/0"),
                            "authors": Self::crossref_authors(item),
                            "year": item.pointer("/issued/date-parts/0/0"),
                            "citations": item.get("is-referenced-by-count"),
                            "doi": item.get("DOI"),
                            "url": item.get("URL"),
                            "journal": item.pointer("/container-title/0"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }

    /// Crossref splits names into given/family parts.
    fn crossref_authors(item: &Value) -> Vec<String> {
        item.get("author")
            .and_then(Value::as_array)
            .map(|authors| {
                authors
                    .iter()
                    .filter_map(|author| {
                        let family = author.get("family").and_then(Value::as_str)?;
                        Some(match author.get("given").and_then(Value::as_str) {
                            Some(given) => format!("{} {}", given, family),
                            None => family.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for ScholarlySearchConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for ScholarlySearchConnector {
    fn name(&self) -> &str {
        "search_papers"
    }

    fn capability(&self) -> Capability {
        Capability::Literature
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let query = required_str(arguments, "query")?;
        let limit = limit_arg(arguments, 20, 100);

        let mut semantic_scholar = Vec::new();
        let mut crossref = Vec::new();

        // One index failing should not blank out the other's results.
        match self.fetch_semantic_scholar(query, limit).await {
            Ok(hits) => semantic_scholar = hits,
            Err(e) => tracing::warn!("semantic scholar search error: {}", e),
        }
        match self.fetch_crossref(query, limit).await {
            Ok(hits) => crossref = hits,
            Err(e) => tracing::warn!("crossref search error: {}", e),
        }

        let total = semantic_scholar.len() + crossref.len();
        Ok(json!({
            "semantic_scholar": semantic_scholar,
            "crossref": crossref,
            "total": total
        }))
    }
}
