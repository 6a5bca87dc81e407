//! bioRxiv / medRxiv preprint connector.
//!
//! The bioRxiv API has no text search endpoint, so this connector fetches
//! the recent window of postings per server and filters client-side by the
//! query terms, the same strategy the upstream service recommends.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{Value, json};

use super::{Connector, limit_arg, required_str};
use crate::types::{AppError, Capability, Result};

const BIORXIV_API: &str = "https://api.biorxiv.org";
const RECENT_WINDOW_DAYS: i64 = 30;

/// Searches bioRxiv and medRxiv preprint servers.
///
/// Arguments: `{"query": string, "include_biorxiv": bool?,
/// "include_medrxiv": bool?, "limit": int?}`.
pub struct PreprintConnector {
    client: reqwest::Client,
    base_url: String,
}

impl PreprintConnector {
    pub fn new() -> Self {
        Self::with_base_url(BIORXIV_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn matches_query(article: &Value, query_lower: &str) -> bool {
        let title = article
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        let abstract_text = article
            .get("abstract")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        title.contains(query_lower) || abstract_text.contains(query_lower)
    }

    async fn fetch_server(&self, server: &str, query: &str, limit: usize) -> Result<Vec<Value>> {
        let end = Utc::now().format("%Y-%m-%d").to_string();
        let start = (Utc::now() - ChronoDuration::days(RECENT_WINDOW_DAYS))
            .format("%Y-%m-%d")
            .to_string();

        let response = self
            .client
            .get(format!(
                "{}/details/{}/{}/{}/0/json",
                self.base_url, server, start, end
            ))
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "{} search failed: {}",
                server,
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let query_lower = query.to_lowercase();
        let hits = data
            .get("collection")
            .and_then(Value::as_array)
            .map(|articles| {
                articles
                    .iter()
                    .filter(|article| Self::matches_query(article, &query_lower))
                    .take(limit)
                    .map(|article| {
                        json!({
                            "title": article.get("title"),
                            "authors": article.get("authors"),
                            "abstract": article.get("abstract"),
                            "doi": article.get("doi"),
                            "date": article.get("date"),
                            "category": article.get("category"),
                            "source": server
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }
}

impl Default for PreprintConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for PreprintConnector {
    fn name(&self) -> &str {
        "search_preprints"
    }

    fn capability(&self) -> Capability {
        Capability::Preprints
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let query = required_str(arguments, "query")?;
        let limit = limit_arg(arguments, 20, 100);

        let include = |key: &str| {
            arguments
                .get(key)
                .and_then(Value::as_bool)
                .unwrap_or(true)
        };

        let mut biorxiv = Vec::new();
        let mut medrxiv = Vec::new();

        // One server failing should not blank out the other's results.
        if include("include_biorxiv") {
            match self.fetch_server("biorxiv", query, limit).await {
                Ok(hits) => biorxiv = hits,
                Err(e) => tracing::warn!("biorxiv search error: {}", e),
            }
        }
        if include("include_medrxiv") {
            match self.fetch_server("medrxiv", query, limit).await {
                Ok(hits) => medrxiv = hits,
                Err(e) => tracing::warn!("medrxiv search error: {}", e),
            }
        }

        let total = biorxiv.len() + medrxiv.len();
        Ok(json!({"biorxiv": biorxiv, "medrxiv": medrxiv, "total": total}))
    }
}
