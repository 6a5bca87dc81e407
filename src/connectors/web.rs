//! Google Programmable Search web connector, tuned for academic content.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Connector, limit_arg, required_str};
use crate::types::{AppError, Capability, Result};

const GOOGLE_SEARCH_API: &str = "https://www.googleapis.com/customsearch/v1";

// Google caps Programmable Search at 10 results per request.
const MAX_RESULTS_PER_REQUEST: usize = 10;

/// General web search biased toward scholarly sources.
///
/// Requires a Google API key and a Programmable Search Engine id; an
/// unconfigured connector fails each invocation with a connector error,
/// which the dispatcher records as a degraded tool outcome.
pub struct WebSearchConnector {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

impl WebSearchConnector {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GOOGLE_SEARCH_API.to_string(),
            api_key: Some(api_key.into()),
            engine_id: Some(engine_id.into()),
        }
    }

    /// Connector without credentials; invocations fail until configured.
    pub fn unconfigured() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GOOGLE_SEARCH_API.to_string(),
            api_key: None,
            engine_id: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn flatten_item(item: &Value) -> Value {
        let metatags = item
            .pointer("/pagemap/metatags/0")
            .cloned()
            .unwrap_or_default();

        let authors = metatags
            .get("citation_author")
            .or_else(|| metatags.get("author"))
            .cloned();
        let publication_date = metatags
            .get("citation_publication_date")
            .or_else(|| metatags.get("citation_date"))
            .cloned();

        json!({
            "title": item.get("title"),
            "link": item.get("link"),
            "snippet": item.get("snippet"),
            "source": item.get("displayLink"),
            "authors": authors,
            "publication_date": publication_date,
            "doi": metatags.get("citation_doi"),
            "journal": metatags.get("citation_journal_title"),
            "type": "academic_search"
        })
    }
}

#[async_trait]
impl Connector for WebSearchConnector {
    fn name(&self) -> &str {
        "web_search"
    }

    fn capability(&self) -> Capability {
        Capability::Web
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let (api_key, engine_id) = match (&self.api_key, &self.engine_id) {
            (Some(key), Some(id)) => (key, id),
            _ => {
                return Err(AppError::Connector(
                    "Web search is not configured (missing API key or engine id)".to_string(),
                ));
            }
        };

        let query = required_str(arguments, "query")?;
        let limit = limit_arg(arguments, MAX_RESULTS_PER_REQUEST, MAX_RESULTS_PER_REQUEST);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", query),
                ("num", &limit.to_string()),
                ("lr", "lang_en"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Web search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let results: Vec<Value> = data
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Self::flatten_item).collect())
            .unwrap_or_default();

        Ok(json!({
            "results": results,
            "total": data.pointer("/searchInformation/totalResults").cloned()
        }))
    }
}
