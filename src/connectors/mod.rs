//! Search connectors and their registry.
//!
//! Each connector is a thin HTTP wrapper around one upstream biomedical
//! search API, returning raw hits for the normalizer. The dispatcher treats
//! every connector identically regardless of category; the registry is where
//! capability toggles are applied when assembling a batch.

pub mod literature;
pub mod preprints;
pub mod scholarly;
pub mod trials;
pub mod variants;
pub mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{AppError, Capability, Result, Toggles};

pub use literature::EuropePmcConnector;
pub use preprints::PreprintConnector;
pub use scholarly::ScholarlySearchConnector;
pub use trials::ClinicalTrialsConnector;
pub use variants::MyVariantConnector;
pub use web::WebSearchConnector;

/// A capability-specific search adapter.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Tool name the Research collaborator uses to address this connector.
    fn name(&self) -> &str;

    /// Which toggle gates this connector.
    fn capability(&self) -> Capability;

    /// Run one search. Transport and upstream failures surface as
    /// `AppError::Connector`; the dispatcher converts them into failed
    /// tool outcomes rather than propagating.
    async fn invoke(&self, arguments: &Value) -> Result<Value>;
}

/// Registry of available connectors, keyed by tool name.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// Registry with the production connector set: Europe PMC, Semantic
    /// Scholar / Crossref, bioRxiv / medRxiv, ClinicalTrials.gov,
    /// MyVariant.info, and web search.
    pub fn with_default_connectors() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EuropePmcConnector::new()));
        registry.register(Arc::new(ScholarlySearchConnector::new()));
        registry.register(Arc::new(PreprintConnector::new()));
        registry.register(Arc::new(ClinicalTrialsConnector::new()));
        registry.register(Arc::new(MyVariantConnector::new()));
        registry.register(Arc::new(WebSearchConnector::unconfigured()));
        registry
    }

    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        self.connectors
            .insert(connector.name().to_string(), connector);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.connectors.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.connectors.keys().cloned().collect()
    }

    /// Tool names whose capability category is enabled by the toggles.
    pub fn names_allowed_by(&self, toggles: &Toggles) -> Vec<String> {
        self.connectors
            .values()
            .filter(|c| toggles.allows(c.capability()))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Look up a connector, verifying its category is enabled for the task.
    pub fn resolve(&self, name: &str, toggles: &Toggles) -> Result<Arc<dyn Connector>> {
        let connector = self
            .get(name)
            .ok_or_else(|| AppError::Connector(format!("Unknown tool: {}", name)))?;
        if !toggles.allows(connector.capability()) {
            return Err(AppError::Connector(format!(
                "Tool {} is disabled by task toggles",
                name
            )));
        }
        Ok(connector)
    }
}

/// Extract a required string argument from a tool call's argument object.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidRequest(format!("Missing '{}' parameter", key)))
}

/// Extract an optional result limit, clamped to what upstream APIs accept.
pub(crate) fn limit_arg(args: &Value, default: usize, max: usize) -> usize {
    args.get("limit")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(default)
        .min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default_set() {
        let registry = ConnectorRegistry::with_default_connectors();
        assert!(registry.has("search_pubmed"));
        assert!(registry.has("search_papers"));
        assert!(registry.has("search_preprints"));
        assert!(registry.has("search_clinical_trials"));
        assert!(registry.has("search_variants"));
        assert!(registry.has("web_search"));
        assert_eq!(registry.names().len(), 6);
    }

    #[test]
    fn test_names_allowed_by_toggles() {
        let registry = ConnectorRegistry::with_default_connectors();

        let literature_only = Toggles::default();
        let mut allowed = registry.names_allowed_by(&literature_only);
        allowed.sort();
        assert_eq!(
            allowed,
            vec!["search_papers".to_string(), "search_pubmed".to_string()]
        );

        let everything = Toggles::all();
        assert_eq!(registry.names_allowed_by(&everything).len(), 6);
    }

    #[test]
    fn test_resolve_respects_toggles() {
        let registry = ConnectorRegistry::with_default_connectors();
        let toggles = Toggles::default();

        assert!(registry.resolve("search_pubmed", &toggles).is_ok());
        assert!(registry.resolve("search_clinical_trials", &toggles).is_err());
        assert!(registry.resolve("no_such_tool", &toggles).is_err());
    }

    #[test]
    fn test_limit_arg_clamped() {
        let args = serde_json::json!({"limit": 500});
        assert_eq!(limit_arg(&args, 10, 25), 25);
        assert_eq!(limit_arg(&serde_json::json!({}), 10, 25), 10);
    }
}
