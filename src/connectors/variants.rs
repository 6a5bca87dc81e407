//! MyVariant.info genetic variant connector.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Connector, limit_arg, required_str};
use crate::types::{AppError, Capability, Result};

const MYVARIANT_API: &str = "https://myvariant.info/v1";

/// Searches genetic variants by gene symbol, with optional variant-type and
/// clinical-significance filters.
///
/// Arguments: `{"gene": string, "variant_type": string?,
/// "clinical_significance": string?, "limit": int?}`.
pub struct MyVariantConnector {
    client: reqwest::Client,
    base_url: String,
}

impl MyVariantConnector {
    pub fn new() -> Self {
        Self::with_base_url(MYVARIANT_API)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn build_query(args: &Value, gene: &str) -> String {
        let mut parts = vec![format!("gene:{}", gene)];
        if let Some(vt) = args.get("variant_type").and_then(Value::as_str) {
            parts.push(format!("variant_type:{}", vt));
        }
        if let Some(cs) = args.get("clinical_significance").and_then(Value::as_str) {
            parts.push(format!("clinical_significance:{}", cs));
        }
        parts.join(" AND ")
    }
}

impl Default for MyVariantConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MyVariantConnector {
    fn name(&self) -> &str {
        "search_variants"
    }

    fn capability(&self) -> Capability {
        Capability::Variants
    }

    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let gene = required_str(arguments, "gene")?;
        let limit = limit_arg(arguments, 20, 100);
        let query = Self::build_query(arguments, gene);

        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("size", &limit.to_string()),
                ("fields", "rsid,gene,variant,clinical,dbsnp,cadd,gnomad"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Connector(format!(
                "Variant search failed: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Connector(e.to_string()))?;

        let results: Vec<Value> = data
            .get("hits")
            .and_then(Value::as_array)
            .map(|hits| {
                hits.iter()
                    .map(|hit| {
                        // Variant hits carry a synthesized title so the
                        // normalizer can fold them into the paper set.
                        let rsid = hit.get("rsid").and_then(Value::as_str);
                        let id = hit.get("_id").and_then(Value::as_str).unwrap_or("variant");
                        json!({
                            "id": hit.get("_id"),
                            "title": format!("{} ({})", rsid.unwrap_or(id), gene),
                            "rsid": hit.get("rsid"),
                            "gene": hit.pointer("/gene/symbol"),
                            "variant": hit.get("variant"),
                            "clinical": hit.get("clinical"),
                            "cadd": hit.get("cadd"),
                            "gnomad": hit.get("gnomad"),
                            "url": format!("https://myvariant.info/v1/variant/{}", id),
                            "source": "MyVariant.info"
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let total = data
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(results.len() as u64);
        Ok(json!({"results": results, "total": total}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query() {
        let args = serde_json::json!({
            "gene": "BRCA1",
            "clinical_significance": "pathogenic"
        });
        assert_eq!(
            MyVariantConnector::build_query(&args, "BRCA1"),
            "gene:BRCA1 AND clinical_significance:pathogenic"
        );
    }

    #[tokio::test]
    async fn test_missing_gene_rejected() {
        let connector = MyVariantConnector::new();
        let err = connector
            .invoke(&serde_json::json!({"limit": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
