//! Canonical paper extraction and deduplication.
//!
//! Connectors return heterogeneous raw hits (different field names, author
//! shapes, and date formats per upstream API). This module flattens them into
//! [`PaperRecord`]s and merges records across search passes without ever
//! producing two records with the same identity key.
//!
//! Identity key: lowercased DOI when present, otherwise normalized title plus
//! the first author's surname. First-seen records win on collision; the only
//! field ever backfilled is `citation_count`, and only when the earlier
//! record lacked one.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::types::PaperRecord;

/// Maximum number of authors retained per record.
const MAX_AUTHORS: usize = 10;

/// Convert one raw connector hit into a canonical record.
///
/// Returns `None` for hits without a usable title; those are dropped rather
/// than surfaced as empty records.
pub fn normalize(tool_name: &str, raw_hit: &Value) -> Option<PaperRecord> {
    let title = str_field(raw_hit, &["title", "briefTitle"])?;
    if title.trim().is_empty() {
        return None;
    }

    let abstract_text =
        str_field(raw_hit, &["abstract", "summary", "snippet"]).unwrap_or_default();
    let source_url = str_field(raw_hit, &["url", "link", "doi"]).unwrap_or_default();
    let doi = str_field(raw_hit, &["doi"]).filter(|d| !d.trim().is_empty());
    let journal = str_field(raw_hit, &["journal", "venue", "source"]);

    let publication_date = ["year", "date", "pubYear", "publication_date"]
        .iter()
        .filter_map(|key| raw_hit.get(*key))
        .find_map(parse_date);

    let citation_count = raw_hit
        .get("citations")
        .or_else(|| raw_hit.get("citation_count"))
        .and_then(Value::as_u64)
        .map(|n| n as u32);

    Some(PaperRecord {
        title: title.trim().to_string(),
        abstract_text,
        authors: extract_authors(raw_hit),
        publication_date,
        citation_count,
        source_url,
        source_tool: tool_name.to_string(),
        doi,
        journal,
    })
}

/// Extract every normalizable paper from one successful tool payload.
///
/// Handles the payload shapes the connectors produce: a flat `results` array,
/// source-separated literature results (`semantic_scholar` / `crossref`), and
/// server-separated preprint results (`biorxiv` / `medrxiv`).
pub fn extract_papers(tool_name: &str, payload: &Value) -> Vec<PaperRecord> {
    let mut papers = Vec::new();

    let mut collect = |items: Option<&Value>, source: &str| {
        if let Some(Value::Array(hits)) = items {
            papers.extend(hits.iter().filter_map(|hit| normalize(source, hit)));
        }
    };

    if payload.get("results").is_some() {
        collect(payload.get("results"), tool_name);
    } else if payload.get("semantic_scholar").is_some() || payload.get("crossref").is_some() {
        collect(payload.get("semantic_scholar"), "semantic_scholar");
        collect(payload.get("crossref"), "crossref");
    } else if payload.get("biorxiv").is_some() || payload.get("medrxiv").is_some() {
        collect(payload.get("biorxiv"), "biorxiv");
        collect(payload.get("medrxiv"), "medrxiv");
    }

    papers
}

/// Deduplication key for a paper record.
///
/// DOI (case-insensitive) when present; otherwise the normalized title joined
/// with the first author's lowercased surname.
pub fn identity_key(record: &PaperRecord) -> String {
    if let Some(doi) = record.doi.as_deref() {
        let doi = doi.trim();
        if !doi.is_empty() {
            return format!("doi:{}", doi.to_lowercase());
        }
    }

    let title: String = record
        .title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let surname = record
        .authors
        .first()
        .and_then(|name| name.split_whitespace().last())
        .map(|s| {
            s.chars()
                .filter(|c| c.is_alphabetic())
                .collect::<String>()
                .to_lowercase()
        })
        .unwrap_or_default();

    format!("{}|{}", title, surname)
}

/// Merge newly normalized records into an existing deduplicated set.
///
/// Records whose identity key is already present are not added; the
/// earlier-seen record keeps its provenance and fields. The one exception is
/// `citation_count`: a colliding newer record may backfill it when the
/// existing record has none. Populated fields are never overwritten.
pub fn merge(existing: Vec<PaperRecord>, incoming: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut merged = existing;
    let mut keys: Vec<String> = merged.iter().map(identity_key).collect();

    for record in incoming {
        let key = identity_key(&record);
        match keys.iter().position(|k| *k == key) {
            Some(idx) => {
                let kept = &mut merged[idx];
                if kept.citation_count.is_none() && record.citation_count.is_some() {
                    kept.citation_count = record.citation_count;
                }
            }
            None => {
                keys.push(key);
                merged.push(record);
            }
        }
    }

    merged
}

fn str_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|v| v.as_str())
        .map(|s| s.to_string())
}

fn extract_authors(raw: &Value) -> Vec<String> {
    match raw.get("authors") {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                // Semantic Scholar nests authors as {"name": "..."}
                Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .take(MAX_AUTHORS)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse the year out of the loose date formats upstream APIs return:
/// bare integers, ISO dates, or free text containing a four-digit year.
fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let year = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => first_year(s),
        _ => None,
    }?;

    if !(1000..=9999).contains(&year) {
        return None;
    }
    Utc.with_ymd_and_hms(year as i32, 1, 1, 0, 0, 0).single()
}

fn first_year(text: &str) -> Option<i64> {
    let digits: Vec<char> = text.chars().collect();
    for window in digits.windows(4) {
        if window.iter().all(|c| c.is_ascii_digit()) {
            let candidate: String = window.iter().collect();
            return candidate.parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(title: &str, author: &str, source: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            abstract_text: String::new(),
            authors: vec![author.to_string()],
            publication_date: None,
            citation_count: None,
            source_url: String::new(),
            source_tool: source.to_string(),
            doi: None,
            journal: None,
        }
    }

    #[test]
    fn test_normalize_basic_hit() {
        let hit = json!({
            "title": "BRCA1 variant pathogenicity",
            "abstract": "We characterize...",
            "authors": ["Jane Smith", "Wei Chen"],
            "citations": 42,
            "year": 2021,
            "url": "https://example.org/paper",
            "doi": "10.1000/xyz",
            "journal": "Nature Genetics"
        });

        let paper = normalize("search_pubmed", &hit).unwrap();
        assert_eq!(paper.title, "BRCA1 variant pathogenicity");
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.citation_count, Some(42));
        assert_eq!(paper.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(paper.source_tool, "search_pubmed");
        assert_eq!(
            paper.publication_date.unwrap().format("%Y").to_string(),
            "2021"
        );
    }

    #[test]
    fn test_normalize_drops_untitled_hits() {
        assert!(normalize("search_pubmed", &json!({"abstract": "no title"})).is_none());
        assert!(normalize("search_pubmed", &json!({"title": "  "})).is_none());
    }

    #[test]
    fn test_normalize_field_fallbacks() {
        // Clinical trials use briefTitle; web hits use snippet/link
        let hit = json!({
            "briefTitle": "Phase II trial of olaparib",
            "snippet": "A randomized trial...",
            "link": "https://clinicaltrials.gov/ct2/show/NCT1",
            "authors": "Trial Group"
        });
        let paper = normalize("search_clinical_trials", &hit).unwrap();
        assert_eq!(paper.title, "Phase II trial of olaparib");
        assert_eq!(paper.abstract_text, "A randomized trial...");
        assert_eq!(paper.authors, vec!["Trial Group".to_string()]);
    }

    #[test]
    fn test_normalize_object_authors() {
        let hit = json!({
            "title": "Paper",
            "authors": [{"name": "Ada Lovelace"}, {"name": "Alan Turing"}]
        });
        let paper = normalize("search_papers", &hit).unwrap();
        assert_eq!(paper.authors, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_author_cap() {
        let names: Vec<Value> = (0..20).map(|i| json!(format!("Author {}", i))).collect();
        let hit = json!({"title": "Big collaboration", "authors": names});
        let paper = normalize("search_papers", &hit).unwrap();
        assert_eq!(paper.authors.len(), MAX_AUTHORS);
    }

    #[test]
    fn test_parse_date_from_text() {
        let hit = json!({"title": "T", "date": "Published March 2019 online"});
        let paper = normalize("t", &hit).unwrap();
        assert_eq!(
            paper.publication_date.unwrap().format("%Y").to_string(),
            "2019"
        );
    }

    #[test]
    fn test_extract_papers_source_separated() {
        let payload = json!({
            "semantic_scholar": [{"title": "A"}],
            "crossref": [{"title": "B"}]
        });
        let papers = extract_papers("search_papers", &payload);
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].source_tool, "semantic_scholar");
        assert_eq!(papers[1].source_tool, "crossref");
    }

    #[test]
    fn test_identity_key_prefers_doi() {
        let mut a = record("Totally Different Title", "Jane Smith", "x");
        let mut b = record("Another Title", "Wei Chen", "y");
        a.doi = Some("10.1000/SAME".to_string());
        b.doi = Some("10.1000/same".to_string());
        assert_eq!(identity_key(&a), identity_key(&b));
    }

    #[test]
    fn test_identity_key_title_and_surname() {
        let a = record("BRCA1 Variants: A Review", "Jane Smith", "x");
        let b = record("brca1 variants a review", "J. Smith", "y");
        let c = record("brca1 variants a review", "Wei Chen", "z");
        assert_eq!(identity_key(&a), identity_key(&b));
        assert_ne!(identity_key(&a), identity_key(&c));
    }

    #[test]
    fn test_merge_no_duplicate_keys() {
        let existing = vec![record("Paper One", "Jane Smith", "pubmed")];
        let incoming = vec![
            record("Paper One", "J Smith", "biorxiv"),
            record("Paper Two", "Wei Chen", "biorxiv"),
        ];

        let merged = merge(existing, incoming);
        assert_eq!(merged.len(), 2);

        let mut keys: Vec<String> = merged.iter().map(identity_key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), merged.len());
        // first-seen provenance is kept
        assert_eq!(merged[0].source_tool, "pubmed");
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let existing = vec![
            record("Paper One", "Jane Smith", "pubmed"),
            record("Paper Two", "Wei Chen", "biorxiv"),
        ];
        let merged = merge(existing.clone(), vec![]);
        assert_eq!(merged.len(), existing.len());
        for (kept, original) in merged.iter().zip(existing.iter()) {
            assert_eq!(identity_key(kept), identity_key(original));
        }
    }

    #[test]
    fn test_merge_backfills_citation_count_only() {
        let existing = vec![record("Paper One", "Jane Smith", "pubmed")];
        let mut newer = record("Paper One", "Jane Smith", "semantic_scholar");
        newer.citation_count = Some(17);
        newer.abstract_text = "should not overwrite".to_string();

        let merged = merge(existing, vec![newer]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].citation_count, Some(17));
        // every other field keeps the first-seen value
        assert_eq!(merged[0].source_tool, "pubmed");
        assert_eq!(merged[0].abstract_text, "");
    }

    #[test]
    fn test_merge_never_overwrites_populated_citation_count() {
        let mut existing = record("Paper One", "Jane Smith", "pubmed");
        existing.citation_count = Some(5);
        let mut newer = record("Paper One", "Jane Smith", "crossref");
        newer.citation_count = Some(99);

        let merged = merge(vec![existing], vec![newer]);
        assert_eq!(merged[0].citation_count, Some(5));
    }
}
