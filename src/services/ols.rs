//! Client for the EBI OLS4 search API, used for display metadata.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::{MetadataService, ServiceError, DEFAULT_REQUEST_TIMEOUT, USER_AGENT};
use crate::core::types::Metadata;

/// Search endpoint of the public OLS4 instance
pub const OLS4_SEARCH_URL: &str = "https://www.ebi.ac.uk/ols4/api/search";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    response: Option<SearchDocs>,
}

#[derive(Deserialize)]
struct SearchDocs {
    #[serde(default)]
    docs: Vec<Value>,
}

/// HTTP client for OLS4
#[derive(Debug, Clone)]
pub struct Ols4Client {
    client: reqwest::Client,
    url: String,
}

impl Ols4Client {
    /// Client for the public OLS4 instance with the default request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_url(OLS4_SEARCH_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for another OLS4 deployment
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl MetadataService for Ols4Client {
    async fn fetch_metadata(&self, id: &str, database: &str) -> Result<Option<Metadata>, ServiceError> {
        let ontology = database.to_lowercase();
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("q", id),
                ("queryFields", "obo_id"),
                ("ontology", ontology.as_str()),
                ("exact", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_search_response(&body, id)
    }
}

/// Pick the doc describing `id` out of an OLS4 search response
pub(crate) fn parse_search_response(body: &str, id: &str) -> Result<Option<Metadata>, ServiceError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

    let docs = response.response.map(|r| r.docs).unwrap_or_default();
    let short_form = id.replace(':', "_");

    let matched = docs.iter().find(|doc| {
        first_string(doc.get("obo_id")).is_some_and(|obo| obo == id)
            || doc
                .get("iri")
                .and_then(Value::as_str)
                .and_then(|iri| iri.rsplit('/').next())
                .is_some_and(|tail| tail == short_form)
    });

    Ok(matched.map(|doc| Metadata {
        id: id.to_string(),
        name: first_string(doc.get("label")),
        description: joined(doc.get("description"), ". "),
        synonyms: string_list(doc.get("synonym")),
    }))
}

/// OLS returns some fields as a string and others as a list of strings
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn first_string(value: Option<&Value>) -> Option<String> {
    string_list(value).into_iter().next()
}

fn joined(value: Option<&Value>, separator: &str) -> Option<String> {
    let parts = string_list(value);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEART: &str = r#"{
        "response": {
            "docs": [{
                "iri": "http://purl.obolibrary.org/obo/UBERON_0000948",
                "synonym": ["vertebrate heart", "branchial heart", "cardium"],
                "short_form": ["UBERON_0000948"],
                "description": ["A myogenic muscular circulatory organ.", "It is the primary circulatory organ."],
                "label": ["heart"],
                "obo_id": ["UBERON:0000948"],
                "type": "class"
            }],
            "numFound": 1,
            "start": 0
        },
        "responseHeader": {"QTime": 26, "status": 0}
    }"#;

    #[test]
    fn test_parse_matching_doc() {
        let metadata = parse_search_response(HEART, "UBERON:0000948").unwrap().unwrap();
        assert_eq!(metadata.id, "UBERON:0000948");
        assert_eq!(metadata.name.as_deref(), Some("heart"));
        assert_eq!(metadata.synonyms.len(), 3);
        assert_eq!(
            metadata.description.as_deref(),
            Some("A myogenic muscular circulatory organ.. It is the primary circulatory organ.")
        );
    }

    #[test]
    fn test_string_fields_and_iri_fallback() {
        let body = r#"{"response": {"docs": [
            {"iri": "http://purl.obolibrary.org/obo/MONDO_0004993", "label": "carcinoma"}
        ]}}"#;
        let metadata = parse_search_response(body, "MONDO:0004993").unwrap().unwrap();
        assert_eq!(metadata.name.as_deref(), Some("carcinoma"));
        assert!(metadata.synonyms.is_empty());
        assert!(metadata.description.is_none());
    }

    #[test]
    fn test_no_matching_doc_is_a_miss() {
        assert!(parse_search_response(HEART, "UBERON:0000001").unwrap().is_none());
        assert!(parse_search_response(r#"{"response": {"docs": []}}"#, "MONDO:1")
            .unwrap()
            .is_none());
    }
}
