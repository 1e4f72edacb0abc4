//! Client for the EBI OxO cross-reference search API.
//!
//! See <https://www.ebi.ac.uk/spot/oxo/index>. One request carries a chunk of
//! identifiers and returns, per identifier, the curies it maps to within one
//! hop (`distance: 1`) among the requested datasources.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CrossReferenceService, ServiceError, XrefRecord, DEFAULT_REQUEST_TIMEOUT, USER_AGENT};

/// Search endpoint of the public OxO instance
pub const OXO_SEARCH_URL: &str = "https://www.ebi.ac.uk/spot/oxo/api/search";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    ids: &'a [String],
    input_source: Option<&'a str>,
    mapping_target: &'a [String],
    mapping_source: &'a [String],
    distance: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded", default)]
    embedded: Option<Embedded>,
}

#[derive(Deserialize)]
struct Embedded {
    #[serde(rename = "searchResults", default)]
    search_results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(rename = "queryId", default)]
    query_id: Option<String>,
    #[serde(rename = "mappingResponseList", default)]
    mapping_response_list: Vec<MappingResponse>,
}

#[derive(Deserialize)]
struct MappingResponse {
    curie: String,
}

/// HTTP client for OxO
#[derive(Debug, Clone)]
pub struct OxoClient {
    client: reqwest::Client,
    url: String,
}

impl OxoClient {
    /// Client for the public OxO instance with the default request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_url(OXO_SEARCH_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for another OxO deployment
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

impl CrossReferenceService for OxoClient {
    fn base_url(&self) -> &str {
        &self.url
    }

    async fn lookup(&self, ids: &[String], databases: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
        let request = SearchRequest {
            ids,
            input_source: None,
            mapping_target: databases,
            mapping_source: databases,
            distance: 1,
        };

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("size", ids.len())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_search_response(&body, ids)
    }
}

/// Parse an OxO search response.
///
/// Results without a `queryId` are attributed to the queried id at the same
/// position, which is how OxO orders its results.
pub(crate) fn parse_search_response(body: &str, ids: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

    let results = response
        .embedded
        .map(|e| e.search_results)
        .unwrap_or_default();

    let records = results
        .into_iter()
        .enumerate()
        .filter_map(|(position, result)| {
            let query_id = result
                .query_id
                .filter(|q| !q.is_empty())
                .or_else(|| ids.get(position).cloned())?;
            let mapped_ids = result
                .mapping_response_list
                .into_iter()
                .map(|m| m.curie)
                .collect();
            Some(XrefRecord::new(query_id, mapped_ids))
        })
        .collect();

    Ok(records)
}
