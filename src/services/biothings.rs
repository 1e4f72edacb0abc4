//! Shared client for the BioThings query APIs (MyGene.info, MyChem.info).
//!
//! Both services answer `POST {base}/{version}/query` with a form of `q`
//! (comma-separated values), `scopes` (the field to match), `fields` and
//! `dotfield=true`, and return a flat JSON array with one or more hits per
//! queried value. A hit either carries the requested fields under dotted
//! names or is `{"query": ..., "notfound": true}`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde_json::Value;

use super::{ServiceError, XrefRecord, USER_AGENT};
use crate::core::types::Metadata;

/// Where a database's identifiers live in a BioThings document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// Registry spelling of the database, e.g. `ENSEMBL`
    pub database: &'static str,

    /// Dotted field name, e.g. `ensembl.gene`
    pub field: &'static str,

    /// Values already carry the prefix (`MGI:96677`), so the whole curie is
    /// queried and reported as-is
    pub prefixed: bool,
}

impl FieldMapping {
    /// The value sent in `q` for `id`
    fn query_value<'a>(&self, id: &'a str) -> &'a str {
        if self.prefixed {
            id
        } else {
            id.split_once(':').map_or(id, |(_, value)| value)
        }
    }

    /// Turn a field value into a curie with the registry prefix
    fn curie(&self, value: &str) -> String {
        if self.prefixed && value.contains(':') {
            value.to_string()
        } else {
            format!("{}:{value}", self.database)
        }
    }
}

/// What one BioThings service knows about
#[derive(Debug)]
pub struct BioThingsProfile {
    /// Query endpoint below the base url, e.g. `/v3/query`
    pub query_path: &'static str,

    pub mappings: &'static [FieldMapping],

    /// First present wins
    pub name_fields: &'static [&'static str],
    /// First present wins
    pub description_fields: &'static [&'static str],
    /// All present fields are merged
    pub synonym_fields: &'static [&'static str],
}

impl BioThingsProfile {
    pub fn mapping(&self, database: &str) -> Option<&'static FieldMapping> {
        self.mappings
            .iter()
            .find(|m| m.database.eq_ignore_ascii_case(database))
    }

    fn metadata_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::new();
        for field in [self.name_fields, self.description_fields, self.synonym_fields].concat() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

/// HTTP client for one BioThings service
#[derive(Debug, Clone)]
pub struct BioThingsClient {
    client: reqwest::Client,
    base_url: String,
    query_url: String,
    profile: &'static BioThingsProfile,
}

impl BioThingsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        profile: &'static BioThingsProfile,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            query_url: format!("{base_url}{}", profile.query_path),
            base_url,
            profile,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, values: &[&str], scope: &str, fields: &[&str]) -> Result<String, ServiceError> {
        let q = values.join(",");
        let fields = fields.join(",");
        let response = self
            .client
            .post(&self.query_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("q", q.as_str()),
                ("scopes", scope),
                ("fields", fields.as_str()),
                ("dotfield", "true"),
            ])
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

        Ok(response.text().await?)
    }

    /// Look up a chunk of identifiers, one request per prefix.
    ///
    /// Identifiers whose prefix has no field in this service get no record.
    pub async fn lookup(&self, ids: &[String], databases: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in ids {
            if let Some((prefix, _)) = id.split_once(':') {
                groups.entry(prefix).or_default().push(id.as_str());
            }
        }

        let targets: Vec<&'static FieldMapping> = databases
            .iter()
            .filter_map(|db| self.profile.mapping(db))
            .collect();
        let fields: Vec<&str> = targets.iter().map(|m| m.field).collect();

        let mut records = Vec::new();
        for (prefix, group) in groups {
            let Some(scope) = self.profile.mapping(prefix) else {
                tracing::debug!("No {} field for prefix {prefix}", self.base_url);
                continue;
            };
            let values: Vec<&str> = group.iter().map(|id| scope.query_value(id)).collect();
            let body = self.query(&values, scope.field, &fields).await?;
            records.extend(parse_query_response(&body, &group, scope, &targets)?);
        }

        Ok(records)
    }

    /// Metadata for one identifier, `None` when the service has no hit
    pub async fn fetch_metadata(&self, id: &str, database: &str) -> Result<Option<Metadata>, ServiceError> {
        let Some(scope) = self.profile.mapping(database) else {
            return Ok(None);
        };
        let fields = self.profile.metadata_fields();
        let body = self.query(&[scope.query_value(id)], scope.field, &fields).await?;
        parse_metadata_response(&body, id, scope, self.profile)
    }
}

fn parse_hits(body: &str) -> Result<Vec<Value>, ServiceError> {
    match serde_json::from_str::<Value>(body).map_err(|e| ServiceError::Decode(e.to_string()))? {
        Value::Array(hits) => Ok(hits),
        other => Err(ServiceError::Decode(format!(
            "expected a list of hits, got {}",
            short(&other)
        ))),
    }
}

fn short(value: &Value) -> String {
    let text = value.to_string();
    text.chars().take(80).collect()
}

fn is_hit(hit: &Value) -> bool {
    !hit.get("notfound").and_then(Value::as_bool).unwrap_or(false)
}

/// Flatten a field value: strings, numbers and nested lists of either
fn field_values(value: Option<&Value>, out: &mut Vec<String>) {
    match value {
        Some(Value::String(s)) if !s.is_empty() => out.push(s.clone()),
        Some(Value::Number(n)) => out.push(n.to_string()),
        Some(Value::Array(items)) => {
            for item in items {
                field_values(Some(item), out);
            }
        }
        _ => {}
    }
}

/// Build one record per queried id from a query response.
///
/// `group` holds the queried curies; hits are tied back to them through the
/// `query` value. Several hits for one id are merged.
pub(crate) fn parse_query_response(
    body: &str,
    group: &[&str],
    scope: &FieldMapping,
    targets: &[&'static FieldMapping],
) -> Result<Vec<XrefRecord>, ServiceError> {
    let hits = parse_hits(body)?;

    let by_query: HashMap<&str, &str> = group.iter().map(|id| (scope.query_value(id), *id)).collect();
    let mut mapped: HashMap<&str, Vec<String>> = HashMap::new();

    for hit in &hits {
        let Some(id) = hit
            .get("query")
            .and_then(Value::as_str)
            .and_then(|q| by_query.get(q).copied())
        else {
            continue;
        };
        let entry = mapped.entry(id).or_default();
        if !is_hit(hit) {
            continue;
        }

        for target in targets {
            let mut values = Vec::new();
            field_values(hit.get(target.field), &mut values);
            for value in values {
                let curie = target.curie(&value);
                if !entry.contains(&curie) {
                    entry.push(curie);
                }
            }
        }
    }

    Ok(group
        .iter()
        .filter_map(|id| mapped.remove(id).map(|ids| XrefRecord::new(*id, ids)))
        .collect())
}

/// Metadata from the first hit for `id`
pub(crate) fn parse_metadata_response(
    body: &str,
    id: &str,
    scope: &FieldMapping,
    profile: &BioThingsProfile,
) -> Result<Option<Metadata>, ServiceError> {
    let hits = parse_hits(body)?;
    let query = scope.query_value(id);

    let Some(hit) = hits
        .iter()
        .filter(|hit| is_hit(hit))
        .find(|hit| hit.get("query").and_then(Value::as_str).map_or(true, |q| q == query))
    else {
        return Ok(None);
    };

    let first = |fields: &[&str]| {
        fields.iter().find_map(|field| {
            let mut values = Vec::new();
            field_values(hit.get(*field), &mut values);
            values.into_iter().next()
        })
    };

    let mut synonyms: Vec<String> = Vec::new();
    for field in profile.synonym_fields {
        let mut values = Vec::new();
        field_values(hit.get(*field), &mut values);
        for value in values {
            if !synonyms.contains(&value) {
                synonyms.push(value);
            }
        }
    }

    Ok(Some(Metadata {
        id: id.to_string(),
        name: first(profile.name_fields),
        description: first(profile.description_fields),
        synonyms,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    static PROFILE: BioThingsProfile = BioThingsProfile {
        query_path: "/v3/query",
        mappings: &[
            FieldMapping { database: "ENTREZ", field: "entrezgene", prefixed: false },
            FieldMapping { database: "ENSEMBL", field: "ensembl.gene", prefixed: false },
            FieldMapping { database: "MGI", field: "MGI", prefixed: true },
        ],
        name_fields: &["symbol", "name"],
        description_fields: &["summary"],
        synonym_fields: &["alias", "name"],
    };

    fn targets() -> Vec<&'static FieldMapping> {
        PROFILE.mappings.iter().collect()
    }

    #[test]
    fn test_query_value_and_curie() {
        let ensembl = PROFILE.mapping("ensembl").unwrap();
        assert_eq!(ensembl.query_value("ENSEMBL:ENSG00000141510"), "ENSG00000141510");
        assert_eq!(ensembl.curie("ENSG00000141510"), "ENSEMBL:ENSG00000141510");

        let mgi = PROFILE.mapping("MGI").unwrap();
        assert_eq!(mgi.query_value("MGI:98834"), "MGI:98834");
        assert_eq!(mgi.curie("MGI:98834"), "MGI:98834");
    }

    #[test]
    fn test_parse_query_response() {
        let body = r#"[
            {"query": "ENSG00000141510", "_id": "7157", "entrezgene": "7157",
             "ensembl.gene": "ENSG00000141510", "MGI": "MGI:98834"},
            {"query": "ENSG00000000001", "notfound": true},
            {"query": "ENSG00000230417", "_id": "1", "entrezgene": 1,
             "ensembl.gene": ["ENSG00000230417", "ENSG00000276076"]},
            {"query": "ENSG00000230417", "_id": "2", "entrezgene": 2}
        ]"#;
        let group = ["ENSEMBL:ENSG00000141510", "ENSEMBL:ENSG00000000001", "ENSEMBL:ENSG00000230417"];
        let scope = PROFILE.mapping("ENSEMBL").unwrap();

        let records = parse_query_response(body, &group, scope, &targets()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].query_id, "ENSEMBL:ENSG00000141510");
        assert_eq!(
            records[0].mapped_ids,
            vec!["ENTREZ:7157", "ENSEMBL:ENSG00000141510", "MGI:98834"]
        );
        // Not found is an answer with no equivalents
        assert!(records[1].mapped_ids.is_empty());
        // Hits for the same query are merged, so two ENTREZ ids come back
        assert_eq!(
            records[2].mapped_ids,
            vec!["ENTREZ:1", "ENSEMBL:ENSG00000230417", "ENSEMBL:ENSG00000276076", "ENTREZ:2"]
        );
    }

    #[test]
    fn test_unknown_query_is_ignored() {
        let body = r#"[{"query": "999", "entrezgene": "999"}]"#;
        let scope = PROFILE.mapping("ENTREZ").unwrap();
        let records = parse_query_response(body, &["ENTREZ:7157"], scope, &targets()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_error_object_is_decode_error() {
        let body = r#"{"success": false, "error": "Bad request"}"#;
        let scope = PROFILE.mapping("ENTREZ").unwrap();
        let err = parse_query_response(body, &["ENTREZ:7157"], scope, &targets()).unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }

    #[test]
    fn test_parse_metadata_response() {
        let body = r#"[{
            "query": "7157", "entrezgene": "7157", "symbol": "TP53",
            "name": "tumor protein p53",
            "summary": "This gene encodes a tumor suppressor protein.",
            "alias": ["BCC7", "LFS1", "P53"]
        }]"#;
        let scope = PROFILE.mapping("ENTREZ").unwrap();

        let metadata = parse_metadata_response(body, "ENTREZ:7157", scope, &PROFILE)
            .unwrap()
            .unwrap();

        assert_eq!(metadata.id, "ENTREZ:7157");
        assert_eq!(metadata.name.as_deref(), Some("TP53"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("This gene encodes a tumor suppressor protein.")
        );
        assert_eq!(metadata.synonyms, vec!["BCC7", "LFS1", "P53", "tumor protein p53"]);
    }

    #[test]
    fn test_metadata_not_found() {
        let body = r#"[{"query": "0", "notfound": true}]"#;
        let scope = PROFILE.mapping("ENTREZ").unwrap();
        assert!(parse_metadata_response(body, "ENTREZ:0", scope, &PROFILE)
            .unwrap()
            .is_none());
    }
}
