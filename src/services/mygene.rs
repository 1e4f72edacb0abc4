//! Client for MyGene.info, the cross-reference and metadata source for genes.
//!
//! See <https://docs.mygene.info/en/latest/doc/query_service.html>.

use std::time::Duration;

use super::biothings::{BioThingsClient, BioThingsProfile, FieldMapping};
use super::{CrossReferenceService, MetadataService, ServiceError, XrefRecord, DEFAULT_REQUEST_TIMEOUT};
use crate::core::types::Metadata;

/// Public MyGene.info instance
pub const MYGENE_URL: &str = "https://mygene.info";

static MYGENE: BioThingsProfile = BioThingsProfile {
    query_path: "/v3/query",
    mappings: &[
        FieldMapping { database: "ENTREZ", field: "entrezgene", prefixed: false },
        FieldMapping { database: "ENSEMBL", field: "ensembl.gene", prefixed: false },
        FieldMapping { database: "HGNC", field: "HGNC", prefixed: false },
        FieldMapping { database: "MGI", field: "MGI", prefixed: true },
        FieldMapping { database: "SYMBOL", field: "symbol", prefixed: false },
        FieldMapping { database: "UNIPROT", field: "uniprot.Swiss-Prot", prefixed: false },
    ],
    name_fields: &["symbol", "name"],
    description_fields: &["summary"],
    synonym_fields: &["alias", "other_names", "name"],
};

/// HTTP client for MyGene.info
#[derive(Debug, Clone)]
pub struct MyGeneClient(BioThingsClient);

impl MyGeneClient {
    /// Client for the public instance with the default request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_url(MYGENE_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for another deployment; `url` is the base, without `/v3/query`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        BioThingsClient::new(url, &MYGENE, timeout).map(Self)
    }
}

impl CrossReferenceService for MyGeneClient {
    fn base_url(&self) -> &str {
        self.0.base_url()
    }

    async fn lookup(&self, ids: &[String], databases: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
        self.0.lookup(ids, databases).await
    }
}

impl MetadataService for MyGeneClient {
    async fn fetch_metadata(&self, id: &str, database: &str) -> Result<Option<Metadata>, ServiceError> {
        self.0.fetch_metadata(id, database).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::biothings::{parse_metadata_response, parse_query_response};

    #[test]
    fn test_every_gene_database_has_a_field() {
        for database in ["ENTREZ", "ENSEMBL", "HGNC", "MGI", "SYMBOL", "UNIPROT"] {
            assert!(MYGENE.mapping(database).is_some(), "{database}");
        }
    }

    #[test]
    fn test_hgnc_lookup_response() {
        // POST /v3/query q=11998 scopes=HGNC dotfield=true
        let body = r#"[{
            "query": "11998", "_id": "7157", "_score": 22.1,
            "entrezgene": "7157", "HGNC": "11998", "MGI": "MGI:98834",
            "ensembl.gene": "ENSG00000141510", "symbol": "TP53",
            "uniprot.Swiss-Prot": "P04637", "taxid": 9606
        }]"#;
        let targets: Vec<&'static FieldMapping> = MYGENE.mappings.iter().collect();

        let records = parse_query_response(body, &["HGNC:11998"], MYGENE.mapping("HGNC").unwrap(), &targets)
            .unwrap();

        assert_eq!(records[0].query_id, "HGNC:11998");
        assert_eq!(
            records[0].mapped_ids,
            vec![
                "ENTREZ:7157",
                "ENSEMBL:ENSG00000141510",
                "HGNC:11998",
                "MGI:98834",
                "SYMBOL:TP53",
                "UNIPROT:P04637"
            ]
        );
    }

    #[test]
    fn test_gene_metadata() {
        let body = r#"[{
            "query": "7157", "symbol": "TP53", "name": "tumor protein p53",
            "summary": "This gene encodes a tumor suppressor protein.",
            "alias": ["BCC7", "LFS1"], "other_names": "cellular tumor antigen p53"
        }]"#;
        let metadata = parse_metadata_response(body, "ENTREZ:7157", MYGENE.mapping("ENTREZ").unwrap(), &MYGENE)
            .unwrap()
            .unwrap();

        assert_eq!(metadata.name.as_deref(), Some("TP53"));
        assert_eq!(
            metadata.synonyms,
            vec!["BCC7", "LFS1", "cellular tumor antigen p53", "tumor protein p53"]
        );
    }

    #[test]
    fn test_base_url_is_reported() {
        let client = MyGeneClient::with_url("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(MyGeneClient::new().unwrap().base_url(), MYGENE_URL);
    }
}
