//! Client for MyChem.info, the cross-reference and metadata source for
//! compounds and metabolites.
//!
//! See <https://docs.mychem.info/en/latest/doc/chem_query_service.html>.

use std::time::Duration;

use super::biothings::{BioThingsClient, BioThingsProfile, FieldMapping};
use super::{CrossReferenceService, MetadataService, ServiceError, XrefRecord, DEFAULT_REQUEST_TIMEOUT};
use crate::core::types::Metadata;

/// Public MyChem.info instance
pub const MYCHEM_URL: &str = "https://mychem.info";

static MYCHEM: BioThingsProfile = BioThingsProfile {
    query_path: "/v1/query",
    mappings: &[
        FieldMapping { database: "DrugBank", field: "drugbank.id", prefixed: false },
        FieldMapping { database: "PUBCHEM", field: "pubchem.cid", prefixed: false },
        FieldMapping { database: "CHEBI", field: "chebi.id", prefixed: true },
        FieldMapping { database: "MESH", field: "umls.mesh", prefixed: false },
        FieldMapping { database: "UMLS", field: "umls.cui", prefixed: false },
        FieldMapping { database: "CHEMBL", field: "chembl.molecule_chembl_id", prefixed: false },
        FieldMapping { database: "HMDB", field: "unichem.hmdb", prefixed: false },
    ],
    name_fields: &["drugbank.name", "chebi.name", "chembl.pref_name"],
    description_fields: &["drugbank.description", "chebi.definition"],
    synonym_fields: &["drugbank.synonyms", "chebi.synonyms"],
};

/// HTTP client for MyChem.info
#[derive(Debug, Clone)]
pub struct MyChemClient(BioThingsClient);

impl MyChemClient {
    /// Client for the public instance with the default request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_url(MYCHEM_URL, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for another deployment; `url` is the base, without `/v1/query`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        BioThingsClient::new(url, &MYCHEM, timeout).map(Self)
    }
}

impl CrossReferenceService for MyChemClient {
    fn base_url(&self) -> &str {
        self.0.base_url()
    }

    async fn lookup(&self, ids: &[String], databases: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
        self.0.lookup(ids, databases).await
    }
}

impl MetadataService for MyChemClient {
    async fn fetch_metadata(&self, id: &str, database: &str) -> Result<Option<Metadata>, ServiceError> {
        self.0.fetch_metadata(id, database).await
    }
}
