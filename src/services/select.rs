//! Pick the lookup clients for an ontology type at runtime.

use std::time::Duration;

use super::mychem::{MyChemClient, MYCHEM_URL};
use super::mygene::{MyGeneClient, MYGENE_URL};
use super::ols::{Ols4Client, OLS4_SEARCH_URL};
use super::oxo::{OxoClient, OXO_SEARCH_URL};
use super::{CrossReferenceService, MetadataService, ServiceError, XrefRecord, DEFAULT_REQUEST_TIMEOUT};
use crate::core::types::Metadata;
use crate::registry::store::LookupService;

/// Endpoints of every supported service
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub oxo: String,
    pub ols: String,
    pub mygene: String,
    pub mychem: String,
    pub request_timeout: Duration,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            oxo: OXO_SEARCH_URL.to_string(),
            ols: OLS4_SEARCH_URL.to_string(),
            mygene: MYGENE_URL.to_string(),
            mychem: MYCHEM_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ServiceEndpoints {
    /// Cross-reference client for `service`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn xref_client(&self, service: LookupService) -> Result<XrefClient, ServiceError> {
        Ok(match service {
            LookupService::Oxo => XrefClient::Oxo(OxoClient::with_url(self.oxo.as_str(), self.request_timeout)?),
            LookupService::MyGene => {
                XrefClient::MyGene(MyGeneClient::with_url(self.mygene.as_str(), self.request_timeout)?)
            }
            LookupService::MyChem => {
                XrefClient::MyChem(MyChemClient::with_url(self.mychem.as_str(), self.request_timeout)?)
            }
        })
    }

    /// Metadata client for `service`; OxO types take their metadata from OLS4
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn metadata_client(&self, service: LookupService) -> Result<MetadataClient, ServiceError> {
        Ok(match service {
            LookupService::Oxo => MetadataClient::Ols(Ols4Client::with_url(self.ols.as_str(), self.request_timeout)?),
            LookupService::MyGene => {
                MetadataClient::MyGene(MyGeneClient::with_url(self.mygene.as_str(), self.request_timeout)?)
            }
            LookupService::MyChem => {
                MetadataClient::MyChem(MyChemClient::with_url(self.mychem.as_str(), self.request_timeout)?)
            }
        })
    }
}

/// Any of the cross-reference clients
#[derive(Debug, Clone)]
pub enum XrefClient {
    Oxo(OxoClient),
    MyGene(MyGeneClient),
    MyChem(MyChemClient),
}

impl CrossReferenceService for XrefClient {
    fn base_url(&self) -> &str {
        match self {
            Self::Oxo(client) => client.base_url(),
            Self::MyGene(client) => client.base_url(),
            Self::MyChem(client) => client.base_url(),
        }
    }

    async fn lookup(&self, ids: &[String], databases: &[String]) -> Result<Vec<XrefRecord>, ServiceError> {
        match self {
            Self::Oxo(client) => client.lookup(ids, databases).await,
            Self::MyGene(client) => client.lookup(ids, databases).await,
            Self::MyChem(client) => client.lookup(ids, databases).await,
        }
    }
}

/// Any of the metadata clients
#[derive(Debug, Clone)]
pub enum MetadataClient {
    Ols(Ols4Client),
    MyGene(MyGeneClient),
    MyChem(MyChemClient),
}

impl MetadataService for MetadataClient {
    async fn fetch_metadata(&self, id: &str, database: &str) -> Result<Option<Metadata>, ServiceError> {
        match self {
            Self::Ols(client) => client.fetch_metadata(id, database).await,
            Self::MyGene(client) => client.fetch_metadata(id, database).await,
            Self::MyChem(client) => client.fetch_metadata(id, database).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_follows_service() {
        let endpoints = ServiceEndpoints::default();

        assert_eq!(endpoints.xref_client(LookupService::Oxo).unwrap().base_url(), OXO_SEARCH_URL);
        assert_eq!(
            endpoints.xref_client(LookupService::MyGene).unwrap().base_url(),
            "https://mygene.info"
        );
        assert_eq!(
            endpoints.xref_client(LookupService::MyChem).unwrap().base_url(),
            "https://mychem.info"
        );
    }

    #[test]
    fn test_metadata_client_per_service() {
        let endpoints = ServiceEndpoints::default();

        assert!(matches!(endpoints.metadata_client(LookupService::Oxo).unwrap(), MetadataClient::Ols(_)));
        assert!(matches!(
            endpoints.metadata_client(LookupService::MyGene).unwrap(),
            MetadataClient::MyGene(_)
        ));
        assert!(matches!(
            endpoints.metadata_client(LookupService::MyChem).unwrap(),
            MetadataClient::MyChem(_)
        ));
    }
}
