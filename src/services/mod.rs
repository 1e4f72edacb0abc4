//! External lookup services.
//!
//! The conversion engine talks to two kinds of service through narrow traits so
//! that deterministic fakes can stand in for the network:
//!
//! - [`CrossReferenceService`]: identifier -> equivalent identifiers in other databases
//!   (production: [`oxo::OxoClient`], [`mygene::MyGeneClient`], [`mychem::MyChemClient`])
//! - [`MetadataService`]: resolved identifier -> display metadata
//!   (production: [`ols::Ols4Client`], [`mygene::MyGeneClient`], [`mychem::MyChemClient`])
//!
//! Each ontology type names its service in the registry; [`select`] builds
//! the matching pair of clients. Transient failures are retried according to
//! a [`retry::RetryPolicy`].

use std::future::Future;

use thiserror::Error;

use crate::core::types::Metadata;

pub mod biothings;
pub mod mychem;
pub mod mygene;
pub mod ols;
pub mod oxo;
pub mod retry;
pub mod select;

/// Default per-request timeout for the HTTP clients
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// User agent sent with every request
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Cross-references reported for one queried identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefRecord {
    /// The identifier that was queried, in `PREFIX:VALUE` form
    pub query_id: String,

    /// Equivalent identifiers as reported by the service (prefix case may vary)
    pub mapped_ids: Vec<String>,
}

impl XrefRecord {
    pub fn new(query_id: impl Into<String>, mapped_ids: Vec<String>) -> Self {
        Self {
            query_id: query_id.into(),
            mapped_ids,
        }
    }
}

/// Looks up equivalent identifiers in other databases
pub trait CrossReferenceService: Send + Sync + 'static {
    /// Endpoint reported in `ConversionResult::database_url`
    fn base_url(&self) -> &str;

    /// Look up one chunk of identifiers, restricted to `databases`.
    ///
    /// An identifier without a record, or with an empty record, has no
    /// cross-references; that is an answer, not an error.
    fn lookup(
        &self,
        ids: &[String],
        databases: &[String],
    ) -> impl Future<Output = Result<Vec<XrefRecord>, ServiceError>> + Send;
}

/// Fetches display metadata for a resolved identifier
pub trait MetadataService: Send + Sync + 'static {
    /// `Ok(None)` is an authoritative miss and is not retried
    fn fetch_metadata(
        &self,
        id: &str,
        database: &str,
    ) -> impl Future<Output = Result<Option<Metadata>, ServiceError>> + Send;
}

/// Metadata service that never finds anything; used when enrichment is off
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataService for NoMetadata {
    async fn fetch_metadata(&self, _id: &str, _database: &str) -> Result<Option<Metadata>, ServiceError> {
        Ok(None)
    }
}
