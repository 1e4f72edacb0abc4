use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::core::identifier::parse_identifiers;
use crate::core::types::{ConversionResult, ConvertedId};
use crate::registry::store::{OntologyTypeRegistry, RegistryError};
use crate::resolve::aggregate::ResultAggregator;
use crate::resolve::enrich::MetadataEnricher;
use crate::resolve::policy::AmbiguityPolicy;
use crate::resolve::resolver::CrossReferenceResolver;
use crate::services::retry::RetryPolicy;
use crate::services::{CrossReferenceService, MetadataService, NoMetadata};

/// Default number of identifiers per cross-reference request
pub const DEFAULT_BATCH_SIZE: usize = 300;

/// Largest chunk the cross-reference service accepts
pub const MAX_BATCH_SIZE: usize = 500;

/// Default number of requests in flight at once
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cross-reference service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Configuration for the conversion engine
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Identifiers per cross-reference request
    pub batch_size: usize,
    /// Cross-reference chunks (and metadata lookups) in flight at once
    pub max_concurrent_requests: usize,
    /// Deadline for a whole `convert` call; unanswered identifiers time out
    pub batch_timeout: Option<Duration>,
    /// Retry policy for transient service errors
    pub retry: RetryPolicy,
    /// Whether to run the metadata enricher when one is configured
    pub enrich_metadata: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            batch_timeout: None,
            retry: RetryPolicy::default(),
            enrich_metadata: true,
        }
    }
}

impl ConversionConfig {
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidConfig` for out-of-range values.
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConversionError::InvalidConfig(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConversionError::InvalidConfig(
                "at least one concurrent request is required".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConversionError::InvalidConfig(
                "retry policy must allow at least one attempt".to_string(),
            ));
        }
        Ok(())
    }
}

/// Converts batches of raw identifiers into the default database of their
/// ontology type.
///
/// The registry is shared; every call to [`convert`](Self::convert) works on
/// its own state, so one engine can serve concurrent conversions.
pub struct ConversionEngine<X, M = NoMetadata> {
    registry: Arc<OntologyTypeRegistry>,
    resolver: CrossReferenceResolver<X>,
    enricher: Option<MetadataEnricher<M>>,
    policy: AmbiguityPolicy,
    config: ConversionConfig,
}

impl<X: CrossReferenceService> ConversionEngine<X, NoMetadata> {
    /// Create an engine without metadata enrichment
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvalidConfig` if the configuration is invalid.
    pub fn new(
        registry: Arc<OntologyTypeRegistry>,
        xrefs: X,
        config: ConversionConfig,
    ) -> Result<Self, ConversionError> {
        config.validate()?;
        let resolver = CrossReferenceResolver::new(Arc::new(xrefs), &config);

        Ok(Self {
            registry,
            resolver,
            enricher: None,
            policy: AmbiguityPolicy,
            config,
        })
    }
}

impl<X: CrossReferenceService, M: MetadataService> ConversionEngine<X, M> {
    /// Attach a metadata service; ignored when `enrich_metadata` is off
    pub fn with_metadata<N: MetadataService>(self, metadata: N) -> ConversionEngine<X, N> {
        let enricher = self
            .config
            .enrich_metadata
            .then(|| MetadataEnricher::new(Arc::new(metadata), &self.config));

        ConversionEngine {
            registry: self.registry,
            resolver: self.resolver,
            enricher,
            policy: self.policy,
            config: self.config,
        }
    }

    pub fn registry(&self) -> &OntologyTypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert one batch of `PREFIX:VALUE` identifiers.
    ///
    /// Problems with individual identifiers end up in `failed_ids`; only an
    /// unknown ontology type or a cross-reference service that answered
    /// nothing at all fail the call.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Registry` for an unknown ontology type and
    /// `ConversionError::ServiceUnavailable` when every request failed and
    /// nothing could be converted.
    pub async fn convert<S: AsRef<str>>(
        &self,
        ontology_type: &str,
        ids: &[S],
    ) -> Result<ConversionResult, ConversionError> {
        let config = self.registry.config_for(ontology_type)?;
        let deadline = self.config.batch_timeout.map(|t| Instant::now() + t);
        let default_database = config.default_database.as_str();

        tracing::info!(
            "Converting {} {} ids to {default_database} via {}",
            ids.len(),
            config.type_name,
            self.resolver.base_url()
        );

        let parsed = parse_identifiers(ids, config);
        let resolution = self
            .resolver
            .resolve(
                &parsed.identifiers,
                default_database,
                &config.database_names(),
                deadline,
            )
            .await;

        let mut aggregator =
            ResultAggregator::new(ids.iter().map(|s| s.as_ref().to_string()).collect());
        aggregator.record_failures(parsed.failures);

        for (&idx, reason) in &resolution.failures {
            aggregator.record_failure(idx, reason.clone());
        }

        for identifier in &parsed.identifiers {
            let Some(matches) = resolution.matches.get(&identifier.index) else {
                continue;
            };
            let outcome = self.policy.decide(identifier, matches);
            tracing::debug!("{identifier}: {outcome:?}");
            aggregator.record_outcome(identifier.index, outcome);
        }

        let mut result = aggregator.finish(config, self.resolver.base_url());
        attach_xrefs(&mut result.converted_ids, &resolution.aliases);

        if resolution.service_unreachable() && result.converted_ids.is_empty() {
            let reason = result
                .failed_ids
                .first()
                .map(|f| f.reason.to_string())
                .unwrap_or_default();
            return Err(ConversionError::ServiceUnavailable(reason));
        }

        if let Some(enricher) = &self.enricher {
            let converted = std::mem::take(&mut result.converted_ids);
            result.converted_ids = enricher.enrich(converted, default_database, deadline).await;
        }

        tracing::info!(
            "Converted {} of {} ids ({} kept as-is), {} failed",
            result.converted_ids.len(),
            result.ids.len(),
            result.fallback_count(),
            result.failed_ids.len()
        );

        Ok(result)
    }
}

/// Fill `xrefs` with the raw id (when it was converted away) and the
/// equivalents found in the other supported databases
fn attach_xrefs(converted: &mut [ConvertedId], aliases: &BTreeMap<usize, Vec<String>>) {
    for entry in converted {
        let mut xrefs: Vec<String> = Vec::new();
        if entry.resolved_id.as_deref().is_some_and(|id| id != entry.raw_id) {
            xrefs.push(entry.raw_id.clone());
        }
        for alias in aliases.get(&entry.idx).into_iter().flatten() {
            if *alias != entry.effective_id() && !xrefs.contains(alias) {
                xrefs.push(alias.clone());
            }
        }
        entry.xrefs = xrefs;
    }
}
