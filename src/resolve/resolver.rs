use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::core::identifier::RawIdentifier;
use crate::core::types::FailureReason;
use crate::resolve::engine::ConversionConfig;
use crate::services::retry::RetryPolicy;
use crate::services::{CrossReferenceService, ServiceError, XrefRecord};

/// An equivalent identifier in the default database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferenceMatch {
    pub source_id: String,
    pub target_id: String,
    pub target_database: String,
}

/// Matches and failures for one batch, keyed by input index
#[derive(Debug, Default)]
pub struct Resolution {
    /// Default-database matches per answered identifier (possibly empty)
    pub matches: BTreeMap<usize, Vec<CrossReferenceMatch>>,

    /// Equivalents in the other candidate databases, registry spelling
    pub aliases: BTreeMap<usize, Vec<String>>,

    /// Identifiers whose chunk failed or was not answered in time
    pub failures: BTreeMap<usize, FailureReason>,

    /// Number of chunks sent to the service
    pub chunks_sent: usize,

    /// Number of chunks that failed with a service error
    pub chunks_failed: usize,
}

impl Resolution {
    /// True when every chunk sent to the service failed with a service error
    pub fn service_unreachable(&self) -> bool {
        self.chunks_sent > 0 && self.chunks_failed == self.chunks_sent
    }
}

type ChunkResult = (usize, Result<Vec<XrefRecord>, ServiceError>);

/// Finds default-database equivalents for parsed identifiers.
///
/// Identifiers already in the default database match themselves without a
/// network call. All others are sent to the cross-reference service in chunks
/// of `batch_size`, with at most `max_concurrent` chunks in flight. Each
/// chunk's answer is merged by input index, so the order in which chunks
/// complete does not matter.
pub struct CrossReferenceResolver<S> {
    service: Arc<S>,
    batch_size: usize,
    max_concurrent: usize,
    retry: RetryPolicy,
}

impl<S: CrossReferenceService> CrossReferenceResolver<S> {
    pub fn new(service: Arc<S>, config: &ConversionConfig) -> Self {
        Self {
            service,
            batch_size: config.batch_size.max(1),
            max_concurrent: config.max_concurrent_requests.max(1),
            retry: config.retry.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.service.base_url()
    }

    /// Resolve a batch, giving up on unanswered chunks at `deadline`
    pub async fn resolve(
        &self,
        identifiers: &[RawIdentifier],
        default_database: &str,
        candidate_databases: &[String],
        deadline: Option<Instant>,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        let mut to_lookup: Vec<&RawIdentifier> = Vec::new();

        for identifier in identifiers {
            if identifier.prefix == default_database {
                let curie = identifier.curie();
                resolution.matches.insert(
                    identifier.index,
                    vec![CrossReferenceMatch {
                        source_id: curie.clone(),
                        target_id: curie,
                        target_database: default_database.to_string(),
                    }],
                );
            } else {
                to_lookup.push(identifier);
            }
        }

        if to_lookup.is_empty() {
            return resolution;
        }

        let total = to_lookup.len();
        let mut pending: BTreeMap<usize, Vec<RawIdentifier>> = BTreeMap::new();
        let mut tasks: JoinSet<ChunkResult> = JoinSet::new();
        let permits = Arc::new(Semaphore::new(self.max_concurrent));

        for (chunk_no, chunk) in to_lookup.chunks(self.batch_size).enumerate() {
            let query: Vec<String> = chunk.iter().map(|id| id.curie()).collect();
            pending.insert(chunk_no, chunk.iter().map(|id| (*id).clone()).collect());

            let service = Arc::clone(&self.service);
            let permits = Arc::clone(&permits);
            let databases = candidate_databases.to_vec();
            let retry = self.retry.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let what = format!("Cross-reference lookup for chunk {chunk_no}");
                let result = retry
                    .run(&what, || service.lookup(&query, &databases))
                    .await;
                (chunk_no, result)
            });
        }
        resolution.chunks_sent = pending.len();

        let mut done = 0;
        let mut timed_out = false;
        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        timed_out = true;
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            match next {
                None => break,
                Some(Ok((chunk_no, result))) => {
                    let Some(chunk) = pending.remove(&chunk_no) else {
                        continue;
                    };
                    done += chunk.len();
                    match result {
                        Ok(records) => {
                            merge_records(
                                &mut resolution,
                                &chunk,
                                &records,
                                default_database,
                                candidate_databases,
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Cross-reference lookup failed for {} identifiers: {e}",
                                chunk.len()
                            );
                            resolution.chunks_failed += 1;
                            for identifier in &chunk {
                                resolution.failures.insert(
                                    identifier.index,
                                    FailureReason::Service {
                                        message: e.to_string(),
                                    },
                                );
                            }
                        }
                    }
                    tracing::info!("Finish {done}/{total}");
                }
                Some(Err(e)) => {
                    tracing::warn!("Cross-reference lookup task did not complete: {e}");
                }
            }
        }

        if timed_out {
            tasks.abort_all();
            tracing::warn!(
                "Batch deadline reached with {} chunks outstanding",
                pending.len()
            );
        }

        for chunk in pending.into_values() {
            for identifier in chunk {
                let reason = if timed_out {
                    FailureReason::Timeout
                } else {
                    FailureReason::Service {
                        message: "lookup task did not complete".to_string(),
                    }
                };
                resolution.failures.insert(identifier.index, reason);
            }
        }

        resolution
    }
}

/// Record the default-database matches of every identifier in an answered chunk,
/// keeping equivalents in the other candidate databases as aliases
fn merge_records(
    resolution: &mut Resolution,
    chunk: &[RawIdentifier],
    records: &[XrefRecord],
    default_database: &str,
    candidate_databases: &[String],
) {
    for identifier in chunk {
        let curie = identifier.curie();
        let mut matches: Vec<CrossReferenceMatch> = Vec::new();
        let mut aliases: Vec<String> = Vec::new();

        for record in records.iter().filter(|r| r.query_id == curie) {
            for mapped in &record.mapped_ids {
                let Some((prefix, local)) = mapped.split_once(':') else {
                    continue;
                };
                if local.is_empty() {
                    continue;
                }

                if prefix.eq_ignore_ascii_case(default_database) {
                    let target_id = format!("{default_database}:{local}");
                    if !matches.iter().any(|m| m.target_id == target_id) {
                        matches.push(CrossReferenceMatch {
                            source_id: curie.clone(),
                            target_id,
                            target_database: default_database.to_string(),
                        });
                    }
                } else if let Some(database) = candidate_databases
                    .iter()
                    .find(|db| db.eq_ignore_ascii_case(prefix))
                {
                    let alias = format!("{database}:{local}");
                    if alias != curie && !aliases.contains(&alias) {
                        aliases.push(alias);
                    }
                }
            }
        }

        tracing::debug!(
            "{curie}: {} match(es) in {default_database}, {} alias(es)",
            matches.len(),
            aliases.len()
        );
        resolution.matches.insert(identifier.index, matches);
        if !aliases.is_empty() {
            resolution.aliases.insert(identifier.index, aliases);
        }
    }
}
