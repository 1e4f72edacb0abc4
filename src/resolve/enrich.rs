use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::core::types::{ConvertedId, Metadata};
use crate::resolve::engine::ConversionConfig;
use crate::services::retry::RetryPolicy;
use crate::services::MetadataService;

/// Attaches display metadata to resolved identifiers.
///
/// Each distinct resolved id is fetched once per call. Misses and service
/// errors leave `metadata` empty; they never change `resolved_id`, `raw_id`
/// or `idx`, and never fail the batch.
pub struct MetadataEnricher<M> {
    service: Arc<M>,
    max_concurrent: usize,
    retry: RetryPolicy,
}

impl<M: MetadataService> MetadataEnricher<M> {
    pub fn new(service: Arc<M>, config: &ConversionConfig) -> Self {
        Self {
            service,
            max_concurrent: config.max_concurrent_requests.max(1),
            retry: config.retry.clone(),
        }
    }

    pub async fn enrich(
        &self,
        mut converted: Vec<ConvertedId>,
        database: &str,
        deadline: Option<Instant>,
    ) -> Vec<ConvertedId> {
        // resolved id -> positions in `converted`
        let mut wanted: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, entry) in converted.iter().enumerate() {
            if let Some(id) = &entry.resolved_id {
                wanted.entry(id.clone()).or_default().push(pos);
            }
        }

        if wanted.is_empty() {
            return converted;
        }

        let mut tasks: JoinSet<(String, Option<Metadata>)> = JoinSet::new();
        let permits = Arc::new(Semaphore::new(self.max_concurrent));

        for id in wanted.keys() {
            let id = id.clone();
            let database = database.to_string();
            let service = Arc::clone(&self.service);
            let permits = Arc::clone(&permits);
            let retry = self.retry.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let what = format!("Metadata lookup for {id}");
                match retry.run(&what, || service.fetch_metadata(&id, &database)).await {
                    Ok(Some(metadata)) => (id, Some(metadata)),
                    Ok(None) => {
                        tracing::debug!("No metadata found for {id}");
                        (id, None)
                    }
                    Err(e) => {
                        tracing::warn!("Metadata lookup failed for {id}: {e}");
                        (id, None)
                    }
                }
            });
        }

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!(
                            "Batch deadline reached, {} metadata lookups left unanswered",
                            tasks.len()
                        );
                        tasks.abort_all();
                        break;
                    }
                },
                None => tasks.join_next().await,
            };

            match next {
                None => break,
                Some(Ok((id, Some(metadata)))) => {
                    for &pos in wanted.get(&id).into_iter().flatten() {
                        converted[pos].metadata = Some(metadata.clone());
                    }
                }
                Some(Ok((_, None))) => {}
                Some(Err(e)) => tracing::warn!("Metadata lookup task did not complete: {e}"),
            }
        }

        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeNames {
        calls: AtomicUsize,
    }

    impl MetadataService for FakeNames {
        async fn fetch_metadata(&self, id: &str, _database: &str) -> Result<Option<Metadata>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match id {
                "MONDO:0005148" => Ok(Some(Metadata {
                    id: id.to_string(),
                    name: Some("type 2 diabetes mellitus".to_string()),
                    ..Metadata::default()
                })),
                "MONDO:0000001" => Err(ServiceError::Status {
                    status: 400,
                    body: "bad query".into(),
                }),
                "MONDO:0009999" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(None)
                }
                _ => Ok(None),
            }
        }
    }

    fn enricher() -> (Arc<FakeNames>, MetadataEnricher<FakeNames>) {
        let service = Arc::new(FakeNames {
            calls: AtomicUsize::new(0),
        });
        let config = ConversionConfig {
            retry: RetryPolicy::none(),
            ..ConversionConfig::default()
        };
        (Arc::clone(&service), MetadataEnricher::new(service, &config))
    }

    #[tokio::test]
    async fn test_enrich_attaches_metadata_and_keeps_ids() {
        let (service, enricher) = enricher();
        let converted = vec![
            ConvertedId::resolved(0, "DOID:9352", "MONDO:0005148"),
            ConvertedId::fallback(1, "MESH:D000069290"),
            ConvertedId::resolved(2, "MESH:D003924", "MONDO:0005148"),
            ConvertedId::resolved(3, "DOID:1", "MONDO:0000001"),
            ConvertedId::resolved(4, "DOID:2", "MONDO:0000002"),
        ];

        let enriched = enricher.enrich(converted.clone(), "MONDO", None).await;

        assert_eq!(enriched.len(), converted.len());
        for (before, after) in converted.iter().zip(&enriched) {
            assert_eq!(before.idx, after.idx);
            assert_eq!(before.raw_id, after.raw_id);
            assert_eq!(before.resolved_id, after.resolved_id);
        }
        let name = |i: usize| enriched[i].metadata.as_ref().and_then(|m| m.name.clone());
        assert_eq!(name(0).as_deref(), Some("type 2 diabetes mellitus"));
        assert_eq!(name(2).as_deref(), Some("type 2 diabetes mellitus"));
        assert!(enriched[1].metadata.is_none());
        assert!(enriched[3].metadata.is_none());
        assert!(enriched[4].metadata.is_none());

        // One lookup per distinct resolved id, none for the fallback
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_leaves_slow_entries_empty() {
        let (_, enricher) = enricher();
        let converted = vec![
            ConvertedId::resolved(0, "DOID:9352", "MONDO:0005148"),
            ConvertedId::resolved(1, "DOID:9", "MONDO:0009999"),
        ];
        let deadline = Instant::now() + Duration::from_secs(1);

        let enriched = enricher.enrich(converted, "MONDO", Some(deadline)).await;

        assert!(enriched[0].metadata.is_some());
        assert!(enriched[1].metadata.is_none());
    }
}
