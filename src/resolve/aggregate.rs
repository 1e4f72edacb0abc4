use crate::core::types::{ConversionResult, ConvertedId, FailedId, FailureReason, Strategy};
use crate::registry::store::OntologyTypeConfig;
use crate::resolve::policy::Outcome;

#[derive(Debug, Clone)]
enum Slot {
    Failed(FailureReason),
    Decided(Outcome),
}

/// Collects per-index failures and outcomes into one ordered result.
///
/// The first record for an index wins; later ones are ignored. An index with
/// no record at all is reported as failed with `FailureReason::Unanswered`.
#[derive(Debug)]
pub struct ResultAggregator {
    ids: Vec<String>,
    slots: Vec<Option<Slot>>,
}

impl ResultAggregator {
    pub fn new(ids: Vec<String>) -> Self {
        let slots = vec![None; ids.len()];
        Self { ids, slots }
    }

    fn record(&mut self, idx: usize, slot: Slot) {
        if let Some(entry) = self.slots.get_mut(idx) {
            if entry.is_none() {
                *entry = Some(slot);
            }
        }
    }

    pub fn record_failure(&mut self, idx: usize, reason: FailureReason) {
        self.record(idx, Slot::Failed(reason));
    }

    pub fn record_failures(&mut self, failures: impl IntoIterator<Item = FailedId>) {
        for failed in failures {
            self.record_failure(failed.idx, failed.reason);
        }
    }

    pub fn record_outcome(&mut self, idx: usize, outcome: Outcome) {
        self.record(idx, Slot::Decided(outcome));
    }

    pub fn finish(self, config: &OntologyTypeConfig, database_url: &str) -> ConversionResult {
        let mut converted_ids = Vec::new();
        let mut failed_ids = Vec::new();

        for (idx, (raw, slot)) in self.ids.iter().zip(self.slots).enumerate() {
            match slot {
                Some(Slot::Decided(Outcome::Resolved(target))) => {
                    converted_ids.push(ConvertedId::resolved(idx, raw.as_str(), target));
                }
                Some(Slot::Decided(Outcome::Fallback(_))) => {
                    converted_ids.push(ConvertedId::fallback(idx, raw.as_str()));
                }
                Some(Slot::Decided(Outcome::Rejected { candidates })) => {
                    failed_ids.push(FailedId::new(
                        idx,
                        raw.as_str(),
                        FailureReason::Ambiguous { candidates },
                    ));
                }
                Some(Slot::Failed(reason)) => {
                    failed_ids.push(FailedId::new(idx, raw.as_str(), reason));
                }
                None => {
                    failed_ids.push(FailedId::new(idx, raw.as_str(), FailureReason::Unanswered));
                }
            }
        }

        let strategy = if converted_ids.iter().any(ConvertedId::is_fallback) {
            Strategy::Mixture
        } else {
            Strategy::Strict
        };

        ConversionResult {
            ids: self.ids,
            strategy,
            default_database: config.default_database.clone(),
            converted_ids,
            databases: config.database_names(),
            database_url: database_url.to_string(),
            failed_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OntologyTypeConfig {
        OntologyTypeConfig::new("disease", "Disease", "DOID", &["DOID", "MESH"])
    }

    fn ids(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_orders_by_input_position() {
        let mut aggregator = ResultAggregator::new(ids(&["DOID:4001", "MESH:XXXX", "bad", "MESH:D1"]));
        aggregator.record_outcome(3, Outcome::Fallback("MESH:D1".into()));
        aggregator.record_outcome(
            1,
            Outcome::Rejected {
                candidates: vec!["DOID:1".into(), "DOID:2".into()],
            },
        );
        aggregator.record_failure(2, FailureReason::Malformed);
        aggregator.record_outcome(0, Outcome::Resolved("DOID:4001".into()));

        let result = aggregator.finish(&config(), "fake://xrefs");

        let converted: Vec<usize> = result.converted_ids.iter().map(|c| c.idx).collect();
        assert_eq!(converted, vec![0, 3]);
        assert_eq!(result.failed_id_strings(), vec!["MESH:XXXX", "bad"]);
        assert_eq!(result.converted_ids[1].raw_id, "MESH:D1");
        assert_eq!(result.converted_ids[1].resolved_id, None);
        assert_eq!(result.strategy, Strategy::Mixture);
        assert_eq!(result.databases, vec!["DOID", "MESH"]);
    }

    #[test]
    fn test_strict_when_everything_resolves() {
        let mut aggregator = ResultAggregator::new(ids(&["DOID:1", "MESH:2"]));
        aggregator.record_outcome(0, Outcome::Resolved("DOID:1".into()));
        aggregator.record_outcome(1, Outcome::Resolved("DOID:3".into()));

        let result = aggregator.finish(&config(), "fake://xrefs");
        assert_eq!(result.strategy, Strategy::Strict);
        assert!(result.is_complete());
    }

    #[test]
    fn test_unrecorded_index_is_failed() {
        let mut aggregator = ResultAggregator::new(ids(&["DOID:1", "DOID:2"]));
        aggregator.record_outcome(0, Outcome::Resolved("DOID:1".into()));
        aggregator.record_outcome(7, Outcome::Resolved("DOID:9".into()));

        let result = aggregator.finish(&config(), "fake://xrefs");
        assert_eq!(result.converted_ids.len() + result.failed_ids.len(), 2);
        assert_eq!(result.failed_ids[0].reason, FailureReason::Unanswered);
    }

    #[test]
    fn test_first_record_wins() {
        let mut aggregator = ResultAggregator::new(ids(&["DOID:1"]));
        aggregator.record_failure(0, FailureReason::Timeout);
        aggregator.record_outcome(0, Outcome::Resolved("DOID:1".into()));

        let result = aggregator.finish(&config(), "fake://xrefs");
        assert!(result.converted_ids.is_empty());
        assert_eq!(result.failed_ids[0].reason, FailureReason::Timeout);
    }
}
