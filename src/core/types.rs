use serde::{Deserialize, Serialize};

/// Informational label describing how clean a batch's conversion was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Every converted identifier resolved into the default database
    Strict,
    /// At least one identifier fell back to its original form
    Mixture,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Mixture => write!(f, "Mixture"),
        }
    }
}

/// Descriptive metadata for a resolved identifier
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
}

/// An identifier that made it into the converted set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedId {
    /// Position of the identifier in the input batch
    pub idx: usize,

    /// The identifier exactly as supplied
    pub raw_id: String,

    /// Identifier in the default database, `None` when the raw id is kept
    pub resolved_id: Option<String>,

    pub metadata: Option<Metadata>,

    /// Equivalent identifiers in the other supported databases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xrefs: Vec<String>,
}

impl ConvertedId {
    pub fn resolved(idx: usize, raw_id: impl Into<String>, resolved_id: impl Into<String>) -> Self {
        Self {
            idx,
            raw_id: raw_id.into(),
            resolved_id: Some(resolved_id.into()),
            metadata: None,
            xrefs: Vec::new(),
        }
    }

    pub fn fallback(idx: usize, raw_id: impl Into<String>) -> Self {
        Self {
            idx,
            raw_id: raw_id.into(),
            resolved_id: None,
            metadata: None,
            xrefs: Vec::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.resolved_id.is_none()
    }

    /// The identifier downstream consumers should use for this entry
    pub fn effective_id(&self) -> &str {
        self.resolved_id.as_deref().unwrap_or(&self.raw_id)
    }
}

/// Why an identifier could not be converted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Not of the form `PREFIX:VALUE`
    Malformed,
    /// Prefix is not registered for the ontology type
    UnsupportedDatabase { supported: Vec<String> },
    /// The cross-reference request covering this identifier failed
    Service { message: String },
    /// The batch deadline passed before the identifier was answered
    Timeout,
    /// More than one identifier in the default database matched
    Ambiguous { candidates: Vec<String> },
    /// No outcome was recorded for the identifier
    Unanswered,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "The id must be in the format of <database>:<id>"),
            Self::UnsupportedDatabase { supported } => {
                write!(f, "Invalid prefix, only support {}", supported.join(", "))
            }
            Self::Service { message } => write!(f, "Cross-reference lookup failed: {message}"),
            Self::Timeout => write!(f, "Timed out before the cross-reference lookup finished"),
            Self::Ambiguous { candidates } => {
                write!(f, "Multiple results found: {}", candidates.join(", "))
            }
            Self::Unanswered => write!(f, "No results recorded"),
        }
    }
}

/// An identifier that could not be converted, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedId {
    pub idx: usize,
    pub id: String,
    pub reason: FailureReason,
}

impl FailedId {
    pub fn new(idx: usize, id: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            idx,
            id: id.into(),
            reason,
        }
    }
}

/// Outcome of converting one batch of identifiers.
///
/// Every input position appears exactly once, either in `converted_ids` or in
/// `failed_ids`, and both lists are ordered by input position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub ids: Vec<String>,
    pub strategy: Strategy,
    pub default_database: String,
    pub converted_ids: Vec<ConvertedId>,
    pub databases: Vec<String>,
    pub database_url: String,
    pub failed_ids: Vec<FailedId>,
}

impl ConversionResult {
    /// The original identifier strings of the failed entries, in input order
    pub fn failed_id_strings(&self) -> Vec<&str> {
        self.failed_ids.iter().map(|f| f.id.as_str()).collect()
    }

    pub fn converted(&self, idx: usize) -> Option<&ConvertedId> {
        self.converted_ids.iter().find(|c| c.idx == idx)
    }

    pub fn failed(&self, idx: usize) -> Option<&FailedId> {
        self.failed_ids.iter().find(|f| f.idx == idx)
    }

    pub fn is_complete(&self) -> bool {
        self.failed_ids.is_empty()
    }

    pub fn fallback_count(&self) -> usize {
        self.converted_ids.iter().filter(|c| c.is_fallback()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_id() {
        let resolved = ConvertedId::resolved(0, "DOID:9352", "MONDO:0005148");
        assert_eq!(resolved.effective_id(), "MONDO:0005148");
        assert!(!resolved.is_fallback());

        let kept = ConvertedId::fallback(1, "MESH:D000069290");
        assert_eq!(kept.effective_id(), "MESH:D000069290");
        assert!(kept.is_fallback());
    }

    #[test]
    fn test_failure_reason_serialization() {
        let reason = FailureReason::Ambiguous {
            candidates: vec!["DOID:1".to_string(), "DOID:2".to_string()],
        };
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("\"kind\":\"ambiguous\""));
        assert!(json.contains("DOID:2"));
        assert_eq!(reason.to_string(), "Multiple results found: DOID:1, DOID:2");
    }

    #[test]
    fn test_converted_id_serializes_null_fields() {
        let kept = ConvertedId::fallback(0, "MESH:D000069290");
        let value = serde_json::to_value(&kept).unwrap();
        assert_eq!(value["resolved_id"], serde_json::Value::Null);
        assert_eq!(value["metadata"], serde_json::Value::Null);
        assert_eq!(value["raw_id"], "MESH:D000069290");
    }
}
