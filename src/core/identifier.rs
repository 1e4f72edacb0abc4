use thiserror::Error;

use crate::core::types::{FailedId, FailureReason};
use crate::registry::store::OntologyTypeConfig;

/// A parsed `PREFIX:VALUE` identifier tied to its position in the input batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIdentifier {
    pub index: usize,
    pub prefix: String,
    pub value: String,
}

impl RawIdentifier {
    pub fn new(index: usize, prefix: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            index,
            prefix: prefix.into(),
            value: value.into(),
        }
    }

    /// The identifier in `PREFIX:VALUE` form; identical to the input token
    pub fn curie(&self) -> String {
        format!("{}:{}", self.prefix, self.value)
    }
}

impl std::fmt::Display for RawIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.value)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Malformed identifier '{0}': expected <database>:<id>")]
    Malformed(String),

    #[error("Unsupported database '{prefix}' in '{id}', only support {}", supported.join(", "))]
    UnsupportedDatabase {
        id: String,
        prefix: String,
        supported: Vec<String>,
    },
}

impl IdentifierError {
    pub fn into_reason(self) -> FailureReason {
        match self {
            Self::Malformed(_) => FailureReason::Malformed,
            Self::UnsupportedDatabase { supported, .. } => {
                FailureReason::UnsupportedDatabase { supported }
            }
        }
    }
}

/// Split a token on its first colon.
///
/// A value containing a second colon or any whitespace cannot be attributed to
/// a single entry of its vocabulary and is rejected as malformed.
///
/// # Errors
///
/// Returns `IdentifierError::Malformed` if the token has no colon, an empty
/// prefix or value, or an ambiguous value.
pub fn split_identifier(token: &str) -> Result<(&str, &str), IdentifierError> {
    let malformed = || IdentifierError::Malformed(token.to_string());

    let (prefix, value) = token.split_once(':').ok_or_else(malformed)?;

    if prefix.is_empty() || value.is_empty() {
        return Err(malformed());
    }
    if prefix.chars().any(char::is_whitespace)
        || value.contains(':')
        || value.chars().any(char::is_whitespace)
    {
        return Err(malformed());
    }

    Ok((prefix, value))
}

/// Parse one token and check its prefix against the ontology type's databases
///
/// # Errors
///
/// Returns `IdentifierError::Malformed` for tokens that are not `PREFIX:VALUE`
/// and `IdentifierError::UnsupportedDatabase` for unregistered prefixes.
pub fn parse_identifier(
    index: usize,
    token: &str,
    config: &OntologyTypeConfig,
) -> Result<RawIdentifier, IdentifierError> {
    let (prefix, value) = split_identifier(token)?;

    if !config.supports(prefix) {
        return Err(IdentifierError::UnsupportedDatabase {
            id: token.to_string(),
            prefix: prefix.to_string(),
            supported: config.database_names(),
        });
    }

    Ok(RawIdentifier::new(index, prefix, value))
}

/// Identifiers of one batch, split into parseable ones and per-token failures
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub identifiers: Vec<RawIdentifier>,
    pub failures: Vec<FailedId>,
}

/// Parse a whole batch; failures never abort the batch
pub fn parse_identifiers<S: AsRef<str>>(tokens: &[S], config: &OntologyTypeConfig) -> ParsedBatch {
    let mut batch = ParsedBatch::default();

    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        match parse_identifier(index, token, config) {
            Ok(identifier) => batch.identifiers.push(identifier),
            Err(e) => {
                tracing::debug!("Skipping identifier {index}: {e}");
                batch
                    .failures
                    .push(FailedId::new(index, token, e.into_reason()));
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease() -> OntologyTypeConfig {
        OntologyTypeConfig::new("disease", "Disease", "MONDO", &["MONDO", "DOID", "MESH", "ICD-9"])
    }

    #[test]
    fn test_split_on_first_colon() {
        assert_eq!(split_identifier("MESH:D015673").unwrap(), ("MESH", "D015673"));
        assert_eq!(split_identifier("ICD-9:250.00").unwrap(), ("ICD-9", "250.00"));
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["DOID7402", ":7402", "DOID:", "", "DOID:74 02", "MGI:MGI:1342288", " DOID:1"] {
            assert_eq!(
                split_identifier(token),
                Err(IdentifierError::Malformed(token.to_string())),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_unsupported_prefix() {
        let err = parse_identifier(3, "SNOMED:22298006", &disease()).unwrap_err();
        match err {
            IdentifierError::UnsupportedDatabase { prefix, supported, .. } => {
                assert_eq!(prefix, "SNOMED");
                assert_eq!(supported, vec!["MONDO", "DOID", "MESH", "ICD-9"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(parse_identifier(0, "doid:7402", &disease()).is_err());
    }

    #[test]
    fn test_parse_batch_keeps_indices() {
        let tokens = ["DOID:7402", "garbage", "MESH:D015673", "SNOMED:1"];
        let batch = parse_identifiers(&tokens, &disease());

        let indices: Vec<usize> = batch.identifiers.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(batch.identifiers[1].curie(), "MESH:D015673");

        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.failures[0].idx, 1);
        assert_eq!(batch.failures[0].reason, FailureReason::Malformed);
        assert_eq!(batch.failures[1].id, "SNOMED:1");
        assert!(matches!(
            batch.failures[1].reason,
            FailureReason::UnsupportedDatabase { .. }
        ));
    }
}
