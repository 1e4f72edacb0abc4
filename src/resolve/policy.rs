use crate::core::identifier::RawIdentifier;
use crate::resolve::resolver::CrossReferenceMatch;

/// Decision for a single identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exactly one identifier in the default database
    Resolved(String),
    /// No identifier in the default database; the raw id is kept
    Fallback(String),
    /// Several identifiers in the default database; nothing is kept
    Rejected { candidates: Vec<String> },
}

/// Picks (or refuses to pick) the default-database identifier for an input.
///
/// Many inputs may converge onto one default id. One input fanning out to
/// several default ids is rejected with the candidates listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbiguityPolicy;

impl AmbiguityPolicy {
    pub fn decide(&self, identifier: &RawIdentifier, matches: &[CrossReferenceMatch]) -> Outcome {
        let mut candidates: Vec<String> = Vec::new();
        for m in matches {
            if !candidates.contains(&m.target_id) {
                candidates.push(m.target_id.clone());
            }
        }

        match candidates.len() {
            0 => Outcome::Fallback(identifier.curie()),
            1 => Outcome::Resolved(candidates.remove(0)),
            _ => Outcome::Rejected { candidates },
        }
    }
}
