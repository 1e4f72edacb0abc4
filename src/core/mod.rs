//! Core data types for identifier conversion.
//!
//! - [`RawIdentifier`](identifier::RawIdentifier): a `PREFIX:VALUE` token tied to its input position
//! - [`ConvertedId`](types::ConvertedId), [`FailedId`](types::FailedId): per-identifier results
//! - [`ConversionResult`](types::ConversionResult): the ordered result of one batch
//!
//! ## Identifier Form
//!
//! | Token | Prefix | Value |
//! |-------|--------|-------|
//! | `MONDO:0005148` | MONDO | 0005148 |
//! | `ICD-9:250.00`  | ICD-9 | 250.00 |
//! | `DrugBank:DB00945` | DrugBank | DB00945 |
//!
//! Prefixes are matched exactly against the registry spelling.

pub mod identifier;
pub mod types;
