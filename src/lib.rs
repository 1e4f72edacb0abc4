//! # onto-match
//!
//! A library for normalizing biomedical ontology identifiers before they are
//! loaded into a knowledge graph.
//!
//! Entities arrive from many sources, each naming them in its own vocabulary:
//! the same disease may be `DOID:9352`, `MESH:D003924` or `MONDO:0005148`.
//! `onto-match` converts a batch of `PREFIX:VALUE` identifiers into the single
//! default database configured for their ontology type, using an external
//! cross-reference service to find equivalents.
//!
//! ## Features
//!
//! - **Per-type registry**: supported and default databases for disease, gene,
//!   compound, symptom and metabolite, replaceable from a JSON file
//! - **Per-identifier outcomes**: one bad identifier never fails the batch
//! - **Ambiguity detection**: several default-database equivalents are reported,
//!   never silently picked
//! - **Fallback**: identifiers without an equivalent keep their original form
//! - **Chunked concurrent lookups** with retries and an optional batch deadline
//! - **Metadata enrichment**: names, descriptions and synonyms for resolved ids
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use onto_match::{ConversionConfig, ConversionEngine, OntologyTypeRegistry};
//! use onto_match::services::oxo::OxoClient;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = Arc::new(OntologyTypeRegistry::load_embedded()?);
//! let engine = ConversionEngine::new(registry, OxoClient::new()?, ConversionConfig::default())?;
//!
//! let result = engine.convert("disease", &["DOID:9352", "MESH:D003924"]).await?;
//! println!("{} converted, {} failed", result.converted_ids.len(), result.failed_ids.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: Ontology types and their databases
//! - [`core`]: Identifier parsing and result types
//! - [`resolve`]: Resolution pipeline and conversion engine
//! - [`services`]: Cross-reference and metadata service clients
//! - [`parsing`]: Ontology file reader
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;
pub mod registry;
pub mod resolve;
pub mod services;

// Re-export commonly used types for convenience
pub use core::identifier::{parse_identifier, parse_identifiers, RawIdentifier};
pub use core::types::*;
pub use registry::store::{LookupService, OntologyTypeConfig, OntologyTypeRegistry, RegistryError};
pub use resolve::engine::{ConversionConfig, ConversionEngine, ConversionError};
pub use services::{CrossReferenceService, MetadataService, ServiceError, XrefRecord};
