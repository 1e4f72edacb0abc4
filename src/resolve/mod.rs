//! Identifier resolution pipeline.
//!
//! - [`ConversionEngine`](engine::ConversionEngine): main entry point
//! - [`CrossReferenceResolver`](resolver::CrossReferenceResolver): chunked, concurrent service lookups
//! - [`AmbiguityPolicy`](policy::AmbiguityPolicy): picks or rejects a default-database identifier
//! - [`MetadataEnricher`](enrich::MetadataEnricher): optional display metadata
//! - [`ResultAggregator`](aggregate::ResultAggregator): ordered result assembly
//!
//! ## Pipeline
//!
//! 1. **Parse**: split each token into prefix and value, check the prefix
//! 2. **Resolve**: ids already in the default database match themselves; the
//!    rest are looked up in chunks
//! 3. **Decide**: one default-database match resolves, none keeps the raw id,
//!    several reject the id
//! 4. **Aggregate**: every input position lands in exactly one of
//!    `converted_ids` or `failed_ids`, in input order
//! 5. **Enrich**: attach metadata to resolved ids (failures are non-fatal)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use onto_match::registry::store::OntologyTypeRegistry;
//! use onto_match::resolve::engine::{ConversionConfig, ConversionEngine};
//! use onto_match::services::{ols::Ols4Client, oxo::OxoClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = Arc::new(OntologyTypeRegistry::load_embedded()?);
//! let engine = ConversionEngine::new(registry, OxoClient::new()?, ConversionConfig::default())?
//!     .with_metadata(Ols4Client::new()?);
//!
//! let result = engine.convert("disease", &["DOID:7402", "MESH:D015673"]).await?;
//! for converted in &result.converted_ids {
//!     println!("{} -> {}", converted.raw_id, converted.effective_id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod engine;
pub mod enrich;
pub mod policy;
pub mod resolver;
