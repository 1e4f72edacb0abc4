//! Command-line interface for onto-match.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **convert**: Convert the ids of an ontology file to the default database
//! - **idtypes**: List the databases supported for an ontology type
//! - **template**: Write an example input file
//!
//! ## Usage
//!
//! ```text
//! # Write a template and convert it
//! onto-match template -O disease -o disease.tsv
//! onto-match convert -i disease.tsv -O disease -o disease.json
//!
//! # Formatted rows instead of the raw conversion result
//! onto-match convert -i disease.tsv -O disease -o formatted.tsv --format tsv
//!
//! # Which prefixes are accepted for genes?
//! onto-match idtypes -O gene
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::registry::store::OntologyTypeRegistry;

pub mod convert;
pub mod idtypes;
pub mod template;

#[derive(Parser)]
#[command(name = "onto-match")]
#[command(version)]
#[command(about = "Normalize biomedical ontology identifiers for knowledge graph construction")]
#[command(
    long_about = "onto-match converts identifiers from many vocabularies (MESH, OMIM, DOID, ICD, ...) into one default database per ontology type.\n\nEquivalent identifiers are found through an external cross-reference service:\n- Exactly one equivalent in the default database: the id is converted\n- No equivalent: the original id is kept\n- Several equivalents: the id is reported as ambiguous"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert ontology ids
    Convert(convert::ConvertArgs),

    /// Which ID types are supported
    Idtypes(idtypes::IdtypesArgs),

    /// Generate input file template
    Template(template::TemplateArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load a registry from `path`, or the embedded one
///
/// # Errors
///
/// Returns an error if the registry file cannot be read or parsed.
pub fn load_registry(path: Option<&Path>) -> anyhow::Result<OntologyTypeRegistry> {
    let registry = match path {
        Some(path) => OntologyTypeRegistry::load_from_file(path)?,
        None => OntologyTypeRegistry::load_embedded()?,
    };
    Ok(registry)
}

/// Arguments shared by every subcommand that needs the registry
#[derive(clap::Args)]
pub struct RegistryArgs {
    /// Ontology type (disease, gene, compound, symptom, metabolite, ...)
    #[arg(short = 'O', long)]
    pub ontology_type: String,

    /// Path to a custom ontology type registry (JSON)
    #[arg(long)]
    pub registry: Option<PathBuf>,
}
