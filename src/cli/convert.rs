use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use crate::cli::{load_registry, OutputFormat, RegistryArgs};
use crate::core::types::ConversionResult;
use crate::parsing::tsv::{self, OntologyTable};
use crate::registry::store::OntologyTypeConfig;
use crate::resolve::engine::{
    ConversionConfig, ConversionEngine, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONCURRENT_REQUESTS,
};
use crate::services::mychem::MYCHEM_URL;
use crate::services::mygene::MYGENE_URL;
use crate::services::ols::OLS4_SEARCH_URL;
use crate::services::oxo::OXO_SEARCH_URL;
use crate::services::retry::RetryPolicy;
use crate::services::select::ServiceEndpoints;
use crate::services::{CrossReferenceService, DEFAULT_REQUEST_TIMEOUT};

#[derive(Args)]
pub struct ConvertArgs {
    /// Path to input file (see the template subcommand)
    #[arg(short, long)]
    pub input_file: PathBuf,

    /// Path to output file (stdout when omitted)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,

    /// Identifiers per cross-reference request (1-500)
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Requests in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_REQUESTS)]
    pub concurrency: usize,

    /// Give up on unanswered ids after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Attempts per request for transient failures
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub request_timeout: u64,

    /// Skip fetching names and descriptions for converted ids
    #[arg(long)]
    pub no_metadata: bool,

    /// OxO search endpoint (disease, symptom)
    #[arg(long, default_value = OXO_SEARCH_URL)]
    pub oxo_url: String,

    /// OLS4 search endpoint (metadata for disease, symptom)
    #[arg(long, default_value = OLS4_SEARCH_URL)]
    pub ols_url: String,

    /// MyGene.info base url (gene)
    #[arg(long, default_value = MYGENE_URL)]
    pub mygene_url: String,

    /// MyChem.info base url (compound, metabolite)
    #[arg(long, default_value = MYCHEM_URL)]
    pub mychem_url: String,
}

impl ConvertArgs {
    fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            batch_size: self.batch_size,
            max_concurrent_requests: self.concurrency,
            batch_timeout: self.timeout.map(Duration::from_secs),
            retry: RetryPolicy {
                max_attempts: self.retries,
                ..RetryPolicy::default()
            },
            enrich_metadata: !self.no_metadata,
        }
    }

    fn endpoints(&self) -> ServiceEndpoints {
        ServiceEndpoints {
            oxo: self.oxo_url.clone(),
            ols: self.ols_url.clone(),
            mygene: self.mygene_url.clone(),
            mychem: self.mychem_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

/// Execute convert subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be read, the ontology type is unknown,
/// the cross-reference service is unreachable, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ConvertArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = Arc::new(load_registry(args.registry.registry.as_deref())?);
    let ontology = registry.config_for(&args.registry.ontology_type)?.clone();

    let table = tsv::read_ontology_file(&args.input_file)?;
    let (ids, row_indices) = table.ids();
    tracing::info!("Total number of IDs: {}", ids.len());

    if verbose {
        eprintln!(
            "Read {} ids from {}, converting to {} with {}",
            ids.len(),
            args.input_file.display(),
            ontology.default_database,
            ontology.service
        );
    }

    let endpoints = args.endpoints();
    let xrefs = endpoints.xref_client(ontology.service)?;
    let metadata = endpoints.metadata_client(ontology.service)?;
    tracing::info!("Using {} for {} ids", xrefs.base_url(), ontology.type_name);
    let engine = ConversionEngine::new(Arc::clone(&registry), xrefs, args.conversion_config())?
        .with_metadata(metadata);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(engine.convert(&ontology.type_name, &ids))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            write_output(args.output_file.as_deref(), &json)?;
        }
        OutputFormat::Tsv => {
            let output = args
                .output_file
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--output-file is required with --format tsv"))?;
            write_formatted(output, &table, &row_indices, &result, &ontology)?;
        }
        OutputFormat::Text => {
            let summary = render_text_summary(&result, &ontology);
            write_output(args.output_file.as_deref(), &summary)?;
        }
    }

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => println!("{content}"),
    }
    Ok(())
}

/// Input rows rewritten with the conversion outcome
#[derive(Debug)]
pub struct FormattedRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub failed_columns: Vec<String>,
    pub failed_rows: Vec<Vec<String>>,
}

fn set_value(columns: &[String], row: &mut [String], column: &str, value: &str) {
    if let Some(i) = columns.iter().position(|c| c == column) {
        row[i] = value.to_string();
    }
}

fn cell<'a>(columns: &[String], row: &'a [String], column: &str) -> &'a str {
    columns
        .iter()
        .position(|c| c == column)
        .and_then(|i| row.get(i))
        .map_or("", String::as_str)
}

/// Merge `values` in front of the `|`-separated list in `existing`, dropping
/// blanks and duplicates
fn merge_list(values: &[String], existing: &str) -> String {
    let mut merged: Vec<&str> = Vec::new();
    let candidates = values
        .iter()
        .map(String::as_str)
        .chain(existing.split(tsv::LIST_SEPARATOR));
    for value in candidates.map(str::trim) {
        if !value.is_empty() && !merged.contains(&value) {
            merged.push(value);
        }
    }
    merged.join(&tsv::LIST_SEPARATOR.to_string())
}

/// Join a conversion result back onto the rows it was read from.
///
/// `row_indices[idx]` is the table row of input position `idx`. Resolved rows
/// take the resolved id, the default database as resource and the type label;
/// rows kept as-is keep their id. Metadata fills `name`, `description` and
/// `synonyms`, and equivalent ids in other databases go to `xrefs`; those
/// columns are added when the input lacks them. Failed rows carry a `reason`
/// column.
pub fn format_rows(
    table: &OntologyTable,
    row_indices: &[usize],
    result: &ConversionResult,
    ontology: &OntologyTypeConfig,
) -> FormattedRows {
    let mut columns = table.columns.clone();
    for extra in [tsv::DESCRIPTION, tsv::SYNONYMS, tsv::XREFS] {
        if table.column_index(extra).is_none() {
            columns.push(extra.to_string());
        }
    }
    let width = columns.len();

    let source_row = |idx: usize| -> Option<Vec<String>> {
        let mut row = row_indices.get(idx).and_then(|&r| table.rows.get(r))?.clone();
        row.resize(width, String::new());
        Some(row)
    };

    let mut rows = Vec::with_capacity(result.converted_ids.len());
    for converted in &result.converted_ids {
        let Some(mut row) = source_row(converted.idx) else {
            continue;
        };

        if let Some(resolved) = &converted.resolved_id {
            set_value(&columns, &mut row, tsv::ID, resolved);
            set_value(&columns, &mut row, tsv::RESOURCE, &ontology.default_database);
            set_value(&columns, &mut row, tsv::LABEL, &ontology.label);
        }

        if let Some(metadata) = &converted.metadata {
            if let Some(name) = metadata.name.as_deref() {
                set_value(&columns, &mut row, tsv::NAME, name);
            }
            if let Some(description) = metadata.description.as_deref() {
                set_value(&columns, &mut row, tsv::DESCRIPTION, description);
            }
            let synonyms = merge_list(&metadata.synonyms, cell(&columns, &row, tsv::SYNONYMS));
            set_value(&columns, &mut row, tsv::SYNONYMS, &synonyms);
        }

        let xrefs = merge_list(&converted.xrefs, cell(&columns, &row, tsv::XREFS));
        set_value(&columns, &mut row, tsv::XREFS, &xrefs);

        row.push(converted.raw_id.clone());
        rows.push(row);
    }

    let mut failed_rows = Vec::with_capacity(result.failed_ids.len());
    for failed in &result.failed_ids {
        let Some(mut row) = source_row(failed.idx) else {
            continue;
        };
        row.push(failed.reason.to_string());
        failed_rows.push(row);
    }

    let mut failed_columns = columns.clone();
    failed_columns.push("reason".to_string());
    columns.push("raw_id".to_string());

    FormattedRows {
        columns,
        rows,
        failed_columns,
        failed_rows,
    }
}

fn write_formatted(
    output: &Path,
    table: &OntologyTable,
    row_indices: &[usize],
    result: &ConversionResult,
    ontology: &OntologyTypeConfig,
) -> anyhow::Result<()> {
    let formatted = format_rows(table, row_indices, result, ontology);

    write_output(
        Some(output),
        &tsv::render_rows(&formatted.columns, &formatted.rows, '\t'),
    )?;

    if !formatted.failed_rows.is_empty() {
        let failed_path = output.with_extension("failed.tsv");
        write_output(
            Some(&failed_path),
            &tsv::render_rows(&formatted.failed_columns, &formatted.failed_rows, '\t'),
        )?;
        eprintln!(
            "{} rows could not be converted, see {}",
            formatted.failed_rows.len(),
            failed_path.display()
        );
    }

    Ok(())
}

fn render_text_summary(result: &ConversionResult, ontology: &OntologyTypeConfig) -> String {
    let mut lines = vec![
        format!(
            "Ontology type: {} (default database {})",
            ontology.type_name, result.default_database
        ),
        format!("Strategy: {}", result.strategy),
        format!(
            "Converted: {} ({} kept as-is)",
            result.converted_ids.len(),
            result.fallback_count()
        ),
        format!("Failed: {}", result.failed_ids.len()),
    ];

    for converted in &result.converted_ids {
        lines.push(format!("  {} -> {}", converted.raw_id, converted.effective_id()));
    }
    for failed in &result.failed_ids {
        lines.push(format!("  {} FAILED: {}", failed.id, failed.reason));
    }

    lines.join("\n")
}
