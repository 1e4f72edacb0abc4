use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_registry, RegistryArgs};
use crate::parsing::tsv::{self, REQUIRED_COLUMNS};

#[derive(Args)]
pub struct TemplateArgs {
    /// Path to output file (stdout when omitted)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub registry: RegistryArgs,
}

/// Example rows (id, name, label, resource) for the built-in ontology types
fn example_rows(type_name: &str) -> &'static [[&'static str; 4]] {
    match type_name {
        "disease" => &[
            ["DOID:4001", "ovarian carcinoma", "Disease", "DOID"],
            ["MESH:D015673", "Fatigue Syndrome, Chronic", "Disease", "MESH"],
        ],
        "gene" => &[
            ["ENTREZ:7157", "tumor protein p53", "Gene", "ENTREZ"],
            ["ENTREZ:7100", "toll like receptor 5", "Gene", "ENTREZ"],
            ["HGNC:11998", "tumor protein p53", "Gene", "HGNC"],
            ["ENSEMBL:ENSG00000141510", "tumor protein p53", "Gene", "ENSEMBL"],
            ["SYMBOL:TP53", "tumor protein p53", "Gene", "SYMBOL"],
        ],
        "compound" => &[
            ["DrugBank:DB01628", "ETORICOXIB", "Compound", "DrugBank"],
            ["DrugBank:DB01627", "Lincomycin", "Compound", "DrugBank"],
        ],
        "symptom" => &[
            ["MESH:D000006", "Abdomen, Acute", "Symptom", "MESH"],
            ["SYMP:0000149", "sudden onset of severe chills", "Symptom", "SYMP"],
        ],
        "metabolite" => &[["HMDB:HMDB0003345", "alpha-D-Glucose", "Metabolite", "HMDB"]],
        _ => &[],
    }
}

/// Render a template file for an ontology type
pub fn render_template(type_name: &str) -> String {
    let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    let rows: Vec<Vec<String>> = example_rows(type_name)
        .iter()
        .map(|row| row.iter().map(|v| (*v).to_string()).collect())
        .collect();
    tsv::render_rows(&columns, &rows, '\t')
}

/// Execute template subcommand
///
/// # Errors
///
/// Returns an error if the ontology type is unknown or the file cannot be
/// written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: TemplateArgs, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.registry.as_deref())?;
    let config = registry.config_for(&args.registry.ontology_type)?;
    let content = render_template(&config.type_name);

    match &args.output_file {
        Some(path) => {
            std::fs::write(path, &content)?;
            if verbose {
                eprintln!("Wrote {} template to {}", config.type_name, path.display());
            }
        }
        None => print!("{content}"),
    }

    Ok(())
}
