use clap::Args;

use crate::cli::{load_registry, OutputFormat, RegistryArgs};

#[derive(Args)]
pub struct IdtypesArgs {
    #[command(flatten)]
    pub registry: RegistryArgs,
}

/// Execute idtypes subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded or the ontology type is
/// unknown.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: IdtypesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.registry.as_deref())?;
    let config = registry.config_for(&args.registry.ontology_type)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.databases)?);
        }
        OutputFormat::Tsv => {
            println!("database\thomepage\tdefault");
            for db in &config.databases {
                println!(
                    "{}\t{}\t{}",
                    db.name,
                    db.homepage.as_deref().unwrap_or(""),
                    db.name == config.default_database
                );
            }
        }
        OutputFormat::Text if verbose => {
            println!(
                "{} ({} databases, default {}, via {})",
                config.type_name,
                config.databases.len(),
                config.default_database,
                config.service
            );
            for db in &config.databases {
                println!("{}\t{}", db.name, db.homepage.as_deref().unwrap_or("-"));
            }
        }
        OutputFormat::Text => {
            for name in registry.list_supported_databases(&config.type_name)? {
                println!("{name}");
            }
        }
    }

    Ok(())
}
