//! Zotero → Kumu CLI
//!
//! Builds the Kumu import file and inspects taxonomies and configuration.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zotero_kumu::graph::{save_document, to_json_string};
use zotero_kumu::{
    build_graph, AppConfig, DuplicatePolicy, GraphElement, JsonFileSource, OutputFormat,
    RecordSource, Taxonomy, ZoteroClient,
};

#[derive(Parser)]
#[command(name = "zotero-kumu")]
#[command(about = "Build a Kumu graph import from a Zotero library")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch items, build the graph and write the import file
    Build {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Read items from a saved JSON array instead of the Zotero API
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to output.path from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Taxonomy JSON file (defaults to the configured taxonomy)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,

        /// Emit each element and connection once
        #[arg(long)]
        merge_duplicates: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show the flattened taxonomy
    Themes {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Taxonomy JSON file (defaults to the configured taxonomy)
        #[arg(short, long)]
        taxonomy: Option<PathBuf>,

        /// Output Theme elements and containment edges as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "zotero-kumu.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Build {
            config,
            input,
            output,
            taxonomy,
            merge_duplicates,
            compact,
        } => {
            let mut cfg = AppConfig::load_from(config.as_deref()).context("loading configuration")?;
            if taxonomy.is_some() {
                cfg.taxonomy.path = taxonomy;
            }
            if let Some(output) = output {
                cfg.output.path = output;
            }
            if merge_duplicates {
                cfg.graph.duplicates = DuplicatePolicy::Merge;
            }
            if compact {
                cfg.output.format = OutputFormat::Compact;
            }
            build(&cfg, input)
        }

        Commands::Themes { config, taxonomy, json } => {
            let mut cfg = AppConfig::load_from(config.as_deref()).context("loading configuration")?;
            if taxonomy.is_some() {
                cfg.taxonomy.path = taxonomy;
            }
            let taxonomy = Taxonomy::load(&cfg.taxonomy).context("loading taxonomy")?;

            if json {
                let elements: Vec<GraphElement> = taxonomy
                    .flatten_labels()
                    .into_iter()
                    .map(GraphElement::theme)
                    .collect();
                let doc = zotero_kumu::GraphDocument {
                    elements,
                    connections: taxonomy.flatten_edges(),
                };
                println!("{}", to_json_string(&doc, OutputFormat::Pretty, cfg.output.ascii_only)?);
            } else {
                print!("{}", taxonomy.render_tree());
                println!(
                    "\n{} themes, {} containment edges",
                    taxonomy.flatten_labels().len(),
                    taxonomy.flatten_edges().len()
                );
                println!("Embedded taxonomies: {}", Taxonomy::embedded_names().join(", "));
            }
            Ok(())
        }

        Commands::Config { command } => run_config(command),
    }
}

fn build(cfg: &AppConfig, input: Option<PathBuf>) -> anyhow::Result<()> {
    // Setup: everything that can fail fatally happens before the graph exists.
    let taxonomy = Taxonomy::load(&cfg.taxonomy).context("loading taxonomy")?;
    let source: Box<dyn RecordSource> = match input {
        Some(path) => Box::new(JsonFileSource::new(path)),
        None => Box::new(ZoteroClient::new(&cfg.zotero).context("configuring Zotero access")?),
    };

    println!("📚 Reading items from {}", source.describe());
    let records = source
        .fetch()
        .with_context(|| format!("fetching items from {}", source.describe()))?;

    let output = build_graph(&taxonomy, &records, cfg.graph.duplicates);

    save_document(
        &output.document,
        cfg.output.format,
        cfg.output.ascii_only,
        &cfg.output.path,
    )
    .with_context(|| format!("writing {}", cfg.output.path.display()))?;

    println!(
        "✅ Wrote {}: {} elements, {} connections",
        cfg.output.path.display(),
        output.document.element_count(),
        output.document.connection_count()
    );
    println!(
        "   Items: {} mapped, {} skipped",
        output.stats.records_mapped, output.stats.records_skipped
    );
    if cfg.graph.duplicates == DuplicatePolicy::Merge {
        println!(
            "   Merged: {} elements, {} connections",
            output.stats.elements_merged, output.stats.connections_merged
        );
    }

    if !output.is_complete() {
        println!("\n⚠️  Skipped items:");
        for failure in &output.failures {
            println!("  #{}: {}", failure.position + 1, failure.error);
        }
    }

    Ok(())
}

fn run_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show { config, toml, json } => {
            let cfg = AppConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 zotero-kumu Configuration\n");
                println!("Zotero:");
                println!("  Library: {:?} ({:?})", cfg.zotero.library_id, cfg.zotero.library_type);
                println!("  API key: {}", if cfg.zotero.api_key.is_some() { "set" } else { "not set" });
                println!("  Base URL: {}", cfg.zotero.base_url);
                println!("  Page size: {}", cfg.zotero.effective_page_size());
                println!("  Max items: {}", cfg.zotero.max_items);

                println!("\nTaxonomy:");
                match &cfg.taxonomy.path {
                    Some(path) => println!("  File: {:?}", path),
                    None => println!("  Embedded: {}", cfg.taxonomy.name),
                }

                println!("\nOutput:");
                println!("  Path: {:?}", cfg.output.path);
                println!("  Format: {:?}", cfg.output.format);
                println!("  ASCII only: {}", cfg.output.ascii_only);

                println!("\nGraph:");
                println!("  Duplicates: {:?}", cfg.graph.duplicates);
            }
        }

        ConfigCommands::Init { output } => {
            let cfg = AppConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        ConfigCommands::Validate { config } => match check_config(config.as_deref()) {
            Ok((cfg, taxonomy)) => {
                println!("✅ Configuration is valid");
                println!("   Taxonomy: {} themes", taxonomy.flatten_labels().len());
                match cfg.zotero.access() {
                    Ok(a) => println!("   Library: {} {}", a.library_type.api_segment(), a.library_id),
                    Err(e) => println!("   ⚠️  Library: {} (only --input builds will work)", e),
                }
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {:#}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

/// Load the configuration and the taxonomy it names; both must succeed
fn check_config(config: Option<&str>) -> anyhow::Result<(AppConfig, Taxonomy)> {
    let cfg = AppConfig::load_from(config).context("loading configuration")?;
    let taxonomy = Taxonomy::load(&cfg.taxonomy).context("loading taxonomy")?;
    Ok((cfg, taxonomy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("zotero-kumu.toml");
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_check_config_accepts_embedded_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[taxonomy]\nname = \"docking\"\n");
        let (_, taxonomy) = check_config(Some(&path)).unwrap();
        assert!(!taxonomy.flatten_labels().is_empty());
    }

    #[test]
    fn test_check_config_rejects_unloadable_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let body = format!("[taxonomy]\npath = {:?}\n", missing.to_string_lossy());
        let path = write_config(&dir, &body);

        let err = check_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("loading taxonomy"));
    }

    #[test]
    fn test_check_config_rejects_unknown_embedded_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[taxonomy]\nname = \"no-such-taxonomy\"\n");
        assert!(check_config(Some(&path)).is_err());
    }
}
