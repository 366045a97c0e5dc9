use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use duck_studio::compiler::loader::{load_pipeline_from_yaml, save_pipeline_to_yaml};
use duck_studio::config::catalog::Catalog;
use duck_studio::config::resolver::ConfigEdit;
use duck_studio::{NodeId, Pipeline, Studio};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inspect and edit PeekingDuck pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the nodes of a pipeline
    Show {
        /// Pipeline YAML file
        file: PathBuf,

        /// Also print the serialized pipeline
        #[arg(long)]
        yaml: bool,

        /// Also print the JSON snapshot handed to the engine
        #[arg(long)]
        json: bool,
    },

    /// Show the effective config of one node
    Config {
        file: PathBuf,

        /// 1-based node position
        position: usize,

        /// Node config directory (one subdirectory per node type)
        #[arg(long, short)]
        catalog: PathBuf,

        /// Only keys changed from their defaults
        #[arg(long)]
        user_only: bool,
    },

    /// Set a config key of one node
    Set {
        file: PathBuf,

        /// 1-based node position
        position: usize,

        key: String,

        /// Value, as YAML (`0.5`, `[640, 480]`, `v4tiny`)
        value: String,

        #[arg(long, short)]
        catalog: PathBuf,

        /// Write here instead of overwriting the input file
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Reset a config key of one node to its default
    Reset {
        file: PathBuf,

        /// 1-based node position
        position: usize,

        key: String,

        #[arg(long, short)]
        catalog: PathBuf,

        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Check that every node's inputs are produced upstream
    Check {
        file: PathBuf,

        #[arg(long, short)]
        catalog: PathBuf,
    },

    /// Write the default pipeline
    New {
        /// Output file
        #[arg(default_value = "pipeline_config.yml")]
        out: PathBuf,
    },

    /// List node types, or the nodes of one type
    Nodes {
        #[arg(long, short)]
        catalog: PathBuf,

        /// Node type to list, e.g. `model`
        #[arg(long = "type", short)]
        node_type: Option<String>,

        /// Include custom nodes of this pipeline
        #[arg(long, short)]
        pipeline: Option<PathBuf>,
    },
}

fn open_studio(catalog_dir: &Path, pipeline: Option<&Path>) -> Result<Studio> {
    let catalog = Catalog::load_dir(catalog_dir)
        .with_context(|| format!("Failed to load node catalog from {}", catalog_dir.display()))?;
    info!("Loaded {} node configs from {}", catalog.len(), catalog_dir.display());

    let mut studio = Studio::new(catalog);
    if let Some(path) = pipeline {
        studio
            .load_pipeline(path)
            .with_context(|| format!("Failed to load pipeline from {}", path.display()))?;
    }
    Ok(studio)
}

fn node_at(pipeline: &Pipeline, position: usize) -> Result<NodeId> {
    if position == 0 || position > pipeline.len() {
        bail!(
            "Node position {} out of range, pipeline has {} nodes",
            position,
            pipeline.len()
        );
    }
    Ok(pipeline.get_by_index(position - 1).id())
}

fn save(studio: &mut Studio, out: Option<&Path>) -> Result<()> {
    let path = studio.save_pipeline(out).context("Failed to save pipeline")?;
    println!("Saved {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { file, yaml, json } => {
            let pipeline = load_pipeline_from_yaml(&file)
                .with_context(|| format!("Failed to load pipeline from {}", file.display()))?;
            print!("{pipeline}");

            let description = pipeline.to_description();
            if yaml {
                println!("---");
                print!("{}", description.to_yaml()?);
            }
            if json {
                println!("{}", description.to_json()?);
            }
        }

        Commands::Config { file, position, catalog, user_only } => {
            let studio = open_studio(&catalog, Some(&file))?;
            let id = node_at(studio.pipeline(), position)?;
            let config = studio.effective_config(id)?;

            println!("{}", config.title);
            let mut shown = 0;
            for entry in config.entries() {
                if user_only && !entry.user_set {
                    continue;
                }
                let mark = if entry.user_set { "*" } else { " " };
                let lock = if entry.is_readonly() { " (read-only)" } else { "" };
                println!("{} {:<24} {:<10} {}{}", mark, entry.key, entry.kind, entry.value, lock);
                shown += 1;
            }
            if shown == 0 {
                println!("  No user defined configurations");
            }
            for key in config.stale_keys() {
                println!("! {key} is set but no longer exists in the node's defaults");
            }
        }

        Commands::Set { file, position, key, value, catalog, out } => {
            let mut studio = open_studio(&catalog, Some(&file))?;
            let id = node_at(studio.pipeline(), position)?;
            match studio.set_config_text(id, &key, &value)? {
                ConfigEdit::Set(value) => println!("{key} = {value}"),
                ConfigEdit::Reset => println!("{key} reset to default"),
            }
            save(&mut studio, out.as_deref())?;
        }

        Commands::Reset { file, position, key, catalog, out } => {
            let mut studio = open_studio(&catalog, Some(&file))?;
            let id = node_at(studio.pipeline(), position)?;
            studio.reset_config(id, &key);
            println!("{key} reset to default");
            save(&mut studio, out.as_deref())?;
        }

        Commands::Check { file, catalog } => {
            let studio = open_studio(&catalog, Some(&file))?;
            let issues = studio.verify();
            if issues.is_empty() {
                println!("Pipeline OK: {} nodes", studio.pipeline().len());
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
                bail!("{} problem(s) found in {}", issues.len(), file.display());
            }
        }

        Commands::New { out } => {
            let mut pipeline = Pipeline::new();
            save_pipeline_to_yaml(&mut pipeline, &out)?;
            println!("Created {} with {} nodes", out.display(), pipeline.len());
        }

        Commands::Nodes { catalog, node_type, pipeline } => {
            let studio = open_studio(&catalog, pipeline.as_deref())?;
            match node_type {
                Some(node_type) => {
                    for title in studio.node_titles(&node_type) {
                        println!("{title}");
                    }
                }
                None => {
                    for node_type in studio.node_types() {
                        println!("{node_type}");
                    }
                }
            }
        }
    }

    Ok(())
}
