//! venue-linker CLI: entity-link injection for HTML content.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};

use venue_linker::Linker;
use venue_linker::catalog::{RegistryVariant, load_registry_file};
use venue_linker::config::LinkerConfig;

#[derive(Parser)]
#[command(name = "venue-linker", version, about = "Entity-linking engine for HTML content")]
struct Cli {
    /// Linker config file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bundled registry variant: base or enhanced.
    #[arg(long, global = true)]
    variant: Option<RegistryVariant>,

    /// External registry file; overrides --variant.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Maximum number of links to inject.
    #[arg(long, global = true)]
    budget: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// HTML file to read. Reads stdin when omitted.
    #[arg(long, short)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject entity links and print the enriched HTML.
    Link {
        #[command(flatten)]
        input: InputArgs,

        /// Print the list of injected links to stderr.
        #[arg(long)]
        report: bool,
    },

    /// Print presence and linking statistics as JSON.
    Stats {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Inspect registries.
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// List entities in resolution order.
    List,
    /// Show one entity by canonical name.
    Show {
        /// Canonical entity name (case-insensitive).
        name: String,
    },
    /// Validate a registry file without linking anything.
    Validate {
        /// Registry TOML file.
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Link { input, report } => {
            let linker = build_linker(&cli)?;
            let content = read_input(input.input.as_deref())?;
            let outcome = linker.link(&content);
            print!("{}", outcome.content);

            if *report {
                eprintln!(
                    "Injected {} link(s) (budget {}, registry \"{}\"):",
                    outcome.link_count(),
                    linker.budget(),
                    linker.registry().id()
                );
                for link in &outcome.links {
                    eprintln!(
                        "  \"{}\" [{}] via \"{}\" at byte {} -> {}",
                        link.entity, link.category, link.surface_form, link.offset, link.url
                    );
                }
            }
        }

        Commands::Stats { input } => {
            let linker = build_linker(&cli)?;
            let content = read_input(input.input.as_deref())?;
            let stats = linker.stats(&content);
            let json = serde_json::to_string_pretty(&stats).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Registry { action } => match action {
            RegistryAction::List => {
                let linker = build_linker(&cli)?;
                let registry = linker.registry();
                if registry.is_empty() {
                    println!("Registry \"{}\" is empty.", registry.id());
                } else {
                    println!(
                        "Registry \"{}\" ({} entities, budget {}):",
                        registry.id(),
                        registry.len(),
                        linker.budget()
                    );
                    for entity in registry.sorted_by_priority() {
                        println!(
                            "  {:>2}  {:<10}  {}",
                            entity.priority, entity.category, entity.name
                        );
                    }
                }
            }
            RegistryAction::Show { name } => {
                let linker = build_linker(&cli)?;
                let Some(entity) = linker.registry().get(name) else {
                    miette::bail!(
                        "no entity named \"{name}\" in registry \"{}\"",
                        linker.registry().id()
                    );
                };
                println!("Entity: \"{}\"", entity.name);
                println!("  url:        {}", entity.url);
                println!("  category:   {}", entity.category);
                println!("  priority:   {}", entity.priority);
                if !entity.variations.is_empty() {
                    println!("  variations: {}", entity.variations.join(", "));
                }
            }
            RegistryAction::Validate { file } => {
                let registry = load_registry_file(file)?;
                println!(
                    "ok: registry \"{}\" with {} entities and {} surface forms",
                    registry.id(),
                    registry.len(),
                    registry.pattern_count()
                );
            }
        },
    }

    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn build_linker(cli: &Cli) -> Result<Linker> {
    let mut config = match &cli.config {
        Some(path) => LinkerConfig::load(path)?,
        None => LinkerConfig::default(),
    };
    if let Some(variant) = cli.variant {
        config.variant = variant;
        if cli.registry.is_none() {
            config.registry_path = None;
        }
    }
    if let Some(path) = &cli.registry {
        config.registry_path = Some(path.clone());
    }
    if let Some(budget) = cli.budget {
        config.budget = Some(budget);
    }
    Ok(Linker::from_config(&config)?)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .into_diagnostic()
                .wrap_err("failed to read stdin")?;
            Ok(content)
        }
    }
}
