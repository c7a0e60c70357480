use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitpop_core::args::PersistedValue;
use gitpop_core::config::Config;
use gitpop_core::layout::{self, LayoutOptions};
use gitpop_core::store::{ArgStore, Durability, FileStore};
use gitpop_core::{EventClass, PopupDefinition, Session};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gitpopctl", about = "Inspect gitpop popups and their saved arguments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List known popups
    List,
    /// Print a popup as it would be drawn
    Show {
        popup: String,
        /// Width budget in columns
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
    /// Print the arguments a popup would open with
    Args {
        popup: String,
        /// Print the stored value as JSON instead of flat tokens
        #[arg(long)]
        json: bool,
    },
    /// Save arguments for a popup
    Set {
        popup: String,
        /// Flat tokens, e.g. --all --author=me
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Forget the saved arguments of a popup
    Reset { popup: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("gitpopctl=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("loading config")?;
    let registry = config.load_registry().context("loading popups")?;
    let mut store = FileStore::open(config.store_path()).context("opening argument store")?;

    match cli.command {
        Command::List => {
            for name in registry.names() {
                let popup = registry.get(name)?;
                println!(
                    "{name:<12} {} switches, {} options, {} actions{}",
                    popup.switches.len(),
                    popup.options.len(),
                    popup.actions.len(),
                    popup.man_page.as_deref().map(|m| format!("  [{m}]")).unwrap_or_default()
                );
            }
        }
        Command::Show { popup, width } => {
            let definition = registry.get(&popup)?;
            let session = Session::materialize(definition, store.read(&definition.variable).as_ref());
            let opts = LayoutOptions {
                width,
                ..config.layout.options(width)
            };
            let aux = if config.general.show_help_section {
                layout::common_commands()
            } else {
                Vec::new()
            };
            print!("{}", layout::render(&session, &aux, None, &opts).plain_text());
        }
        Command::Args { popup, json } => {
            let definition = registry.get(&popup)?;
            let stored = store.read(&definition.variable);
            if json {
                let value = stored.unwrap_or_else(|| Session::materialize(definition, None).persisted());
                println!("{}", serde_json::to_string_pretty(&value).context("serializing arguments")?);
            } else {
                let session = Session::materialize(definition, stored.as_ref());
                println!("{}", session.flat_args().join(" "));
            }
        }
        Command::Set { popup, args } => {
            let definition = registry.get(&popup)?;
            let unknown = unknown_tokens(definition, &args);
            if !unknown.is_empty() {
                anyhow::bail!("{popup} has no argument matching {}", unknown.join(", "));
            }
            let session = Session::materialize(definition, Some(&PersistedValue::Flat(args)));
            store
                .write(&definition.variable, session.persisted(), Durability::Durable)
                .with_context(|| format!("saving {}", definition.variable))?;
            info!(popup = %popup, "arguments saved");
            println!("{}: {}", definition.variable, session.flat_args().join(" "));
        }
        Command::Reset { popup } => {
            let definition = registry.get(&popup)?;
            if store.read(&definition.variable).is_none() {
                warn!(popup = %popup, "nothing saved");
            }
            store
                .clear(&definition.variable)
                .with_context(|| format!("clearing {}", definition.variable))?;
            println!("{}: reset to defaults", definition.variable);
        }
    }

    Ok(())
}

/// Tokens that match no switch flag and no option flag prefix.
fn unknown_tokens(definition: &PopupDefinition, tokens: &[String]) -> Vec<String> {
    let session = Session::materialize(definition, None);
    tokens
        .iter()
        .filter(|token| {
            !session.events(EventClass::Switches).iter().any(|e| e.flag() == Some(token.as_str()))
                && !session
                    .events(EventClass::Options)
                    .iter()
                    .filter_map(|e| e.flag())
                    .any(|flag| token.starts_with(flag))
        })
        .cloned()
        .collect()
}
