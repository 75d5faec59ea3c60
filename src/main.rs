//! Massive Stub command line
//!
//! Seeds an emulator and reads from it, for inspecting fixtures and seed
//! files without writing client code.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use massive_stub::core::config::{load_config_or_default, Config};
use massive_stub::{Emulator, EventType};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("massive-stub")
        .version(massive_stub::VERSION)
        .about("In-process realtime database and auth emulator.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("FILE")
                .global(true)
                .help("JSON file to seed the database with instead of the built-in fixtures"),
        )
        .arg(
            Arg::new("disconnected")
                .long("disconnected")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Report the connection flag as false"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("get")
                .about("Print the value at a path as JSON")
                .arg(Arg::new("path").required(true).help("Slash-separated path"))
                .arg(
                    Arg::new("order-by-child")
                        .long("order-by-child")
                        .value_name("FIELD")
                        .requires("equal-to")
                        .help("Child field to filter on"),
                )
                .arg(
                    Arg::new("equal-to")
                        .long("equal-to")
                        .value_name("JSON")
                        .requires("order-by-child")
                        .help("Value the field must equal, as JSON (bare words are strings)"),
                ),
        )
        .subcommand(Command::new("metrics").about("Print Prometheus metrics after seeding"))
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path))?,
        None => {
            let mut config = load_config_or_default(None);
            config.apply_env_overrides()?;
            config
        }
    };
    apply_cli_overrides(&mut config, &matches);

    massive_stub::init(&config)?;
    info!("Starting {} v{}", massive_stub::NAME, massive_stub::VERSION);

    let emulator = Emulator::init(config).context("initializing emulator")?;

    match matches.subcommand() {
        Some(("get", args)) => get(&emulator, args).await,
        Some(("metrics", _)) => {
            print!("{}", massive_stub::system::collect_metrics());
            Ok(())
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(seed) = matches.get_one::<String>("seed") {
        config.database.seed_file = Some(seed.into());
    }

    if matches.get_flag("disconnected") {
        config.database.connected = false;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }
}

async fn get(emulator: &Emulator, args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<String>("path")
        .context("path is required")?;
    let mut reference = emulator.database().reference(path)?;

    if let (Some(field), Some(raw)) = (
        args.get_one::<String>("order-by-child"),
        args.get_one::<String>("equal-to"),
    ) {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        reference = reference.order_by_child(field.clone()).equal_to(value);
    }

    let snapshot = reference.once(EventType::Value).await;
    println!("{}", serde_json::to_string_pretty(snapshot.val())?);
    Ok(())
}
