//! Smelter binary - converts candlestick bars to lexical streams and back
//!
//! Usage:
//!   smelter smelt --symbol BTCUSD --interval 1m --input bars.json --output btc.bin
//!   smelter smelt --symbol BTCUSD --interval 1m --input bars.json --store
//!   smelter unsmelt btc.bin --from 100 --count 10
//!   smelter inspect btc.bin
//!   smelter union a.bin b.bin --output merged.bin
//!   smelter list

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use smelter_cli::{commands, SmeltTarget};
use smelter_config::SmelterConfig;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "smelter")]
#[command(about = "OHLCV binary lexical smelter")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode aggregate JSON bars into a stream
    Smelt {
        #[arg(short, long)]
        symbol: String,
        /// Interval label: seconds ("60") or with a unit ("5m", "1h")
        #[arg(short, long)]
        interval: String,
        /// Polygon-style aggregate JSON
        #[arg(long)]
        input: PathBuf,
        /// Stream file to write
        #[arg(short, long, conflicts_with = "store")]
        output: Option<PathBuf>,
        /// Store into the configured warehouse instead of a file
        #[arg(long)]
        store: bool,
        /// Mark the stream as keyed by ID
        #[arg(long)]
        by_id: bool,
    },
    /// Decode a stream file to JSON
    Unsmelt {
        file: PathBuf,
        /// First record to decode
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Number of records to decode (all when omitted)
        #[arg(long)]
        count: Option<usize>,
        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the headers of a stream file
    Inspect { file: PathBuf },
    /// Merge streams of one symbol and interval
    Union {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// List streams in the configured warehouse
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SmelterConfig::load(cli.config.as_deref())?;
    init_logging(&cli, &config)?;

    if let Err(e) = run(cli.command, &config) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(command: Commands, config: &SmelterConfig) -> Result<()> {
    let policy = config.precision.to_policy()?;

    match command {
        Commands::Smelt {
            symbol,
            interval,
            input,
            output,
            store,
            by_id,
        } => {
            let target = match (output, store) {
                (Some(path), false) => SmeltTarget::File(path),
                (None, true) => SmeltTarget::Warehouse {
                    root: config.warehouse.root.clone(),
                    create_missing: config.warehouse.create_missing,
                },
                _ => bail!("smelt needs either --output or --store"),
            };
            let bits = commands::smelt(&input, &symbol, &interval, policy, by_id)?;
            let path = commands::deliver(&bits, &target)?;
            info!("Smelted {} bits into {:?}", bits.len(), path);
        }
        Commands::Unsmelt {
            file,
            from,
            count,
            output,
            pretty,
        } => {
            let range = match (from, count) {
                (0, None) => None,
                (from, count) => Some((from, count.unwrap_or(usize::MAX))),
            };
            let decoded = commands::unsmelt(&file, range)?;
            let json = commands::sticks_json(&decoded.sticks, pretty)?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{json}"),
            }
        }
        Commands::Inspect { file } => {
            let summary = commands::inspect(&file)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Union { inputs, output } => {
            commands::union(&inputs, &output, policy)?;
        }
        Commands::List => {
            for key in commands::list(&config.warehouse.root, config.warehouse.create_missing)? {
                println!("{key}");
            }
        }
    }
    Ok(())
}

fn init_logging(cli: &Cli, config: &SmelterConfig) -> Result<()> {
    let level = cli.log_level.as_deref().unwrap_or(&config.global.log_level);
    let log_level = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    // Logs go to stderr so decoded JSON on stdout stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    if cli.json_logs || config.global.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
