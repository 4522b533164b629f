//! SIGMET raw volume inspector.
//!
//! Opens a volume, prints a JSON summary of its header, sweeps and rays
//! and optionally a decoded section of one data type.

mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sigmet_parser::{ReaderConfig, SigmetVolume};
use summary::{summarize, SectionRequest};

#[derive(Parser, Debug)]
#[command(name = "sigmet-inspect")]
#[command(about = "Inspect SIGMET/IRIS raw radar volumes")]
struct Args {
    /// SIGMET raw volume file
    file: String,

    /// Data type to decode (e.g. dbz, vel, width, zdr)
    #[arg(short, long)]
    data_type: Option<String>,

    /// Sweep indices as first:last[:stride] (0-based)
    #[arg(long)]
    sweeps: Option<String>,

    /// Radial indices as first:last[:stride]
    #[arg(long)]
    radials: Option<String>,

    /// Gate indices as first:last[:stride]
    #[arg(long)]
    gates: Option<String>,

    /// Skip the format discriminator check
    #[arg(long)]
    no_verify: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "warn", env = "SIGMET_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let mut config = ReaderConfig::from_env();
    if args.no_verify {
        config.verify_format = false;
    }

    info!(file = %args.file, "Opening volume");
    let mut volume = SigmetVolume::open_with_config(&args.file, config)
        .with_context(|| format!("failed to open {}", args.file))?;

    let request = match &args.data_type {
        Some(data_type) => Some(SectionRequest::parse(
            data_type,
            args.sweeps.as_deref(),
            args.radials.as_deref(),
            args.gates.as_deref(),
            volume.header(),
        )?),
        None => None,
    };

    let summary = summarize(&mut volume, request.as_ref())?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{output}");

    Ok(())
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so stdout stays valid JSON
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
