use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::Parser;
use idexfan::{
    init_logging, pipeline_for, rewrite_file, Config, RewriteSession, BUILD_DATE, VERSION,
};

fn long_version() -> &'static str {
    static LONG_VERSION: OnceLock<String> = OnceLock::new();
    LONG_VERSION.get_or_init(|| format!("{} (built {})", VERSION, BUILD_DATE))
}

#[derive(Parser)]
#[command(name = "idexfan")]
#[command(version = long_version())]
#[command(about = "Bind M106 fan commands to the active tool in IDEX G-code files")]
#[command(long_about = None)]
struct Cli {
    /// G-code file to process (rewritten in place unless --output is given)
    input: PathBuf,

    /// Write the result here instead of replacing the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fan index to leave untouched; replaces the configured list (repeatable)
    #[arg(long = "exclude-fan", value_name = "INDEX")]
    exclude_fan: Vec<u32>,

    /// Ignore the per-user configuration file
    #[arg(long, conflicts_with = "config")]
    no_default_config: bool,

    /// Print the session summary as JSON when done
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if cli.no_default_config => Config::default(),
        None => match Config::default_path() {
            Ok(path) if path.exists() => Config::load_from_file(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            _ => Config::default(),
        },
    };

    if !cli.exclude_fan.is_empty() {
        config.fan.excluded_indexes = cli.exclude_fan.iter().copied().collect();
    }

    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr when stdout carries the JSON summary
    init_logging(cli.json)?;

    let config = load_config(&cli)?;
    tracing::debug!("Excluded fan indexes: {:?}", config.fan.excluded_indexes);

    let pipeline = pipeline_for(&config);
    let session = RewriteSession::new(&pipeline)
        .with_marker(config.output.marker.clone())
        .with_progress_step(config.output.progress_step_percent);

    let output = cli.output.as_deref().unwrap_or(cli.input.as_path());
    let summary = rewrite_file(&cli.input, output, session)
        .with_context(|| format!("Failed to post-process {}", cli.input.display()))?;

    tracing::info!(
        "{} lines read, {} fan commands bound",
        summary.lines_read,
        summary.lines_rewritten
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
