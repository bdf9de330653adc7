//! CLI entry point for the text ripper.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use lex_ripper::{EchoTarget, FilterSet, LogProgressReporter, RipperConfig, run};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Tokenize one column of a CSV file",
    long_about = "Streams a CSV file, tokenizes the text of one column against a dictionary,\n\
                  and writes the tokenized text back into the rows.\n\n\
                  EXAMPLES:\n  \
                  # Append a tokenized column\n  \
                  lex-ripper --input reviews.csv --output out.csv --column body\n\n  \
                  # Replace the column in place, quoting it\n  \
                  lex-ripper --input reviews.csv --output out.csv --column body --replace --quote body\n\n  \
                  # Only print the separated words\n  \
                  lex-ripper --input reviews.csv --column body --show"
)]
struct Args {
    /// Path to the CSV file to read
    #[arg(long)]
    input: Option<String>,

    /// Path to the CSV file to write
    ///
    /// May be omitted together with --show or --debug to discard output
    #[arg(long)]
    output: Option<String>,

    /// Name of the column to tokenize
    #[arg(long)]
    column: Option<String>,

    /// Custom dictionary file (surface,part_of_speech[,base_form[,reading]])
    #[arg(long)]
    dic: Option<String>,

    /// Comma-separated output columns that are always quoted
    #[arg(long, value_delimiter = ',')]
    quote: Vec<String>,

    /// Overwrite the column instead of appending a tokenized column
    #[arg(long)]
    replace: bool,

    /// Print the separated words of every row
    #[arg(long)]
    show: bool,

    /// Print every token with its features
    #[arg(long)]
    debug: bool,

    /// Seconds between progress reports (0 disables them)
    #[arg(long, default_value = "30")]
    progress: u64,

    /// Text placed between tokens
    #[arg(long, default_value = " ")]
    separator: String,

    /// Suffix of the appended column name
    #[arg(long, default_value = "_tokenized")]
    suffix: String,

    /// Stop-word file, one word per line, applied after tokenization
    #[arg(long)]
    stopwords: Option<String>,

    /// JSON configuration file; command line flags are ignored when set
    #[arg(long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the run summary as JSON to stdout
    ///
    /// Disables all logs and moves --show / --debug output to stderr so
    /// stdout can be piped to other tools.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<RipperConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path);
            RipperConfig::from_json_file(path)?
        }
        None => config_from_flags(args)?,
    };

    if args.json {
        config.echo = EchoTarget::Stderr;
    }
    Ok(config)
}

fn config_from_flags(args: &Args) -> Result<RipperConfig> {
    let mut builder = RipperConfig::builder()
        .quote_columns(args.quote.iter().map(|c| c.trim().to_string()))
        .replace(args.replace)
        .show(args.show)
        .debug(args.debug)
        .progress_interval_secs(args.progress)
        .separator(&args.separator)
        .suffix(&args.suffix);

    if let Some(input) = &args.input {
        builder = builder.input(input);
    }
    if let Some(output) = &args.output {
        builder = builder.output(output);
    }
    if let Some(column) = &args.column {
        builder = builder.column(column);
    }
    if let Some(dic) = &args.dic {
        builder = builder.dictionary(dic);
    }
    if let Some(stopwords) = &args.stopwords {
        builder = builder.stopwords(stopwords);
    }

    builder.build().map_err(|e| anyhow!("{}", e))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables from .env file before RUST_LOG is read
    dotenv().ok();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    match run(&config, FilterSet::default(), Arc::new(LogProgressReporter)) {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if !args.quiet {
                println!("{}", summary);
            }
            Ok(())
        }
        Err(e) => {
            error!("Ripper failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("{} ({})", e, e.error_code()))
        }
    }
}
