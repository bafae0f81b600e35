use clap::Parser;
use pgdump_obfuscator::config::{
    builtin_rules, load_config, parse_rules, ConfigError, Configuration, RowErrorPolicy,
};
use pgdump_obfuscator::errors::AppError;
use pgdump_obfuscator::logger::{self, LogFormat};
use pgdump_obfuscator::metrics::Metrics;
use pgdump_obfuscator::registry::Registry;
use pgdump_obfuscator::stream::process;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pgdump-obfuscator", version)]
#[command(about = "Obfuscate sensitive columns in a PostgreSQL plain-text dump stream")]
struct Cli {
    /// Input dump, '-' for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output destination, '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Rule, e.g. auth_user:email:email (repeatable)
    #[arg(short = 'c', long = "rule", value_name = "TABLE:COLUMN:STRATEGY")]
    rules: Vec<String>,

    /// Rules file (YAML, JSON or TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from the built-in rule list
    #[arg(long)]
    builtin: bool,

    /// Abort on the first row that cannot be transformed
    #[arg(long)]
    strict: bool,

    /// Fixed hex salt, for output that is stable across runs
    #[arg(long, value_name = "HEX")]
    salt: Option<String>,

    /// Print the resolved configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Write Prometheus text metrics to this file after the run
    #[arg(long)]
    metrics_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// Merge built-in rules, the rules file and `-c` tokens, in that order.
fn resolve_config(cli: &Cli) -> Result<Configuration, ConfigError> {
    let mut cfg = load_config(cli.config.as_deref())?;
    let file_rules = std::mem::take(&mut cfg.rules);

    if cli.builtin {
        cfg.rules.extend_from_slice(builtin_rules());
    }
    cfg.rules.extend(file_rules);
    cfg.rules.extend(parse_rules(&cli.rules)?);

    if cli.strict {
        cfg.row_errors = RowErrorPolicy::Abort;
    }
    if cli.salt.is_some() {
        cfg.salt = cli.salt.clone();
    }
    Ok(cfg)
}

fn open_input(path: &str) -> io::Result<Box<dyn BufRead>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin().lock())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &str) -> io::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let cfg = resolve_config(&cli)?;

    if cli.print_config {
        print!("{}", cfg.to_yaml()?);
        return Ok(());
    }

    let salt = cfg.resolve_salt()?;
    if cfg.salt.is_some() {
        warn!("Using a fixed salt; output can be correlated across runs");
    }
    let registry = Registry::new(&cfg.rules, salt);
    if registry.is_empty() {
        warn!("No obfuscation rules configured, the dump will pass through unchanged");
    }
    let metrics = Metrics::new()?;

    info!(
        input = %cli.input,
        rules = cfg.rules.len(),
        row_errors = ?cfg.row_errors,
        "Reading dump"
    );
    let input = open_input(&cli.input)?;
    let output = open_output(&cli.output)?;

    let stats = process(&registry, cfg.row_errors, input, output)?;
    metrics.record(&stats);

    if let Some(path) = &cli.metrics_file {
        metrics.write_to(path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logging(cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
