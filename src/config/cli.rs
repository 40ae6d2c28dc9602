use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Weaver binary.
#[derive(Debug, Parser)]
#[command(
    name = "weaver",
    version,
    about = "Weave topic pages from a structured content catalog"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "WEAVER_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Weave each topic in order and print the pages to stdout.
    Weave(WeaveArgs),
    /// Read topics from stdin, one per line, and weave them as they arrive.
    Shell(ShellArgs),
    /// List the topics the catalog knows.
    Topics,
}

#[derive(Debug, Args, Clone)]
pub struct WeaveArgs {
    /// Topics to weave; blank topics are skipped.
    #[arg(value_name = "TOPIC", required = true)]
    pub topics: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ShellArgs {
    /// Write each rendered page to `<DIR>/<topic>.html` instead of stdout.
    #[arg(long = "output-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the lower bound of the simulated fetch delay.
    #[arg(long = "latency-min-ms", value_name = "MILLIS", global = true)]
    pub latency_min_ms: Option<u64>,

    /// Override the upper bound of the simulated fetch delay.
    #[arg(long = "latency-max-ms", value_name = "MILLIS", global = true)]
    pub latency_max_ms: Option<u64>,

    /// Override the cache staleness window; 0 keeps pages forever.
    #[arg(long = "stale-after-seconds", value_name = "SECONDS", global = true)]
    pub stale_after_seconds: Option<u64>,

    /// Load the content catalog from a JSON file instead of the built-in one.
    #[arg(
        long = "catalog",
        value_name = "FILE",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub catalog: Option<PathBuf>,
}
