mod commands;
mod config;
mod input;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use surveyflow_core::QuestionId;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Survey conditional flow toolkit.
#[derive(Parser)]
#[command(name = "surveyflow", version, about = "Survey conditional flow toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a survey's flow configuration before activation
    Validate {
        /// Path to the survey JSON file
        survey: PathBuf,
    },

    /// Show where one answer leads, without recording anything
    Resolve {
        /// Path to the survey JSON file
        survey: PathBuf,
        /// Question id (e.g. 3 or Q3)
        #[arg(long)]
        question: QuestionId,
        /// The answer; comma-separated for multiple choice, empty to skip
        #[arg(long, allow_hyphen_values = true)]
        answer: String,
    },

    /// Activate a survey and drive one respondent through it
    Walk {
        /// Path to the survey JSON file
        survey: PathBuf,
        /// JSON object mapping question ids to answers
        #[arg(long)]
        answers: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.config.as_deref().map(config::read_config).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Validate { survey } => {
            commands::validate::cmd_validate(&survey, &config, cli.output, cli.quiet);
        }
        Commands::Resolve {
            survey,
            question,
            answer,
        } => {
            commands::resolve::cmd_resolve(&survey, question, &answer, cli.output, cli.quiet);
        }
        Commands::Walk { survey, answers } => {
            commands::walk::cmd_walk(&survey, &answers, &config, cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "warn,surveyflow_core=debug,surveyflow_engine=debug,surveyflow_storage=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Report an error to stderr, as a JSON object under `--output json`.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
        OutputFormat::Text if !quiet => eprintln!("error: {}", msg),
        OutputFormat::Text => {}
    }
}

/// Report an error and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

/// Pretty-print a serializable value to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": format!("serialization error: {}", e) }));
            process::exit(1);
        }
    }
}
