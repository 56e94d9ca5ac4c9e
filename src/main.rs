use clap::Parser;
use env_logger::Builder;
use env_logger::Env;
use log::{error, Level};
use std::io::Write;

use antep::analysis::analyze_image;
use antep::color_utils::{colors, init_color_config, symbols};
use antep::config::{AnalysisConfig, AnalyzeCommand, GlobalArgs, DEFAULT_MODEL_ID};
use antep::provider::ProviderError;
use antep::report::render_report;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Analyze a pistachio leaf photo for diseases and pests
    Analyze(AnalyzeCommand),

    /// Show version information
    Version,
}

#[derive(Parser)]
#[command(name = "antep")]
#[command(about = "Pistachio leaf disease and pest analysis")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn get_log_level_from_verbosity(
    verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::ErrorLevel>,
) -> log::LevelFilter {
    let base_level = verbosity.log_level_filter();
    let adjusted_level = match base_level {
        log::LevelFilter::Off => log::LevelFilter::Off, // -qq -> OFF
        log::LevelFilter::Error => log::LevelFilter::Warn, // default -> WARN
        log::LevelFilter::Warn => log::LevelFilter::Info, // -v -> INFO
        log::LevelFilter::Info => log::LevelFilter::Debug, // -vv -> DEBUG
        log::LevelFilter::Debug => log::LevelFilter::Trace, // -vvv -> TRACE
        log::LevelFilter::Trace => log::LevelFilter::Trace, // -vvvv -> TRACE (max)
    };

    // clap-verbosity-flag cannot distinguish default from -q, so check the
    // quiet flag directly for the ERROR level.
    if verbosity.is_silent() {
        log::LevelFilter::Error
    } else {
        adjusted_level
    }
}

fn init_logger(cli: &Cli) {
    // If the user didn't pass -v/-q and RUST_LOG is set, honor the env var.
    let use_env = !cli.global.verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut b = Builder::new();
        b.filter_level(get_log_level_from_verbosity(cli.global.verbosity.clone()));
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => colors::error_level("ERROR"),
                Level::Warn => colors::warning_level("WARN"),
                Level::Info => colors::success("INFO"),
                Level::Debug => colors::dim("DEBUG"),
                Level::Trace => colors::dim("TRACE"),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();
}

/// Turn a failed analysis into the user-facing message for its error kind.
fn render_failure(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ProviderError>() {
        Some(ProviderError::Unavailable(detail)) => {
            format!("Could not reach the model provider: {detail}")
        }
        Some(ProviderError::Rejected { status, .. }) => {
            format!(
                "The inference endpoint rejected the request (HTTP {status}). \
                 Check your API key and model id."
            )
        }
        Some(ProviderError::MalformedResponse(detail)) => {
            format!("The provider returned a response that could not be parsed: {detail}")
        }
        None => format!("Analysis failed unexpectedly: {err:#}"),
    }
}

fn main() {
    let cli = Cli::parse();
    init_color_config(cli.global.no_color);
    init_logger(&cli);

    match &cli.command {
        Some(Commands::Analyze(analyze_cmd)) => {
            let config = match AnalysisConfig::from_args(cli.global.clone(), analyze_cmd.clone()) {
                Ok(config) => config,
                Err(msg) => {
                    error!("{} Invalid configuration: {msg}", symbols::operation_failed());
                    std::process::exit(2);
                }
            };

            match analyze_image(&config) {
                Ok(report) => {
                    println!("{}", render_report(&report));
                }
                Err(e) => {
                    error!("{} {}", symbols::operation_failed(), render_failure(&e));
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Version) => {
            println!("antep v{}", env!("CARGO_PKG_VERSION"));
            println!("Default remote model: {DEFAULT_MODEL_ID}");
            println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
        }
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().unwrap();
        }
    }
}
