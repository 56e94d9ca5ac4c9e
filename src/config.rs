//! Configuration layer providing clean separation between CLI arguments and
//! the internal analysis configuration.
//!
//! Every deployment-specific setting (API key, model id, endpoint,
//! confidence threshold, weights location) is supplied here, with
//! flag > environment variable > default precedence. Conversion from CLI
//! structs into `AnalysisConfig` goes through `from_args`, which validates
//! combinations before any work starts.

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use std::path::PathBuf;

/// Default hosted detection endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://detect.roboflow.com";

/// Default pistachio model identifier on the hosted endpoint.
pub const DEFAULT_MODEL_ID: &str = "fistik-ojqcr/3";

/// Default confidence threshold applied to all detections of a request.
pub const DEFAULT_CONFIDENCE: f32 = 0.45;

/// Parse probability value (must be between 0.0 and 1.0)
pub fn parse_probability(s: &str) -> Result<f32, String> {
    let val = s
        .parse::<f32>()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if !(0.0..=1.0).contains(&val) {
        return Err(format!("Must be between 0.0 and 1.0, got {val}"));
    }
    Ok(val)
}

/// Which backend performs the image-to-detections computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Remote,
    Local,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(ProviderKind::Remote),
            "local" => Ok(ProviderKind::Local),
            _ => Err(format!("Unknown provider '{s}' (expected 'remote' or 'local')")),
        }
    }
}

/// Global CLI arguments that apply to all antep commands
#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    /// Verbosity level (-q/--quiet, -v/-vv/-vvv/-vvvv for info/debug/trace)
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// Disable colored output (also respects NO_COLOR and ANTEP_NO_COLOR env vars)
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// CLI command for leaf analysis (only command-specific arguments)
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeCommand {
    /// Path to the leaf photo to analyze (.jpg, .jpeg or .png)
    #[arg(value_name = "IMAGE", required = true)]
    pub image: PathBuf,

    /// Inference backend: 'remote' (hosted endpoint) or 'local' (in-process model)
    #[arg(long, default_value = "remote")]
    pub provider: ProviderKind,

    /// Confidence threshold for detections (0.0-1.0)
    #[arg(short, long, default_value = "0.45", value_parser = parse_probability)]
    pub confidence: f32,

    /// API key for the hosted endpoint (env: ANTEP_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model identifier on the hosted endpoint (env: ANTEP_MODEL_ID)
    #[arg(long)]
    pub model_id: Option<String>,

    /// Base URL of the hosted detection endpoint (env: ANTEP_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// URL to download local model weights from (env: ANTEP_WEIGHTS_URL)
    #[arg(long)]
    pub weights_url: Option<String>,

    /// MD5 checksum for weights verification (used with --weights-url)
    #[arg(long)]
    pub weights_checksum: Option<String>,

    /// Path to existing local weights, bypassing the download cache
    /// (env: ANTEP_WEIGHTS_PATH)
    #[arg(long)]
    pub weights_path: Option<PathBuf>,
}

/// Remote-endpoint settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model_id: String,
    pub api_key: String,
}

/// Local-weights settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct WeightsConfig {
    pub url: Option<String>,
    pub checksum: Option<String>,
    pub path_override: Option<PathBuf>,
}

/// Internal configuration for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub image: PathBuf,
    pub provider: ProviderKind,
    pub confidence: f32,
    /// Present iff the remote provider is selected.
    pub remote: Option<RemoteConfig>,
    /// Present iff the local provider is selected.
    pub weights: Option<WeightsConfig>,
}

fn flag_or_env(flag: Option<String>, env_var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
}

impl AnalysisConfig {
    /// Create configuration from global args and command-specific args
    pub fn from_args(_global: GlobalArgs, cmd: AnalyzeCommand) -> Result<Self, String> {
        let (remote, weights) = match cmd.provider {
            ProviderKind::Remote => {
                let api_key = flag_or_env(cmd.api_key, "ANTEP_API_KEY").ok_or_else(|| {
                    "Remote provider requires an API key (--api-key or ANTEP_API_KEY)".to_string()
                })?;
                let remote = RemoteConfig {
                    endpoint: flag_or_env(cmd.endpoint, "ANTEP_ENDPOINT")
                        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                    model_id: flag_or_env(cmd.model_id, "ANTEP_MODEL_ID")
                        .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                    api_key,
                };
                (Some(remote), None)
            }
            ProviderKind::Local => {
                if cmd.weights_path.is_some() && cmd.weights_url.is_some() {
                    return Err(
                        "Cannot use both --weights-path and --weights-url. Choose one.".to_string(),
                    );
                }
                let path_override = cmd
                    .weights_path
                    .or_else(|| flag_or_env(None, "ANTEP_WEIGHTS_PATH").map(PathBuf::from));
                let url = flag_or_env(cmd.weights_url, "ANTEP_WEIGHTS_URL");
                if path_override.is_none() && url.is_none() {
                    return Err(
                        "Local provider requires weights: pass --weights-path/ANTEP_WEIGHTS_PATH \
                         or --weights-url/ANTEP_WEIGHTS_URL"
                            .to_string(),
                    );
                }
                let weights = WeightsConfig {
                    url,
                    checksum: cmd.weights_checksum,
                    path_override,
                };
                (None, Some(weights))
            }
        };

        Ok(Self {
            image: cmd.image,
            provider: cmd.provider,
            confidence: cmd.confidence,
            remote,
            weights,
        })
    }
}
