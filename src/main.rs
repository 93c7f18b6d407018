//! Activity Sensing CLI
//!
//! Offline entry point: extracts feature tables from recordings, replays a
//! recording through a full evaluation session and writes default
//! configuration files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use activity_sensing::config::EngineConfig;
use activity_sensing::export::write_feature_csv;
use activity_sensing::replay::{extract_features, read_samples_path};

#[derive(Debug, Parser)]
#[command(name = "activity-sensing", version, about = "Accelerometer activity recognition")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write one 22-column feature row per complete frame of a recording
    Features {
        /// Recording with x,y,z columns
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay a recording through an evaluation session and print the report
    Replay {
        /// Recording with x,y,z[,truth] columns
        #[arg(short, long)]
        input: PathBuf,

        /// ONNX model (defaults to the configured bundled asset)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Engine configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Write the default configuration
    Config {
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Features { input, output, config } => {
            let config = load_config(config.as_deref())?;
            features(&input, output.as_deref(), &config)?;
        }
        Commands::Replay {
            input,
            model,
            config,
            pretty,
        } => {
            let config = load_config(config.as_deref())?;
            replay(&input, model.as_deref(), config, pretty).await?;
        }
        Commands::Config { output } => {
            EngineConfig::default()
                .to_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), "default configuration written");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn features(input: &Path, output: Option<&Path>, config: &EngineConfig) -> anyhow::Result<()> {
    let records = read_samples_path(input).with_context(|| format!("reading {}", input.display()))?;
    let rows = extract_features(records.iter().map(|r| r.sample()), config.frame_size);

    let written = match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_feature_csv(file, rows)?
        }
        None => write_feature_csv(std::io::stdout().lock(), rows)?,
    };
    info!(samples = records.len(), frames = written, "features extracted");
    Ok(())
}

#[cfg(feature = "onnx")]
async fn replay(
    input: &Path,
    model: Option<&Path>,
    config: EngineConfig,
    pretty: bool,
) -> anyhow::Result<()> {
    use std::sync::Arc;

    use activity_sensing::classifier::{ModelAsset, OnnxClassifier};

    let classifier = match model {
        Some(path) => OnnxClassifier::from_file(path)?,
        None => OnnxClassifier::from_asset(&ModelAsset::new(
            config.asset_dir.clone(),
            config.cache_dir.clone(),
            config.model_asset.as_str(),
        ))?,
    };

    let records = read_samples_path(input).with_context(|| format!("reading {}", input.display()))?;
    let report = activity_sensing::replay::replay(&records, Arc::new(classifier), config).await?;

    let json = if pretty {
        report.to_pretty_json()?
    } else {
        report.to_json()?
    };
    println!("{}", json);
    Ok(())
}

#[cfg(not(feature = "onnx"))]
async fn replay(
    _input: &Path,
    _model: Option<&Path>,
    _config: EngineConfig,
    _pretty: bool,
) -> anyhow::Result<()> {
    anyhow::bail!("replay needs a model runtime; rebuild with `--features onnx`")
}
