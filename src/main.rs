mod explain;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

#[cfg(test)]
#[path = "../tests/src_inline/fixtures.rs"]
mod fixtures;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::input::InputPaths;
use crate::model::profile::{ExportProfile, ProfileError};
use crate::pipeline::stage5_write::WriteOptions;
use crate::pipeline::{ExportError, run_export};

#[derive(Debug, Parser)]
#[command(name = "credit-shap-export", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score the validation set, explain it and write the dashboard CSVs.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// XGBoost model saved as JSON.
    #[arg(long, default_value = "model/xgb_model.json")]
    model: PathBuf,
    /// Validation feature table (CSV, optionally .gz).
    #[arg(long, default_value = "data/X_val.csv")]
    features: PathBuf,
    /// Validation labels (CSV, label in the last column).
    #[arg(long, default_value = "data/y_val.csv")]
    labels: PathBuf,
    /// Output directory for the exported files.
    #[arg(long, default_value = "exports")]
    out: PathBuf,
    /// JSON export profile; unset fields use the built-in defaults.
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Decision threshold on the default probability.
    #[arg(long)]
    threshold: Option<f64>,
    /// Comma-separated features for the attribution-vs-score view.
    #[arg(long, value_delimiter = ',')]
    vs_score_features: Option<Vec<String>>,
    /// Also write confusion_combined.csv (detail and summary rows together).
    #[arg(long)]
    combined_confusion: bool,
}

fn main() {
    if let Err(err) = logging::init_logging() {
        eprintln!("Logging disabled: {err}");
    }
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ExportError> {
    match cli.command {
        Command::Run(args) => {
            let profile = resolve_profile(&args)?;
            let paths = InputPaths {
                model: args.model.clone(),
                features: args.features.clone(),
                labels: args.labels.clone(),
            };
            let written = run_export(
                &paths,
                &profile,
                &args.out,
                WriteOptions {
                    combined_confusion: args.combined_confusion,
                },
            )?;
            tracing::info!(
                files = written.len(),
                out = %args.out.display(),
                "export complete"
            );
            Ok(())
        }
    }
}

fn resolve_profile(args: &RunArgs) -> Result<ExportProfile, ProfileError> {
    let mut profile = match &args.profile {
        Some(path) => ExportProfile::load(path)?,
        None => ExportProfile::default_v1(),
    };
    if let Some(threshold) = args.threshold {
        profile.decision_threshold = threshold;
    }
    if let Some(features) = &args.vs_score_features {
        profile.vs_score_features = features.iter().map(|f| f.trim().to_string()).collect();
    }
    Ok(profile)
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
