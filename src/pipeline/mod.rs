pub mod stage2_score;
pub mod stage3_explain;
pub mod stage4_aggregate;
pub mod stage5_write;

use std::path::{Path, PathBuf};

use crate::input::{InputError, InputPaths, load_input};
use crate::model::profile::{ExportProfile, ProfileError};
use stage2_score::run_stage2;
use stage3_explain::run_stage3;
use stage4_aggregate::run_stage4;
use stage5_write::{Stage5Input, WriteOptions, write_reports};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("failed to write reports to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Runs every stage once, top to bottom, and returns the files written.
pub fn run_export(
    paths: &InputPaths,
    profile: &ExportProfile,
    out_dir: &Path,
    options: WriteOptions,
) -> Result<Vec<PathBuf>, ExportError> {
    profile.validate()?;

    let bundle = load_input(paths)?;
    let scored = run_stage2(&bundle, profile.decision_threshold);
    let explained = run_stage3(&bundle, &scored);
    let views = run_stage4(&scored, &explained.attributions, profile)?;

    let input = Stage5Input {
        bundle: &bundle,
        profile,
        scored: &scored,
        explained: &explained,
        views: &views,
        tool_name: env!("CARGO_PKG_NAME").to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_reports(&input, out_dir, options).map_err(|source| ExportError::Write {
        path: out_dir.to_path_buf(),
        source,
    })
}
