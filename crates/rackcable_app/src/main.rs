// SPDX-License-Identifier: MIT OR Apache-2.0
//! `rackcable` - headless patch inspector.
//!
//! Loads a patch (JSON modules and cables) and optional cable settings
//! (RON), rebuilds the rack, reports cables that could not be restored and
//! prints the cleaned-up patch to stdout.
//!
//! ```text
//! rackcable <patch.json> [settings.ron]
//! ```

mod layout;
mod patch;

use patch::{PatchError, PatchFile};
use rackcable_core::settings::SettingsError;
use rackcable_core::CableSettings;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Top-level errors
#[derive(Debug, Error)]
enum AppError {
    /// Bad command line
    #[error("usage: rackcable <patch.json> [settings.ron]")]
    Usage,

    /// Settings could not be loaded
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Patch could not be loaded
    #[error("Patch error: {0}")]
    Patch(#[from] PatchError),
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rackcable_app=debug,rackcable_core=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting rackcable v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args_os().skip(1).map(PathBuf::from).collect()) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Vec<PathBuf>) -> Result<(), AppError> {
    let (patch_path, settings_path) = match args.as_slice() {
        [patch] => (patch, None),
        [patch, settings] => (patch, Some(settings)),
        _ => return Err(AppError::Usage),
    };

    let settings = match settings_path {
        Some(path) => CableSettings::load(path)?,
        None => CableSettings::default(),
    };

    let patch = PatchFile::load(patch_path)?;
    let (mut rack, report) = patch.build_rack(settings)?;

    let frame = rack.step_frame();
    tracing::info!(
        "Rack ready: {} cables restored, {} skipped, {} plugs drawn",
        report.loaded.len(),
        report.failed.len(),
        frame.plugs.len()
    );

    println!("{}", patch.with_cables_of(&rack).to_json()?);
    Ok(())
}
