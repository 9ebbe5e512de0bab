//! Save command - download the tiles of an area into the store.

use std::sync::Arc;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tilekeep::app::{AppConfig, TileKeepApp};
use tilekeep::control::{SaveEvent, SaveStatus, Viewport};
use tilekeep::coord::LatLngBounds;

use super::common::{interrupt_signal, PromptHook};
use crate::error::CliError;

#[derive(Debug, Clone, Args)]
pub struct SaveArgs {
    /// Area as south,west,north,east in degrees (default: [save] bounds)
    #[arg(long)]
    pub bounds: Option<LatLngBounds>,

    /// Current map zoom (optional when --zoom-levels decides the levels)
    #[arg(long, required_unless_present = "zoom_levels")]
    pub zoom: Option<u8>,

    /// Comma-separated zoom levels to save instead of the current zoom
    #[arg(long, value_delimiter = ',')]
    pub zoom_levels: Option<Vec<u8>>,

    /// Save from the current zoom up to --max-zoom
    #[arg(long)]
    pub save_what_you_see: bool,

    /// Highest zoom for --save-what-you-see
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl SaveArgs {
    /// Apply the arguments over the configured control options.
    ///
    /// Returns the adjusted config and the viewport to save from.
    pub fn configure(&self, mut config: AppConfig) -> Result<(AppConfig, Viewport), CliError> {
        let bounds = match self.bounds {
            Some(bounds) => {
                config.control.bounds = None;
                bounds
            }
            None => config.control.bounds.ok_or_else(|| {
                CliError::InvalidArgument(
                    "--bounds is required when [save] bounds is not configured".to_string(),
                )
            })?,
        };

        let zoom = match (self.zoom, &self.zoom_levels) {
            (Some(zoom), _) => zoom,
            (None, Some(levels)) if !self.save_what_you_see => {
                levels.iter().copied().min().unwrap_or_default()
            }
            _ => {
                return Err(CliError::InvalidArgument(
                    "--zoom is required with --save-what-you-see".to_string(),
                ))
            }
        };

        let mut control = config.control;
        if let Some(levels) = &self.zoom_levels {
            control = control.with_zoom_levels(levels.clone());
        }
        if self.save_what_you_see {
            control = control.with_save_what_you_see(true);
        }
        if let Some(max_zoom) = self.max_zoom {
            control = control.with_max_zoom(max_zoom);
        }
        if !self.yes {
            control = control.with_confirm(PromptHook::new(save_prompt));
        }
        config.control = control;

        Ok((config, Viewport::new(bounds, zoom)))
    }
}

fn save_prompt(status: &SaveStatus) -> String {
    format!(
        "Save {} tiles? ({} already stored)",
        status.length_to_be_saved, status.storage_size
    )
}

/// Run the save command.
pub async fn run(config: AppConfig, args: SaveArgs) -> Result<(), CliError> {
    let (config, viewport) = args.configure(config)?;
    let app = TileKeepApp::start(config).await?;
    let result = save(&app, &viewport).await;
    app.shutdown().await;
    result
}

async fn save(app: &TileKeepApp, viewport: &Viewport) -> Result<(), CliError> {
    let control = app.control();
    let Some(mut session) = control.save_tiles(viewport).await? else {
        println!("Save cancelled.");
        return Ok(());
    };

    let interrupt = interrupt_signal()?;
    let cancel_control = Arc::clone(&control);
    tokio::spawn(async move {
        interrupt.notified().await;
        tracing::warn!("Interrupt received, cancelling save session");
        cancel_control.cancel_active();
    });

    let status = session.status();
    let bar = ProgressBar::new(status.length_to_be_saved);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{wide_bar}] {pos}/{len} tiles ({per_sec}, eta {eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    while let Some(event) = session.next_event().await {
        match event {
            SaveEvent::TileSaved { .. } => bar.inc(1),
            SaveEvent::TileFailed { key, error, .. } => {
                bar.inc(1);
                bar.println(format!("{} {}: {}", style("failed").red(), key, error));
            }
            SaveEvent::AllDownloaded(status) => {
                bar.set_message(format!("{} downloaded", status.length_loaded));
            }
            SaveEvent::Cancelled(_) => bar.abandon(),
            _ => {}
        }
    }
    if !bar.is_finished() {
        bar.finish();
    }

    let report = session.wait().await;
    tracing::info!(
        total = report.total,
        saved = report.saved,
        failed = report.failed,
        cancelled = report.was_cancelled,
        "Save command finished"
    );
    println!();
    if report.was_cancelled {
        println!("{}", style("Save interrupted.").yellow());
    }
    println!("  Saved:   {}/{}", report.saved, report.total);
    if report.failed > 0 {
        println!("  Failed:  {}", style(report.failed).red());
    }
    println!("  Stored:  {} tiles", report.storage_size);
    Ok(())
}
