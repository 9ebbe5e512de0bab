//! Inspection commands - stats, list and get.

use std::path::Path;

use console::style;
use tilekeep::app::{AppConfig, TileKeepApp};
use tilekeep::layer::TileImage;

use super::common::TileArgs;
use crate::error::CliError;

/// Show storage statistics.
pub async fn run_stats(config: AppConfig) -> Result<(), CliError> {
    let app = TileKeepApp::start(config).await?;
    let result = stats(&app).await;
    app.shutdown().await;
    result
}

async fn stats(app: &TileKeepApp) -> Result<(), CliError> {
    let store = app.store();
    let stored = store.count().await?;
    let blobs = store.blob_count().await?;
    let layer_tiles = store.list_for_template(app.layer().url_template()).await?;

    println!("{}", style("Tile store").bold());
    println!("  Backend:  {}", app.config().cache.backend_name());
    println!("  Tiles:    {}", stored);
    println!(
        "  Layer:    {} ({})",
        layer_tiles.len(),
        app.layer().url_template()
    );
    if blobs > stored {
        println!(
            "  Orphaned: {}",
            style(blobs - stored).yellow()
        );
    }
    Ok(())
}

/// List stored tiles of the layer.
pub async fn run_list(config: AppConfig, geojson: bool) -> Result<(), CliError> {
    let app = TileKeepApp::start(config).await?;
    let result = list(&app, geojson).await;
    app.shutdown().await;
    result
}

async fn list(app: &TileKeepApp, geojson: bool) -> Result<(), CliError> {
    let layer = app.layer();
    if geojson {
        let collection = app
            .store()
            .to_geojson(layer.url_template(), layer.deriver().tile_size())
            .await?;
        let text = serde_json::to_string_pretty(&collection)
            .map_err(|e| CliError::Config(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let mut tiles = app.store().list_for_template(layer.url_template()).await?;
    tiles.sort_by_key(|t| (t.descriptor.z, t.descriptor.x, t.descriptor.y));
    for tile in &tiles {
        println!(
            "{:>2}/{}/{}  {}",
            tile.descriptor.z, tile.descriptor.x, tile.descriptor.y, tile.descriptor.key
        );
    }
    println!("{} tiles", tiles.len());
    Ok(())
}

/// Write one tile to `output`.
pub async fn run_get(config: AppConfig, tile: TileArgs, output: &Path) -> Result<(), CliError> {
    let app = TileKeepApp::start(config).await?;
    let result = get(&app, tile, output).await;
    app.shutdown().await;
    result
}

async fn get(app: &TileKeepApp, tile: TileArgs, output: &Path) -> Result<(), CliError> {
    let layer = app.layer();
    let coord = tile.coord();

    let (data, source) = match layer.create_tile(coord).await {
        TileImage::Stored { data, .. } => (data, "storage"),
        TileImage::Online { url } => (layer.fetcher().fetch(&url).await?, "network"),
    };

    std::fs::write(output, &data).map_err(|error| CliError::FileWrite {
        path: output.display().to_string(),
        error,
    })?;
    println!(
        "Wrote tile {} ({} bytes from {}) to {}",
        coord,
        data.len(),
        source,
        output.display()
    );
    Ok(())
}
