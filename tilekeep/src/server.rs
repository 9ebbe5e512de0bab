//! HTTP tile endpoint backed by an [`OfflineTileLayer`].
//!
//! Serves `GET /tiles/{z}/{x}/{y}` (an extension on `y` is ignored) from the
//! store when the tile is saved and from the network otherwise, plus:
//!
//! | Route                  | Response                                    |
//! |------------------------|---------------------------------------------|
//! | `/status`              | `ready!`                                    |
//! | `/api/status.json`     | stored tile count and layer template        |
//! | `/api/tiles.geojson`   | GeoJSON of the layer's stored tiles         |
//!
//! Tiles fetched for a miss are not stored.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, Response, StatusCode,
    },
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::coord::{world_tiles, TileCoord, MAX_ZOOM};
use crate::layer::{sniff_content_type, OfflineTileLayer, TileImage};
use crate::provider::FetchError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server is already running on {0}")]
    AlreadyRunning(SocketAddr),
}

/// Tile server lifecycle: bind, serve in the background, stop.
pub struct TileServer {
    ip: String,
    port: u16,
    layer: OfflineTileLayer,
    local_addr: Option<SocketAddr>,
    exit_signal: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl TileServer {
    pub fn new(ip: &str, port: u16, layer: OfflineTileLayer) -> Self {
        Self {
            ip: ip.to_owned(),
            port,
            layer,
            local_addr: None,
            exit_signal: None,
            join: None,
        }
    }

    /// Address actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Routes of the server, for embedding in another router.
    pub fn router(layer: OfflineTileLayer) -> Router {
        Router::new()
            .route("/status", get(|| async { "ready!" }))
            .route("/tiles/:z/:x/:y", get(serve_tile))
            .route("/api/status.json", get(serve_status))
            .route("/api/tiles.geojson", get(serve_geojson))
            .with_state(layer)
    }

    /// Bind and start serving in the background.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(addr) = self.local_addr {
            return Err(ServerError::AlreadyRunning(addr));
        }

        let addr = format!("{}:{}", self.ip, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let router = Self::router(self.layer.clone());
        let (tx, rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
            {
                error!(error = %e, "Tile server exited with error");
            }
        });

        info!(addr = %local_addr, url_template = %self.layer.url_template(), "Tile server listening");
        self.local_addr = Some(local_addr);
        self.exit_signal = Some(tx);
        self.join = Some(join);
        Ok(local_addr)
    }

    /// Stop serving and wait for in-flight requests to finish.
    pub async fn stop(&mut self) {
        let Some(tx) = self.exit_signal.take() else {
            return;
        };
        debug!("Stopping tile server");
        let _ = tx.send(());
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                error!(error = %e, "Tile server task failed");
            }
        }
        self.local_addr = None;
    }
}

/// Parse `z`, `x` and `y` (with optional extension) into a tile on the grid.
fn parse_tile_path(z: &str, x: &str, y: &str, tile_size: u32) -> Option<TileCoord> {
    let z: u8 = z.parse().ok()?;
    if z > MAX_ZOOM {
        return None;
    }
    let x: u32 = x.parse().ok()?;
    let y: u32 = y.split('.').next()?.parse().ok()?;
    let limit = world_tiles(z, tile_size);
    (x < limit && y < limit).then(|| TileCoord::new(x, y, z))
}

async fn serve_tile(
    Path((z, x, y)): Path<(String, String, String)>,
    State(layer): State<OfflineTileLayer>,
) -> Response<Body> {
    let Some(coord) = parse_tile_path(&z, &x, &y, layer.deriver().tile_size()) else {
        return plain(StatusCode::BAD_REQUEST, "Invalid tile coordinates");
    };

    let (data, source) = match layer.create_tile(coord).await {
        TileImage::Stored { data, .. } => (data, "store"),
        TileImage::Online { url } => match layer.fetcher().fetch(&url).await {
            Ok(data) => (data, "network"),
            Err(e) => {
                warn!(tile = %coord, error = %e, "Tile unavailable");
                return match e {
                    FetchError::Status { status: 404, .. } => plain(StatusCode::NOT_FOUND, "Not Found"),
                    _ => plain(StatusCode::BAD_GATEWAY, "Upstream tile request failed"),
                };
            }
        },
    };

    debug!(tile = %coord, source, bytes = data.len(), "Serving tile");
    Response::builder()
        .status(StatusCode::OK)
        .header(
            CONTENT_TYPE,
            sniff_content_type(&data).unwrap_or("application/octet-stream"),
        )
        .header(CACHE_CONTROL, "public, max-age=86400")
        .header("x-tile-source", source)
        .body(Body::from(data))
        .unwrap_or_else(|_| plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
}

async fn serve_status(State(layer): State<OfflineTileLayer>) -> Response<Body> {
    match layer.store().count().await {
        Ok(count) => json(serde_json::json!({
            "status": "ready",
            "urlTemplate": layer.url_template(),
            "storageSize": count,
        })),
        Err(e) => {
            error!(error = %e, "Failed to count stored tiles");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Tile store unavailable")
        }
    }
}

async fn serve_geojson(State(layer): State<OfflineTileLayer>) -> Response<Body> {
    match layer
        .store()
        .to_geojson(layer.url_template(), layer.deriver().tile_size())
        .await
    {
        Ok(collection) => json(collection),
        Err(e) => {
            error!(error = %e, "Failed to list stored tiles");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Tile store unavailable")
        }
    }
}

fn json(value: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(value.to_string()));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn plain(status: StatusCode, message: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockFetcher;
    use crate::store::TileStore;
    use crate::template::TileLayerOptions;

    const TEMPLATE: &str = "https://{s}.tiles.example.org/{z}/{x}/{y}.png";
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nrest";

    async fn layer_with(fetcher: std::sync::Arc<MockFetcher>) -> OfflineTileLayer {
        let store = TileStore::in_memory().await.unwrap();
        OfflineTileLayer::new(TEMPLATE, TileLayerOptions::default(), store, fetcher).unwrap()
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_parse_tile_path() {
        assert_eq!(parse_tile_path("3", "1", "2.png", 256), Some(TileCoord::new(1, 2, 3)));
        assert_eq!(parse_tile_path("3", "1", "2", 256), Some(TileCoord::new(1, 2, 3)));
        assert_eq!(parse_tile_path("3", "8", "2", 256), None);
        assert_eq!(parse_tile_path("31", "0", "0", 256), None);
        assert_eq!(parse_tile_path("a", "0", "0", 256), None);
    }

    #[tokio::test]
    async fn test_serves_stored_tile_without_fetching() {
        let fetcher = MockFetcher::new();
        let layer = layer_with(fetcher.clone()).await;
        let coord = TileCoord::new(1, 2, 3);
        layer
            .store()
            .put(layer.deriver().descriptor(&coord), PNG.to_vec())
            .await
            .unwrap();

        let mut server = TileServer::new("127.0.0.1", 0, layer);
        let addr = server.start().await.unwrap();

        let response = client()
            .get(format!("http://{}/tiles/3/1/2.png", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()[CONTENT_TYPE.as_str()], "image/png");
        assert_eq!(response.headers()["x-tile-source"], "store");
        assert_eq!(response.bytes().await.unwrap().as_ref(), PNG);
        assert_eq!(fetcher.calls(), 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_miss_fetches_and_unknown_is_404() {
        let fetcher = MockFetcher::new();
        let layer = layer_with(fetcher.clone()).await;
        fetcher.respond(&layer.tile_url(&TileCoord::new(0, 0, 1)), PNG);

        let mut server = TileServer::new("127.0.0.1", 0, layer.clone());
        let addr = server.start().await.unwrap();

        let ok = client()
            .get(format!("http://{}/tiles/1/0/0", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
        assert_eq!(ok.headers()["x-tile-source"], "network");

        let missing = client()
            .get(format!("http://{}/tiles/1/1/1", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);

        let bad = client()
            .get(format!("http://{}/tiles/1/5/0", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status(), 400);

        assert_eq!(layer.store().count().await.unwrap(), 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_status_and_geojson() {
        let layer = layer_with(MockFetcher::new()).await;
        let coord = TileCoord::new(0, 0, 1);
        layer
            .store()
            .put(layer.deriver().descriptor(&coord), PNG.to_vec())
            .await
            .unwrap();

        let mut server = TileServer::new("127.0.0.1", 0, layer);
        let addr = server.start().await.unwrap();
        assert!(matches!(server.start().await, Err(ServerError::AlreadyRunning(_))));

        let status: serde_json::Value = client()
            .get(format!("http://{}/api/status.json", addr))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .map(|body| serde_json::from_slice(&body).unwrap())
            .unwrap();
        assert_eq!(status["storageSize"], 1);

        let geojson: serde_json::Value = client()
            .get(format!("http://{}/api/tiles.geojson", addr))
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .map(|body| serde_json::from_slice(&body).unwrap())
            .unwrap();
        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["features"].as_array().unwrap().len(), 1);

        server.stop().await;
    }
}
