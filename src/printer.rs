//! The pipeline orchestrator.
//!
//! [`WorldPrinter`] sequences the whole run: world size, name resolution,
//! bulk stats, status normalization, material assembly, per-tile
//! compositing, row/map stitching and the final save. Progress surfaces
//! through [`Checkpoint`] subscribers; any failure aborts the run with no
//! partial output.

use crate::cache::CacheManager;
use crate::compose::draw_room;
use crate::constants::{
    DEFAULT_BACKGROUND, DEFAULT_CACHE_DIR, DEFAULT_DRAW_CONCURRENCY, DEFAULT_FETCH_CONCURRENCY,
    DEFAULT_RETRY_BUDGET, DEFAULT_RETRY_DELAY,
};
use crate::error::PrinterError;
use crate::events::{Checkpoint, Emitter, Notice};
use crate::layout::RoomNameResolver;
use crate::material::{DrawMaterial, MaterialAssembler};
use crate::matrix::{map_matrix_limit, Matrix};
use crate::net::NetworkClient;
use crate::stitch::{stitch_map, stitch_rows};
use crate::types::{normalize_statuses, now_ms, MapSize, MapStats};
use image::Rgba;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Receiver of the final encoded map.
pub trait ResultSink: Send + Sync {
    /// Persists the encoded image and returns a location descriptor.
    fn save(&self, bytes: Vec<u8>) -> impl Future<Output = Result<String, PrinterError>> + Send;
}

/// Sink writing the map to a fixed file path.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub path: PathBuf,
}

impl ResultSink for FileSink {
    async fn save(&self, bytes: Vec<u8>) -> Result<String, PrinterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(self.path.display().to_string())
    }
}

/// Tuning knobs of a print run.
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Concurrent cells per row while assembling materials (network bound).
    pub fetch_concurrency: usize,
    /// Concurrent cells per row while compositing tiles (codec bound).
    pub draw_concurrency: usize,
    /// Retry budget for tile/badge fetches.
    pub retry_budget: u32,
    /// Delay between retry attempts.
    pub retry_delay: Duration,
    /// Background fill, visible through gap cells.
    pub background: [u8; 4],
    /// Cache root directory.
    pub cache_root: PathBuf,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            draw_concurrency: DEFAULT_DRAW_CONCURRENCY,
            retry_budget: DEFAULT_RETRY_BUDGET,
            retry_delay: DEFAULT_RETRY_DELAY,
            background: DEFAULT_BACKGROUND,
            cache_root: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

/// Everything fetched for one run, ready to draw.
pub struct WorldDataSet {
    pub materials: Matrix<Option<DrawMaterial>>,
    pub map_size: MapSize,
    pub stats: MapStats,
}

/// Orchestrates fetching and drawing a world map.
pub struct WorldPrinter<C, R, S> {
    client: C,
    resolver: R,
    sink: S,
    cache: CacheManager,
    emitter: Emitter,
    config: PrinterConfig,
}

impl<C, R, S> WorldPrinter<C, R, S>
where
    C: NetworkClient,
    R: RoomNameResolver,
    S: ResultSink,
{
    /// Builds a printer. The cache namespace is derived from the client's
    /// host and shard, so servers sharing a cache root never collide.
    pub fn new(client: C, resolver: R, sink: S, config: PrinterConfig) -> Result<Self, PrinterError> {
        let namespace = format!("{}{}", client.host(), client.shard().unwrap_or(""));
        let cache = CacheManager::new(namespace, &config.cache_root)?;
        Ok(Self {
            client,
            resolver,
            sink,
            cache,
            emitter: Emitter::new(),
            config,
        })
    }

    /// Registers a subscriber for one lifecycle checkpoint.
    pub fn on<F>(&mut self, checkpoint: Checkpoint, handler: F)
    where
        F: Fn(&Notice<'_>) + Send + Sync + 'static,
    {
        self.emitter.on(checkpoint, handler);
    }

    /// Fetches everything needed to draw: size, names, stats and materials.
    pub async fn fetch_world(&self) -> Result<WorldDataSet, PrinterError> {
        self.client.connect().await?;

        let host = self.client.host();
        let shard = self.client.shard();

        self.emitter.emit(
            Checkpoint::BeforeFetchSize,
            &Notice {
                host: Some(host),
                shard,
                ..Default::default()
            },
        );
        let map_size = self.client.get_world_size().await?;
        let names = self.resolver.resolve(map_size).await?;
        self.emitter.emit(
            Checkpoint::AfterFetchSize,
            &Notice {
                map_size: Some(map_size),
                ..Default::default()
            },
        );
        info!(width = map_size.width, height = map_size.height, "world size resolved");

        self.emitter.emit(
            Checkpoint::BeforeFetchStats,
            &Notice {
                map_size: Some(map_size),
                ..Default::default()
            },
        );
        let rooms: Vec<String> = names.iter().flatten().flatten().cloned().collect();
        let mut stats = self.client.get_map_stats(&rooms).await?;
        normalize_statuses(&mut stats, now_ms());
        self.emitter.emit(
            Checkpoint::AfterFetchStats,
            &Notice {
                stats: Some(&stats),
                ..Default::default()
            },
        );
        info!(rooms = rooms.len(), "map stats fetched");

        self.emitter.emit(
            Checkpoint::BeforeFetchMaterials,
            &Notice {
                stats: Some(&stats),
                ..Default::default()
            },
        );
        let assembler = MaterialAssembler::new(
            &self.client,
            &self.cache,
            self.config.retry_budget,
            self.config.retry_delay,
        );
        let materials = assembler
            .assemble(names, &stats, self.config.fetch_concurrency, |material| {
                self.emitter.emit(
                    Checkpoint::MaterialReady,
                    &Notice {
                        room: Some(&material.room_name),
                        stats: Some(&stats),
                        ..Default::default()
                    },
                );
            })
            .await?;
        self.emitter
            .emit(Checkpoint::AfterFetchMaterials, &Notice::default());

        Ok(WorldDataSet {
            materials,
            map_size,
            stats,
        })
    }

    /// Draws the fetched world and hands the encoded map to the sink.
    /// Returns the sink's location descriptor.
    pub async fn draw_world(&self, dataset: WorldDataSet) -> Result<String, PrinterError> {
        self.emitter.emit(
            Checkpoint::BeforeDraw,
            &Notice {
                stats: Some(&dataset.stats),
                ..Default::default()
            },
        );

        // Room names survive the compositing pass as row-cache keys.
        let names: Matrix<Option<String>> = dataset
            .materials
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(|m| m.room_name.clone()))
                    .collect()
            })
            .collect();

        let tiles = map_matrix_limit(
            dataset.materials,
            self.config.draw_concurrency,
            |cell| async move {
                let rendered = draw_room(cell.as_ref()).await?;
                self.emitter.emit(
                    Checkpoint::RoomDrawn,
                    &Notice {
                        room: cell.as_ref().map(|m| m.room_name.as_str()),
                        ..Default::default()
                    },
                );
                Ok::<_, PrinterError>(rendered)
            },
        )
        .await?;

        let background = Rgba(self.config.background);
        let (row_paths, width) = stitch_rows(tiles, &names, &self.cache, background).await?;
        let map = stitch_map(&row_paths, width, background).await?;
        self.emitter.emit(Checkpoint::AfterDraw, &Notice::default());
        info!(rows = row_paths.len(), width, "map stitched");

        self.emitter.emit(Checkpoint::BeforeSave, &Notice::default());
        let save_path = self.sink.save(map).await?;
        self.emitter.emit(
            Checkpoint::AfterSave,
            &Notice {
                save_path: Some(&save_path),
                ..Default::default()
            },
        );
        info!(save_path, "map saved");

        Ok(save_path)
    }

    /// Runs the whole pipeline: fetch, draw, save.
    pub async fn print_world(&self) -> Result<String, PrinterError> {
        let dataset = self.fetch_world().await?;
        self.draw_world(dataset).await
    }
}
