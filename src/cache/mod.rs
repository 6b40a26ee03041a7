//! Content-addressed disk cache for tiles, badges and stitched rows.
//!
//! Every entry name carries a SHA-256 digest of its logical key salted with
//! the cache namespace (server host + shard), so caches for different
//! servers can share one directory without colliding. Keys are deterministic
//! functions of content identity: concurrent writes to the same key produce
//! identical files and need no locking.

use crate::error::PrinterError;
use crate::types::PlayerInfo;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A lazily read cache entry: a path plus the read operation.
///
/// Handles keep decoded bytes out of memory until a tile is actually
/// composited, which bounds peak memory on large grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHandle {
    path: PathBuf,
}

impl ContentHandle {
    /// Location of the entry on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entry's bytes.
    pub async fn read(&self) -> Result<Vec<u8>, PrinterError> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// Disk cache manager for one server's map assets.
pub struct CacheManager {
    namespace: String,
    root: PathBuf,
}

impl CacheManager {
    /// Creates a cache rooted at `root`, creating the directory if needed.
    ///
    /// `namespace` must uniquely identify the owning server and shard;
    /// it is folded into every entry digest.
    pub fn new(namespace: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self, PrinterError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            namespace: namespace.into(),
            root,
        })
    }

    /// Root directory of this cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Looks up the cached tile for a room. `None` on a miss.
    pub async fn tile_handle(&self, room: &str) -> Option<ContentHandle> {
        self.existing(self.tile_path(room)).await
    }

    /// Stores a room tile and returns its handle.
    pub async fn store_tile(&self, room: &str, bytes: &[u8]) -> Result<ContentHandle, PrinterError> {
        let path = self.tile_path(room);
        tokio::fs::write(&path, bytes).await?;
        debug!(room, path = %path.display(), "tile cached");
        Ok(ContentHandle { path })
    }

    /// Looks up the cached badge for a player. `None` on a miss, including
    /// when only an entry for an older badge style exists.
    pub async fn badge_handle(&self, player: &PlayerInfo) -> Option<ContentHandle> {
        self.existing(self.badge_path(player)).await
    }

    /// Stores a player badge and returns its handle.
    pub async fn store_badge(
        &self,
        player: &PlayerInfo,
        bytes: &[u8],
    ) -> Result<ContentHandle, PrinterError> {
        let path = self.badge_path(player);
        tokio::fs::write(&path, bytes).await?;
        debug!(player = %player.username, path = %path.display(), "badge cached");
        Ok(ContentHandle { path })
    }

    /// Stores a stitched row image, keyed by the ordered list of its room
    /// names (gaps join as empty strings). Returns the on-disk path; the
    /// next stitch stage re-reads it from there.
    pub async fn store_row(
        &self,
        rooms: &[Option<String>],
        bytes: &[u8],
    ) -> Result<PathBuf, PrinterError> {
        let key: Vec<&str> = rooms
            .iter()
            .map(|name| name.as_deref().unwrap_or(""))
            .collect();
        let digest = self.digest(&key.join(","));
        let path = self.root.join(format!("mapRow.{digest}.png"));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    fn tile_path(&self, room: &str) -> PathBuf {
        let digest = self.digest(room);
        self.root.join(format!("{room}.{digest}.png"))
    }

    fn badge_path(&self, player: &PlayerInfo) -> PathBuf {
        let style =
            serde_json::to_string(&player.badge).expect("badge style serializes to JSON");
        let digest = self.digest(&format!("{}{}", player.username, style));
        self.root.join(format!("{}.{digest}.svg", player.username))
    }

    async fn existing(&self, path: PathBuf) -> Option<ContentHandle> {
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(ContentHandle { path }),
            _ => None,
        }
    }

    /// Hex digest of an entity key salted with the cache namespace.
    fn digest(&self, entity_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(entity_key.as_bytes());
        hasher.update(self.namespace.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
