//! Material assembly: resolving every grid cell to its draw inputs.
//!
//! For each named cell this produces a [`DrawMaterial`] carrying the room's
//! stats plus lazy handles to its tile and (when owned) badge bytes. Handles
//! come from the cache when present, otherwise from a retry-wrapped network
//! fetch followed by a cache write — the network stays the source of truth
//! on a miss.

use crate::cache::{CacheManager, ContentHandle};
use crate::error::PrinterError;
use crate::matrix::{map_matrix_limit, Matrix};
use crate::net::NetworkClient;
use crate::retry::retry;
use crate::types::{MapStats, RoomStats};
use std::time::Duration;
use tracing::debug;

/// Everything needed to draw one room: identity, stats and byte handles.
#[derive(Debug, Clone)]
pub struct DrawMaterial {
    pub room_name: String,
    pub stats: RoomStats,
    pub tile: ContentHandle,
    /// Present when the room has an owner.
    pub badge: Option<ContentHandle>,
}

/// Resolves draw materials for a whole name matrix.
pub struct MaterialAssembler<'a, C> {
    client: &'a C,
    cache: &'a CacheManager,
    retry_budget: u32,
    retry_delay: Duration,
}

impl<'a, C: NetworkClient> MaterialAssembler<'a, C> {
    pub fn new(
        client: &'a C,
        cache: &'a CacheManager,
        retry_budget: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            retry_budget,
            retry_delay,
        }
    }

    /// Assembles materials for every cell, up to `limit` cells of one row at
    /// a time. Gap cells stay gaps; `on_cell` fires once per assembled
    /// material.
    pub async fn assemble<F>(
        &self,
        names: Matrix<Option<String>>,
        stats: &MapStats,
        limit: usize,
        on_cell: F,
    ) -> Result<Matrix<Option<DrawMaterial>>, PrinterError>
    where
        F: Fn(&DrawMaterial),
    {
        let on_cell = &on_cell;
        map_matrix_limit(names, limit, |cell| async move {
            match cell {
                None => Ok(None),
                Some(room) => {
                    let material = self.assemble_cell(room, stats).await?;
                    on_cell(&material);
                    Ok(Some(material))
                }
            }
        })
        .await
    }

    async fn assemble_cell(
        &self,
        room: String,
        stats: &MapStats,
    ) -> Result<DrawMaterial, PrinterError> {
        let info = stats
            .stats
            .get(&room)
            .ok_or_else(|| PrinterError::MissingRoomStats(room.clone()))?;

        let tile = self.tile_handle(&room).await?;

        let badge = match &info.own {
            Some(owner) => {
                let player = stats
                    .users
                    .get(&owner.user)
                    .ok_or_else(|| PrinterError::MissingOwner(owner.user.clone()))?;
                Some(self.badge_handle(player).await?)
            }
            None => None,
        };

        Ok(DrawMaterial {
            room_name: room,
            stats: info.clone(),
            tile,
            badge,
        })
    }

    async fn tile_handle(&self, room: &str) -> Result<ContentHandle, PrinterError> {
        if let Some(handle) = self.cache.tile_handle(room).await {
            debug!(room, "tile cache hit");
            return Ok(handle);
        }

        let bytes = retry(self.retry_budget, self.retry_delay, || {
            self.client.get_tile_bytes(room)
        })
        .await?;
        self.cache.store_tile(room, &bytes).await
    }

    async fn badge_handle(
        &self,
        player: &crate::types::PlayerInfo,
    ) -> Result<ContentHandle, PrinterError> {
        if let Some(handle) = self.cache.badge_handle(player).await {
            debug!(player = %player.username, "badge cache hit");
            return Ok(handle);
        }

        let bytes = retry(self.retry_budget, self.retry_delay, || {
            self.client.get_badge_bytes(&player.username)
        })
        .await?;
        self.cache.store_badge(player, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BadgeStyle, MapSize, PlayerInfo, RoomOwner, RoomStatus};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Mock server: counts fetches and can fail the first N tile requests.
    #[derive(Default)]
    struct MockClient {
        tile_calls: AtomicU32,
        badge_calls: AtomicU32,
        tile_failures: u32,
    }

    impl NetworkClient for MockClient {
        fn host(&self) -> &str {
            "http://mock"
        }

        fn shard(&self) -> Option<&str> {
            None
        }

        async fn connect(&self) -> Result<(), PrinterError> {
            Ok(())
        }

        async fn get_world_size(&self) -> Result<MapSize, PrinterError> {
            Ok(MapSize {
                width: 1,
                height: 1,
            })
        }

        async fn get_map_stats(&self, _rooms: &[String]) -> Result<MapStats, PrinterError> {
            Ok(MapStats::default())
        }

        async fn get_tile_bytes(&self, room: &str) -> Result<Vec<u8>, PrinterError> {
            let calls = self.tile_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if calls <= self.tile_failures {
                return Err(PrinterError::EmptyBody(format!("tile {room}")));
            }
            Ok(format!("tile:{room}").into_bytes())
        }

        async fn get_badge_bytes(&self, username: &str) -> Result<Vec<u8>, PrinterError> {
            self.badge_calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("badge:{username}").into_bytes())
        }
    }

    fn stats_with_owner() -> MapStats {
        let mut stats = HashMap::new();
        stats.insert(
            "W0N0".to_string(),
            RoomStats {
                status: RoomStatus::Normal,
                own: None,
                novice_until: None,
                respawn_until: None,
                sign: None,
            },
        );
        stats.insert(
            "E0N0".to_string(),
            RoomStats {
                status: RoomStatus::Normal,
                own: Some(RoomOwner {
                    user: "asd123".to_string(),
                    level: 2,
                }),
                novice_until: None,
                respawn_until: None,
                sign: None,
            },
        );

        let mut users = HashMap::new();
        users.insert(
            "asd123".to_string(),
            PlayerInfo {
                id: "asd123".to_string(),
                username: "testUser".to_string(),
                badge: BadgeStyle {
                    kind: 1,
                    color1: "#fff".to_string(),
                    color2: "#000".to_string(),
                    color3: "#888".to_string(),
                    param: 0,
                    flip: false,
                },
            },
        );

        MapStats { stats, users }
    }

    fn assembler<'a>(client: &'a MockClient, cache: &'a CacheManager) -> MaterialAssembler<'a, MockClient> {
        MaterialAssembler::new(client, cache, 3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_gap_cells_produce_no_material() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let stats = stats_with_owner();

        let names = vec![vec![None, Some("W0N0".to_string())]];
        let materials = assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await
            .unwrap();

        assert!(materials[0][0].is_none());
        assert!(materials[0][1].is_some());
    }

    #[tokio::test]
    async fn test_named_cell_without_stats_is_fatal() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let stats = stats_with_owner();

        let names = vec![vec![Some("W9N9".to_string())]];
        let result = assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await;

        match result {
            Err(PrinterError::MissingRoomStats(room)) => assert_eq!(room, "W9N9"),
            other => panic!("expected MissingRoomStats, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_owner_without_player_entry_is_fatal() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let mut stats = stats_with_owner();
        stats.users.clear();

        let names = vec![vec![Some("E0N0".to_string())]];
        let result = assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await;

        assert!(matches!(result, Err(PrinterError::MissingOwner(id)) if id == "asd123"));
    }

    #[tokio::test]
    async fn test_read_through_hits_cache_on_second_pass() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let stats = stats_with_owner();

        let names = vec![vec![Some("W0N0".to_string()), Some("E0N0".to_string())]];

        let materials = assembler(&client, &cache)
            .assemble(names.clone(), &stats, 4, |_| {})
            .await
            .unwrap();
        assert_eq!(client.tile_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.badge_calls.load(Ordering::SeqCst), 1);

        // Stored bytes readable through the handle.
        let tile = materials[0][0].as_ref().unwrap().tile.read().await.unwrap();
        assert_eq!(tile, b"tile:W0N0");

        // Second run resolves everything from disk.
        assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await
            .unwrap();
        assert_eq!(client.tile_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.badge_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_body_is_retried() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient {
            tile_failures: 2,
            ..Default::default()
        };
        let stats = stats_with_owner();

        let names = vec![vec![Some("W0N0".to_string())]];
        let materials = assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await
            .unwrap();

        assert!(materials[0][0].is_some());
        // Two failures then one success.
        assert_eq!(client.tile_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_on_cell_fires_per_material() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let stats = stats_with_owner();

        let seen = std::sync::Mutex::new(Vec::new());
        let names = vec![vec![None, Some("W0N0".to_string()), Some("E0N0".to_string())]];

        assembler(&client, &cache)
            .assemble(names, &stats, 4, |material| {
                seen.lock().unwrap().push(material.room_name.clone());
            })
            .await
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec!["E0N0".to_string(), "W0N0".to_string()]);
    }

    #[tokio::test]
    async fn test_owned_room_carries_badge_handle() {
        let temp = TempDir::new().unwrap();
        let cache = CacheManager::new("mock", temp.path()).unwrap();
        let client = MockClient::default();
        let stats = stats_with_owner();

        let names = vec![vec![Some("W0N0".to_string()), Some("E0N0".to_string())]];
        let materials = assembler(&client, &cache)
            .assemble(names, &stats, 4, |_| {})
            .await
            .unwrap();

        assert!(materials[0][0].as_ref().unwrap().badge.is_none());
        let owned = materials[0][1].as_ref().unwrap();
        let badge = owned.badge.as_ref().unwrap().read().await.unwrap();
        assert_eq!(badge, b"badge:testUser");
    }
}
