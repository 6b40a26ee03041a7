//! Network access to a Screeps-compatible game server.
//!
//! [`NetworkClient`] is the seam the pipeline works against; [`ScreepsClient`]
//! is the reqwest-backed implementation. The client is an immutable
//! per-session value: credentials are folded into the HTTP client's default
//! headers at construction and never mutated afterwards.

use crate::error::PrinterError;
use crate::types::{MapSize, MapStats};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// User-Agent for all requests. Some tile CDNs reject requests without one.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Stat aggregation requested from the bulk map-stats endpoint.
const STAT_NAME: &str = "owner0";

/// Client interface against the remote game server.
///
/// All byte-returning operations guarantee a non-empty body or fail with a
/// retryable network error.
pub trait NetworkClient: Send + Sync {
    /// Server base URL, used for cache namespacing and event payloads.
    fn host(&self) -> &str;

    /// Shard name, when the server is sharded.
    fn shard(&self) -> Option<&str>;

    /// Verifies the session is usable before the pipeline starts.
    fn connect(&self) -> impl Future<Output = Result<(), PrinterError>> + Send;

    /// Fetches the world dimensions in room units.
    fn get_world_size(&self) -> impl Future<Output = Result<MapSize, PrinterError>> + Send;

    /// Fetches stats for every named room in one bulk query.
    fn get_map_stats(
        &self,
        rooms: &[String],
    ) -> impl Future<Output = Result<MapStats, PrinterError>> + Send;

    /// Fetches one room's tile image.
    fn get_tile_bytes(
        &self,
        room: &str,
    ) -> impl Future<Output = Result<Vec<u8>, PrinterError>> + Send;

    /// Fetches one player's badge image.
    fn get_badge_bytes(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Vec<u8>, PrinterError>> + Send;
}

/// Connection description for a [`ScreepsClient`].
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Base URL of the server, e.g. `https://screeps.com`.
    pub host: String,
    /// Shard to draw (official server).
    pub shard: Option<String>,
    /// Auth token obtained by the caller.
    pub token: Option<String>,
    /// Optional CDN serving room tiles as `map/<shard>/<room>.png`.
    pub tile_cdn: Option<String>,
}

/// `NetworkClient` implementation over reqwest.
pub struct ScreepsClient {
    info: ServerInfo,
    http: reqwest::Client,
}

impl ScreepsClient {
    /// Builds a client for one session. The token, when present, is set as
    /// the `X-Token`/`X-Username` default headers here and nowhere else.
    pub fn new(info: ServerInfo) -> Result<Self, PrinterError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &info.token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| PrinterError::Network(format!("invalid auth token: {e}")))?;
            headers.insert("X-Token", value.clone());
            headers.insert("X-Username", value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| PrinterError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { info, http })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.info.host.trim_end_matches('/'), path)
    }

    fn tile_url(&self, room: &str) -> String {
        match (&self.info.tile_cdn, &self.info.shard) {
            (Some(cdn), Some(shard)) => {
                format!("{}/map/{}/{}.png", cdn.trim_end_matches('/'), shard, room)
            }
            _ => format!(
                "{}/assets/map/{}.png",
                self.info.host.trim_end_matches('/'),
                room
            ),
        }
    }

    /// GET `url` and return its body, enforcing 2xx and a non-empty body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, PrinterError> {
        trace!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PrinterError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrinterError::Network(format!("HTTP {status} from {url}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PrinterError::Network(format!("failed to read response: {e}")))?;

        if bytes.is_empty() {
            return Err(PrinterError::EmptyBody(url.to_string()));
        }

        debug!(url, bytes = bytes.len(), "response received");
        Ok(bytes.to_vec())
    }
}

impl NetworkClient for ScreepsClient {
    fn host(&self) -> &str {
        &self.info.host
    }

    fn shard(&self) -> Option<&str> {
        self.info.shard.as_deref()
    }

    async fn connect(&self) -> Result<(), PrinterError> {
        if self.info.token.is_none() {
            return Ok(());
        }

        let url = self.api_url("auth/me");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PrinterError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrinterError::Network(format!(
                "session check failed: HTTP {status} from {url}"
            )));
        }
        Ok(())
    }

    async fn get_world_size(&self) -> Result<MapSize, PrinterError> {
        let mut url = self.api_url("game/world-size");
        if let Some(shard) = &self.info.shard {
            url = format!("{url}?shard={shard}");
        }

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PrinterError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrinterError::Network(format!("HTTP {status} from {url}")));
        }

        response
            .json::<MapSize>()
            .await
            .map_err(|e| PrinterError::Network(format!("invalid world-size response: {e}")))
    }

    async fn get_map_stats(&self, rooms: &[String]) -> Result<MapStats, PrinterError> {
        let url = self.api_url("game/map-stats");
        let body = json!({
            "rooms": rooms,
            "shard": self.info.shard,
            "statName": STAT_NAME,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrinterError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrinterError::Network(format!("HTTP {status} from {url}")));
        }

        response
            .json::<MapStats>()
            .await
            .map_err(|e| PrinterError::Network(format!("invalid map-stats response: {e}")))
    }

    async fn get_tile_bytes(&self, room: &str) -> Result<Vec<u8>, PrinterError> {
        self.get_bytes(&self.tile_url(room)).await
    }

    async fn get_badge_bytes(&self, username: &str) -> Result<Vec<u8>, PrinterError> {
        let url = self.api_url(&format!("user/badge-svg?username={username}"));
        let bytes = self.get_bytes(&url).await?;
        Ok(fix_badge_vector(bytes))
    }
}

/// Repairs the known malformed clip circle in badge vector data.
///
/// The badge endpoint emits a clip radius of 52 on a 100-unit viewBox, which
/// leaks corners past the intended circular outline once rasterized.
fn fix_badge_vector(bytes: Vec<u8>) -> Vec<u8> {
    match String::from_utf8(bytes) {
        Ok(text) => text.replace("r=\"52\"", "r=\"50\"").into_bytes(),
        // Raster payloads pass through untouched.
        Err(err) => err.into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(info: ServerInfo) -> ScreepsClient {
        ScreepsClient::new(info).unwrap()
    }

    #[test]
    fn test_api_url_joins_host_and_path() {
        let c = client(ServerInfo {
            host: "https://screeps.com/".to_string(),
            ..Default::default()
        });
        assert_eq!(c.api_url("auth/me"), "https://screeps.com/api/auth/me");
    }

    #[test]
    fn test_tile_url_prefers_cdn_when_sharded() {
        let c = client(ServerInfo {
            host: "https://screeps.com".to_string(),
            shard: Some("shard3".to_string()),
            tile_cdn: Some("https://cdn.example.com".to_string()),
            ..Default::default()
        });
        assert_eq!(
            c.tile_url("W49S9"),
            "https://cdn.example.com/map/shard3/W49S9.png"
        );
    }

    #[test]
    fn test_tile_url_falls_back_to_server_assets() {
        let c = client(ServerInfo {
            host: "http://localhost:21025".to_string(),
            ..Default::default()
        });
        assert_eq!(
            c.tile_url("W1N1"),
            "http://localhost:21025/assets/map/W1N1.png"
        );
    }

    #[test]
    fn test_fix_badge_vector_repairs_clip_radius() {
        let raw = br#"<svg><circle cx="50" cy="50" r="52" /></svg>"#.to_vec();
        let fixed = fix_badge_vector(raw);
        assert_eq!(
            fixed,
            br#"<svg><circle cx="50" cy="50" r="50" /></svg>"#.to_vec()
        );
    }

    #[test]
    fn test_fix_badge_vector_keeps_other_radii() {
        let raw = br#"<svg><circle r="25" /></svg>"#.to_vec();
        assert_eq!(fix_badge_vector(raw.clone()), raw);
    }

    #[test]
    fn test_fix_badge_vector_passes_binary_through() {
        let raw = vec![0x89, 0x50, 0x4e, 0x47, 0xff, 0x00];
        assert_eq!(fix_badge_vector(raw.clone()), raw);
    }

    #[test]
    fn test_client_rejects_unprintable_token() {
        let result = ScreepsClient::new(ServerInfo {
            host: "https://screeps.com".to_string(),
            token: Some("bad\ntoken".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(PrinterError::Network(_))));
    }
}
