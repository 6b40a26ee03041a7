//! Wire types for the game server's map API and status derivation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// World dimensions in room units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

/// Effective state of a room.
///
/// The server only reports `normal` and `out of borders`; the novice and
/// respawn states are derived from the expiry timestamps before drawing,
/// see [`normalize_statuses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "novice")]
    Novice,
    #[serde(rename = "respawn")]
    Respawn,
    #[serde(rename = "out of borders")]
    Inactivated,
}

/// Owner of a claimed room: player id plus controller level (0-8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOwner {
    pub user: String,
    pub level: u8,
}

/// A player's signature on a room. Carried through for completeness;
/// rendering ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSign {
    pub datetime: i64,
    pub text: String,
    pub time: i64,
    pub user: String,
}

/// Per-room entry of the bulk stats response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStats {
    pub status: RoomStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own: Option<RoomOwner>,
    /// Novice-area expiry, milliseconds since the epoch.
    #[serde(default, rename = "novice", skip_serializing_if = "Option::is_none")]
    pub novice_until: Option<i64>,
    /// Respawn-area expiry, milliseconds since the epoch.
    #[serde(default, rename = "respawnArea", skip_serializing_if = "Option::is_none")]
    pub respawn_until: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<RoomSign>,
}

/// Badge configuration of a player.
///
/// The serialized JSON form participates in the badge cache key, so any
/// visual change invalidates previously cached renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeStyle {
    #[serde(rename = "type")]
    pub kind: i32,
    pub color1: String,
    pub color2: String,
    pub color3: String,
    pub param: i64,
    pub flip: bool,
}

/// Player entry of the bulk stats response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub badge: BadgeStyle,
}

/// Response of the bulk `map-stats` query: per-room stats plus the players
/// referenced by their owner entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapStats {
    #[serde(default)]
    pub stats: HashMap<String, RoomStats>,
    #[serde(default)]
    pub users: HashMap<String, PlayerInfo>,
}

/// Current wall-clock time in milliseconds since the epoch, the unit the
/// server uses for expiry timestamps.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Derives the effective status of every room in place.
///
/// Inactivated rooms are left untouched. For the rest, a still-valid novice
/// expiry wins, then a still-valid respawn expiry. The novice check always
/// runs first, regardless of which expiry is numerically later.
pub fn normalize_statuses(stats: &mut MapStats, now_ms: i64) {
    for info in stats.stats.values_mut() {
        if info.status == RoomStatus::Inactivated {
            continue;
        }
        if info.novice_until.is_some_and(|t| t >= now_ms) {
            info.status = RoomStatus::Novice;
        } else if info.respawn_until.is_some_and(|t| t >= now_ms) {
            info.status = RoomStatus::Respawn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_stats(status: RoomStatus, novice: Option<i64>, respawn: Option<i64>) -> RoomStats {
        RoomStats {
            status,
            own: None,
            novice_until: novice,
            respawn_until: respawn,
            sign: None,
        }
    }

    fn stats_of(entries: Vec<(&str, RoomStats)>) -> MapStats {
        MapStats {
            stats: entries
                .into_iter()
                .map(|(name, info)| (name.to_string(), info))
                .collect(),
            users: HashMap::new(),
        }
    }

    #[test]
    fn test_normalize_detects_novice_area() {
        let now = 1_000_000;
        let mut stats = stats_of(vec![(
            "W1N1",
            plain_stats(RoomStatus::Normal, Some(now + 5000), None),
        )]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N1"].status, RoomStatus::Novice);
    }

    #[test]
    fn test_normalize_detects_respawn_area() {
        let now = 1_000_000;
        let mut stats = stats_of(vec![(
            "W1N1",
            plain_stats(RoomStatus::Normal, None, Some(now + 5000)),
        )]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N1"].status, RoomStatus::Respawn);
    }

    #[test]
    fn test_normalize_checks_novice_before_respawn() {
        let now = 1_000_000;
        // Both valid; novice wins even though its expiry is later.
        let mut stats = stats_of(vec![(
            "W1N1",
            plain_stats(RoomStatus::Normal, Some(now + 10_000), Some(now + 5000)),
        )]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N1"].status, RoomStatus::Novice);
    }

    #[test]
    fn test_normalize_leaves_inactivated_untouched() {
        let now = 1_000_000;
        let mut stats = stats_of(vec![(
            "W1N1",
            plain_stats(RoomStatus::Inactivated, Some(now + 10_000), Some(now + 5000)),
        )]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N1"].status, RoomStatus::Inactivated);
    }

    #[test]
    fn test_normalize_leaves_plain_normal_untouched() {
        let now = 1_000_000;
        let mut stats = stats_of(vec![("W1N2", plain_stats(RoomStatus::Normal, None, None))]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N2"].status, RoomStatus::Normal);
    }

    #[test]
    fn test_normalize_ignores_expired_timestamps() {
        let now = 1_000_000;
        let mut stats = stats_of(vec![(
            "W1N1",
            plain_stats(RoomStatus::Normal, Some(now - 1), Some(now - 1)),
        )]);

        normalize_statuses(&mut stats, now);
        assert_eq!(stats.stats["W1N1"].status, RoomStatus::Normal);
    }

    #[test]
    fn test_normalize_keeps_other_fields() {
        let now = 1_000_000;
        let mut info = plain_stats(RoomStatus::Normal, Some(now + 5000), None);
        info.own = Some(RoomOwner {
            user: "a123".to_string(),
            level: 4,
        });
        let mut stats = stats_of(vec![("W1N4", info.clone())]);

        normalize_statuses(&mut stats, now);

        let fixed = &stats.stats["W1N4"];
        assert_eq!(fixed.status, RoomStatus::Novice);
        assert_eq!(fixed.own, info.own);
        assert_eq!(fixed.novice_until, info.novice_until);
    }

    #[test]
    fn test_map_stats_wire_format() {
        let raw = r##"{
            "stats": {
                "E0N0": {
                    "status": "normal",
                    "own": { "user": "asd123", "level": 2 },
                    "novice": 1700000000000
                },
                "W0N0": { "status": "out of borders" }
            },
            "users": {
                "asd123": {
                    "_id": "asd123",
                    "username": "testUser",
                    "badge": {
                        "type": 3,
                        "color1": "#f00",
                        "color2": "#0f0",
                        "color3": "#00f",
                        "param": 0,
                        "flip": false
                    }
                }
            }
        }"##;

        let stats: MapStats = serde_json::from_str(raw).unwrap();
        assert_eq!(stats.stats["E0N0"].status, RoomStatus::Normal);
        assert_eq!(stats.stats["E0N0"].own.as_ref().unwrap().level, 2);
        assert_eq!(stats.stats["E0N0"].novice_until, Some(1_700_000_000_000));
        assert_eq!(stats.stats["W0N0"].status, RoomStatus::Inactivated);
        assert_eq!(stats.users["asd123"].username, "testUser");
    }
}
