//! Shared rendering and pipeline constants.

use std::time::Duration;

/// Edge length of one room tile in pixels.
pub const ROOM_PIXELS: u32 = 150;

/// Background color of the assembled map (RGBA). Gap cells show this fill.
pub const DEFAULT_BACKGROUND: [u8; 4] = [0x2b, 0x2b, 0x2b, 0xff];

/// Mask color for inactivated rooms.
pub const INACTIVATED_MASK: [u8; 3] = [0x00, 0x00, 0x00];

/// Mask color for respawn-area rooms.
pub const RESPAWN_MASK: [u8; 3] = [0x00, 0x6b, 0xff];

/// Mask color for novice-area rooms.
pub const NOVICE_MASK: [u8; 3] = [0x7c, 0xff, 0x7c];

/// Alpha applied to status masks and to level-0 badges.
pub const HALF_ALPHA: u8 = 128;

/// Badge scale factor per controller level (index 0-8).
///
/// A level-8 room shows the badge at 60% of its source width, a remote
/// claim (level 0) at 25%.
pub const BADGE_SCALE_BY_LEVEL: [f32; 9] = [0.25, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6];

/// Default retry budget for tile and badge fetches.
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Default delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Default concurrency while assembling materials (network bound).
pub const DEFAULT_FETCH_CONCURRENCY: usize = 15;

/// Default concurrency while compositing tiles (codec bound).
pub const DEFAULT_DRAW_CONCURRENCY: usize = 30;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".screeps_cache";
