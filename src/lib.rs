//! worldprinter - assembles a full world map image from a game server's
//! per-room tiles and owner badges.
//!
//! The pipeline fetches the world size, resolves the room-name grid, pulls
//! bulk room stats, assembles per-cell draw materials through a
//! content-addressed disk cache, composites each room tile (status masks,
//! owner badges) and stitches everything into one PNG.
//!
//! # Example
//!
//! ```ignore
//! use worldprinter::{
//!     FileSink, MirroredQuadrantLayout, PrinterConfig, ScreepsClient, ServerInfo, WorldPrinter,
//! };
//!
//! let client = ScreepsClient::new(ServerInfo {
//!     host: "https://screeps.com".to_string(),
//!     shard: Some("shard3".to_string()),
//!     token: Some(token),
//!     ..Default::default()
//! })?;
//! let sink = FileSink { path: "./result.png".into() };
//!
//! let printer = WorldPrinter::new(client, MirroredQuadrantLayout, sink, PrinterConfig::default())?;
//! let saved = printer.print_world().await?;
//! ```

pub mod cache;
pub mod compose;
pub mod constants;
pub mod error;
pub mod events;
pub mod layout;
pub mod logging;
pub mod material;
pub mod matrix;
pub mod net;
pub mod printer;
pub mod retry;
pub mod stitch;
pub mod types;

pub use cache::{CacheManager, ContentHandle};
pub use error::PrinterError;
pub use events::{Checkpoint, Notice};
pub use layout::{DefaultLayout, FixedLayout, MirroredQuadrantLayout, RoomNameResolver};
pub use material::DrawMaterial;
pub use net::{NetworkClient, ScreepsClient, ServerInfo};
pub use printer::{FileSink, PrinterConfig, ResultSink, WorldDataSet, WorldPrinter};
pub use types::{MapSize, MapStats, RoomStatus};

/// Version of the worldprinter library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
