//! Lifecycle checkpoints and subscriber registration.
//!
//! The orchestrator announces its progress through named checkpoints.
//! Subscribers register per checkpoint and receive a small borrowed payload;
//! nothing in the pipeline depends on what (if anything) is listening, so
//! the core runs headless in tests.

use crate::types::{MapSize, MapStats};
use std::collections::HashMap;

/// Named pipeline checkpoints.
///
/// The `Before*`/`After*` pairs fire once per run around each phase;
/// [`Checkpoint::MaterialReady`] fires once per assembled cell and
/// [`Checkpoint::RoomDrawn`] once per composited cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    BeforeFetchSize,
    AfterFetchSize,
    BeforeFetchStats,
    AfterFetchStats,
    BeforeFetchMaterials,
    AfterFetchMaterials,
    BeforeDraw,
    AfterDraw,
    BeforeSave,
    AfterSave,
    MaterialReady,
    RoomDrawn,
}

/// Borrowed payload delivered with a checkpoint. Fields are filled as far
/// as the pipeline has progressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notice<'a> {
    pub host: Option<&'a str>,
    pub shard: Option<&'a str>,
    pub map_size: Option<MapSize>,
    pub room: Option<&'a str>,
    pub stats: Option<&'a MapStats>,
    pub save_path: Option<&'a str>,
}

type Handler = Box<dyn Fn(&Notice<'_>) + Send + Sync>;

/// Per-checkpoint subscriber registry.
#[derive(Default)]
pub struct Emitter {
    handlers: HashMap<Checkpoint, Vec<Handler>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for one checkpoint.
    pub fn on<F>(&mut self, checkpoint: Checkpoint, handler: F)
    where
        F: Fn(&Notice<'_>) + Send + Sync + 'static,
    {
        self.handlers.entry(checkpoint).or_default().push(Box::new(handler));
    }

    /// Delivers `notice` to every subscriber of `checkpoint`.
    pub fn emit(&self, checkpoint: Checkpoint, notice: &Notice<'_>) {
        if let Some(handlers) = self.handlers.get(&checkpoint) {
            for handler in handlers {
                handler(notice);
            }
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(checkpoint, handlers)| (checkpoint, handlers.len()))
            .collect();
        f.debug_struct("Emitter").field("handlers", &counts).finish()
    }
}
