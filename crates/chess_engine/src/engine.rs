//! The contract every move-selection strategy implements, and the registry
//! the adapter looks them up in.

use std::collections::HashMap;

use chess_core::{Board, Color, ContextToken, Move};

use crate::scheduler::CancelHandle;

const MIN_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 8;
const ELO_DEPTH_2: u32 = 1200;
const ELO_DEPTH_3: u32 = 1800;

/// Requested playing strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Difficulty level; level `n` searches `n` plies.
    Level(u8),
    /// Approximate rating, mapped onto depths 1 to 3.
    Elo(u32),
}

impl Strength {
    pub fn depth(self) -> u8 {
        match self {
            Strength::Level(level) => level.clamp(MIN_LEVEL, MAX_LEVEL),
            Strength::Elo(elo) if elo < ELO_DEPTH_2 => 1,
            Strength::Elo(elo) if elo < ELO_DEPTH_3 => 2,
            Strength::Elo(_) => 3,
        }
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength::Level(2)
    }
}

/// Everything an engine gets to decide on a move.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// A private copy of the position; engines may mutate it freely.
    pub board: Board,
    pub color: Color,
    pub strength: Strength,
    /// Search depth after the adapter applied its cap.
    pub depth: u8,
    pub context: ContextToken,
    pub cancel: CancelHandle,
}

/// An engine's answer. Nothing here is trusted: the adapter re-validates
/// every proposal against the position before it is played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    Move(Move),
    /// Coordinate notation such as `e7e8q`, as external engines speak it.
    Notation(String),
    NoMove,
    /// The engine stopped because the request was cancelled or went stale.
    Abandoned,
    Failed(String),
}

pub type ReplyFn = Box<dyn FnOnce(EngineReply)>;

/// A move-selection strategy. Implementations answer asynchronously by
/// calling `reply` exactly once, normally from a host timer callback.
pub trait MoveEngine {
    fn id(&self) -> &str;

    fn request_move(&mut self, request: EngineRequest, reply: ReplyFn);
}

/// Engines by identifier.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Box<dyn MoveEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `engine` under its id, returning any engine it replaced.
    pub fn register(&mut self, engine: Box<dyn MoveEngine>) -> Option<Box<dyn MoveEngine>> {
        self.engines.insert(engine.id().to_string(), engine)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn MoveEngine + 'static)> {
        self.engines.get_mut(id).map(|engine| engine.as_mut())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.engines.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
