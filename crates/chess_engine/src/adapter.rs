//! One asynchronous entry point over every registered engine.
//!
//! Whatever an engine answers, the move is replayed through
//! [`Game::apply_move`] before it counts, and `on_complete` hears about the
//! request exactly once: with the applied move, or with the reason it failed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chess_core::{ChessError, Color, Game, GameStatus, Move};
use log::{info, warn};

use crate::ai::{MinimaxEngine, MINIMAX_ENGINE_ID};
use crate::engine::{EngineRegistry, EngineReply, EngineRequest, MoveEngine, Strength};
use crate::error::EngineError;
use crate::host::{Host, TimerId};
use crate::scheduler::{CancelHandle, SchedulerConfig};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_DEPTH: u8 = 4;

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// How long an engine may take before the request fails.
    pub timeout: Duration,
    /// Upper bound on the search depth any strength maps to.
    pub max_depth: u8,
    /// Used by the built-in engine.
    pub scheduler: SchedulerConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_depth: DEFAULT_MAX_DEPTH,
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// A move that passed validation and is now part of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub engine: String,
    pub mv: Move,
    pub status: GameStatus,
}

pub type CompletionFn = Box<dyn FnOnce(Result<MoveOutcome, EngineError>)>;

type Completion = Rc<RefCell<Option<CompletionFn>>>;

/// Fires the completion if nobody has yet. Returns whether this call did.
fn complete(slot: &Completion, result: Result<MoveOutcome, EngineError>) -> bool {
    // Release the borrow before calling out; the callback may start a new request.
    let callback = slot.borrow_mut().take();
    match callback {
        Some(callback) => {
            callback(result);
            true
        }
        None => false,
    }
}

/// Lets the caller abandon an outstanding request.
pub struct RequestHandle {
    cancel: CancelHandle,
    completion: Completion,
}

impl RequestHandle {
    /// Stops the engine at its next checkpoint and reports
    /// [`EngineError::Cancelled`] if the request had not finished yet.
    pub fn cancel(&self) {
        self.cancel.cancel();
        complete(&self.completion, Err(EngineError::Cancelled));
    }

    pub fn is_pending(&self) -> bool {
        self.completion.borrow().is_some()
    }
}

pub struct EngineAdapter {
    registry: EngineRegistry,
    host: Rc<dyn Host>,
    config: AdapterConfig,
    selected: String,
}

impl EngineAdapter {
    /// An adapter with the built-in search engine registered and selected.
    pub fn new(host: Rc<dyn Host>, config: AdapterConfig) -> Self {
        let mut registry = EngineRegistry::new();
        registry.register(Box::new(MinimaxEngine::with_config(
            Rc::clone(&host),
            config.scheduler.clone(),
        )));
        Self {
            registry,
            host,
            config,
            selected: MINIMAX_ENGINE_ID.to_string(),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn register(&mut self, engine: Box<dyn MoveEngine>) {
        info!("registered engine {}", engine.id());
        self.registry.register(engine);
    }

    pub fn select_engine(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.registry.contains(id) {
            return Err(EngineError::UnknownEngine(id.to_string()));
        }
        self.selected = id.to_string();
        Ok(())
    }

    pub fn selected_engine(&self) -> &str {
        &self.selected
    }

    pub fn depth_for(&self, strength: Strength) -> u8 {
        strength.depth().min(self.config.max_depth).max(1)
    }

    /// Asks the selected engine to play `color`'s move in `game`.
    pub fn request_move<F>(
        &mut self,
        game: &Rc<RefCell<Game>>,
        color: Color,
        strength: Strength,
        on_complete: F,
    ) -> RequestHandle
    where
        F: FnOnce(Result<MoveOutcome, EngineError>) + 'static,
    {
        let id = self.selected.clone();
        self.request_move_with(&id, game, color, strength, on_complete)
    }

    /// Like [`request_move`](Self::request_move) with an explicit engine.
    ///
    /// Requests that cannot start (unknown engine, finished game, wrong
    /// side) complete before this returns. Everything else completes from a
    /// host callback, so `game` is only borrowed immutably during this call.
    pub fn request_move_with<F>(
        &mut self,
        engine_id: &str,
        game: &Rc<RefCell<Game>>,
        color: Color,
        strength: Strength,
        on_complete: F,
    ) -> RequestHandle
    where
        F: FnOnce(Result<MoveOutcome, EngineError>) + 'static,
    {
        let watchdog: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let disarm = {
            let host = Rc::clone(&self.host);
            let watchdog = Rc::clone(&watchdog);
            move |result: Result<MoveOutcome, EngineError>| {
                if let Some(timer) = watchdog.take() {
                    host.cancel(timer);
                }
                on_complete(result);
            }
        };
        let completion: Completion = Rc::new(RefCell::new(Some(Box::new(disarm) as CompletionFn)));
        let handle = RequestHandle {
            cancel: CancelHandle::new(),
            completion: Rc::clone(&completion),
        };

        let request = match self.prepare(engine_id, game, color, strength, &handle.cancel) {
            Ok(request) => request,
            Err(err) => {
                warn!("move request to {} rejected: {}", engine_id, err);
                complete(&completion, Err(err));
                return handle;
            }
        };

        let after = self.config.timeout;
        let timer = {
            let slot = Rc::clone(&completion);
            let cancel = handle.cancel.clone();
            let engine = engine_id.to_string();
            self.host.schedule(
                after,
                Box::new(move || {
                    if slot.borrow().is_some() {
                        warn!("engine {} timed out after {:?}", engine, after);
                        cancel.cancel();
                        complete(&slot, Err(EngineError::Timeout { engine, after }));
                    }
                }),
            )
        };
        watchdog.set(Some(timer));

        let host = Rc::clone(&self.host);
        let engine = engine_id.to_string();
        let game = Rc::clone(game);
        let context = request.context.clone();
        let cancel = handle.cancel.clone();
        let slot = Rc::clone(&completion);
        let reply = Box::new(move |reply: EngineReply| {
            // Engines may answer from inside `request_move`; the game is only
            // touched once control is back with the host.
            host.schedule(
                Duration::ZERO,
                Box::new(move || {
                    if slot.borrow().is_none() {
                        warn!("dropping late reply from {}: {:?}", engine, reply);
                        return;
                    }
                    let result = if !context.is_current() {
                        warn!("discarding stale reply from {}", engine);
                        Err(EngineError::StaleResult)
                    } else if cancel.is_cancelled() {
                        Err(EngineError::Cancelled)
                    } else {
                        resolve(&engine, &game, reply)
                    };
                    complete(&slot, result);
                }),
            );
        });

        match self.registry.get_mut(engine_id) {
            Some(engine) => engine.request_move(request, reply),
            None => {
                complete(&completion, Err(EngineError::UnknownEngine(engine_id.to_string())));
            }
        }
        handle
    }

    fn prepare(
        &self,
        engine_id: &str,
        game: &Rc<RefCell<Game>>,
        color: Color,
        strength: Strength,
        cancel: &CancelHandle,
    ) -> Result<EngineRequest, EngineError> {
        if !self.registry.contains(engine_id) {
            return Err(EngineError::UnknownEngine(engine_id.to_string()));
        }
        let game = game.borrow();
        let status = game.status();
        if status.is_over() {
            return Err(EngineError::GameOver(status));
        }
        let to_move = game.board().side_to_move();
        if color != to_move {
            return Err(EngineError::WrongSide { requested: color, to_move });
        }
        Ok(EngineRequest {
            board: game.board().clone(),
            color,
            strength,
            depth: self.depth_for(strength),
            context: game.context_token(),
            cancel: cancel.clone(),
        })
    }
}

/// Turns an engine reply into a played move, or the reason it was refused.
fn resolve(engine: &str, game: &Rc<RefCell<Game>>, reply: EngineReply) -> Result<MoveOutcome, EngineError> {
    let illegal = |mv: String| {
        warn!("engine {} proposed illegal move {}", engine, mv);
        EngineError::IllegalEngineMove {
            engine: engine.to_string(),
            mv,
        }
    };

    let mv = match reply {
        EngineReply::Move(mv) => mv,
        EngineReply::Notation(text) => text.trim().parse::<Move>().map_err(|_| illegal(text))?,
        EngineReply::NoMove => {
            return Err(EngineError::NoMove {
                engine: engine.to_string(),
            })
        }
        EngineReply::Failed(reason) => {
            return Err(EngineError::Failed {
                engine: engine.to_string(),
                reason,
            })
        }
        EngineReply::Abandoned => return Err(EngineError::Cancelled),
    };

    let mut game = game.borrow_mut();
    let status = game.apply_move(mv).map_err(|err| match err {
        ChessError::IllegalMove(_) => illegal(mv.to_string()),
        other => EngineError::from(other),
    })?;
    // The game records the fully resolved move, promotion piece included.
    let played = game.board().last_move().unwrap_or(mv);
    Ok(MoveOutcome {
        engine: engine.to_string(),
        mv: played,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VirtualHost;
    use crate::engine::ReplyFn;

    struct Scripted(EngineReply);

    impl MoveEngine for Scripted {
        fn id(&self) -> &str {
            "scripted"
        }

        fn request_move(&mut self, _request: EngineRequest, reply: ReplyFn) {
            reply(self.0.clone());
        }
    }

    fn run(reply: EngineReply, fen: &str) -> (Rc<RefCell<Game>>, Result<MoveOutcome, EngineError>) {
        let host = Rc::new(VirtualHost::default());
        let mut adapter = EngineAdapter::new(host.clone(), AdapterConfig::default());
        adapter.register(Box::new(Scripted(reply)));
        let game = Rc::new(RefCell::new(Game::from_fen(fen).unwrap()));
        let color = game.borrow().board().side_to_move();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        adapter.request_move_with("scripted", &game, color, Strength::default(), move |r| {
            *sink.borrow_mut() = Some(r)
        });
        host.run_until_idle();
        let result = seen.borrow_mut().take().unwrap();
        (game, result)
    }

    const START: &str = chess_core::fen::STARTING_FEN;

    #[test]
    fn notation_reply_is_applied() {
        let (game, result) = run(EngineReply::Notation("e2e4".into()), START);
        let outcome = result.unwrap();
        assert_eq!(outcome.mv.to_uci(), "e2e4");
        assert_eq!(outcome.status, GameStatus::Active);
        assert_eq!(game.borrow().board().side_to_move(), Color::Black);
    }

    #[test]
    fn promotion_defaults_to_queen_in_outcome() {
        let (_, result) = run(EngineReply::Notation("a7a8".into()), "7k/P7/8/8/8/8/8/K7 w - - 0 1");
        assert_eq!(result.unwrap().mv.to_uci(), "a7a8q");
    }

    #[test]
    fn garbage_notation_is_an_illegal_engine_move() {
        let (game, result) = run(EngineReply::Notation("zz99".into()), START);
        assert!(matches!(result, Err(EngineError::IllegalEngineMove { .. })));
        assert_eq!(game.borrow().board().to_fen(), START);
    }

    #[test]
    fn failure_is_reported() {
        let (_, result) = run(EngineReply::Failed("crashed".into()), START);
        assert_eq!(
            result,
            Err(EngineError::Failed {
                engine: "scripted".into(),
                reason: "crashed".into()
            })
        );
    }

    #[test]
    fn finished_request_withdraws_its_watchdog() {
        let host = Rc::new(VirtualHost::default());
        let mut adapter = EngineAdapter::new(host.clone(), AdapterConfig::default());
        adapter.register(Box::new(Scripted(EngineReply::Notation("e2e4".into()))));
        let game = Rc::new(RefCell::new(Game::new()));
        let handle = adapter.request_move_with("scripted", &game, Color::White, Strength::default(), |r| {
            assert!(r.is_ok())
        });
        assert_eq!(host.pending(), 2);
        host.run_next();
        assert!(!handle.is_pending());
        assert_eq!(host.pending(), 0);
        assert!(host.now() < DEFAULT_TIMEOUT);
    }

    #[test]
    fn depth_is_capped() {
        let host = Rc::new(VirtualHost::default());
        let adapter = EngineAdapter::new(
            host,
            AdapterConfig {
                max_depth: 2,
                ..AdapterConfig::default()
            },
        );
        assert_eq!(adapter.depth_for(Strength::Level(6)), 2);
        assert_eq!(adapter.depth_for(Strength::Elo(900)), 1);
    }

    #[test]
    fn selecting_unknown_engine_fails() {
        let host = Rc::new(VirtualHost::default());
        let mut adapter = EngineAdapter::new(host, AdapterConfig::default());
        assert_eq!(
            adapter.select_engine("stockfish"),
            Err(EngineError::UnknownEngine("stockfish".into()))
        );
        assert_eq!(adapter.selected_engine(), MINIMAX_ENGINE_ID);
    }
}
