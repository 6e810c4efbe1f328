use std::rc::Rc;

use log::debug;

use crate::engine::{EngineReply, EngineRequest, MoveEngine, ReplyFn};
use crate::host::Host;
use crate::scheduler::{self, SchedulerConfig, SteppedSearch};
use crate::search::SearchTask;

pub const MINIMAX_ENGINE_ID: &str = "minimax";

/// The built-in engine: alpha-beta search sliced into host timer steps.
pub struct MinimaxEngine {
    host: Rc<dyn Host>,
    config: SchedulerConfig,
}

impl MinimaxEngine {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    pub fn with_config(host: Rc<dyn Host>, config: SchedulerConfig) -> Self {
        Self { host, config }
    }
}

impl MoveEngine for MinimaxEngine {
    fn id(&self) -> &str {
        MINIMAX_ENGINE_ID
    }

    fn request_move(&mut self, request: EngineRequest, reply: ReplyFn) {
        let work = SteppedSearch {
            task: SearchTask::new(request.board, request.color, request.depth),
            moves_per_step: self.config.moves_per_step,
        };
        let depth = request.depth;
        scheduler::spawn(
            Rc::clone(&self.host),
            self.config.clone(),
            work,
            Some(request.context),
            request.cancel,
            move |outcome| match outcome {
                Ok(Some(result)) => {
                    debug!(
                        "minimax depth {} chose {:?} (score {}, {} nodes)",
                        depth, result.best_move, result.score, result.nodes
                    );
                    reply(result.best_move.map_or(EngineReply::NoMove, EngineReply::Move));
                }
                Ok(None) => reply(EngineReply::NoMove),
                Err(_) => reply(EngineReply::Abandoned),
            },
        );
    }
}
