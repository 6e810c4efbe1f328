use std::rc::Rc;
use std::time::Duration;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::engine::{EngineReply, EngineRequest, MoveEngine, ReplyFn};
use crate::host::Host;

pub const RANDOM_ENGINE_ID: &str = "random";

/// Plays a uniformly random legal move and answers in coordinate notation,
/// the way an out-of-process engine would.
pub struct RandomEngine {
    host: Rc<dyn Host>,
    rng: StdRng,
}

impl RandomEngine {
    pub fn new(host: Rc<dyn Host>, seed: u64) -> Self {
        Self {
            host,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MoveEngine for RandomEngine {
    fn id(&self) -> &str {
        RANDOM_ENGINE_ID
    }

    fn request_move(&mut self, request: EngineRequest, reply: ReplyFn) {
        let answer = match request.board.legal_moves().choose(&mut self.rng) {
            Some(mv) => EngineReply::Notation(mv.to_uci()),
            None => EngineReply::NoMove,
        };
        self.host.schedule(Duration::ZERO, Box::new(move || reply(answer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Strength;
    use crate::host::VirtualHost;
    use crate::scheduler::CancelHandle;
    use chess_core::{Game, Move};
    use std::cell::RefCell;

    fn ask(engine: &mut RandomEngine, game: &Game) -> Rc<RefCell<Option<EngineReply>>> {
        let slot = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&slot);
        engine.request_move(
            EngineRequest {
                board: game.board().clone(),
                color: game.board().side_to_move(),
                strength: Strength::Level(1),
                depth: 1,
                context: game.context_token(),
                cancel: CancelHandle::new(),
            },
            Box::new(move |r| *sink.borrow_mut() = Some(r)),
        );
        slot
    }

    #[test]
    fn answers_with_a_legal_coordinate_move() {
        let host = Rc::new(VirtualHost::default());
        let mut engine = RandomEngine::new(host.clone(), 7);
        let game = Game::new();
        let slot = ask(&mut engine, &game);
        host.run_until_idle();
        let reply = slot.borrow_mut().take();
        let Some(EngineReply::Notation(uci)) = reply else {
            panic!("expected notation, got {:?}", reply);
        };
        let mv: Move = uci.parse().unwrap();
        assert!(game.board().legal_moves().iter().any(|m| m.same_squares(&mv)));
    }

    #[test]
    fn same_seed_same_choice() {
        let host = Rc::new(VirtualHost::default());
        let game = Game::new();
        let mut a = RandomEngine::new(host.clone(), 42);
        let mut b = RandomEngine::new(host.clone(), 42);
        let (ra, rb) = (ask(&mut a, &game), ask(&mut b, &game));
        host.run_until_idle();
        assert_eq!(*ra.borrow(), *rb.borrow());
    }
}
