use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chess_core::{fen::STARTING_FEN, Color, Game};
use chess_engine::{
    AdapterConfig, EngineAdapter, EngineError, Host, MoveOutcome, RandomEngine, Strength, VirtualHost,
};
use log::{error, info};
use structopt::StructOpt;

/// Headless self-play between two registered engines
#[derive(StructOpt, Debug)]
#[structopt(name = "coop-chess")]
struct Opt {
    /// Engine playing White ("minimax" or "random")
    #[structopt(short = "w", long = "white", default_value = "minimax")]
    white: String,
    /// Engine playing Black
    #[structopt(short = "b", long = "black", default_value = "random")]
    black: String,
    /// Difficulty level, searched as that many plies
    #[structopt(short = "l", long = "level", default_value = "2")]
    level: u8,
    /// Approximate rating; overrides --level
    #[structopt(long = "elo")]
    elo: Option<u32>,
    /// Stop after this many plies
    #[structopt(long = "max-plies", default_value = "200")]
    max_plies: usize,
    /// Seed for the random engine
    #[structopt(long = "seed", default_value = "1")]
    seed: u64,
    /// Simulated host frame rate
    #[structopt(long = "fps", default_value = "60")]
    fps: f32,
    /// Engine timeout in seconds (at least 1)
    #[structopt(long = "timeout", default_value = "30")]
    timeout: u64,
    /// Starting position, the standard one if omitted
    #[structopt(long = "fen")]
    fen: Option<String>,
}

fn main() {
    pretty_env_logger::init();
    let opt = Opt::from_args();

    let game = match Game::from_fen(opt.fen.as_deref().unwrap_or(STARTING_FEN)) {
        Ok(game) => Rc::new(RefCell::new(game)),
        Err(err) => {
            error!("{}", err);
            std::process::exit(2);
        }
    };

    let host = Rc::new(VirtualHost::new(opt.fps));
    let config = AdapterConfig {
        timeout: Duration::from_secs(opt.timeout.max(1)),
        ..AdapterConfig::default()
    };
    let mut adapter = EngineAdapter::new(host.clone(), config);
    adapter.register(Box::new(RandomEngine::new(host.clone(), opt.seed)));

    let strength = match opt.elo {
        Some(elo) => Strength::Elo(elo),
        None => Strength::Level(opt.level),
    };
    info!(
        "{} (white) vs {} (black), search depth {}",
        opt.white,
        opt.black,
        adapter.depth_for(strength)
    );

    let mut plies = 0;
    while plies < opt.max_plies && !game.borrow().status().is_over() {
        let color = game.borrow().board().side_to_move();
        let engine = match color {
            Color::White => &opt.white,
            Color::Black => &opt.black,
        };

        let slot: Rc<RefCell<Option<Result<MoveOutcome, EngineError>>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&slot);
        adapter.request_move_with(engine, &game, color, strength, move |result| {
            *sink.borrow_mut() = Some(result)
        });
        loop {
            let answered = slot.borrow().is_some();
            if answered || !host.run_next() {
                break;
            }
        }

        let result = slot.borrow_mut().take();
        match result {
            Some(Ok(outcome)) => {
                plies += 1;
                info!("{}. {} {} ({})", plies, color, outcome.mv, outcome.engine);
            }
            Some(Err(err)) => {
                error!("{} could not move: {}", engine, err);
                std::process::exit(1);
            }
            None => {
                error!("{} never answered", engine);
                std::process::exit(1);
            }
        }
    }

    let game = game.borrow();
    info!("final position {}", game.board().to_fen());
    info!("{} after {} plies ({:?} simulated)", game.status(), plies, host.now());
    println!("{}", game.status());
}
