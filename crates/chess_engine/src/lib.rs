pub mod adapter;
pub mod ai;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod host;
pub mod perft;
pub mod random;
pub mod scheduler;
pub mod search;

pub use adapter::{AdapterConfig, EngineAdapter, MoveOutcome, RequestHandle};
pub use ai::{MinimaxEngine, MINIMAX_ENGINE_ID};
pub use engine::{EngineRegistry, EngineReply, EngineRequest, MoveEngine, ReplyFn, Strength};
pub use error::EngineError;
pub use evaluation::evaluate_position;
pub use host::{Host, TimerId, VirtualHost};
pub use perft::{perft, perft_divide, perft_parallel};
pub use random::{RandomEngine, RANDOM_ENGINE_ID};
pub use scheduler::{spawn, AdaptiveDelay, CancelHandle, Interrupted, SchedulerConfig, Steppable, SteppedSearch};
pub use search::{select_move, select_move_unpruned, SearchResult, SearchTask, Step, MATE_SCORE};
