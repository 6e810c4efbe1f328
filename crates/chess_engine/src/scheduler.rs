//! Slices long computations into steps run from host timer callbacks.
//!
//! A job alternates between running one step and handing control back to the
//! host, which calls it again after a delay that grows while the host is
//! below its target frame rate. Cancellation and staleness are checked before
//! every step and once more before the result is delivered.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chess_core::ContextToken;
use log::{debug, trace};

use crate::host::Host;
use crate::search::{SearchResult, SearchTask, Step};

const DEFAULT_TARGET_FPS: f32 = 60.0;
const DEFAULT_HYSTERESIS_FPS: f32 = 5.0;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1);
const DEFAULT_DELAY_PER_FPS: Duration = Duration::from_millis(2);
const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MOVES_PER_STEP: usize = 1;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Frame rate the host wants to hold.
    pub target_fps: f32,
    /// How far below target the host must fall before throttling kicks in.
    /// Throttling ends once the target is reached again.
    pub hysteresis_fps: f32,
    /// Delay between steps while the host keeps up.
    pub base_delay: Duration,
    /// Extra delay per frame-per-second of deficit while throttled.
    pub delay_per_fps: Duration,
    pub max_delay: Duration,
    /// Root moves searched per step.
    pub moves_per_step: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            hysteresis_fps: DEFAULT_HYSTERESIS_FPS,
            base_delay: DEFAULT_BASE_DELAY,
            delay_per_fps: DEFAULT_DELAY_PER_FPS,
            max_delay: DEFAULT_MAX_DELAY,
            moves_per_step: DEFAULT_MOVES_PER_STEP,
        }
    }
}

/// Load-driven delay between steps.
#[derive(Debug, Clone)]
pub struct AdaptiveDelay {
    config: SchedulerConfig,
    throttled: bool,
}

impl AdaptiveDelay {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config, throttled: false }
    }

    pub fn is_throttled(&self) -> bool {
        self.throttled
    }

    pub fn next_delay(&mut self, frame_rate: f32) -> Duration {
        let target = self.config.target_fps;
        let was_throttled = self.throttled;
        if self.throttled {
            self.throttled = frame_rate < target;
        } else {
            self.throttled = frame_rate < target - self.config.hysteresis_fps;
        }
        if self.throttled != was_throttled {
            debug!(
                "host at {:.1} fps (target {:.1}), throttling {}",
                frame_rate,
                target,
                if self.throttled { "on" } else { "off" }
            );
        }

        if !self.throttled {
            return self.config.base_delay;
        }
        let deficit = (target - frame_rate).max(0.0);
        let extra = Duration::from_nanos((self.config.delay_per_fps.as_nanos() as f64 * deficit as f64) as u64);
        (self.config.base_delay + extra).min(self.config.max_delay)
    }
}

/// Shared cancel flag for one job.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Why a job ended without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    Stale,
}

/// A unit of work that can be advanced one bounded step at a time.
pub trait Steppable {
    type Output;

    fn step(&mut self) -> Step;

    /// Called once, after `step` has returned `Step::Done`.
    fn output(&mut self) -> Self::Output;
}

/// A search advancing a fixed number of root moves per step.
pub struct SteppedSearch {
    pub task: SearchTask,
    pub moves_per_step: usize,
}

impl Steppable for SteppedSearch {
    type Output = Option<SearchResult>;

    fn step(&mut self) -> Step {
        self.task.step(self.moves_per_step)
    }

    fn output(&mut self) -> Self::Output {
        self.task.result()
    }
}

type DoneFn<T> = Box<dyn FnOnce(Result<T, Interrupted>)>;

struct Job<S: Steppable> {
    work: S,
    delay: AdaptiveDelay,
    context: Option<ContextToken>,
    cancel: CancelHandle,
    done: Option<DoneFn<S::Output>>,
    steps: u64,
}

impl<S: Steppable> Job<S> {
    fn interruption(&self) -> Option<Interrupted> {
        if self.cancel.is_cancelled() {
            Some(Interrupted::Cancelled)
        } else if self.context.as_ref().map_or(false, |c| !c.is_current()) {
            Some(Interrupted::Stale)
        } else {
            None
        }
    }
}

/// Starts `work` on `host`. The first step runs from a timer, never inside
/// this call, and `done` is invoked exactly once.
pub fn spawn<S, F>(
    host: Rc<dyn Host>,
    config: SchedulerConfig,
    work: S,
    context: Option<ContextToken>,
    cancel: CancelHandle,
    done: F,
) where
    S: Steppable + 'static,
    F: FnOnce(Result<S::Output, Interrupted>) + 'static,
{
    let job = Rc::new(RefCell::new(Job {
        work,
        delay: AdaptiveDelay::new(config),
        context,
        cancel,
        done: Some(Box::new(done) as DoneFn<S::Output>),
        steps: 0,
    }));
    let next_host = Rc::clone(&host);
    host.schedule(Duration::ZERO, Box::new(move || run_step(job, next_host)));
}

fn run_step<S: Steppable + 'static>(job: Rc<RefCell<Job<S>>>, host: Rc<dyn Host>) {
    let delivery = {
        let mut j = job.borrow_mut();
        if let Some(reason) = j.interruption() {
            debug!("job interrupted after {} steps: {:?}", j.steps, reason);
            j.done.take().map(|done| (done, Err(reason)))
        } else {
            j.steps += 1;
            match j.work.step() {
                Step::Continue => {
                    let delay = j.delay.next_delay(host.frame_rate());
                    trace!("step {} done, next in {:?}", j.steps, delay);
                    drop(j);
                    let next_host = Rc::clone(&host);
                    let next_job = Rc::clone(&job);
                    host.schedule(delay, Box::new(move || run_step(next_job, next_host)));
                    return;
                }
                Step::Done => {
                    let outcome = match j.interruption() {
                        Some(reason) => Err(reason),
                        None => Ok(j.work.output()),
                    };
                    debug!("job finished after {} steps", j.steps);
                    j.done.take().map(|done| (done, outcome))
                }
            }
        }
    };

    if let Some((done, outcome)) = delivery {
        done(outcome);
    }
}
