//! The host side of cooperative scheduling: a timer, a clock and a load signal.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use log::trace;

pub type HostTask = Box<dyn FnOnce()>;

/// Identifies a scheduled task so it can be withdrawn before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// What the single-threaded host offers the engine.
pub trait Host {
    /// Current host time.
    fn now(&self) -> Duration;

    /// Frames per second the host is currently achieving.
    fn frame_rate(&self) -> f32;

    /// Runs `task` once, no earlier than `delay` from now.
    fn schedule(&self, delay: Duration, task: HostTask) -> TimerId;

    /// Drops a task that has not run yet. Returns whether one was removed.
    fn cancel(&self, timer: TimerId) -> bool;
}

struct Timer {
    due: Duration,
    seq: u64,
    task: HostTask,
}

/// An in-process host with a virtual clock. Timers fire in due-time order
/// (ties in scheduling order) and the clock jumps to each timer as it runs.
pub struct VirtualHost {
    now: Cell<Duration>,
    frame_rate: Cell<f32>,
    seq: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
}

impl VirtualHost {
    pub fn new(frame_rate: f32) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            frame_rate: Cell::new(frame_rate),
            seq: Cell::new(0),
            timers: RefCell::new(Vec::new()),
        }
    }

    pub fn set_frame_rate(&self, frame_rate: f32) {
        self.frame_rate.set(frame_rate);
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Fires the earliest timer. Returns `false` if none was pending.
    pub fn run_next(&self) -> bool {
        let timer = {
            let mut timers = self.timers.borrow_mut();
            let Some(index) = timers
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| (t.due, t.seq))
                .map(|(i, _)| i)
            else {
                return false;
            };
            timers.swap_remove(index)
        };
        if timer.due > self.now.get() {
            self.now.set(timer.due);
        }
        trace!("virtual host firing timer {} at {:?}", timer.seq, self.now.get());
        (timer.task)();
        true
    }

    /// Fires timers until none remain; returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while self.run_next() {
            fired += 1;
        }
        fired
    }
}

impl Default for VirtualHost {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl Host for VirtualHost {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn frame_rate(&self) -> f32 {
        self.frame_rate.get()
    }

    fn schedule(&self, delay: Duration, task: HostTask) -> TimerId {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.timers.borrow_mut().push(Timer {
            due: self.now.get() + delay,
            seq,
            task,
        });
        TimerId(seq)
    }

    fn cancel(&self, timer: TimerId) -> bool {
        let removed = {
            let mut timers = self.timers.borrow_mut();
            timers
                .iter()
                .position(|t| t.seq == timer.0)
                .map(|index| timers.swap_remove(index))
        };
        // Dropped outside the borrow: the task may own handles back into the host.
        removed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn timers_fire_in_due_order() {
        let host = Rc::new(VirtualHost::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("late", 30), ("early", 10), ("tie-a", 20), ("tie-b", 20)] {
            let log = Rc::clone(&log);
            host.schedule(Duration::from_millis(ms), Box::new(move || log.borrow_mut().push(name)));
        }
        assert_eq!(host.run_until_idle(), 4);
        assert_eq!(*log.borrow(), vec!["early", "tie-a", "tie-b", "late"]);
        assert_eq!(host.now(), Duration::from_millis(30));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let host = VirtualHost::default();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let id = host.schedule(Duration::from_millis(10), Box::new(move || flag.set(true)));
        host.schedule(Duration::from_millis(5), Box::new(|| {}));
        assert!(host.cancel(id));
        assert!(!host.cancel(id));
        assert_eq!(host.pending(), 1);
        host.run_until_idle();
        assert!(!fired.get());
        assert_eq!(host.now(), Duration::from_millis(5));
    }

    #[test]
    fn tasks_can_schedule_more_tasks() {
        let host = Rc::new(VirtualHost::default());
        let count = Rc::new(Cell::new(0));
        fn tick(host: Rc<VirtualHost>, count: Rc<Cell<u32>>) {
            count.set(count.get() + 1);
            if count.get() < 5 {
                let next = Rc::clone(&host);
                host.schedule(Duration::from_millis(5), Box::new(move || tick(next, count)));
            }
        }
        let (h, c) = (Rc::clone(&host), Rc::clone(&count));
        host.schedule(Duration::ZERO, Box::new(move || tick(h, c)));
        host.run_until_idle();
        assert_eq!(count.get(), 5);
        assert_eq!(host.now(), Duration::from_millis(20));
        assert_eq!(host.pending(), 0);
    }
}
