//! Cooperative, single-threaded task scheduling.
//!
//! The engine never blocks: coalesced scene updates run on the next tick,
//! camera animations step on animation frames and long-touch detection uses
//! cancellable timers. The host drives the queue from its event loop.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Handle returned by [`TaskQueue::schedule`].
pub type TimerId = u64;

type Task = Box<dyn FnOnce()>;

/// Upper bound on tick rounds in [`TaskQueue::run_until_idle`].
const MAX_IDLE_ROUNDS: usize = 1000;

struct Timer {
    id: TimerId,
    deadline: Duration,
    task: Task,
}

struct QueueState {
    now: Duration,
    ticks: VecDeque<Task>,
    frames: Vec<Task>,
    timers: Vec<Timer>,
    next_timer_id: TimerId,
    wall_clock_origin: Instant,
}

/// Shared handle over the task queue. Clones refer to the same queue.
///
/// Time is a virtual clock starting at zero. Hosts either advance it
/// explicitly or align it with the wall clock once per frame.
#[derive(Clone)]
pub struct TaskQueue {
    state: Rc<RefCell<QueueState>>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                now: Duration::ZERO,
                ticks: VecDeque::new(),
                frames: Vec::new(),
                timers: Vec::new(),
                next_timer_id: 0,
                wall_clock_origin: Instant::now(),
            })),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Posts a task for the next tick.
    pub fn invoke_later(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().ticks.push_back(Box::new(task));
    }

    /// Posts a task for the next animation frame.
    pub fn request_animation_frame(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().frames.push(Box::new(task));
    }

    /// Runs `task` once the clock reached `now() + delay`.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_timer_id;
        state.next_timer_id += 1;
        let deadline = state.now + delay;
        state.timers.push(Timer {
            id,
            deadline,
            task: Box::new(task),
        });
        id
    }

    /// Returns `false` if the timer already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.timers.len();
        state.timers.retain(|timer| timer.id != id);
        state.timers.len() != before
    }

    pub fn pending_ticks(&self) -> usize {
        self.state.borrow().ticks.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Runs the tasks posted before this call, in posting order.
    ///
    /// Tasks posted while running wait for the next call. Returns the number
    /// of tasks run.
    pub fn run_pending(&self) -> usize {
        let tasks = std::mem::take(&mut self.state.borrow_mut().ticks);
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    /// Runs the animation frame callbacks requested before this call.
    pub fn run_frame(&self) -> usize {
        let tasks = std::mem::take(&mut self.state.borrow_mut().frames);
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    /// Moves the clock forward, running due timers at their deadline.
    pub fn advance(&self, delta: Duration) {
        let target = self.now() + delta;
        self.run_timers_until(target);
    }

    /// Aligns the virtual clock with the time elapsed since the queue was created.
    pub fn sync_to_wall_clock(&self) {
        let elapsed = self.state.borrow().wall_clock_origin.elapsed();
        if elapsed > self.now() {
            self.run_timers_until(elapsed);
        }
    }

    fn run_timers_until(&self, target: Duration) {
        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.deadline <= target)
                    .min_by_key(|(_, timer)| (timer.deadline, timer.id))
                    .map(|(index, _)| index);
                next.map(|index| {
                    let timer = state.timers.remove(index);
                    state.now = state.now.max(timer.deadline);
                    timer
                })
            };
            match due {
                Some(timer) => (timer.task)(),
                None => break,
            }
        }
        let mut state = self.state.borrow_mut();
        state.now = state.now.max(target);
    }

    /// Runs ticks until none is left. Frames and timers are left alone.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_IDLE_ROUNDS {
            let ran = self.run_pending();
            if ran == 0 {
                return total;
            }
            total += ran;
        }
        log::warn!("Task queue still busy after {} rounds", MAX_IDLE_ROUNDS);
        total
    }

    /// Runs animation frames until no more are requested, advancing the clock
    /// by `frame_time` before each one.
    pub fn run_frames_until_idle(&self, frame_time: Duration) -> usize {
        let mut total = 0;
        for _ in 0..MAX_IDLE_ROUNDS {
            if self.pending_frames() == 0 {
                return total;
            }
            self.advance(frame_time);
            total += self.run_frame();
        }
        log::warn!("Animation still running after {} frames", MAX_IDLE_ROUNDS);
        total
    }
}
