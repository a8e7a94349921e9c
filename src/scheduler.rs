//! Virtual-time timers.
//!
//! Every delay in the page (search debounce, staggered reveals, the simulated
//! subscribe round-trip, tooltip fade) is a task queued on a [`Scheduler`]
//! instead of a real `setTimeout`. Time only moves when the owner calls
//! [`Scheduler::pop_due`] / [`Scheduler::settle`], so tests can step through
//! a debounce window millisecond by millisecond.
//!
//! Components are written against the [`Timers`] trait with their own task
//! type. The site keeps a single scheduler of its own task enum and hands each
//! component a [`Scoped`] view that wraps the component's tasks on the way in:
//!
//! ```text
//! search box  ── Timers<SearchTask> ──┐
//! lang filter ── Timers<LanguageTask> ┼─ Scoped ─► Scheduler<Task>
//! fruit tree  ── Timers<FruitTask> ───┘
//! ```

use std::collections::{BTreeMap, HashMap};

/// Handle returned by [`Timers::set_timeout`], used to cancel the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Something that can queue delayed tasks of type `T`.
pub trait Timers<T> {
    /// Current virtual time in milliseconds.
    fn now(&self) -> u64;

    /// Run `task` once `delay_ms` have elapsed.
    fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerHandle;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn clear_timeout(&mut self, handle: TimerHandle) -> bool;
}

/// Deterministic timer queue. Tasks due at the same instant run in the order
/// they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), T>,
    /// seq → due time, for cancellation.
    pending: HashMap<u64, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Number of timers still waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return the earliest task due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: u64) -> Option<T> {
        let (&(due, seq), _) = self.queue.iter().next()?;
        if due > until {
            return None;
        }
        self.pending.remove(&seq);
        self.now = self.now.max(due);
        self.queue.remove(&(due, seq))
    }

    /// Move the clock forward to `until` once all due tasks have run.
    pub fn settle(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    /// Pop every task due within the next `ms`, in firing order, and settle.
    ///
    /// Tasks scheduled by the caller while handling the returned batch are not
    /// included; use [`pop_due`](Self::pop_due) in a loop when handlers can
    /// schedule follow-ups.
    pub fn advance(&mut self, ms: u64) -> Vec<T> {
        let until = self.now + ms;
        let mut fired = Vec::new();
        while let Some(task) = self.pop_due(until) {
            fired.push(task);
        }
        self.settle(until);
        fired
    }

    /// View this scheduler as a `Timers<U>` that wraps each task with `wrap`.
    pub fn scoped<U, F>(&mut self, wrap: F) -> Scoped<'_, T, F>
    where
        F: Fn(U) -> T,
    {
        Scoped { inner: self, wrap }
    }
}

impl<T> Timers<T> for Scheduler<T> {
    fn now(&self) -> u64 {
        self.now
    }

    fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.now + delay_ms;
        self.queue.insert((due, seq), task);
        self.pending.insert(seq, due);
        TimerHandle(seq)
    }

    fn clear_timeout(&mut self, handle: TimerHandle) -> bool {
        match self.pending.remove(&handle.0) {
            Some(due) => self.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }
}

/// A [`Scheduler`] borrowed for one component's task type.
pub struct Scoped<'a, T, F> {
    inner: &'a mut Scheduler<T>,
    wrap: F,
}

impl<T, U, F> Timers<U> for Scoped<'_, T, F>
where
    F: Fn(U) -> T,
{
    fn now(&self) -> u64 {
        self.inner.now
    }

    fn set_timeout(&mut self, delay_ms: u64, task: U) -> TimerHandle {
        let wrapped = (self.wrap)(task);
        self.inner.set_timeout(delay_ms, wrapped)
    }

    fn clear_timeout(&mut self, handle: TimerHandle) -> bool {
        self.inner.clear_timeout(handle)
    }
}
