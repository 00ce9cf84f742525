/*!
Logical clocks and a timer queue keyed by them.

The controller and the replay engine never read wall time directly; they are
handed a [`Clock`] so that headless runs and tests can drive time explicitly.
Times are `f64` seconds since an arbitrary origin.
*/

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait Clock {
    fn now(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Monotonic wall clock measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Externally advanced clock. Clones share the same time source.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(t: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(t)),
        }
    }

    pub fn set(&self, t: f64) {
        self.now.set(t);
    }

    pub fn advance(&self, dt: f64) {
        self.now.set(self.now.get() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due: f64,
    payload: T,
}

/// Pending one-shot timers, fired in due-time order by [`TimerQueue::drain_due`].
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer { id, due, payload });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx).payload)
    }

    /// Removes and returns every timer due at or before `now`, earliest first.
    /// Timers due at the same instant fire in scheduling order.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.due <= now);
        self.timers = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|t| t.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let view = clock.clone();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(view.now(), 0.75);
        view.set(2.0);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn timers_fire_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(2.0, "late");
        q.schedule(1.0, "early");
        q.schedule(1.0, "early-second");
        q.schedule(5.0, "pending");

        assert!(q.drain_due(0.5).is_empty());
        assert_eq!(q.drain_due(2.0), vec!["early", "early-second", "late"]);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let id = q.schedule(1.0, 7);
        assert_eq!(q.cancel(id), Some(7));
        assert_eq!(q.cancel(id), None);
        assert!(q.drain_due(10.0).is_empty());
    }
}
