//! Latest-value fan-out.
//!
//! Every subscriber owns a single slot. Publishing overwrites the slot content, so a consumer that falls
//! behind only ever sees the most recent value and can never hold the publisher back longer than the copy
//! into its slot.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct SlotState<T> {
    value: Option<T>,
    seq: u64,
    closed: bool,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn new(closed: bool) -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                seq: 0,
                closed,
            }),
            ready: Condvar::new(),
        }
    }

    fn put(&self, value: T) {
        let mut state = self.state.lock();
        state.value = Some(value);
        state.seq += 1;
        drop(state);
        self.ready.notify_all();
    }

    fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }
}

fn take_newer<T: Clone>(last_seen: &mut u64, state: &SlotState<T>) -> Option<T> {
    if state.seq > *last_seen {
        *last_seen = state.seq;
        state.value.clone()
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
}

/// Publishing side, shared between the analysis worker and whoever registers subscribers.
pub struct SignalFanout<T> {
    slots: Mutex<Vec<Arc<Slot<T>>>>,
    closed: AtomicBool,
    published: AtomicU64,
}

impl<T: Clone + Send> SignalFanout<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            published: AtomicU64::new(0),
        }
    }

    /// Registers a new subscriber. It only sees values published after this call.
    pub fn subscribe(&self) -> SignalReceiver<T> {
        let mut slots = self.slots.lock();
        let slot = Arc::new(Slot::new(self.closed.load(Ordering::Acquire)));
        slots.push(Arc::clone(&slot));
        SignalReceiver { slot, last_seen: 0 }
    }

    /// Hands a copy of `value` to every live subscriber.
    pub fn publish(&self, value: T) {
        let mut slots = self.slots.lock();
        // a slot only referenced from here lost its receiver
        slots.retain(|slot| Arc::strong_count(slot) > 1);
        for slot in slots.iter() {
            slot.put(value.clone());
        }
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Wakes up every receiver; they drain what is left and then report the end of the stream.
    pub fn close(&self) {
        let slots = self.slots.lock();
        self.closed.store(true, Ordering::Release);
        for slot in slots.iter() {
            slot.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots
            .lock()
            .iter()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }

    /// Number of publish calls so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl<T: Clone + Send> Default for SignalFanout<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consuming side of one subscription.
pub struct SignalReceiver<T> {
    slot: Arc<Slot<T>>,
    last_seen: u64,
}

impl<T: Clone> SignalReceiver<T> {
    /// Newest value not seen yet, without blocking.
    pub fn latest(&mut self) -> Option<T> {
        let state = self.slot.state.lock();
        take_newer(&mut self.last_seen, &state)
    }

    /// Blocks until a new value is published. Returns None once the fan-out is closed and drained.
    pub fn recv(&mut self) -> Option<T> {
        let mut state = self.slot.state.lock();
        loop {
            if let Some(value) = take_newer(&mut self.last_seen, &state) {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            self.slot.ready.wait(&mut state);
        }
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        loop {
            if let Some(value) = take_newer(&mut self.last_seen, &state) {
                return Ok(value);
            }
            if state.closed {
                return Err(RecvTimeoutError::Closed);
            }
            if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                return take_newer(&mut self.last_seen, &state).ok_or(RecvTimeoutError::Timeout);
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.slot.state.lock().closed
    }
}
