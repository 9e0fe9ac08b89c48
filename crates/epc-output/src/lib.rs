//! epc-output: the burst/debounce output buffer (spec §4.4).
//!
//! Every public method is synchronous and non-blocking — a drain only ever
//! runs inside a task `tokio::spawn`ed on the caller's behalf, never on the
//! caller's own stack, matching §5's claim that the core has no suspension
//! points. Within that drain task the queued items are posted to the
//! transport one at a time, in order, so a burst comes out in the same FIFO
//! order it was enqueued in (§5). The debounce timer is the one genuine
//! time-based callback, armed via `tokio::time::sleep` in its own spawned
//! task; a monotonic generation counter makes arming a new timer implicitly
//! cancel the previous one (§4.4 "timers are single-shot").

pub mod error;

pub use error::OutputError;

use async_trait::async_trait;
use epc_core::OutputSink;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

pub const DEFAULT_WAIT_ITEMS: usize = 10;
pub const DEFAULT_WAIT_MS: u64 = 2000;

/// The non-blocking HTTP POST collaborator (spec §6 `http_post`).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post(&self, url: &str, body: &str);
}

struct Inner {
    queue: VecDeque<(String, String)>,
    enabled: bool,
    timer_generation: u64,
    draining: bool,
}

/// FIFO queue plus the enabled/disabled x idle/armed state machine of §4.4.
pub struct OutputBuffer<T: HttpTransport + 'static> {
    transport: Arc<T>,
    wait_items: usize,
    wait_ms: u64,
    inner: Mutex<Inner>,
    self_weak: Weak<Self>,
}

impl<T: HttpTransport + 'static> OutputBuffer<T> {
    /// Clamps `wait_items` up to 1 and logs, rather than rejecting outright —
    /// hosts that want a hard validation error should use [`Self::try_new`].
    pub fn new(transport: Arc<T>, wait_items: usize, wait_ms: u64) -> Arc<Self> {
        let wait_items = if wait_items == 0 {
            tracing::warn!("wait_items=0 is not valid; clamping to 1");
            1
        } else {
            wait_items
        };
        Arc::new_cyclic(|weak| Self {
            transport,
            wait_items,
            wait_ms,
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                enabled: true,
                timer_generation: 0,
                draining: false,
            }),
            self_weak: weak.clone(),
        })
    }

    /// Strict constructor for hosts that surface configuration errors up
    /// front instead of degrading silently (SPEC_FULL §3 "config validation
    /// at configure time").
    pub fn try_new(transport: Arc<T>, wait_items: usize, wait_ms: u64) -> Result<Arc<Self>, OutputError> {
        if wait_items == 0 {
            return Err(OutputError::InvalidWaitItems(wait_items));
        }
        Ok(Self::new(transport, wait_items, wait_ms))
    }

    pub fn with_defaults(transport: Arc<T>) -> Arc<Self> {
        Self::new(transport, DEFAULT_WAIT_ITEMS, DEFAULT_WAIT_MS)
    }

    pub fn queue_len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock().unwrap().enabled
    }

    /// §4.4 `schedule`: always append; drain immediately at the threshold,
    /// otherwise (re)arm the debounce timer.
    pub fn schedule(&self, url: String, body: String) {
        let armed_generation = {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push_back((url, body));
            if !inner.enabled {
                None
            } else if inner.queue.len() >= self.wait_items {
                drop(inner);
                self.send_all_scheduled();
                return;
            } else {
                inner.timer_generation += 1;
                Some(inner.timer_generation)
            }
        };

        if let Some(generation) = armed_generation {
            self.arm_timer(generation);
        }
    }

    fn arm_timer(&self, generation: u64) {
        let weak = self.self_weak.clone();
        let wait_ms = self.wait_ms;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            let Some(this) = weak.upgrade() else { return };
            let should_drain = {
                let mut inner = this.inner.lock().unwrap();
                if inner.timer_generation != generation || !inner.enabled || inner.draining {
                    false
                } else {
                    inner.draining = true;
                    true
                }
            };
            if should_drain {
                tracing::debug!("debounce timer fired; draining output buffer");
                this.drain_in_order().await;
            }
        });
    }

    /// §4.4 `send_all_scheduled`: cancel any pending timer; drain the queue
    /// fully while enabled, or leave it untouched while disabled. Every item
    /// popped in one drain is awaited against `transport.post` in turn rather
    /// than handed to its own `tokio::spawn`, so a burst is delivered in
    /// strict FIFO enqueue order (spec §5) regardless of how many worker
    /// threads the host's runtime has — one spawn per item would let the
    /// scheduler interleave them across threads and reorder the POSTs. The
    /// `draining` flag keeps two overlapping triggers (the threshold path and
    /// the debounce timer firing back to back) from racing two drains against
    /// the same queue: whichever loses just observes a drain already in
    /// flight and returns, trusting that drain to pick up whatever it
    /// enqueued before exiting.
    pub fn send_all_scheduled(&self) {
        let should_drain = {
            let mut inner = self.inner.lock().unwrap();
            inner.timer_generation += 1;
            if !inner.enabled || inner.draining {
                false
            } else {
                inner.draining = true;
                true
            }
        };
        if !should_drain {
            return;
        }

        let this = match self.self_weak.upgrade() {
            Some(this) => this,
            None => return,
        };
        tokio::spawn(async move {
            this.drain_in_order().await;
        });
    }

    async fn drain_in_order(&self) {
        loop {
            let next = {
                let mut inner = self.inner.lock().unwrap();
                if !inner.enabled {
                    inner.draining = false;
                    break;
                }
                match inner.queue.pop_front() {
                    Some(item) => item,
                    None => {
                        inner.draining = false;
                        break;
                    }
                }
            };

            self.transport.post(&next.0, &next.1).await;
            tracing::debug!(url = next.0, "dispatched queued item to transport");
        }
    }

    /// §4.4 `enable_sending`.
    pub fn enable_sending(&self) {
        self.inner.lock().unwrap().enabled = true;
        self.send_all_scheduled();
    }

    /// §4.4 `disable_sending`.
    pub fn disable_sending(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.enabled = false;
        inner.timer_generation += 1;
    }
}

impl<T: HttpTransport + 'static> OutputSink for OutputBuffer<T> {
    fn schedule(&self, url: String, body: String) {
        OutputBuffer::schedule(self, url, body);
    }
}
