//! FIFO buffer for events received before their stream is configured
//! (spec §4.1 step 2, §6 `input_buffer_enqueue`/`input_buffer_dequeue`).

use epc_domain::Event;

#[derive(Debug, Default)]
pub struct DeferredInputBuffer {
    items: Vec<(String, Event)>,
}

impl DeferredInputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stream: String, data: Event) {
        self.items.push((stream, data));
    }

    /// Remove and return every pending item, oldest first, leaving the
    /// buffer empty. Callers that re-defer an item (still unconfigured)
    /// push it back onto a now-empty buffer, so this never loops forever.
    pub fn drain_all(&mut self) -> Vec<(String, Event)> {
        std::mem::take(&mut self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
