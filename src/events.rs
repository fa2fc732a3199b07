//! The in-process fan-out channel carrying state-change events to the
//! animation layer. Emission order equals mutation order; a failed
//! mutation emits no event other than (optionally) [Event::Errored].

/// One observable change to machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RegisterChanged { index: usize, old: i64, new: i64 },
    MemoryChanged { word_index: usize, old: Option<String>, new: Option<String> },
    StorageChanged { word_index: usize, old: Option<String>, new: Option<String> },
    PcChanged { old: usize, new: usize },
    Halted,
    Errored { message: String },
}

/// A synchronous, single-threaded subscriber list. There is no
/// buffering: `emit` calls every subscriber inline before returning.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn FnMut(&Event)>>,
}

impl EventBus {
    pub fn new() -> EventBus {
        EventBus { subscribers: Vec::new() }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&Event) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    pub fn emit(&mut self, event: Event) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}
