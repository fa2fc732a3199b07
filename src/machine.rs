//! Owns every piece of mutable state for one interpreter instance:
//! registers, memory, storage, the label table, the jump counters, the
//! halt flag and the single-slot error descriptor. Fully re-initialised
//! by [crate::interpreter::Interpreter::load]; never shared across
//! programs.

use std::collections::HashMap;

use crate::error::Error;
use crate::events::{Event, EventBus};
use crate::limits::{MEMORY_SIZE, NUM_REGISTERS, STORAGE_SIZE};
use crate::preprocessor::LabelTable;

/// The error slot plus enough context to render the Host API's
/// `Error at address <addr> executing '<line>'` format.
#[derive(Debug, Clone)]
pub struct ErrorSlot {
    pub error: Error,
    pub address: usize,
    pub line: String,
}

pub struct MachineState {
    registers: [i64; NUM_REGISTERS],
    memory: [Option<String>; MEMORY_SIZE],
    storage: [Option<String>; STORAGE_SIZE],
    labels: LabelTable,
    num_label_jumps: u32,
    jump_counts: HashMap<String, u32>,
    halted: bool,
    error: Option<ErrorSlot>,
    events: EventBus,
}

impl MachineState {
    pub fn new() -> MachineState {
        MachineState {
            registers: [0; NUM_REGISTERS],
            memory: std::array::from_fn(|_| None),
            storage: std::array::from_fn(|_| None),
            labels: LabelTable::new(),
            num_label_jumps: 0,
            jump_counts: HashMap::new(),
            halted: false,
            error: None,
            events: EventBus::new(),
        }
    }

    /// Reset every piece of state to its initial value, keeping event
    /// subscribers attached across the reset.
    pub fn reset(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.memory = std::array::from_fn(|_| None);
        self.storage = std::array::from_fn(|_| None);
        self.labels = LabelTable::new();
        self.num_label_jumps = 0;
        self.jump_counts.clear();
        self.halted = false;
        self.error = None;
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&Event) + 'static) {
        self.events.subscribe(callback);
    }

    // -- registers --------------------------------------------------

    pub fn pc(&self) -> usize {
        self.registers[0] as usize
    }

    pub fn set_pc(&mut self, new: usize) {
        let old = self.pc();
        self.registers[0] = new as i64;
        self.events.emit(Event::PcChanged { old, new });
    }

    /// Read a general-purpose register (1..=9). Callers are expected to
    /// have already validated the index via [crate::addressing].
    pub fn register(&self, index: usize) -> i64 {
        self.registers[index]
    }

    pub fn set_register(&mut self, index: usize, value: i64) {
        let old = self.registers[index];
        self.registers[index] = value;
        self.events.emit(Event::RegisterChanged { index, old, new: value });
    }

    // -- memory / storage --------------------------------------------

    pub fn memory_cell(&self, word_index: usize) -> &Option<String> {
        &self.memory[word_index]
    }

    pub fn set_memory_cell(&mut self, word_index: usize, value: Option<String>) {
        let old = self.memory[word_index].clone();
        self.memory[word_index] = value.clone();
        self.events.emit(Event::MemoryChanged { word_index, old, new: value });
    }

    pub fn storage_cell(&self, word_index: usize) -> &Option<String> {
        &self.storage[word_index]
    }

    pub fn set_storage_cell(&mut self, word_index: usize, value: Option<String>) {
        let old = self.storage[word_index].clone();
        self.storage[word_index] = value.clone();
        self.events.emit(Event::StorageChanged { word_index, old, new: value });
    }

    pub fn memory(&self) -> &[Option<String>; MEMORY_SIZE] {
        &self.memory
    }

    pub fn storage(&self) -> &[Option<String>; STORAGE_SIZE] {
        &self.storage
    }

    // -- labels / jump guard ------------------------------------------

    pub fn set_labels(&mut self, labels: LabelTable) {
        self.labels = labels;
    }

    pub fn label_address(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn num_label_jumps(&self) -> u32 {
        self.num_label_jumps
    }

    pub fn jump_counts(&self) -> &HashMap<String, u32> {
        &self.jump_counts
    }

    /// Record one evaluation (taken or not) of a branch-family
    /// instruction referencing `label`. Returns the updated total.
    pub fn record_branch_evaluation(&mut self, label: &str) -> u32 {
        self.num_label_jumps += 1;
        *self.jump_counts.entry(label.to_string()).or_insert(0) += 1;
        self.num_label_jumps
    }

    // -- halt / error ---------------------------------------------------

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.halted = true;
        self.events.emit(Event::Halted);
    }

    /// Write-once: the first failure wins, later writers are dropped.
    pub fn set_error(&mut self, error: Error, address: usize, line: String) {
        if self.error.is_some() {
            return;
        }
        self.events.emit(Event::Errored { message: error.message.clone() });
        self.error = Some(ErrorSlot { error, address, line });
    }

    pub fn error(&self) -> Option<&ErrorSlot> {
        self.error.as_ref()
    }
}

impl Default for MachineState {
    fn default() -> MachineState {
        MachineState::new()
    }
}
