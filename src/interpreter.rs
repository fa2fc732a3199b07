//! The `load` / `step` / `run` entry points offered to the visualizer:
//! orchestration over [MachineState], the Preprocessor and the Executor,
//! plus the infinite-loop guard.

use crate::error::Error;
use crate::events::Event;
use crate::executor;
use crate::limits::MEMORY_SIZE;
use crate::machine::MachineState;
use crate::preprocessor;

/// An inspectable, read-only copy of machine state for the animator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: usize,
    /// General-purpose registers, indices 1..=9.
    pub registers: [i64; 9],
    pub memory: Vec<Option<String>>,
    pub storage: Vec<Option<String>>,
}

/// One interpreter instance. State is never shared across programs: a
/// new [Interpreter::load] fully re-initialises everything.
pub struct Interpreter {
    state: MachineState,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter { state: MachineState::new() }
    }

    /// Subscribe to every state-change event emitted from here on.
    pub fn subscribe(&mut self, callback: impl FnMut(&Event) + 'static) {
        self.state.subscribe(callback);
    }

    /// Reset all state and install `lines` at memory cells `0..n`.
    pub fn load(&mut self, lines: &[String]) -> Result<(), Error> {
        self.state.reset();

        if lines.len() > MEMORY_SIZE {
            return Err(Error::new(
                crate::error::ErrorKind::AddrOutOfRange,
                format!("program has {} lines but memory holds only {} words", lines.len(), MEMORY_SIZE),
            ));
        }

        let labels = preprocessor::preprocess(lines)?;
        self.state.set_labels(labels);
        for (index, line) in lines.iter().enumerate() {
            self.state.set_memory_cell(index, Some(line.clone()));
        }

        Ok(())
    }

    /// Perform exactly one instruction. `Ok(true)` means execution may
    /// continue; `Ok(false)` means the program halted; `Err` carries the
    /// same error that is now sitting in the (already-written) error slot.
    pub fn step(&mut self) -> Result<bool, Error> {
        if self.state.halted() || self.state.error().is_some() {
            return Ok(false);
        }

        let pc = self.state.pc();
        if pc >= MEMORY_SIZE {
            let error = Error::new(
                crate::error::ErrorKind::AddrOutOfRange,
                format!("fetch from out-of-range pc {} (capacity {} words)", pc, MEMORY_SIZE),
            );
            self.state.set_error(error.clone(), pc * 4, String::new());
            return Err(error);
        }
        let line = match self.state.memory_cell(pc).clone() {
            Some(line) => line,
            None => {
                let error = Error::new(
                    crate::error::ErrorKind::MemUninitialized,
                    format!("fetch from uninitialized line {}", pc),
                );
                self.state.set_error(error.clone(), pc * 4, String::new());
                return Err(error);
            }
        };
        self.state.set_pc(pc + 1);

        match executor::execute_line(&mut self.state, &line) {
            Ok(()) => Ok(!self.state.halted()),
            Err(error) => {
                let address = (self.state.pc() as i64 - 1) * 4;
                self.state.set_error(error.clone(), address.max(0) as usize, line);
                Err(error)
            }
        }
    }

    /// Repeat `step` until it returns `Ok(false)`.
    pub fn run(&mut self) -> Result<(), Error> {
        while self.step()? {}
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut registers = [0i64; 9];
        for (i, reg) in registers.iter_mut().enumerate() {
            *reg = self.state.register(i + 1);
        }
        Snapshot {
            pc: self.state.pc(),
            registers,
            memory: self.state.memory().to_vec(),
            storage: self.state.storage().to_vec(),
        }
    }

    /// The Host API's user-facing error format:
    /// `Error at address <addr> executing '<line>'\n<message>`.
    pub fn format_error(&self) -> Option<String> {
        self.state.error().map(|slot| {
            format!("Error at address {} executing '{}'\n{}", slot.address, slot.line, slot.error.message)
        })
    }

    pub fn halted(&self) -> bool {
        self.state.halted()
    }

    /// Total branch-family evaluations recorded so far (taken or not).
    pub fn num_label_jumps(&self) -> u32 {
        self.state.num_label_jumps()
    }

    /// Per-label breakdown of branch-family evaluations, keyed by the
    /// branch's target label name.
    pub fn jump_counts(&self) -> &std::collections::HashMap<String, u32> {
        self.state.jump_counts()
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}
