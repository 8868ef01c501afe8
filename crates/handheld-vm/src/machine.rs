//! Single-step execution of boot code.

use handheld_core::{Error, Result};
use handheld_ir::{Instruction, Opcode, Program};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Lifecycle of a machine between resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// Pointer at 0, nothing executed yet
    Ready,
    /// At least one instruction executed
    Running,
    /// Pointer reached the end of the code
    Terminated,
    /// A step tried to leave the program
    Faulted,
}

impl MachineState {
    pub fn is_halted(&self) -> bool {
        matches!(self, MachineState::Terminated | MachineState::Faulted)
    }
}

/// Result of a successful `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Pointer is on another instruction
    Continued,
    /// Pointer landed exactly on the end of the code
    Terminated,
}

/// How `run_until_repeat` stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RunExit {
    Terminated,
    /// The instruction at `at` was about to run a second time
    WouldRepeat { at: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub exit: RunExit,
    pub accumulator: i64,
    pub steps: usize,
}

impl RunReport {
    pub fn terminated(&self) -> bool {
        self.exit == RunExit::Terminated
    }
}

/// Execution state over a decoded program
#[derive(Debug, Clone)]
pub struct Machine {
    program: Program,
    pointer: usize,
    accumulator: i64,
    visits: Vec<u32>,
    state: MachineState,
    started: bool,
}

impl Machine {
    pub fn new(program: Program) -> Self {
        let visits = vec![0; program.len()];
        let state = Self::initial_state(&program);
        Self {
            program,
            pointer: 0,
            accumulator: 0,
            visits,
            state,
            started: false,
        }
    }

    /// Decode a listing and load it
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Program::from_lines(lines)?))
    }

    fn initial_state(program: &Program) -> MachineState {
        // An empty listing starts on its own end
        if program.is_empty() {
            MachineState::Terminated
        } else {
            MachineState::Ready
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    pub fn visits(&self) -> &[u32] {
        &self.visits
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// True once an instruction has executed since construction or the last reset
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_terminated(&self) -> bool {
        self.state == MachineState::Terminated
    }

    pub fn is_faulted(&self) -> bool {
        self.state == MachineState::Faulted
    }

    /// The instruction about to execute, if the machine has not halted
    pub fn current_instruction(&self) -> Option<&Instruction> {
        if self.state.is_halted() {
            None
        } else {
            self.program.get(self.pointer)
        }
    }

    /// Visit count of the instruction about to execute
    pub fn visits_at_pointer(&self) -> Option<u32> {
        if self.state.is_halted() {
            None
        } else {
            self.visits.get(self.pointer).copied()
        }
    }

    /// True if the next instruction has already executed during this run
    pub fn would_repeat(&self) -> bool {
        self.visits_at_pointer().map_or(false, |count| count >= 1)
    }

    /// Execute exactly one instruction.
    ///
    /// Stepping a halted machine is a caller bug and is reported as
    /// [`Error::InvalidState`]. A jump outside `0..=len` faults the machine and
    /// returns [`Error::OutOfBounds`].
    pub fn advance(&mut self) -> Result<StepOutcome> {
        if self.state.is_halted() {
            return Err(Error::InvalidState(format!(
                "advance called on a {:?} machine (pointer {}, code length {})",
                self.state,
                self.pointer,
                self.program.len()
            )));
        }

        let index = self.pointer;
        let len = self.program.len();
        let inst = *self.program.get(index).ok_or_else(|| {
            Error::InvalidState(format!(
                "pointer {} is outside a running program of length {}",
                index, len
            ))
        })?;

        self.state = MachineState::Running;

        let destination = match inst.opcode {
            Opcode::Acc => {
                self.accumulator = match self.accumulator.checked_add(inst.operand) {
                    Some(value) => value,
                    None => {
                        self.state = MachineState::Faulted;
                        debug!("Accumulator overflow at {}", index);
                        return Err(Error::AccumulatorOverflow { index });
                    }
                };
                index as i64 + 1
            }
            Opcode::Jmp => match (index as i64).checked_add(inst.operand) {
                Some(destination) => destination,
                None => {
                    self.state = MachineState::Faulted;
                    debug!("Instruction {} ({}) jumps beyond i64", index, inst);
                    return Err(Error::JumpOverflow {
                        index,
                        operand: inst.operand,
                    });
                }
            },
            Opcode::Nop => index as i64 + 1,
        };
        self.visits[index] = self.visits[index].saturating_add(1);
        self.started = true;

        trace!(
            index,
            instruction = %inst,
            accumulator = self.accumulator,
            "step"
        );

        if destination < 0 || destination > len as i64 {
            self.state = MachineState::Faulted;
            debug!("Instruction {} ({}) jumps to {}", index, inst, destination);
            return Err(Error::OutOfBounds {
                index,
                destination,
                len,
            });
        }

        self.pointer = destination as usize;
        if self.pointer == len {
            self.state = MachineState::Terminated;
            debug!("Program terminated with accumulator {}", self.accumulator);
            Ok(StepOutcome::Terminated)
        } else {
            Ok(StepOutcome::Continued)
        }
    }

    /// Step until the program ends or the next instruction has already run.
    ///
    /// Every run finishes within `len` steps, since the pointer cannot avoid
    /// revisiting an instruction for longer than that.
    pub fn run_until_repeat(&mut self) -> Result<RunReport> {
        let mut steps = 0;

        loop {
            if self.is_terminated() {
                return Ok(RunReport {
                    exit: RunExit::Terminated,
                    accumulator: self.accumulator,
                    steps,
                });
            }
            if self.would_repeat() {
                return Ok(RunReport {
                    exit: RunExit::WouldRepeat { at: self.pointer },
                    accumulator: self.accumulator,
                    steps,
                });
            }

            self.advance()?;
            steps += 1;
        }
    }

    /// Return to the initial state without decoding again
    pub fn reset(&mut self) {
        self.pointer = 0;
        self.accumulator = 0;
        self.visits.iter_mut().for_each(|count| *count = 0);
        self.state = Self::initial_state(&self.program);
        self.started = false;
    }
}
