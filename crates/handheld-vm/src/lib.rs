//! Execution engine for handheld boot code.
//!
//! This module provides:
//! - [`Machine`]: single-step interpreter with per-instruction visit counters
//! - [`RepairSearch`]: finds the one `jmp`/`nop` flip that lets a looping program end

pub mod machine;
pub mod repair;

pub use machine::{Machine, MachineState, RunExit, RunReport, StepOutcome};
pub use repair::{MutationTrial, Repair, RepairOutcome, RepairSearch, TrialOutcome};

use handheld_core::Result;
use handheld_ir::Program;

/// Run a program until it ends or is about to repeat an instruction
pub fn detect_loop(program: &Program) -> Result<RunReport> {
    Machine::new(program.clone()).run_until_repeat()
}
