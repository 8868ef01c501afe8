//! Static checks for decoded programs.

use crate::instruction::{Instruction, Opcode};
use crate::program::Program;
use handheld_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A `jmp` whose destination lies outside the program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpHazard {
    pub index: usize,
    pub instruction: Instruction,
    /// `None` when the destination does not fit in an `i64`
    pub destination: Option<i64>,
}

/// Validate that a program is well-formed
pub fn validate_program(program: &Program) -> Result<()> {
    if program.is_empty() {
        return Err(Error::Validation("Program has no instructions".to_string()));
    }

    Ok(())
}

/// List every `jmp` that would fault if executed.
///
/// Landing exactly one past the last instruction ends the program and is not a hazard.
pub fn jump_hazards(program: &Program) -> Vec<JumpHazard> {
    let len = program.len() as i64;

    program
        .instructions()
        .iter()
        .enumerate()
        .filter(|(_, inst)| inst.opcode == Opcode::Jmp)
        .filter_map(|(idx, inst)| {
            let destination = (idx as i64).checked_add(inst.operand);
            if destination.map_or(true, |dest| dest < 0 || dest > len) {
                Some(JumpHazard {
                    index: idx,
                    instruction: *inst,
                    destination,
                })
            } else {
                None
            }
        })
        .collect()
}
