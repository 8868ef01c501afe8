//! Decoded boot code programs.

use crate::instruction::{Instruction, Opcode};
use handheld_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// An immutable, decoded instruction listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Listing")]
pub struct Program {
    instructions: Vec<Instruction>,
    main_entry: Option<usize>,
}

/// Serialized form read back into a `Program`; `main_entry` is always recomputed
#[derive(Deserialize)]
struct Listing {
    instructions: Vec<Instruction>,
}

impl From<Listing> for Program {
    fn from(listing: Listing) -> Self {
        Program::new(listing.instructions)
    }
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        let main_entry = instructions
            .iter()
            .position(|inst| inst.opcode != Opcode::Nop);
        Self {
            instructions,
            main_entry,
        }
    }

    /// Decode a listing, one instruction per line. Blank lines are skipped.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instructions = Vec::new();

        for (idx, line) in lines.into_iter().enumerate() {
            let text = line.as_ref().trim();
            if text.is_empty() {
                continue;
            }

            let inst = text
                .parse::<Instruction>()
                .map_err(|reason| Error::MalformedInstruction {
                    line: idx + 1,
                    text: text.to_string(),
                    reason,
                })?;
            instructions.push(inst);
        }

        tracing::debug!("Loaded program with {} instructions", instructions.len());
        Ok(Self::new(instructions))
    }

    /// Decode a newline-separated listing
    pub fn parse(source: &str) -> Result<Self> {
        Self::from_lines(source.lines())
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Position of the first instruction that is not a `nop`.
    /// Diagnostic only: execution always begins at index 0.
    pub fn main_entry(&self) -> Option<usize> {
        self.main_entry
    }

    /// Positions holding the given opcode, in program order
    pub fn positions_of(&self, opcode: Opcode) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, inst)| inst.opcode == opcode)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn jump_positions(&self) -> Vec<usize> {
        self.positions_of(Opcode::Jmp)
    }

    pub fn nop_positions(&self) -> Vec<usize> {
        self.positions_of(Opcode::Nop)
    }

    /// A copy of this program with the instruction at `index` flipped between
    /// `jmp` and `nop`. Returns `None` if `index` is out of range or holds an `acc`.
    pub fn with_flipped(&self, index: usize) -> Option<Program> {
        let flipped = self.instructions.get(index)?.flipped()?;
        let mut instructions = self.instructions.clone();
        instructions[index] = flipped;
        Some(Program::new(instructions))
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program::new(instructions)
    }
}
