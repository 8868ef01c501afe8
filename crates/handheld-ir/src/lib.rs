//! Intermediate representation for handheld boot code.
//!
//! Boot code is a flat listing of three instructions:
//! - `acc`: add the operand to the accumulator
//! - `jmp`: move the instruction pointer by the operand
//! - `nop`: do nothing
//!
//! Listings are decoded once into an immutable [`Program`] that execution
//! engines and repair searches copy from.

pub mod instruction;
pub mod program;
pub mod validation;

pub use instruction::{Instruction, Opcode};
pub use program::Program;
pub use validation::{jump_hazards, validate_program, JumpHazard};
