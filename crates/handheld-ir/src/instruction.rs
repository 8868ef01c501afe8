//! Instruction set for the boot code.

use handheld_core::MalformedReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boot code opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Acc, // accumulator += operand
    Jmp, // pointer += operand
    Nop, // pointer += 1, operand ignored
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Acc => "acc",
            Opcode::Jmp => "jmp",
            Opcode::Nop => "nop",
        }
    }

    /// Returns true if this opcode can be swapped by a repair
    pub fn is_flippable(&self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Nop)
    }

    /// The jmp/nop counterpart of this opcode
    pub fn flipped(&self) -> Option<Opcode> {
        match self {
            Opcode::Jmp => Some(Opcode::Nop),
            Opcode::Nop => Some(Opcode::Jmp),
            Opcode::Acc => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = MalformedReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acc" => Ok(Opcode::Acc),
            "jmp" => Ok(Opcode::Jmp),
            "nop" => Ok(Opcode::Nop),
            other => Err(MalformedReason::UnknownOpcode(other.to_string())),
        }
    }
}

/// A single decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: i64,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: i64) -> Self {
        Self { opcode, operand }
    }

    pub fn acc(operand: i64) -> Self {
        Self::new(Opcode::Acc, operand)
    }

    pub fn jmp(operand: i64) -> Self {
        Self::new(Opcode::Jmp, operand)
    }

    pub fn nop(operand: i64) -> Self {
        Self::new(Opcode::Nop, operand)
    }

    /// The same instruction with jmp and nop swapped; `None` for acc
    pub fn flipped(&self) -> Option<Instruction> {
        self.opcode
            .flipped()
            .map(|opcode| Instruction::new(opcode, self.operand))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.opcode, self.operand)
    }
}

impl FromStr for Instruction {
    type Err = MalformedReason;

    /// Decode `<opcode> <signed integer>`, where the operand carries an explicit sign
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();

        let opcode: Opcode = tokens
            .next()
            .ok_or(MalformedReason::MissingOperand)?
            .parse()?;

        let arg = tokens.next().ok_or(MalformedReason::MissingOperand)?;
        if tokens.next().is_some() {
            return Err(MalformedReason::TrailingTokens);
        }

        if !arg.starts_with('+') && !arg.starts_with('-') {
            return Err(MalformedReason::UnsignedOperand(arg.to_string()));
        }

        let operand = arg
            .parse::<i64>()
            .map_err(|_| MalformedReason::InvalidOperand(arg.to_string()))?;

        Ok(Instruction::new(opcode, operand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instructions() {
        assert_eq!("acc +1".parse::<Instruction>(), Ok(Instruction::acc(1)));
        assert_eq!("jmp -4".parse::<Instruction>(), Ok(Instruction::jmp(-4)));
        assert_eq!("nop +0".parse::<Instruction>(), Ok(Instruction::nop(0)));
        assert_eq!("  acc   -99 ".parse::<Instruction>(), Ok(Instruction::acc(-99)));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "mul +2".parse::<Instruction>(),
            Err(MalformedReason::UnknownOpcode("mul".to_string()))
        );
        assert_eq!(
            "acc".parse::<Instruction>(),
            Err(MalformedReason::MissingOperand)
        );
        assert_eq!(
            "acc 5".parse::<Instruction>(),
            Err(MalformedReason::UnsignedOperand("5".to_string()))
        );
        assert_eq!(
            "jmp +x".parse::<Instruction>(),
            Err(MalformedReason::InvalidOperand("+x".to_string()))
        );
        assert_eq!(
            "jmp +-3".parse::<Instruction>(),
            Err(MalformedReason::InvalidOperand("+-3".to_string()))
        );
        assert_eq!(
            "nop +1 +2".parse::<Instruction>(),
            Err(MalformedReason::TrailingTokens)
        );
        assert_eq!(
            "ACC +1".parse::<Instruction>(),
            Err(MalformedReason::UnknownOpcode("ACC".to_string()))
        );
    }

    #[test]
    fn test_opcode_properties() {
        assert!(Opcode::Jmp.is_flippable());
        assert!(Opcode::Nop.is_flippable());
        assert!(!Opcode::Acc.is_flippable());

        assert_eq!(Opcode::Jmp.flipped(), Some(Opcode::Nop));
        assert_eq!(Opcode::Nop.flipped(), Some(Opcode::Jmp));
        assert_eq!(Opcode::Acc.flipped(), None);
    }

    #[test]
    fn test_flip_keeps_operand() {
        assert_eq!(Instruction::jmp(-4).flipped(), Some(Instruction::nop(-4)));
        assert_eq!(Instruction::nop(7).flipped(), Some(Instruction::jmp(7)));
        assert_eq!(Instruction::acc(3).flipped(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::nop(0).to_string(), "nop +0");
        assert_eq!(Instruction::jmp(-3).to_string(), "jmp -3");
        assert_eq!(Instruction::acc(12).to_string(), "acc +12");
    }
}
