//! Configuration types for the solver.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Order in which repair candidates are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOrder {
    /// Every `jmp` by position, then every `nop` by position
    JumpsFirst,
    /// All flippable instructions by position
    ByPosition,
}

impl Default for CandidateOrder {
    fn default() -> Self {
        CandidateOrder::JumpsFirst
    }
}

/// Repair search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Candidate ordering
    pub order: CandidateOrder,
    /// Stop at the first candidate that terminates
    pub stop_at_first: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            order: CandidateOrder::JumpsFirst,
            stop_at_first: true,
        }
    }
}

/// Which puzzle parts the solver reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Part {
    One,
    Two,
    Both,
}

impl Part {
    pub fn includes_loop_check(&self) -> bool {
        matches!(self, Part::One | Part::Both)
    }

    pub fn includes_repair(&self) -> bool {
        matches!(self, Part::Two | Part::Both)
    }
}

/// Top-level solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Parts to run
    pub part: Part,
    /// Repair search settings
    pub repair: RepairConfig,
    /// Emit JSON instead of text
    pub json_output: bool,
    /// Warn about jumps that leave the program before running it
    pub check_jumps: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            part: Part::Both,
            repair: RepairConfig::default(),
            json_output: false,
            check_jumps: true,
        }
    }
}

impl SolverConfig {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&text)?;
        tracing::debug!("Loaded solver config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let repair = RepairConfig::default();
        assert_eq!(repair.order, CandidateOrder::JumpsFirst);
        assert!(repair.stop_at_first);

        let solver = SolverConfig::default();
        assert_eq!(solver.part, Part::Both);
        assert!(!solver.json_output);
        assert!(solver.check_jumps);
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json = r#"{ "part": "two", "repair": { "order": "by-position" } }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.part, Part::Two);
        assert_eq!(config.repair.order, CandidateOrder::ByPosition);
        assert!(config.repair.stop_at_first);
        assert!(config.check_jumps);
    }

    #[test]
    fn test_part_selection() {
        assert!(Part::One.includes_loop_check());
        assert!(!Part::One.includes_repair());
        assert!(Part::Two.includes_repair());
        assert!(Part::Both.includes_loop_check() && Part::Both.includes_repair());
    }

    #[test]
    fn test_missing_config_file() {
        let result = SolverConfig::from_json_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
