//! Single-instruction repair search.
//!
//! A corrupted boot program loops forever because exactly one `jmp` should be a
//! `nop` or the other way round. The search flips each candidate in turn on an
//! independent copy of the program and runs it until it terminates, repeats an
//! instruction, or faults.

use crate::machine::{Machine, RunExit};
use handheld_core::{CandidateOrder, RepairConfig};
use handheld_ir::{Instruction, Opcode, Program};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// How a single trial ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialOutcome {
    Terminated,
    WouldRepeat,
    Faulted,
}

/// One candidate flip and what happened when it ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationTrial {
    pub index: usize,
    pub original: Opcode,
    pub outcome: TrialOutcome,
    pub accumulator: i64,
    pub steps: usize,
}

/// A flip that makes the program terminate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repair {
    pub index: usize,
    pub original: Instruction,
    pub replacement: Instruction,
    /// Accumulator when the repaired program terminates
    pub accumulator: i64,
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RepairOutcome {
    Repaired { repair: Repair, trials: usize },
    NoRepairFound { trials: usize },
}

impl RepairOutcome {
    pub fn repair(&self) -> Option<&Repair> {
        match self {
            RepairOutcome::Repaired { repair, .. } => Some(repair),
            RepairOutcome::NoRepairFound { .. } => None,
        }
    }

    pub fn trials(&self) -> usize {
        match self {
            RepairOutcome::Repaired { trials, .. } | RepairOutcome::NoRepairFound { trials } => {
                *trials
            }
        }
    }
}

pub struct RepairSearch {
    config: RepairConfig,
}

impl RepairSearch {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    /// Flippable positions in the order they will be tried
    pub fn candidates(&self, program: &Program) -> Vec<usize> {
        match self.config.order {
            CandidateOrder::JumpsFirst => {
                let mut positions = program.jump_positions();
                positions.extend(program.nop_positions());
                positions
            }
            CandidateOrder::ByPosition => program
                .instructions()
                .iter()
                .enumerate()
                .filter(|(_, inst)| inst.opcode.is_flippable())
                .map(|(idx, _)| idx)
                .collect(),
        }
    }

    /// Run the program with the instruction at `index` flipped.
    /// Returns `None` if that instruction cannot be flipped.
    pub fn trial(&self, program: &Program, index: usize) -> Option<MutationTrial> {
        let original = program.get(index)?.opcode;
        let mut machine = Machine::new(program.with_flipped(index)?);

        let trial = match machine.run_until_repeat() {
            Ok(report) => MutationTrial {
                index,
                original,
                outcome: match report.exit {
                    RunExit::Terminated => TrialOutcome::Terminated,
                    RunExit::WouldRepeat { .. } => TrialOutcome::WouldRepeat,
                },
                accumulator: report.accumulator,
                steps: report.steps,
            },
            Err(e) if e.is_fault() => {
                debug!("Trial at {} faulted: {}", index, e);
                MutationTrial {
                    index,
                    original,
                    outcome: TrialOutcome::Faulted,
                    accumulator: machine.accumulator(),
                    steps: machine.visits().iter().map(|&count| count as usize).sum(),
                }
            }
            Err(e) => {
                warn!("Trial at {} stopped unexpectedly: {}", index, e);
                MutationTrial {
                    index,
                    original,
                    outcome: TrialOutcome::Faulted,
                    accumulator: machine.accumulator(),
                    steps: 0,
                }
            }
        };

        debug!(
            index,
            original = %original,
            outcome = ?trial.outcome,
            accumulator = trial.accumulator,
            "trial finished"
        );
        Some(trial)
    }

    /// Every trial in candidate order. Stops after the first terminating
    /// trial when `stop_at_first` is set.
    pub fn trials(&self, program: &Program) -> Vec<MutationTrial> {
        let mut trials = Vec::new();

        for index in self.candidates(program) {
            let Some(trial) = self.trial(program, index) else {
                continue;
            };
            let done = trial.outcome == TrialOutcome::Terminated && self.config.stop_at_first;
            trials.push(trial);
            if done {
                break;
            }
        }

        trials
    }

    /// Find the first flip that makes the program terminate
    #[instrument(skip(self, program), fields(len = program.len()))]
    pub fn search(&self, program: &Program) -> RepairOutcome {
        let trials = self.trials(program);
        let count = trials.len();

        let repairs = Self::collect_repairs(program, &trials);
        if repairs.len() > 1 {
            warn!(
                "{} different flips terminate; reporting the first at {}",
                repairs.len(),
                repairs[0].index
            );
        }

        match repairs.into_iter().next() {
            Some(repair) => {
                info!(
                    "Repaired instruction {} ({} -> {}) after {} trials",
                    repair.index, repair.original, repair.replacement, count
                );
                RepairOutcome::Repaired {
                    repair,
                    trials: count,
                }
            }
            None => {
                warn!("No single flip repairs the program ({} trials)", count);
                RepairOutcome::NoRepairFound { trials: count }
            }
        }
    }

    /// Every terminating flip, regardless of `stop_at_first`
    pub fn all_repairs(&self, program: &Program) -> Vec<Repair> {
        let exhaustive = RepairSearch::new(RepairConfig {
            stop_at_first: false,
            ..self.config.clone()
        });
        Self::collect_repairs(program, &exhaustive.trials(program))
    }

    fn collect_repairs(program: &Program, trials: &[MutationTrial]) -> Vec<Repair> {
        trials
            .iter()
            .filter(|trial| trial.outcome == TrialOutcome::Terminated)
            .filter_map(|trial| {
                let original = *program.get(trial.index)?;
                Some(Repair {
                    index: trial.index,
                    original,
                    replacement: original.flipped()?,
                    accumulator: trial.accumulator,
                    steps: trial.steps,
                })
            })
            .collect()
    }
}

impl Default for RepairSearch {
    fn default() -> Self {
        Self::new(RepairConfig::default())
    }
}
