//! Solving a listing and rendering the results.

use anyhow::{Context, Result};
use handheld_core::SolverConfig;
use handheld_ir::{jump_hazards, validate_program, JumpHazard, Program};
use handheld_vm::{detect_loop, Repair, RepairOutcome, RepairSearch, RunExit, RunReport};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub instructions: usize,
    pub main_entry: Option<usize>,
    pub hazards: Vec<JumpHazard>,
    /// Part one: run of the unmodified program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_check: Option<RunReport>,
    /// Part one: fault raised by the unmodified program instead of a report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_fault: Option<String>,
    /// Part two: first repairing flip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_repairs: Option<Vec<Repair>>,
}

pub fn solve(program: &Program, config: &SolverConfig, all_repairs: bool) -> Result<Report> {
    validate_program(program)?;

    let hazards = if config.check_jumps {
        jump_hazards(program)
    } else {
        Vec::new()
    };
    for hazard in &hazards {
        match hazard.destination {
            Some(destination) => warn!(
                "Instruction {} ({}) would jump to {}",
                hazard.index, hazard.instruction, destination
            ),
            None => warn!(
                "Instruction {} ({}) would jump beyond the i64 range",
                hazard.index, hazard.instruction
            ),
        }
    }

    // A fault only ends the part one run; the repair search still gets its turn
    let (loop_check, loop_fault) = if config.part.includes_loop_check() {
        match detect_loop(program) {
            Ok(report) => {
                info!("Loop check finished after {} steps", report.steps);
                (Some(report), None)
            }
            Err(e) if e.is_fault() => {
                warn!("Unmodified program faulted: {}", e);
                (None, Some(e.to_string()))
            }
            Err(e) => return Err(e).context("running the unmodified program"),
        }
    } else {
        (None, None)
    };

    let (repair, all_repairs) = if config.part.includes_repair() {
        let search = RepairSearch::new(config.repair.clone());
        let outcome = search.search(program);
        let all = all_repairs.then(|| search.all_repairs(program));
        (Some(outcome), all)
    } else {
        (None, None)
    };

    Ok(Report {
        instructions: program.len(),
        main_entry: program.main_entry(),
        hazards,
        loop_check,
        loop_fault,
        repair,
        all_repairs,
    })
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing report")
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if let Some(run) = &self.loop_check {
            let _ = match run.exit {
                RunExit::WouldRepeat { at } => writeln!(
                    out,
                    "PART 1: Accumulator immediately before instruction {} repeats = {}",
                    at, run.accumulator
                ),
                RunExit::Terminated => writeln!(
                    out,
                    "PART 1: Program terminated without repeating, accumulator = {}",
                    run.accumulator
                ),
            };
        }
        if let Some(fault) = &self.loop_fault {
            let _ = writeln!(out, "PART 1: Program faulted: {}", fault);
        }

        if let Some(outcome) = &self.repair {
            let _ = match outcome {
                RepairOutcome::Repaired { repair, .. } => writeln!(
                    out,
                    "PART 2: Corrupted instruction `{}` at position {} (now `{}`), \
                     accumulator = {}",
                    repair.original.opcode, repair.index, repair.replacement, repair.accumulator
                ),
                RepairOutcome::NoRepairFound { trials } => writeln!(
                    out,
                    "PART 2: No single jmp/nop flip repairs the program ({} candidates tried)",
                    trials
                ),
            };
        }

        if let Some(repairs) = &self.all_repairs {
            let _ = writeln!(out, "Terminating flips: {}", repairs.len());
            for repair in repairs {
                let _ = writeln!(
                    out,
                    "  {:>5}: {} -> {} (accumulator = {})",
                    repair.index, repair.original, repair.replacement, repair.accumulator
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handheld_core::Part;

    const SAMPLE: &str = "nop +0
acc +1
jmp +4
acc +3
jmp -3
acc -99
acc +1
jmp -4
acc +6";

    #[test]
    fn test_solve_sample() {
        let program = Program::parse(SAMPLE).unwrap();
        let report = solve(&program, &SolverConfig::default(), false).unwrap();

        assert_eq!(report.instructions, 9);
        assert_eq!(report.main_entry, Some(1));
        assert!(report.hazards.is_empty());
        assert_eq!(report.loop_check.as_ref().unwrap().accumulator, 5);
        assert_eq!(report.repair.as_ref().unwrap().repair().unwrap().index, 7);
        assert!(report.all_repairs.is_none());

        let text = report.render_text();
        assert!(text.contains("instruction 1 repeats = 5"));
        assert!(text.contains("Corrupted instruction `jmp` at position 7"));
        assert!(text.contains("accumulator = 8"));
    }

    #[test]
    fn test_part_selection() {
        let program = Program::parse(SAMPLE).unwrap();
        let config = SolverConfig {
            part: Part::Two,
            ..Default::default()
        };

        let report = solve(&program, &config, true).unwrap();
        assert!(report.loop_check.is_none());
        assert_eq!(report.all_repairs.as_ref().unwrap().len(), 1);
        assert!(!report.render_text().contains("PART 1"));
    }

    #[test]
    fn test_part_one_fault_still_reports_repair() {
        let program = Program::parse("acc +1\njmp +7").unwrap();
        let report = solve(&program, &SolverConfig::default(), false).unwrap();

        assert!(report.loop_check.is_none());
        assert!(report.loop_fault.as_ref().unwrap().contains("jumps to 8"));
        assert_eq!(report.hazards.len(), 1);
        assert_eq!(report.hazards[0].destination, Some(8));
        assert_eq!(report.repair.as_ref().unwrap().repair().unwrap().index, 1);

        let text = report.render_text();
        assert!(text.contains("PART 1: Program faulted"));
        assert!(text.contains("`jmp` at position 1"));
    }

    #[test]
    fn test_part_two_skips_loop_check() {
        let program = Program::parse("acc +1\njmp +7").unwrap();
        let config = SolverConfig {
            part: Part::Two,
            ..Default::default()
        };
        let report = solve(&program, &config, false).unwrap();
        assert!(report.loop_check.is_none());
        assert!(report.loop_fault.is_none());
    }

    #[test]
    fn test_no_repair_rendering() {
        let program = Program::parse("acc +1\nacc +2").unwrap();
        let report = solve(&program, &SolverConfig::default(), false).unwrap();
        assert!(report.loop_check.as_ref().unwrap().terminated());
        let text = report.render_text();
        assert!(text.contains("terminated without repeating, accumulator = 3"));
        assert!(text.contains("No single jmp/nop flip repairs the program"));
        assert!(text.contains("(0 candidates tried)"));
    }

    #[test]
    fn test_empty_program_rejected() {
        let program = Program::parse("\n\n").unwrap();
        assert!(solve(&program, &SolverConfig::default(), false).is_err());
    }

    #[test]
    fn test_json_report() {
        let program = Program::parse(SAMPLE).unwrap();
        let report = solve(&program, &SolverConfig::default(), false).unwrap();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["loop_check"]["accumulator"], 5);
        assert_eq!(json["loop_check"]["exit"]["kind"], "would-repeat");
        assert_eq!(json["repair"]["status"], "repaired");
        assert!(json.get("all_repairs").is_none());
        assert!(json.get("loop_fault").is_none());
    }
}
