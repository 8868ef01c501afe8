//! Command line front end: repairs the boot code of a handheld console.
//!
//! Usage: `handheld <input> [--part one|two|both] [--order jumps-first|by-position]
//! [--all-repairs] [--json] [--config FILE]`

mod report;
mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use handheld_core::{CandidateOrder, Part, SolverConfig};
use handheld_ir::Program;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PartArg {
    One,
    Two,
    Both,
}

impl From<PartArg> for Part {
    fn from(arg: PartArg) -> Self {
        match arg {
            PartArg::One => Part::One,
            PartArg::Two => Part::Two,
            PartArg::Both => Part::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    JumpsFirst,
    ByPosition,
}

impl From<OrderArg> for CandidateOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::JumpsFirst => CandidateOrder::JumpsFirst,
            OrderArg::ByPosition => CandidateOrder::ByPosition,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "handheld")]
#[command(about = "Find the loop in a boot code listing and repair it")]
struct Args {
    /// Boot code listing, one instruction per line
    input: PathBuf,

    /// Which parts to solve
    #[arg(long, value_enum)]
    part: Option<PartArg>,

    /// Order in which flip candidates are tried
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Also list every flip that makes the program terminate
    #[arg(long)]
    all_repairs: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// JSON solver configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging when RUST_LOG is unset
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn solver_config(&self) -> Result<SolverConfig> {
        let mut config = match &self.config {
            Some(path) => SolverConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SolverConfig::default(),
        };

        if let Some(part) = self.part {
            config.part = part.into();
        }
        if let Some(order) = self.order {
            config.repair.order = order.into();
        }
        if self.json {
            config.json_output = true;
        }

        Ok(config)
    }
}

fn load_program(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let program = Program::from_lines(text.lines().map(str::trim))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(program)
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.verbose)?;

    let config = args.solver_config()?;
    debug!("Solver config: {:?}", config);

    let program = load_program(&args.input)?;
    info!(
        "Loaded {} instructions from {}",
        program.len(),
        args.input.display()
    );

    let report = report::solve(&program, &config, args.all_repairs)?;

    if config.json_output {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    if let Some(fault) = &report.loop_fault {
        bail!("unmodified program faulted: {}", fault);
    }

    Ok(())
}
