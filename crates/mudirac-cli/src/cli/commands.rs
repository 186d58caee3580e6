use super::CliError;
use super::helpers::*;
use mudirac_core::Config;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// JSON input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Prefix of the output files [default: input file name up to its first '.']
    #[arg(long)]
    seed: Option<String>,

    /// Directory receiving the output files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write a JSON summary of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug, -vvv trace); overrides the input file
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub(super) fn run_input(args: RunArgs) -> Result<i32, CliError> {
    let config = Config::load(&args.input)?;
    let verbosity = if args.verbose > 0 {
        args.verbose
    } else {
        config.verbosity
    };
    init_logging(verbosity);

    let seed = args
        .seed
        .clone()
        .unwrap_or_else(|| seed_from_path(&args.input));
    let mut atom = config.build_atom()?;
    info!(
        "atom: Z = {}, A = {}, m = {} au, {} nucleus",
        atom.z(),
        atom.a(),
        atom.m(),
        config.nuclear_model
    );

    let mut transitions = Vec::with_capacity(config.xr_lines.len());
    for line in config.xray_lines()? {
        info!("computing transition {line}");
        let lower = atom.get_state(line.lower.n, line.lower.l, line.lower.s)?;
        let upper = atom.get_state(line.upper.n, line.upper.l, line.upper.s)?;
        let transition = Transition { line, lower, upper };
        info!(
            "transition {line} energy = {:.6} keV",
            transition.energy_ev() / 1000.0
        );
        transitions.push(transition);
    }

    if config.output >= 1 {
        let path = xr_out_path(&args.output_dir, &seed);
        write_text(&path, &render_xr_out(&atom, &transitions))?;
        info!("wrote {}", path.display());
    }
    if config.output >= 2 {
        for transition in &transitions {
            for (index, state) in transition.states() {
                let path = state_path(&args.output_dir, &seed, &transition.line, index);
                debug!("writing state {index} of line {}", transition.line);
                write_text(&path, &render_state(state))?;
            }
        }
    }
    if let Some(report) = &args.report {
        write_text(report, &render_report(&seed, &config, &atom, &transitions)?)?;
        info!("JSON report: {}", report.display());
    }

    Ok(0)
}
