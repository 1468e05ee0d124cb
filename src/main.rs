mod city_import;
mod gen_cities;
mod ranking;
mod tour_io;

use std::{error::Error, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand};
use tour_cuts::{
    milp::BranchAndCutStats, solve_with, BranchAndCutEngine, CoordinateSet, ExternalSolver,
    LpModelerEngine, SolvedTour, SolverOptions,
};

use city_import::import_cities;
use gen_cities::{BoundingBox, RandomCityGenerator};
use ranking::{pick_top_n, to_coordinate_set, Weights};
use tour_io::{export_tour, print_summary};

#[derive(Parser)]
#[clap(about = "Exact shortest round trips through cities")]
struct Cli {
    /// Log every subtour cut and search node
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve a tour through the highest ranked cities of a CSV file
    Solve(Solve),
    /// Solve a tour through randomly placed cities
    Random(Random),
}

#[derive(Args)]
struct Solve {
    /// CSV with the columns city, lat, lng, population
    #[clap(parse(from_os_str))]
    input: PathBuf,

    #[clap(short = 'n', long, default_value = "15")]
    top_n: usize,

    #[clap(long, default_value = "1.0")]
    population_weight: f64,

    #[clap(flatten)]
    options: RunOptions,
}

#[derive(Args)]
struct Random {
    #[clap(short, long, default_value = "15")]
    num_cities: usize,

    #[clap(short, long, default_value = "0")]
    seed: u64,

    #[clap(flatten)]
    options: RunOptions,
}

#[derive(Args, Clone, Debug)]
struct RunOptions {
    /// Time limit in seconds
    #[clap(short, long)]
    time_limit: Option<f64>,

    #[clap(short, long, default_value = "branch-cut")]
    engine: EngineChoice,

    /// Write the tour as CSV
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineChoice {
    BranchCut,
    External(ExternalSolver),
}

impl FromStr for EngineChoice {
    type Err = String;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "branch-cut" => Ok(EngineChoice::BranchCut),
            other => other
                .parse::<ExternalSolver>()
                .map(EngineChoice::External)
                .map_err(|_| format!("unknown engine '{}', use branch-cut, cbc or gurobi", other)),
        }
    }
}

fn set_up_logging(verbose: bool) -> Result<(), fern::InitError> {
    std::fs::create_dir_all("logs")?;
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date}][{level}] {message}",
                date = chrono::Local::now().format("%H:%M:%S"),
                level = record.level(),
                message = message
            ));
        })
        .level(level)
        .chain(std::io::stderr())
        .chain(fern::log_file(format!(
            "logs/{}.log",
            chrono::Local::now().format("%d%m%Y-%H%M")
        ))?)
        .apply()?;

    log::info!("Logger set up!");

    Ok(())
}

fn time_limit(seconds: Option<f64>) -> Result<Option<Duration>, Box<dyn Error>> {
    match seconds {
        Some(s) => Duration::try_from_secs_f64(s).map(Some).map_err(|_| {
            format!("time limit must be a non-negative number of seconds, got {}", s).into()
        }),
        None => Ok(None),
    }
}

fn log_stats(stats: BranchAndCutStats) {
    log::info!(
        "Branch-and-cut: {} nodes, {} LP solves, {} candidates, {} cuts.",
        stats.nodes,
        stats.lp_solves,
        stats.candidates,
        stats.cuts
    );
}

fn run(coords: &CoordinateSet, options: &RunOptions) -> Result<(), Box<dyn Error>> {
    let solver_options = SolverOptions::with_time_limit(time_limit(options.time_limit)?);

    let solved: SolvedTour = match options.engine {
        EngineChoice::BranchCut => {
            let mut engine = BranchAndCutEngine::new();
            let solved = solve_with(&mut engine, coords, &solver_options)?;
            log_stats(engine.stats());
            solved
        }
        EngineChoice::External(solver) => {
            let mut engine = LpModelerEngine::new(solver);
            let solved = solve_with(&mut engine, coords, &solver_options)?;
            log::info!("{:?} needed {} rounds.", solver, engine.rounds());
            solved
        }
    };

    print_summary(&solved)?;
    if let Some(path) = &options.output {
        export_tour(path, &solved, coords)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    set_up_logging(cli.verbose)?;

    match cli.command {
        Command::Solve(solve) => {
            let records = import_cities(&solve.input)?;
            let weights = Weights {
                population: solve.population_weight,
            };
            let chosen = pick_top_n(&records, solve.top_n, &weights);
            let coords = to_coordinate_set(&chosen);
            log::info!("Selected {} cities.", coords.len());
            run(&coords, &solve.options)
        }
        Command::Random(random) => {
            let coords = RandomCityGenerator::new(random.seed, BoundingBox::default())
                .generate(random.num_cities)?;
            run(&coords, &random.options)
        }
    }
}
