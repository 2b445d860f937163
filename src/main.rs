use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use prettytable::{Cell, Row, Table};
use separator::Separatable;

use sokogen::cancel::CancelToken;
use sokogen::config::GenerateOptions;
use sokogen::fs;
use sokogen::generator::driver;
use sokogen::parser;
use sokogen::solution::SolutionDoc;
use sokogen::solver::{SolveStatus, Solver, DEFAULT_MAX_ITERATIONS};

fn main() {
    env_logger::init();

    let matches = App::new("sokogen")
        .about("Sokoban level generator and solver")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("solve")
                .about("Solve level files and write solution documents")
                .arg(
                    Arg::with_name("path")
                        .required(true)
                        .help("A level file, or a directory with Level<N>.txt files"),
                )
                .arg(
                    Arg::with_name("max-iterations")
                        .long("max-iterations")
                        .takes_value(true)
                        .help("Iteration cap for the search"),
                )
                .arg(
                    Arg::with_name("no-validate")
                        .long("no-validate")
                        .help("Skip crate/target count validation"),
                ),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Generate a solvable level on parallel workers")
                .arg(arg_with_default("min-size", "8"))
                .arg(arg_with_default("max-size", "12"))
                .arg(arg_with_default("targets", "2"))
                .arg(arg_with_default("holes", "1"))
                .arg(arg_with_default("seed", "0"))
                .arg(arg_with_default("seed-offset", "1"))
                .arg(arg_with_default("threads", "4"))
                .arg(
                    Arg::with_name("no-entrance-exit")
                        .long("no-entrance-exit")
                        .help("Start on a random floor cell instead of an entrance"),
                )
                .arg(
                    Arg::with_name("wait-all")
                        .long("wait-all")
                        .help("Let every worker finish instead of cancelling after the first win"),
                )
                .arg(
                    Arg::with_name("out")
                        .long("out")
                        .takes_value(true)
                        .help("Write the level (and its solution document) here"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("solve", Some(sub)) => cmd_solve(sub),
        ("generate", Some(sub)) => cmd_generate(sub),
        _ => unreachable!(),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn arg_with_default<'a>(name: &'a str, default: &'a str) -> Arg<'a, 'a> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .default_value(default)
}

fn parsed<T: std::str::FromStr>(matches: &ArgMatches<'_>, name: &str) -> Result<T, Box<dyn Error>>
where
    T::Err: std::fmt::Display,
{
    let raw = matches.value_of(name).unwrap_or_default();
    raw.parse()
        .map_err(|err| format!("--{} {:?}: {}", name, raw, err).into())
}

fn cmd_solve(matches: &ArgMatches<'_>) -> Result<(), Box<dyn Error>> {
    let path = Path::new(matches.value_of("path").unwrap());
    let max_iterations = match matches.value_of("max-iterations") {
        Some(_) => parsed(matches, "max-iterations")?,
        None => DEFAULT_MAX_ITERATIONS,
    };
    let validate = !matches.is_present("no-validate");

    let level_paths: Vec<PathBuf> = if path.is_dir() {
        fs::discover_levels(path)?
    } else {
        vec![path.to_path_buf()]
    };
    if level_paths.is_empty() {
        return Err(format!("no Level<N>.txt files in {}", path.display()).into());
    }

    let mut failures = 0;
    for level_path in &level_paths {
        println!("Solving {}...", level_path.display());
        let text = fs::read_file(level_path)?;
        let state = match parser::parse(&text, validate) {
            Ok(state) => state,
            Err(err) => {
                // a broken file shouldn't kill the whole batch
                eprintln!("Failed to parse {}: {}", level_path.display(), err);
                failures += 1;
                continue;
            }
        };

        let solver = Solver::new(&state);
        let started = Instant::now();
        let outcome = solver.is_solvable(&state, max_iterations, &CancelToken::new());
        let elapsed = started.elapsed();

        println!(
            "States explored: {}",
            outcome.states_explored.separated_string()
        );
        match outcome.status {
            SolveStatus::Solved => {
                let solution = outcome.solution.expect("solved without a path");
                println!("Moves: {}", solution);
                println!("{}", solution.metrics());

                let name = level_name(level_path);
                let doc = SolutionDoc::new(&name, &solution, elapsed.as_millis() as u64);
                let out_path = level_path.with_extension("solution.json");
                fs::write_file(&out_path, &serde_json::to_string_pretty(&doc)?)?;
                println!("Wrote {}", out_path.display());
            }
            SolveStatus::Exhausted => println!("No solution"),
            SolveStatus::BudgetExceeded => println!("No solution within the budget"),
            SolveStatus::Cancelled => println!("Cancelled"),
        }
    }

    if failures > 0 {
        return Err(format!("{} level(s) failed to parse", failures).into());
    }
    Ok(())
}

fn cmd_generate(matches: &ArgMatches<'_>) -> Result<(), Box<dyn Error>> {
    let options = GenerateOptions {
        min_size: parsed(matches, "min-size")?,
        max_size: parsed(matches, "max-size")?,
        target_count: parsed(matches, "targets")?,
        hole_count: parsed(matches, "holes")?,
        use_entrance_exit: !matches.is_present("no-entrance-exit"),
        seed: parsed(matches, "seed")?,
        seed_offset: parsed(matches, "seed-offset")?,
        thread_count: parsed(matches, "threads")?,
        wait_for_full_completion: matches.is_present("wait-all"),
    };

    let outcome = driver::generate_level(&options)?;
    print_metrics(&outcome.metrics);

    let level = match outcome.level {
        Some(level) => level,
        None => return Err("no solvable level produced, try more attempts or threads".into()),
    };

    println!("{}", level.state);
    println!("Solution: {}", level.solution);
    println!("{}", level.solution.metrics());

    if let Some(out) = matches.value_of("out") {
        let out = Path::new(out);
        fs::write_file(out, &parser::render(&level.state))?;

        let doc = SolutionDoc::new(&level_name(out), &level.solution, 0);
        let doc_path = out.with_extension("solution.json");
        fs::write_file(&doc_path, &serde_json::to_string_pretty(&doc)?)?;
        println!("Wrote {} and {}", out.display(), doc_path.display());
    }

    Ok(())
}

fn print_metrics(metrics: &[sokogen::generator::WorkerMetrics]) {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("worker"),
        Cell::new("seed"),
        Cell::new("attempts"),
        Cell::new("states"),
        Cell::new("ms"),
        Cell::new("solved"),
    ]));
    for m in metrics {
        table.add_row(Row::new(vec![
            Cell::new(&m.worker.to_string()),
            Cell::new(&m.seed.to_string()),
            Cell::new(&m.attempts.to_string()),
            Cell::new(&m.states_explored.separated_string()),
            Cell::new(&m.elapsed.as_millis().to_string()),
            Cell::new(if m.solved { "yes" } else { "no" }),
        ]));
    }
    table.printstd();
}

fn level_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Level")
        .to_owned()
}
