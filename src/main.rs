use clap::{App, Arg};
use dpllsat::formula::dimacs::{parse, parse_file, write_result};
use dpllsat::*;
use log::info;
use std::time::Instant;

fn main() {
    env_logger::init();

    let matches = App::new("dpllsat")
        .about("DPLL satisfiability solver for DIMACS CNF")
        .arg(Arg::with_name("INPUT").help("input file (in CNF); reads stdin if absent").index(1))
        .arg(
            Arg::with_name("max-decisions")
                .long("max-decisions")
                .value_name("N")
                .help("give up with UNKNOWN after N branching decisions")
                .takes_value(true),
        )
        .get_matches();

    let max_decisions = match matches.value_of("max-decisions").map(str::parse::<usize>) {
        None => None,
        Some(Ok(n)) => Some(n),
        Some(Err(e)) => {
            eprintln!("invalid --max-decisions: {}", e);
            std::process::exit(-1);
        }
    };

    let f = if let Some(path) = matches.value_of("INPUT") {
        parse_file(path)
    } else {
        parse(std::io::stdin())
    };

    match f {
        Ok(f) => {
            info!("{} variables, {} clauses", f.num_variables(), f.num_clauses());

            let start = Instant::now();
            let result = match max_decisions {
                Some(n) => Solver::with_interrupt(&f, DecisionBudget::new(n)).solve(),
                None => solve(&f),
            };
            info!("answer found after {:?}", start.elapsed());

            if let Err(e) = write_result(std::io::stdout().lock(), &result) {
                eprintln!("error writing result: {}", e);
                std::process::exit(-1);
            }

            let exit_code = match result {
                SatResult::Satisfiable(_) => 0,
                SatResult::Unsatisfiable => 1,
                SatResult::Unknown => 2,
            };
            std::process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("parse error: {}", e);
            std::process::exit(-1);
        }
    }
}
