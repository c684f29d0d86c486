use clap::Parser;
use plan_cli::args::{Cli, Command};
use plan_cli::outcome::exit_code;
use plan_cli::{ma_run, solve};

fn main() {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::Uptime::from(std::time::Instant::now()))
        .with_max_level(cli.log_level)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a tracing subscriber was already installed");
    }

    let result = match &cli.command {
        Command::Solve(args) => solve::run(args),
        Command::Ma(args) => ma_run::run(args),
    };

    let code = match result {
        Ok(outcome) => {
            match &outcome {
                plan_cli::outcome::Outcome::Found(path) => {
                    println!("plan found, {} steps", path.ops.len());
                }
                plan_cli::outcome::Outcome::NotFound => println!("no plan exists"),
                plan_cli::outcome::Outcome::Aborted(reason) => println!("search aborted: {reason}"),
                plan_cli::outcome::Outcome::MaxTime => println!("aborted: time limit exceeded"),
                plan_cli::outcome::Outcome::MaxMemory => println!("aborted: memory limit exceeded"),
            }
            exit_code(&outcome)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };

    std::process::exit(code);
}
