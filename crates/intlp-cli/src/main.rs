use clap::{Args, Parser, Subcommand, ValueEnum};
use intlp_solver::{BranchAndBoundSolver, Matrix, Problem, Solution, SolutionStatus, Solver, TwoPhaseSimplexSolver};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "intlp")]
#[command(about = "Solve small integer linear programs with branch and bound", long_about = None)]
struct Cli {
    /// Log solver progress to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one of the built-in example problems
    Example {
        /// Which example to solve
        #[arg(value_enum)]
        name: ExampleName,
        #[command(flatten)]
        options: SolveOptions,
    },
    /// Solve a problem stored as JSON
    Solve {
        /// File with `objective`, `constraints`, `rhs` and optional `integer_variables`
        file: PathBuf,
        #[command(flatten)]
        options: SolveOptions,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExampleName {
    /// maximize 2x + 3y s.t. 3x + 2y <= 13, 4x + 5y <= 11
    Homework,
    /// maximize x + y s.t. x + y <= 1
    Unit,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Args)]
struct SolveOptions {
    /// Integrality tolerance
    #[arg(short, long, default_value_t = 0.0001)]
    epsilon: f64,
    /// Explore the node with the best relaxation bound first instead of depth-first
    #[arg(long)]
    best_first: bool,
    /// Only solve the continuous relaxation
    #[arg(long)]
    relaxation: bool,
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    format: Format,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 {
        let level = if cli.verbose > 1 { Level::TRACE } else { Level::DEBUG };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
            std::process::exit(1);
        }
    }

    let (problem, options) = match cli.command {
        Commands::Example { name, options } => match example(name) {
            Ok(p) => (p, options),
            Err(e) => {
                eprintln!("Invalid example: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Solve { file, options } => {
            let source = match std::fs::read_to_string(&file) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading file: {}", e);
                    std::process::exit(1);
                }
            };
            match serde_json::from_str::<Problem>(&source) {
                Ok(p) => (p, options),
                Err(e) => {
                    eprintln!("Invalid problem: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let lp = TwoPhaseSimplexSolver::new();
    let solution = if options.relaxation {
        lp.run(&problem)
    } else {
        BranchAndBoundSolver::new(&lp, options.epsilon, !options.best_first).run(&problem)
    };

    match options.format {
        Format::Json => print_json(&solution),
        Format::Pretty => print_pretty(&solution),
    }
}

/// The fixed problems the solver was first written for
fn example(name: ExampleName) -> intlp_solver::Result<Problem> {
    match name {
        ExampleName::Homework => Problem::new(
            Matrix::from_vec(&[2.0, 3.0])?,
            Matrix::from_rows(vec![vec![3.0, 2.0], vec![4.0, 5.0]])?,
            Matrix::from_vec(&[13.0, 11.0])?,
        ),
        ExampleName::Unit => Problem::new(
            Matrix::from_vec(&[1.0, 1.0])?,
            Matrix::from_rows(vec![vec![1.0, 1.0]])?,
            Matrix::from_vec(&[1.0])?,
        ),
    }
}

fn print_pretty(solution: &Solution) {
    match solution.status() {
        SolutionStatus::Unbounded => println!("The problem is unbounded."),
        SolutionStatus::Infeasible => println!("The problem is infeasible."),
        SolutionStatus::Optimal => {
            println!("Optimal solution found: z = {}", solution.objective_value);
            println!("Solution: {:?}", solution.values);
        }
    }
}

fn print_json(solution: &Solution) {
    // serde_json cannot represent the infinite sentinels, so report the status
    // next to the values instead
    let objective = match solution.status() {
        SolutionStatus::Optimal => serde_json::json!(solution.objective_value),
        _ => serde_json::Value::Null,
    };
    let output = serde_json::json!({
        "status": solution.status(),
        "objective_value": objective,
        "values": solution.values,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).unwrap_or_else(|e| format!("Error: {}", e))
    );
}
