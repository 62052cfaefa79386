use clap::Parser;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::process::ExitCode;
use tmi::{Halt, MachineConfig, ProgramLoader, Step, TuringMachine};

/// Runs a Turing machine program and prints the final tape.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmi programs/increment.tm
  tmi --trace --max-steps 100 programs/busy-beaver-3.tm")]
struct Cli {
    /// The program file to execute
    program: PathBuf,

    /// Stop with an error after this many steps instead of running until the program halts
    #[clap(long, value_name = "N")]
    max_steps: Option<usize>,

    /// Print the machine configuration after every step
    #[clap(short = 't', long)]
    trace: bool,

    /// Print the final configuration as JSON
    #[clap(long)]
    json: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors, hiding parser warnings
    #[clap(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version print to stdout and succeed
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    initialize_logging(&cli);

    let program = match ProgramLoader::load_program(&cli.program) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "loaded {} with {} states",
        cli.program.display(),
        program.states.len()
    );

    let config = MachineConfig {
        step_limit: cli.max_steps,
    };
    let mut machine = TuringMachine::with_config(program, config);

    if let Step::Halt(Halt::Err(e)) = run(&mut machine, cli.trace) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.json {
        match serde_json::to_string_pretty(&machine.report()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("Final tape:");
        println!("{}", machine.tape());
    }

    ExitCode::SUCCESS
}

/// Runs the machine to completion, printing every configuration when `trace` is set.
fn run(machine: &mut TuringMachine, trace: bool) -> Step {
    if !trace {
        return machine.run();
    }

    print_state(machine);
    loop {
        let step = machine.step();
        if let Step::Halt(Halt::Err(_)) = step {
            return step;
        }

        print_state(machine);
        if step != Step::Continue {
            println!("\nMachine halted.\n");
            return step;
        }
    }
}

fn print_state(machine: &TuringMachine) {
    println!(
        "Step: {}, State: {}, Head: {}, Tape: {}",
        machine.step_count(),
        machine.state(),
        machine.tape().head(),
        machine.tape()
    );
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}",
                record.level().to_string().to_lowercase(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .ok();
}
