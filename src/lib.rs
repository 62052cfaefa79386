//! This crate provides a parser and an execution engine for a line-oriented Turing machine
//! language. A program declares its alphabet, one instruction table per state and an optional
//! initial tape; the machine runs it on a single unbounded tape until an instruction halts it.
//!
//! ```text
//! SYMBOLS
//! _          ;; the first symbol is the blank
//! 1
//! END
//! STATE 0
//! READ 1 WRITE 1 MOVE RIGHT NEXT 0
//! READ _ WRITE 1 MOVE RIGHT NEXT HALT
//! END
//! INITIAL 111
//! ```

pub mod loader;
pub mod machine;
pub mod parser;
pub mod source;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the source module, used by the `pest` grammar.
pub use crate::source::Rule;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the machine and its configuration from the machine module.
pub use machine::{MachineConfig, RunReport, TuringMachine};
/// Re-exports the parsing entry points from the parser module.
pub use parser::{parse, parse_with_warnings};
pub use tape::Tape;
/// Re-exports the program model, execution results and error types from the types module.
pub use types::{
    Direction, Halt, Instruction, Next, ParseErrorKind, Program, State, StateId, Step,
    TuringMachineError, Warning,
};

/// Parses `input`, runs it until it halts, and returns the rendered final tape.
///
/// A program that never halts makes this function loop forever.
pub fn interpret(input: &str) -> Result<String, TuringMachineError> {
    let mut machine = TuringMachine::new(parse(input)?);

    match machine.run() {
        Step::Halt(Halt::Err(e)) => Err(e),
        _ => Ok(machine.tape().render()),
    }
}
