//! This module defines the core data structures and types used throughout the interpreter,
//! including the program representation, instructions, execution results, and error types.

use serde::{Deserialize, Serialize};
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Identifier of a machine state. Execution always starts in state `0`.
pub type StateId = usize;

/// The state every program starts in.
pub const INITIAL_STATE: StateId = 0;

/// The reserved words of the source language.
///
/// Keywords are matched case-sensitively and only in the positions the grammar allows them,
/// so a symbol may share its spelling with the first letter of a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Symbols,
    End,
    State,
    Read,
    Write,
    Move,
    Next,
    Halt,
    Left,
    Right,
    Initial,
}

impl Keyword {
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Symbols => "SYMBOLS",
            Keyword::End => "END",
            Keyword::State => "STATE",
            Keyword::Read => "READ",
            Keyword::Write => "WRITE",
            Keyword::Move => "MOVE",
            Keyword::Next => "NEXT",
            Keyword::Halt => "HALT",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Initial => "INITIAL",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one cell to the left.
    Left,
    /// Move the head one cell to the right.
    Right,
}

impl Direction {
    /// Parses the `LEFT`/`RIGHT` keyword of a `MOVE` clause.
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token {
            t if t == Keyword::Left.as_str() => Some(Direction::Left),
            t if t == Keyword::Right.as_str() => Some(Direction::Right),
            _ => None,
        }
    }

    /// The change in head offset caused by this move.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    pub fn keyword(self) -> Keyword {
        match self {
            Direction::Left => Keyword::Left,
            Direction::Right => Keyword::Right,
        }
    }
}

/// Where the machine goes after an instruction fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Next {
    /// Continue in the given state.
    State(StateId),
    /// Stop the machine.
    Halt,
}

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::State(id) => write!(f, "{id}"),
            Next::Halt => write!(f, "{}", Keyword::Halt),
        }
    }
}

/// A single `READ .. WRITE .. MOVE .. NEXT ..` line of a state block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The symbol that must be under the head for this instruction to fire.
    pub read: char,
    /// The symbol written to the current cell.
    pub write: char,
    /// The direction the head moves after writing.
    pub direction: Direction,
    /// The state to continue in, or [`Next::Halt`].
    pub next: Next,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            Keyword::Read,
            self.read,
            Keyword::Write,
            self.write,
            Keyword::Move,
            self.direction.keyword(),
            Keyword::Next,
            self.next
        )
    }
}

/// The instructions of one state, keyed by their read symbol.
///
/// A state holds at most one instruction per read symbol. Inserting a second instruction for
/// a symbol that is already present keeps the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Instruction>", into = "Vec<Instruction>")]
pub struct State {
    instructions: BTreeMap<char, Instruction>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction, returning `false` if one with the same read symbol already exists.
    /// In that case the state is left unchanged.
    pub fn insert(&mut self, instruction: Instruction) -> bool {
        match self.instructions.entry(instruction.read) {
            Entry::Vacant(entry) => {
                entry.insert(instruction);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Returns the instruction that fires when `symbol` is under the head.
    pub fn get(&self, symbol: char) -> Option<&Instruction> {
        self.instructions.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Iterates the instructions in ascending order of read symbol.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }
}

impl FromIterator<Instruction> for State {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        let mut state = State::new();
        for instruction in iter {
            state.insert(instruction);
        }
        state
    }
}

impl From<Vec<Instruction>> for State {
    fn from(instructions: Vec<Instruction>) -> Self {
        instructions.into_iter().collect()
    }
}

impl From<State> for Vec<Instruction> {
    fn from(state: State) -> Self {
        state.instructions.into_values().collect()
    }
}

/// A parsed and validated program.
///
/// Every instruction only reads and writes symbols of the alphabet, the initial tape only holds
/// symbols of the alphabet, and state `0` is always present. States referenced by a `NEXT`
/// clause are not required to exist until the machine reaches them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// The declared symbols.
    pub alphabet: BTreeSet<char>,
    /// The first declared symbol, filling every cell that was never written.
    pub blank: char,
    /// The instruction table of every declared state.
    pub states: BTreeMap<StateId, State>,
    /// The tape contents loaded at offsets `0..len` before execution.
    pub initial_tape: Vec<char>,
}

impl Program {
    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(&id)
    }

    /// Looks up the instruction for `symbol` in state `id`.
    pub fn instruction(&self, id: StateId, symbol: char) -> Option<&Instruction> {
        self.state(id).and_then(|state| state.get(symbol))
    }

    pub fn contains_symbol(&self, symbol: char) -> bool {
        self.alphabet.contains(&symbol)
    }
}

/// Represents the outcome of an execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine has stopped.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// A `NEXT HALT` instruction was executed.
    Ok,

    Err(TuringMachineError),
}

/// Names the block an `END` line was expected to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Symbols,
    State(StateId),
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Symbols => write!(f, "{}", Keyword::Symbols),
            Block::State(id) => write!(f, "{} {id}", Keyword::State),
        }
    }
}

/// The reason a program was rejected by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("File should start with 'SYMBOLS'")]
    MissingSymbolsHeader,
    #[error("Symbols should be exactly 1 character long, not '{0}'")]
    InvalidSymbol(String),
    #[error("Expected 'END' to close the {0} block")]
    UnterminatedBlock(Block),
    #[error("Empty symbols list")]
    EmptyAlphabet,
    #[error(
        "Instructions should look like 'READ <symbol> WRITE <symbol> MOVE <LEFT|RIGHT> NEXT <number|HALT>'"
    )]
    MalformedInstruction,
    #[error("'{0}' is not a valid symbol to read")]
    InvalidReadSymbol(String),
    #[error("'{0}' is not a valid symbol to write")]
    InvalidWriteSymbol(String),
    #[error("'{0}' is not a valid direction, expected LEFT or RIGHT")]
    InvalidDirection(String),
    #[error("The next state should be a number or HALT, not '{0}'")]
    InvalidNextState(String),
    #[error("States should start with 'STATE 0'")]
    MissingInitialState,
    #[error("States should have a number, not '{0}'")]
    InvalidStateId(String),
    #[error("Invalid symbol(s) {0:?} in initial tape")]
    InvalidTapeSymbols(Vec<char>),
}

/// Represents the errors that can occur while loading, parsing, or running a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The program text violates the language. `report` points at the offending source span.
    #[error("Program parsing error: {report}")]
    ParseError {
        kind: ParseErrorKind,
        report: Box<pest::error::Error<Rule>>,
    },
    /// The line grammar rejected the input before any directive was examined.
    #[error("Program parsing error: {0}")]
    GrammarError(Box<pest::error::Error<Rule>>),
    /// The machine moved into a state that has no block in the program.
    #[error("{0} is not a defined state")]
    UndefinedState(StateId),
    /// The current state has no instruction for the symbol under the head.
    #[error("State {state} did not have a READ instruction for the symbol '{symbol}'")]
    UndefinedTransition { state: StateId, symbol: char },
    /// The configured step limit was reached before the machine halted.
    #[error("Step limit of {0} reached before the machine halted")]
    StepLimitExceeded(usize),
    /// Indicates an error while reading a program file.
    #[error("File error: {0}")]
    FileError(String),
}

impl TuringMachineError {
    /// Returns the parse failure reason, if this is a parse error.
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            TuringMachineError::ParseError { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// A non-fatal problem found while parsing. Line numbers refer to the physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    DuplicateSymbol { symbol: char, line: usize },
    DuplicateInstruction { state: StateId, read: char, line: usize },
    StateRedeclared { state: StateId, line: usize },
    MissingInitialTape,
    EmptyInitialTape { line: usize },
    IgnoredContent { line: usize, text: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicateSymbol { symbol, line } => {
                write!(f, "duplicate symbol '{symbol}' (line {line})")
            }
            Warning::DuplicateInstruction { state, read, line } => write!(
                f,
                "an instruction reading '{read}' was already defined for state {state}, ignoring the redefinition on line {line}"
            ),
            Warning::StateRedeclared { state, line } => write!(
                f,
                "state {state} is already declared, the block on line {line} extends it"
            ),
            Warning::MissingInitialTape => {
                write!(f, "no initial tape given, defaulting to a single blank cell")
            }
            Warning::EmptyInitialTape { line } => write!(
                f,
                "initial tape on line {line} is empty, defaulting to a single blank cell"
            ),
            Warning::IgnoredContent { line, text } => {
                write!(f, "ignoring unexpected content on line {line}: '{text}'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(read: char, write: char, next: Next) -> Instruction {
        Instruction {
            read,
            write,
            direction: Direction::Right,
            next,
        }
    }

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_direction_keywords() {
        assert_eq!(Direction::from_keyword("LEFT"), Some(Direction::Left));
        assert_eq!(Direction::from_keyword("RIGHT"), Some(Direction::Right));
        assert_eq!(Direction::from_keyword("right"), None);
        assert_eq!(Direction::from_keyword("L"), None);
        assert_eq!(Direction::Left.delta(), -1);
        assert_eq!(Direction::Right.delta(), 1);
    }

    #[test]
    fn test_state_keeps_first_instruction_per_read_symbol() {
        let mut state = State::new();

        assert!(state.insert(instruction('a', 'b', Next::State(1))));
        assert!(!state.insert(instruction('a', 'c', Next::Halt)));
        assert!(state.insert(instruction('b', 'b', Next::Halt)));

        assert_eq!(state.len(), 2);
        assert_eq!(state.get('a').unwrap().write, 'b');
        assert_eq!(state.get('a').unwrap().next, Next::State(1));
        assert!(state.get('c').is_none());
    }

    #[test]
    fn test_state_deserialization_enforces_uniqueness() {
        let json = r#"[
            {"read":"a","write":"x","direction":"Left","next":"Halt"},
            {"read":"a","write":"y","direction":"Right","next":{"State":2}}
        ]"#;

        let state: State = serde_json::from_str(json).unwrap();

        assert_eq!(state.len(), 1);
        assert_eq!(state.get('a').unwrap().write, 'x');
    }

    #[test]
    fn test_instruction_display() {
        let halting = Instruction {
            read: '0',
            write: '1',
            direction: Direction::Left,
            next: Next::Halt,
        };
        assert_eq!(
            halting.to_string(),
            "READ 0 WRITE 1 MOVE LEFT NEXT HALT"
        );
        assert_eq!(
            instruction('a', 'b', Next::State(12)).to_string(),
            "READ a WRITE b MOVE RIGHT NEXT 12"
        );
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::UndefinedState(5);
        assert_eq!(error.to_string(), "5 is not a defined state");

        let error = TuringMachineError::UndefinedTransition {
            state: 2,
            symbol: 'x',
        };
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("State 2"));
        assert!(error_msg.contains("'x'"));
    }

    #[test]
    fn test_unterminated_block_names_the_block() {
        assert_eq!(
            ParseErrorKind::UnterminatedBlock(Block::State(3)).to_string(),
            "Expected 'END' to close the STATE 3 block"
        );
        assert_eq!(
            ParseErrorKind::UnterminatedBlock(Block::Symbols).to_string(),
            "Expected 'END' to close the SYMBOLS block"
        );
    }
}
