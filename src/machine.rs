//! This module defines the `TuringMachine` struct, which executes a parsed `Program` on a
//! single tape. It tracks the current state, applies instructions, and reports halts and
//! runtime errors.

use crate::tape::Tape;
use crate::types::{
    Halt, Instruction, Next, Program, StateId, Step, TuringMachineError, INITIAL_STATE,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Execution settings for a `TuringMachine`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Maximum number of steps before execution stops with an error.
    /// `None` runs until the program halts, which may be never.
    pub step_limit: Option<usize>,
}

impl MachineConfig {
    pub fn with_step_limit(limit: usize) -> Self {
        Self {
            step_limit: Some(limit),
        }
    }
}

/// A single-tape Turing machine executing a `Program`.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    program: Program,
    config: MachineConfig,
    state: StateId,
    tape: Tape,
    step_count: usize,
    halted: bool,
}

impl TuringMachine {
    /// Creates a machine in state `0` with the head on offset `0` of the program's initial tape.
    /// Execution is unbounded.
    pub fn new(program: Program) -> Self {
        Self::with_config(program, MachineConfig::default())
    }

    pub fn with_config(program: Program, config: MachineConfig) -> Self {
        let tape = Tape::new(program.blank, &program.initial_tape);

        Self {
            program,
            config,
            state: INITIAL_STATE,
            tape,
            step_count: 0,
            halted: false,
        }
    }

    /// Executes a single instruction.
    ///
    /// The instruction for the current state and the symbol under the head writes its symbol,
    /// moves the head and then either selects the next state or halts the machine.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine moved to another state.
    /// * `Step::Halt(Halt::Ok)` if a `NEXT HALT` instruction was executed, or the machine had
    ///   already halted.
    /// * `Step::Halt(Halt::Err(_))` if the state is undefined, no instruction matches, or the
    ///   step limit was reached. The machine is left unchanged.
    pub fn step(&mut self) -> Step {
        if self.halted {
            return Step::Halt(Halt::Ok);
        }

        if let Some(limit) = self.config.step_limit {
            if self.step_count >= limit {
                return Step::Halt(Halt::Err(TuringMachineError::StepLimitExceeded(limit)));
            }
        }

        let instruction = match self.lookup() {
            Ok(instruction) => *instruction,
            Err(e) => return Step::Halt(Halt::Err(e)),
        };

        trace!(
            "step {}: state {} at offset {}: {}",
            self.step_count,
            self.state,
            self.tape.head(),
            instruction
        );

        self.tape.write(instruction.write);
        self.tape.shift(instruction.direction);
        self.step_count += 1;

        match instruction.next {
            Next::State(next) => {
                self.state = next;
                Step::Continue
            }
            Next::Halt => {
                self.halted = true;
                debug!(
                    "halted in state {} after {} steps",
                    self.state, self.step_count
                );
                Step::Halt(Halt::Ok)
            }
        }
    }

    /// Runs the machine until it halts or fails.
    ///
    /// Without a step limit a program that never halts keeps this loop running forever.
    pub fn run(&mut self) -> Step {
        loop {
            match self.step() {
                Step::Continue => continue,
                halt => return halt,
            }
        }
    }

    /// Restores state `0`, the initial tape, and a zero step count.
    pub fn reset(&mut self) {
        self.state = INITIAL_STATE;
        self.tape = Tape::new(self.program.blank, &self.program.initial_tape);
        self.step_count = 0;
        self.halted = false;
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the total number of instructions executed.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Checks if the machine has executed a `NEXT HALT` instruction.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the instruction the next step would execute, if there is one.
    pub fn instruction(&self) -> Option<&Instruction> {
        self.lookup().ok()
    }

    /// Summarizes the current configuration.
    pub fn report(&self) -> RunReport {
        let bounds = self.tape.bounds();

        RunReport {
            tape: self.tape.render(),
            head: self.tape.head(),
            leftmost: *bounds.start(),
            rightmost: *bounds.end(),
            state: self.state,
            steps: self.step_count,
            halted: self.halted,
        }
    }

    fn lookup(&self) -> Result<&Instruction, TuringMachineError> {
        let state = self
            .program
            .state(self.state)
            .ok_or(TuringMachineError::UndefinedState(self.state))?;
        let symbol = self.tape.read();

        state
            .get(symbol)
            .ok_or(TuringMachineError::UndefinedTransition {
                state: self.state,
                symbol,
            })
    }
}

/// A serializable snapshot of a machine's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// The rendered tape, see [`Tape::render`].
    pub tape: String,
    pub head: i64,
    pub leftmost: i64,
    pub rightmost: i64,
    pub state: StateId,
    pub steps: usize,
    pub halted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, State};
    use std::collections::{BTreeMap, BTreeSet};

    fn instruction(read: char, write: char, direction: Direction, next: Next) -> Instruction {
        Instruction {
            read,
            write,
            direction,
            next,
        }
    }

    fn create_program(states: Vec<(StateId, Vec<Instruction>)>, initial: &str) -> Program {
        Program {
            alphabet: BTreeSet::from(['0', '1']),
            blank: '0',
            states: states
                .into_iter()
                .map(|(id, instructions)| (id, State::from(instructions)))
                .collect::<BTreeMap<_, _>>(),
            initial_tape: initial.chars().collect(),
        }
    }

    /// Writes a 1 on every blank until it reads a 1.
    fn create_fill_program(initial: &str) -> Program {
        create_program(
            vec![(
                0,
                vec![
                    instruction('0', '1', Direction::Right, Next::State(0)),
                    instruction('1', '1', Direction::Right, Next::Halt),
                ],
            )],
            initial,
        )
    }

    #[test]
    fn test_machine_creation() {
        let machine = TuringMachine::new(create_fill_program("001"));

        assert_eq!(machine.state(), 0);
        assert_eq!(machine.tape().render(), "0 0 1");
        assert_eq!(machine.tape().head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert!(!machine.is_halted());
    }

    #[test]
    fn test_single_step() {
        let mut machine = TuringMachine::new(create_fill_program("001"));

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.tape().render(), "1 0 1");
        assert_eq!(machine.tape().head(), 1);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_run_to_halt() {
        let mut machine = TuringMachine::new(create_fill_program("001"));

        assert_eq!(machine.run(), Step::Halt(Halt::Ok));
        assert!(machine.is_halted());
        assert_eq!(machine.step_count(), 3);
        assert_eq!(machine.tape().head(), 3);
        assert_eq!(machine.tape().render(), "1 1 1 0");
    }

    #[test]
    fn test_step_after_halt_changes_nothing() {
        let mut machine = TuringMachine::new(create_fill_program("1"));

        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
        let tape = machine.tape().clone();

        assert_eq!(machine.step(), Step::Halt(Halt::Ok));
        assert_eq!(machine.tape(), &tape);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_undefined_state() {
        let program = create_program(
            vec![(
                0,
                vec![instruction('0', '1', Direction::Left, Next::State(5))],
            )],
            "0",
        );
        let mut machine = TuringMachine::new(program);

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(
            machine.step(),
            Step::Halt(Halt::Err(TuringMachineError::UndefinedState(5)))
        );
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_undefined_transition() {
        let program = create_program(
            vec![(
                0,
                vec![instruction('1', '1', Direction::Left, Next::Halt)],
            )],
            "0",
        );
        let mut machine = TuringMachine::new(program);

        assert!(machine.instruction().is_none());
        match machine.run() {
            Step::Halt(Halt::Err(TuringMachineError::UndefinedTransition { state, symbol })) => {
                assert_eq!(state, 0);
                assert_eq!(symbol, '0');
            }
            other => panic!("Expected an undefined transition, but got {:?}", other),
        }
    }

    #[test]
    fn test_step_limit() {
        // Never halts: keeps moving right over blanks
        let program = create_program(
            vec![(
                0,
                vec![instruction('0', '0', Direction::Right, Next::State(0))],
            )],
            "0",
        );
        let mut machine = TuringMachine::with_config(program, MachineConfig::with_step_limit(25));

        assert_eq!(
            machine.run(),
            Step::Halt(Halt::Err(TuringMachineError::StepLimitExceeded(25)))
        );
        assert_eq!(machine.step_count(), 25);
        assert_eq!(machine.tape().bounds(), 0..=25);
    }

    #[test]
    fn test_reset() {
        let mut machine = TuringMachine::new(create_fill_program("01"));

        machine.run();
        assert!(machine.is_halted());

        machine.reset();
        assert_eq!(machine.state(), 0);
        assert_eq!(machine.tape().render(), "0 1");
        assert_eq!(machine.step_count(), 0);
        assert!(!machine.is_halted());

        assert_eq!(machine.run(), Step::Halt(Halt::Ok));
        assert_eq!(machine.tape().render(), "1 1 0");
    }

    #[test]
    fn test_moving_left_extends_tape() {
        let program = create_program(
            vec![
                (
                    0,
                    vec![instruction('1', '1', Direction::Left, Next::State(1))],
                ),
                (
                    1,
                    vec![instruction('0', '1', Direction::Left, Next::Halt)],
                ),
            ],
            "1",
        );
        let mut machine = TuringMachine::new(program);

        assert_eq!(machine.run(), Step::Halt(Halt::Ok));
        assert_eq!(machine.tape().bounds(), -2..=0);
        assert_eq!(machine.tape().render(), "0 1 1");
    }

    #[test]
    fn test_report() {
        let mut machine = TuringMachine::new(create_fill_program("01"));
        machine.run();

        let report = machine.report();
        assert_eq!(report.tape, "1 1 0");
        assert_eq!(report.head, 2);
        assert_eq!(report.leftmost, 0);
        assert_eq!(report.rightmost, 2);
        assert_eq!(report.steps, 2);
        assert!(report.halted);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tape\":\"1 1 0\""));
    }
}
