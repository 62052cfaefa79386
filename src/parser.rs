//! This module parses machine descriptions into a validated `Program`.
//!
//! Parsing runs in stages over the logical lines produced by [`Source`]: the `SYMBOLS` block,
//! the `STATE 0` block followed by any further state blocks, and the optional `INITIAL` tape.
//! Each stage consumes lines from a starting index and returns the index of the first line it
//! did not consume.

use crate::{
    source::{parse_error, Line, Source},
    types::{
        Block, Direction, Instruction, Keyword, Next, ParseErrorKind, Program, State, StateId,
        TuringMachineError, Warning, INITIAL_STATE,
    },
};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Parses the given input string into a `Program`.
///
/// This is the main entry point for parsing program definitions. Non-fatal problems are
/// reported through the `log` facade at `warn` level.
///
/// # Arguments
///
/// * `input` - A string slice containing the program definition.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` pointing at the offending line otherwise.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    let (program, warnings) = parse_with_warnings(input)?;

    for warning in &warnings {
        warn!("{warning}");
    }

    Ok(program)
}

/// Parses the given input string, returning the warnings instead of logging them.
pub fn parse_with_warnings(input: &str) -> Result<(Program, Vec<Warning>), TuringMachineError> {
    let source = Source::load(input)?;
    let mut warnings = Vec::new();

    let (alphabet, next, blank) = parse_symbols(&source, &mut warnings)?;
    let (states, next) = parse_states(&source, next, &alphabet, &mut warnings)?;
    let (initial_tape, next) =
        parse_initial_tape(&source, next, &alphabet, blank, &mut warnings)?;

    warnings.extend(source.lines()[next..].iter().map(|line| Warning::IgnoredContent {
        line: line.number(),
        text: line.text().to_string(),
    }));

    Ok((
        Program {
            alphabet,
            blank,
            states,
            initial_tape,
        },
        warnings,
    ))
}

/// Parses the leading `SYMBOLS ... END` block.
///
/// Returns the alphabet, the index of the first line after `END`, and the blank symbol, which
/// is the first symbol in declaration order.
fn parse_symbols(
    source: &Source,
    warnings: &mut Vec<Warning>,
) -> Result<(BTreeSet<char>, usize, char), TuringMachineError> {
    let header = source
        .get(0)
        .ok_or_else(|| source.error_at_end(ParseErrorKind::MissingSymbolsHeader))?;
    if !is_keyword(header, Keyword::Symbols) {
        return Err(header.error(ParseErrorKind::MissingSymbolsHeader));
    }

    let mut alphabet = BTreeSet::new();
    let mut blank = None;
    let mut index = 1;

    loop {
        let line = source
            .get(index)
            .ok_or_else(|| header.error(ParseErrorKind::UnterminatedBlock(Block::Symbols)))?;
        if is_keyword(line, Keyword::End) {
            break;
        }

        let symbol = single_char(line.text())
            .ok_or_else(|| line.error(ParseErrorKind::InvalidSymbol(line.text().to_string())))?;

        if !alphabet.insert(symbol) {
            warnings.push(Warning::DuplicateSymbol {
                symbol,
                line: line.number(),
            });
        }
        blank.get_or_insert(symbol);
        index += 1;
    }

    let blank = blank.ok_or_else(|| header.error(ParseErrorKind::EmptyAlphabet))?;

    // + 1 skips the END line
    Ok((alphabet, index + 1, blank))
}

/// Parses a single `READ <s> WRITE <s> MOVE <LEFT|RIGHT> NEXT <n|HALT>` line.
pub fn parse_instruction(
    line: &Line,
    alphabet: &BTreeSet<char>,
) -> Result<Instruction, TuringMachineError> {
    let [read_kw, read, write_kw, write, move_kw, direction, next_kw, next] = line.words()[..]
    else {
        return Err(line.error(ParseErrorKind::MalformedInstruction));
    };

    let keywords = [
        (read_kw, Keyword::Read),
        (write_kw, Keyword::Write),
        (move_kw, Keyword::Move),
        (next_kw, Keyword::Next),
    ];
    if keywords.iter().any(|(word, kw)| word.as_str() != kw.as_str()) {
        return Err(line.error(ParseErrorKind::MalformedInstruction));
    }

    let read_symbol = alphabet_symbol(read.as_str(), alphabet).ok_or_else(|| {
        parse_error(ParseErrorKind::InvalidReadSymbol(read.as_str().into()), read)
    })?;
    let write_symbol = alphabet_symbol(write.as_str(), alphabet).ok_or_else(|| {
        parse_error(ParseErrorKind::InvalidWriteSymbol(write.as_str().into()), write)
    })?;
    let direction_value = Direction::from_keyword(direction.as_str()).ok_or_else(|| {
        parse_error(
            ParseErrorKind::InvalidDirection(direction.as_str().into()),
            direction,
        )
    })?;
    let next_value = parse_next(next.as_str()).ok_or_else(|| {
        parse_error(ParseErrorKind::InvalidNextState(next.as_str().into()), next)
    })?;

    Ok(Instruction {
        read: read_symbol,
        write: write_symbol,
        direction: direction_value,
        next: next_value,
    })
}

/// Parses the mandatory `STATE 0` block and every state block that follows it.
///
/// A state declared in more than one block collects the instructions of all of them. Parsing
/// stops at the first line that does not start with `STATE`.
fn parse_states(
    source: &Source,
    start: usize,
    alphabet: &BTreeSet<char>,
    warnings: &mut Vec<Warning>,
) -> Result<(BTreeMap<StateId, State>, usize), TuringMachineError> {
    let header = source
        .get(start)
        .ok_or_else(|| source.error_at_end(ParseErrorKind::MissingInitialState))?;
    if header.text() != format!("{} {INITIAL_STATE}", Keyword::State) {
        return Err(header.error(ParseErrorKind::MissingInitialState));
    }

    let mut states = BTreeMap::new();
    let mut index = parse_state_block(
        source,
        start,
        INITIAL_STATE,
        alphabet,
        &mut states,
        warnings,
    )?;

    while let Some(header) = source.get(index) {
        let Some(id) = header.text().strip_prefix(Keyword::State.as_str()) else {
            break;
        };

        let id = id.trim();
        let id = parse_state_id(id)
            .ok_or_else(|| header.error(ParseErrorKind::InvalidStateId(id.to_string())))?;

        if states.contains_key(&id) {
            warnings.push(Warning::StateRedeclared {
                state: id,
                line: header.number(),
            });
        }

        index = parse_state_block(source, index, id, alphabet, &mut states, warnings)?;
    }

    Ok((states, index))
}

/// Parses the instructions of the block whose header is at `header_index` into state `id`.
///
/// Returns the index of the first line after the block's `END`.
fn parse_state_block(
    source: &Source,
    header_index: usize,
    id: StateId,
    alphabet: &BTreeSet<char>,
    states: &mut BTreeMap<StateId, State>,
    warnings: &mut Vec<Warning>,
) -> Result<usize, TuringMachineError> {
    let header = &source.lines()[header_index];
    let state = states.entry(id).or_default();
    let mut index = header_index + 1;

    loop {
        let line = source
            .get(index)
            .ok_or_else(|| header.error(ParseErrorKind::UnterminatedBlock(Block::State(id))))?;
        if is_keyword(line, Keyword::End) {
            return Ok(index + 1);
        }

        let instruction = parse_instruction(line, alphabet)?;
        if !state.insert(instruction) {
            warnings.push(Warning::DuplicateInstruction {
                state: id,
                read: instruction.read,
                line: line.number(),
            });
        }
        index += 1;
    }
}

/// Parses the optional `INITIAL` line.
///
/// Falls back to a single blank cell, with a warning, when the line is missing or holds no
/// symbols. Returns the tape and the index of the first line not consumed.
fn parse_initial_tape(
    source: &Source,
    index: usize,
    alphabet: &BTreeSet<char>,
    blank: char,
    warnings: &mut Vec<Warning>,
) -> Result<(Vec<char>, usize), TuringMachineError> {
    let Some((line, rest)) = source
        .get(index)
        .and_then(|line| Some((line, line.text().strip_prefix(Keyword::Initial.as_str())?)))
    else {
        warnings.push(Warning::MissingInitialTape);
        return Ok((vec![blank], index));
    };

    let tape: Vec<char> = rest.chars().filter(|c| !c.is_whitespace()).collect();
    if tape.is_empty() {
        warnings.push(Warning::EmptyInitialTape {
            line: line.number(),
        });
        return Ok((vec![blank], index + 1));
    }

    let invalid: Vec<char> = tape
        .iter()
        .copied()
        .filter(|symbol| !alphabet.contains(symbol))
        .collect();
    if !invalid.is_empty() {
        return Err(line.error(ParseErrorKind::InvalidTapeSymbols(invalid)));
    }

    Ok((tape, index + 1))
}

/// Parses the target of a `NEXT` clause: a non-negative state number or `HALT`.
fn parse_next(token: &str) -> Option<Next> {
    if token == Keyword::Halt.as_str() {
        return Some(Next::Halt);
    }

    parse_state_id(token).map(Next::State)
}

/// Parses a state number made of ASCII digits only.
fn parse_state_id(token: &str) -> Option<StateId> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    token.parse().ok()
}

fn alphabet_symbol(token: &str, alphabet: &BTreeSet<char>) -> Option<char> {
    single_char(token).filter(|symbol| alphabet.contains(symbol))
}

/// Returns the only character of `text`, if it has exactly one.
fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn is_keyword(line: &Line, keyword: Keyword) -> bool {
    line.text() == keyword.as_str()
}
