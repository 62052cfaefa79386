//! The machine's tape: a sparse, unbounded row of cells with a single head.

use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

/// A sparse tape. Cells that were never written read as the blank symbol.
///
/// The tape remembers the leftmost and rightmost offsets the head has visited, which together
/// with the initial contents delimit what gets rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: HashMap<i64, char>,
    blank: char,
    head: i64,
    leftmost: i64,
    rightmost: i64,
}

impl Tape {
    /// Creates a tape holding `initial` at offsets `0..initial.len()`, with the head at `0`.
    pub fn new(blank: char, initial: &[char]) -> Self {
        let cells = (0..).zip(initial.iter().copied()).collect();

        Self {
            cells,
            blank,
            head: 0,
            leftmost: 0,
            rightmost: (initial.len() as i64 - 1).max(0),
        }
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    /// The offset of the cell under the head.
    pub fn head(&self) -> i64 {
        self.head
    }

    /// The visited offsets, from leftmost to rightmost.
    pub fn bounds(&self) -> RangeInclusive<i64> {
        self.leftmost..=self.rightmost
    }

    /// Returns the symbol at `offset`.
    pub fn get(&self, offset: i64) -> char {
        self.cells.get(&offset).copied().unwrap_or(self.blank)
    }

    /// Returns the symbol under the head.
    pub fn read(&self) -> char {
        self.get(self.head)
    }

    /// Overwrites the cell under the head.
    pub fn write(&mut self, symbol: char) {
        self.cells.insert(self.head, symbol);
    }

    /// Moves the head one cell, materializing the new cell as blank if it was never visited.
    pub fn shift(&mut self, direction: Direction) {
        self.head += direction.delta();
        self.cells.entry(self.head).or_insert(self.blank);

        self.leftmost = self.leftmost.min(self.head);
        self.rightmost = self.rightmost.max(self.head);
    }

    /// The symbols of every offset in [`Tape::bounds`], in ascending order.
    pub fn symbols(&self) -> Vec<char> {
        self.bounds().map(|offset| self.get(offset)).collect()
    }

    /// Renders the visited part of the tape as space separated symbols.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.symbols().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}
