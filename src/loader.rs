//! This module provides the `ProgramLoader` struct, responsible for loading programs from
//! files and strings.

use crate::parser::parse;
use crate::types::{Program, TuringMachineError};
use std::fs;
use std::path::Path;

/// `ProgramLoader` is a utility struct for loading programs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a program from the specified file path.
    ///
    /// The whole file is read before parsing starts. Parse errors are reported against the
    /// file's path.
    ///
    /// # Arguments
    ///
    /// * `path` - A reference to the `Path` of the program file to load.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed into a `Program`.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::ParseError)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content).map_err(|e| match e {
            TuringMachineError::ParseError { kind, report } => TuringMachineError::ParseError {
                kind,
                report: Box::new((*report).with_path(&path.display().to_string())),
            },
            other => other,
        })
    }

    /// Loads a program from the provided string content.
    ///
    /// # Arguments
    ///
    /// * `content` - A string slice containing the program definition.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        parse(content)
    }
}
