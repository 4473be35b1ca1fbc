use std::path::PathBuf;

use thiserror::Error;

use crate::ds::{FETCH, WORD_WIDTH};

#[derive(Debug, Error)]
#[error("Error on line {line_number}: {message}")]
pub(crate) struct ParseError {
    line_number: usize,
    message: String,
}

impl ParseError {
    pub(crate) fn new(line_number: usize, message: &str) -> Self {
        ParseError {
            line_number,
            message: message.to_string(),
        }
    }
}

/// Integrity violations of the signal registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RegistryError {
    #[error("Signal '{name}' reuses bit {bit} already assigned to '{existing}'")]
    DuplicateSignal {
        name: String,
        bit: u32,
        existing: String,
    },
    #[error("Signal '{name}' defined more than once")]
    DuplicateName { name: String },
    #[error("Bit {bit} of signal '{name}' is outside the {width}-bit control word", width = WORD_WIDTH)]
    OutOfRange { name: String, bit: u32 },
    #[error("Undefined signal '{0}'")]
    UnknownSignal(String),
}

#[derive(Debug, Error)]
pub(crate) enum MicrocodeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Error on line {line}: {source}")]
    RegistryAt { line: usize, source: RegistryError },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Undefined signal '{signal}' in step {step} of program '{program}'")]
    UnknownSignal {
        signal: String,
        program: String,
        step: usize,
    },

    #[error("Reset signal '{0}' is not a defined control line")]
    UnknownResetSignal(String),

    #[error("Program '{program}' does not end with the reset signal '{reset}'")]
    MissingReset { program: String, reset: String },

    #[error("{steps} microcode steps do not fit a {bits}-bit address bus ({capacity} entries)")]
    AddressOverflow {
        steps: usize,
        bits: u32,
        capacity: usize,
    },

    #[error("No '{}' program defined", FETCH)]
    MissingFetch,

    #[error("'fetch' must be the first program, found '{0}' first")]
    FetchNotFirst(String),

    #[error("Program '{0}' defined more than once")]
    DuplicateProgram(String),

    #[error("Generated artifacts disagree: {0}")]
    ArtifactMismatch(String),

    #[error("File error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl MicrocodeError {
    /// Process exit status reported for this error.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            MicrocodeError::Io { .. } => 1,
            MicrocodeError::Parse(_) => 2,
            MicrocodeError::RegistryAt { source, .. } | MicrocodeError::Registry(source) => {
                match source {
                    RegistryError::UnknownSignal(_) => 4,
                    _ => 3,
                }
            }
            MicrocodeError::UnknownSignal { .. } | MicrocodeError::UnknownResetSignal(_) => 4,
            MicrocodeError::MissingReset { .. } => 5,
            MicrocodeError::AddressOverflow { .. } => 6,
            MicrocodeError::MissingFetch
            | MicrocodeError::FetchNotFirst(_)
            | MicrocodeError::DuplicateProgram(_) => 7,
            MicrocodeError::ArtifactMismatch(_) => 8,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MicrocodeError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let errors = [
            MicrocodeError::io("x", std::io::Error::other("boom")),
            MicrocodeError::Parse(ParseError::new(1, "bad")),
            MicrocodeError::Registry(RegistryError::DuplicateName { name: "a".into() }),
            MicrocodeError::UnknownResetSignal("r".into()),
            MicrocodeError::MissingReset {
                program: "op".into(),
                reset: "r".into(),
            },
            MicrocodeError::AddressOverflow {
                steps: 9,
                bits: 3,
                capacity: 8,
            },
            MicrocodeError::MissingFetch,
            MicrocodeError::ArtifactMismatch("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(MicrocodeError::exit_code).collect();
        codes.dedup();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_registry_error_at_line_message() {
        let err = MicrocodeError::RegistryAt {
            line: 3,
            source: RegistryError::OutOfRange {
                name: "big".into(),
                bit: 40,
            },
        };
        assert_eq!(
            err.to_string(),
            "Error on line 3: Bit 40 of signal 'big' is outside the 32-bit control word"
        );
        assert_eq!(err.exit_code(), 3);
    }
}
