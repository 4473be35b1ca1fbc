use std::fmt;

use crate::{error::MicrocodeError, registry::SignalRegistry};

/// Width of a control word in bits.
pub(crate) const WORD_WIDTH: u32 = 32;

/// Name of the shared instruction-fetch prologue.
pub(crate) const FETCH: &str = "fetch";

/// A named single-bit control line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Signal {
    pub(crate) name: String,
    pub(crate) bit: u32,
}

/// The signals active during one cycle. Order is irrelevant and repeats are
/// harmless; the names are kept as written so errors can quote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) signals: Vec<String>,
}

impl Step {
    pub(crate) fn new<I, S>(signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step {
            signals: signals.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn idle() -> Self {
        Step::default()
    }
}

/// The control routine for one opcode class, or for the fetch prologue
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpcodeProgram {
    pub(crate) name: String,
    pub(crate) steps: Vec<Step>,
}

impl OpcodeProgram {
    pub(crate) fn new(name: &str, steps: Vec<Step>) -> Self {
        OpcodeProgram {
            name: name.to_string(),
            steps,
        }
    }

    pub(crate) fn is_fetch(&self) -> bool {
        self.name == FETCH
    }
}

/// Programs in declaration order. Declaration order is global address order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Catalog {
    programs: Vec<OpcodeProgram>,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Catalog::default()
    }

    pub(crate) fn push(&mut self, program: OpcodeProgram) -> Result<(), MicrocodeError> {
        if self.get(&program.name).is_some() {
            return Err(MicrocodeError::DuplicateProgram(program.name));
        }
        self.programs.push(program);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&OpcodeProgram> {
        self.programs.iter().find(|p| p.name == name)
    }

    pub(crate) fn programs(&self) -> &[OpcodeProgram] {
        &self.programs
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut OpcodeProgram> {
        self.programs.last_mut()
    }

    /// Checks that exactly one fetch prologue exists and that it comes first.
    /// Names are unique by construction, so a second fetch cannot exist.
    pub(crate) fn validate(&self) -> Result<(), MicrocodeError> {
        match self.programs.first() {
            None => Err(MicrocodeError::MissingFetch),
            Some(first) if first.is_fetch() => Ok(()),
            Some(first) => {
                if self.get(FETCH).is_some() {
                    Err(MicrocodeError::FetchNotFirst(first.name.clone()))
                } else {
                    Err(MicrocodeError::MissingFetch)
                }
            }
        }
    }
}

/// Everything a compilation run reads: the control lines, the programs,
/// and the reset signal named by the source, if any.
#[derive(Debug, Clone)]
pub(crate) struct MicrocodeSpec {
    pub(crate) registry: SignalRegistry,
    pub(crate) catalog: Catalog,
    pub(crate) reset_signal: Option<String>,
}

/// The encoded value of one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ControlWord(pub(crate) u32);

impl ControlWord {
    pub(crate) fn has_bit(self, bit: u32) -> bool {
        self.0 & (1 << bit) != 0
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// A program together with the encoded words of its steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EncodedProgram {
    pub(crate) name: String,
    pub(crate) words: Vec<ControlWord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, steps: usize) -> OpcodeProgram {
        OpcodeProgram::new(name, vec![Step::idle(); steps])
    }

    #[test]
    fn test_catalog_rejects_duplicate_program() {
        let mut catalog = Catalog::new();
        catalog.push(program(FETCH, 1)).unwrap();
        catalog.push(program("op_a", 1)).unwrap();
        let err = catalog.push(program("op_a", 2)).unwrap_err();
        assert_eq!(err.to_string(), "Program 'op_a' defined more than once");
        assert_eq!(catalog.programs().len(), 2);
    }

    #[test]
    fn test_catalog_validate() {
        let mut catalog = Catalog::new();
        assert!(matches!(catalog.validate(), Err(MicrocodeError::MissingFetch)));

        catalog.push(program("op_a", 1)).unwrap();
        assert!(matches!(catalog.validate(), Err(MicrocodeError::MissingFetch)));

        catalog.push(program(FETCH, 3)).unwrap();
        match catalog.validate() {
            Err(MicrocodeError::FetchNotFirst(name)) => assert_eq!(name, "op_a"),
            other => panic!("Expected FetchNotFirst, got {:?}", other),
        }

        let mut catalog = Catalog::new();
        catalog.push(program(FETCH, 3)).unwrap();
        catalog.push(program("op_a", 1)).unwrap();
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_control_word_display_is_eight_hex_digits() {
        assert_eq!(ControlWord(0).to_string(), "00000000");
        assert_eq!(ControlWord(0x5).to_string(), "00000005");
        assert_eq!(ControlWord(0xdead_beef).to_string(), "deadbeef");
        assert!(ControlWord(0x4).has_bit(2));
        assert!(!ControlWord(0x4).has_bit(1));
    }
}
