use crate::{
    ds::{Catalog, MicrocodeSpec, OpcodeProgram, Step},
    error::{MicrocodeError, ParseError},
    registry::SignalRegistry,
};
use std::io::BufRead;

#[derive(Debug)]
pub(crate) struct ParserState {
    line_number: usize,
    registry: SignalRegistry,
    next_bit: u32,
    catalog: Catalog,
    reset_signal: Option<String>,
}

impl ParserState {
    pub(crate) fn new() -> Self {
        ParserState {
            line_number: 0,
            registry: SignalRegistry::new(),
            next_bit: 0,
            catalog: Catalog::new(),
            reset_signal: None,
        }
    }

    /// Helper method to create a ParseError with the current line number
    fn parse_error(&self, message: &str) -> ParseError {
        ParseError::new(self.line_number, message)
    }

    pub(crate) fn into_spec(self) -> MicrocodeSpec {
        MicrocodeSpec {
            registry: self.registry,
            catalog: self.catalog,
            reset_signal: self.reset_signal,
        }
    }
}

impl ParserState {
    pub(crate) fn parse<R: BufRead>(&mut self, reader: R) -> Result<(), MicrocodeError> {
        for line in reader.lines() {
            self.line_number += 1;
            let line =
                line.map_err(|e| self.parse_error(&format!("Failed to read line: {}", e)))?;
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue; // Skip comments and empty lines
            }
            let (first_char, rest) = line.split_at(line.chars().next().map_or(0, char::len_utf8));
            match first_char {
                "@" => self.parse_signal_line(rest)?,
                "!" => self.parse_reset_line(rest)?,
                ":" => self.parse_program_line(rest)?,
                "=" => self.parse_step_line(rest)?,
                _ => {
                    return Err(self
                        .parse_error(&format!("Invalid line start '{}'", first_char))
                        .into());
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ParserState {
    fn check_identifier(&self, kind: &str, name: &str) -> Result<(), ParseError> {
        if is_identifier(name) {
            Ok(())
        } else {
            Err(self.parse_error(&format!(
                "Invalid {} name '{}', must be an identifier",
                kind, name
            )))
        }
    }

    fn single_name<'a>(&self, line: &'a str, marker: char, what: &str) -> Result<&'a str, ParseError> {
        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| self.parse_error(&format!("Missing {} after '{}'", what, marker)))?;
        if tokens.next().is_some() {
            return Err(self.parse_error(&format!(
                "Expected a single {} after '{}'",
                what, marker
            )));
        }
        Ok(name)
    }
}

impl ParserState {
    fn parse_signal_line(&mut self, line: &str) -> Result<(), MicrocodeError> {
        let mut terms = line.split_whitespace().peekable();
        if terms.peek().is_none() {
            return Err(self.parse_error("Missing control line after '@'").into());
        }
        for term in terms {
            let (name, bit) = match term.split_once(':') {
                Some((name, bit_str)) => {
                    let invalid = || {
                        self.parse_error(&format!(
                            "Invalid bit index '{}' for control line '{}'",
                            bit_str, name
                        ))
                    };
                    // `u32::from_str` also takes a leading '+'.
                    if bit_str.is_empty() || !bit_str.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid().into());
                    }
                    let bit: u32 = bit_str.parse().map_err(|_| invalid())?;
                    (name, bit)
                }
                None => (term, self.next_bit),
            };
            self.check_identifier("control line", name)?;
            let bit = self
                .registry
                .register(name, bit)
                .map_err(|source| MicrocodeError::RegistryAt {
                    line: self.line_number,
                    source,
                })?;
            self.next_bit = bit + 1;
        }
        Ok(())
    }

    fn parse_reset_line(&mut self, line: &str) -> Result<(), MicrocodeError> {
        let name = self.single_name(line, '!', "reset signal")?;
        self.check_identifier("control line", name)?;
        if let Some(existing) = &self.reset_signal {
            return Err(self
                .parse_error(&format!("Reset signal already designated as '{}'", existing))
                .into());
        }
        self.reset_signal = Some(name.to_string());
        Ok(())
    }

    fn parse_program_line(&mut self, line: &str) -> Result<(), MicrocodeError> {
        let name = self.single_name(line, ':', "program name")?;
        self.check_identifier("program", name)?;
        if self.catalog.get(name).is_some() {
            return Err(self
                .parse_error(&format!("Program '{}' defined more than once", name))
                .into());
        }
        self.catalog.push(OpcodeProgram::new(name, Vec::new()))
    }

    fn parse_step_line(&mut self, line: &str) -> Result<(), MicrocodeError> {
        let terms: Vec<&str> = line.split_whitespace().collect();
        for term in &terms {
            self.check_identifier("control line", term)?;
        }
        let step = if terms.is_empty() {
            Step::idle()
        } else {
            Step::new(terms)
        };
        let line_number = self.line_number;
        let program = self
            .catalog
            .last_mut()
            .ok_or_else(|| ParseError::new(line_number, "Step defined before any program"))?;
        program.steps.push(step);
        Ok(())
    }
}
