//! Synthesizable SystemVerilog lookup table for the control store.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::{
    allocator::Allocation,
    ds::{ControlWord, EncodedProgram, WORD_WIDTH},
    error::ParseError,
    registry::SignalRegistry,
};

/// Smallest address width able to index `total_steps` entries. Never below
/// one bit, since a zero-width port is not synthesizable.
pub(crate) fn address_width(total_steps: usize) -> u32 {
    total_steps.max(2).next_power_of_two().trailing_zeros()
}

pub(crate) fn emit(
    programs: &[EncodedProgram],
    allocation: &Allocation,
    registry: &SignalRegistry,
    module_name: &str,
) -> String {
    let mut table = String::new();
    write_table(&mut table, programs, allocation, registry, module_name)
        .expect("formatting into a String is infallible");
    table
}

fn write_table<W: Write>(
    out: &mut W,
    programs: &[EncodedProgram],
    allocation: &Allocation,
    registry: &SignalRegistry,
    module_name: &str,
) -> fmt::Result {
    let width = address_width(allocation.total_steps);

    writeln!(
        out,
        "// Microcode lookup table: {} steps, {}-bit address.",
        allocation.total_steps, width
    )?;
    writeln!(out, "// Generated by microcode; do not edit.")?;
    writeln!(out, "//")?;
    for signal in registry.by_bit() {
        writeln!(out, "// bit {:>2}: {}", signal.bit, signal.name)?;
    }
    writeln!(out, "module {} (", module_name)?;
    writeln!(out, "    input  logic [{}:0] addr,", width - 1)?;
    writeln!(out, "    output logic [{}:0] word", WORD_WIDTH - 1)?;
    writeln!(out, ");")?;
    writeln!(out, "    always_comb begin")?;
    writeln!(out, "        case (addr)")?;

    for (program, placement) in programs.iter().zip(&allocation.placements) {
        let plural = if placement.len == 1 { "" } else { "s" };
        match placement.relative_offset {
            None => writeln!(
                out,
                "            // {}: prologue, {} step{}",
                placement.name, placement.len, plural
            )?,
            Some(offset) => writeln!(
                out,
                "            // {}: relative offset {}, {} step{}",
                placement.name, offset, placement.len, plural
            )?,
        }
        for (step, word) in program.words.iter().enumerate() {
            writeln!(
                out,
                "            {}'d{}: word = {}'h{};",
                width,
                placement.base + step,
                WORD_WIDTH,
                word
            )?;
        }
    }

    // Unlisted addresses must never raise a signal.
    writeln!(
        out,
        "            default: word = {}'h{};",
        WORD_WIDTH,
        ControlWord(0)
    )?;
    writeln!(out, "        endcase")?;
    writeln!(out, "    end")?;
    writeln!(out, "endmodule")
}

/// The address map recovered from an emitted table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DecodedTable {
    pub(crate) width: u32,
    pub(crate) entries: BTreeMap<usize, ControlWord>,
    pub(crate) default: Option<ControlWord>,
}

pub(crate) fn decode(table: &str) -> Result<DecodedTable, ParseError> {
    let mut decoded = DecodedTable::default();
    for (index, line) in table.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.starts_with("//") {
            continue;
        }
        if line.starts_with("input") {
            decoded.width = parse_port_width(line)
                .ok_or_else(|| ParseError::new(line_number, "Invalid address port"))?;
        } else if let Some(rest) = line.strip_prefix("default:") {
            decoded.default = Some(parse_assignment(rest, line_number)?);
        } else if line.starts_with(|c: char| c.is_ascii_digit()) {
            let (literal, rest) = line.split_once(':').ok_or_else(|| {
                ParseError::new(line_number, &format!("Invalid table entry '{}'", line))
            })?;
            let (bits, address) = literal.split_once("'d").ok_or_else(|| {
                ParseError::new(line_number, &format!("Invalid address literal '{}'", literal))
            })?;
            if bits.parse::<u32>().ok() != Some(decoded.width) {
                return Err(ParseError::new(
                    line_number,
                    &format!(
                        "Address literal '{}' does not match the {}-bit port",
                        literal, decoded.width
                    ),
                ));
            }
            let address: usize = address.parse().map_err(|_| {
                ParseError::new(line_number, &format!("Invalid address literal '{}'", literal))
            })?;
            let word = parse_assignment(rest, line_number)?;
            if decoded.entries.insert(address, word).is_some() {
                return Err(ParseError::new(
                    line_number,
                    &format!("Address {} listed more than once", address),
                ));
            }
        }
    }
    Ok(decoded)
}

fn parse_port_width(line: &str) -> Option<u32> {
    let start = line.find('[')? + 1;
    let end = line.find(":0]")?;
    line.get(start..end)?.parse::<u32>().ok().map(|hi| hi + 1)
}

fn parse_assignment(rest: &str, line_number: usize) -> Result<ControlWord, ParseError> {
    let invalid = || ParseError::new(line_number, &format!("Invalid assignment '{}'", rest.trim()));
    let (_, literal) = rest.split_once("'h").ok_or_else(invalid)?;
    let digits = literal.trim().trim_end_matches(';');
    u32::from_str_radix(digits, 16)
        .map(ControlWord)
        .map_err(|_| invalid())
}
