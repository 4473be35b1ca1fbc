//! Built-in control unit for the RV32I core.
//!
//! Signals are a closed enum, so a misspelled control line is a Rust compile
//! error here instead of an `UnknownSignal` at generation time.

use crate::{
    ds::{Catalog, MicrocodeSpec, OpcodeProgram, Step, FETCH},
    error::MicrocodeError,
    registry::SignalRegistry,
};

macro_rules! signals {
    ($($variant:ident = $bit:expr => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub(crate) enum Rv32iSignal {
            $($variant = $bit,)*
        }

        impl Rv32iSignal {
            pub(crate) const ALL: &'static [Rv32iSignal] = &[$(Rv32iSignal::$variant,)*];

            pub(crate) fn name(self) -> &'static str {
                match self {
                    $(Rv32iSignal::$variant => $name,)*
                }
            }

            pub(crate) fn bit(self) -> u32 {
                self as u32
            }
        }
    };
}

signals! {
    MemoryRead = 0 => "memory_read",
    MemoryWrite = 1 => "memory_write",
    MemAddrPc = 2 => "mem_addr_pc",
    MemAddrLoad = 3 => "mem_addr_load",
    MemAddrStore = 4 => "mem_addr_store",
    WordSizeSrc = 5 => "word_size_src",
    IImmediate = 6 => "i_immediate",
    UImmediate = 7 => "u_immediate",
    IncrementPc = 8 => "increment_pc",
    IncrementPc2 = 9 => "increment_pc2",
    MicroReset = 10 => "micro_reset",
    WriteLowerInstr = 11 => "write_lower_instr",
    WriteUpperInstr = 12 => "write_upper_instr",
    RegisterInputImm = 13 => "register_input_imm",
    Op2Immediate = 14 => "op2_immediate",
    RegistersWrite = 15 => "registers_write",
}

use Rv32iSignal::*;

fn step(signals: &[Rv32iSignal]) -> Step {
    Step::new(signals.iter().map(|s| s.name()))
}

fn program(name: &str, steps: &[&[Rv32iSignal]]) -> OpcodeProgram {
    OpcodeProgram::new(name, steps.iter().map(|s| step(s)).collect())
}

pub(crate) fn spec() -> Result<MicrocodeSpec, MicrocodeError> {
    let mut registry = SignalRegistry::new();
    for signal in Rv32iSignal::ALL {
        registry.register(signal.name(), signal.bit())?;
    }

    let mut catalog = Catalog::new();
    // The 16-bit halves of the instruction are fetched on consecutive cycles.
    catalog.push(program(
        FETCH,
        &[
            &[MemAddrPc, IncrementPc2],
            &[MemAddrPc, WriteLowerInstr, IncrementPc2],
            &[WriteUpperInstr],
        ],
    ))?;
    catalog.push(program("op_fence", &[&[MicroReset]]))?;
    catalog.push(program(
        "op_ai",
        &[&[Op2Immediate, RegistersWrite, MicroReset]],
    ))?;
    catalog.push(program("op_a", &[&[RegistersWrite, MicroReset]]))?;
    catalog.push(program(
        "op_lui",
        &[&[RegisterInputImm, RegistersWrite, MicroReset]],
    ))?;
    catalog.push(program("op_e", &[&[MicroReset]]))?;

    Ok(MicrocodeSpec {
        registry,
        catalog,
        reset_signal: Some(MicroReset.name().to_string()),
    })
}
