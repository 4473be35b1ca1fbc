//! Turns a loaded microcode definition into the two control-store artifacts.
//!
//! Nothing is written here. Both texts are produced in memory and decoded
//! back against each other, so a caller only ever sees a matching pair or
//! an error.

use log::{debug, warn};

use crate::{
    allocator::{allocate, Allocation},
    ds::{ControlWord, EncodedProgram, MicrocodeSpec},
    encoder::encode_program,
    error::MicrocodeError,
    lookup_table::{self, address_width},
    sim_image,
};

pub(crate) const DEFAULT_RESET_SIGNAL: &str = "micro_reset";

#[derive(Debug, Clone)]
pub(crate) struct CompileOptions {
    /// Takes precedence over the reset signal named by the source.
    pub(crate) reset_signal: Option<String>,
    pub(crate) address_bits: u32,
    pub(crate) module_name: String,
    pub(crate) annotate: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            reset_signal: None,
            address_bits: 8,
            module_name: "microcode_rom".to_string(),
            annotate: false,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Artifacts {
    pub(crate) allocation: Allocation,
    pub(crate) sim_image: String,
    pub(crate) lookup_table: String,
}

pub(crate) fn compile(
    spec: &MicrocodeSpec,
    options: &CompileOptions,
) -> Result<Artifacts, MicrocodeError> {
    spec.catalog.validate()?;

    let reset_name = options
        .reset_signal
        .as_deref()
        .or(spec.reset_signal.as_deref())
        .unwrap_or(DEFAULT_RESET_SIGNAL);
    let reset_bit = spec
        .registry
        .resolve(reset_name)
        .map_err(|_| MicrocodeError::UnknownResetSignal(reset_name.to_string()))?;

    let programs = spec
        .catalog
        .programs()
        .iter()
        .map(|program| -> Result<EncodedProgram, MicrocodeError> {
            let encoded = encode_program(program, &spec.registry)?;
            if !program.is_fetch() {
                check_reset(&encoded, reset_bit, reset_name)?;
            }
            Ok(encoded)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let allocation = allocate(&spec.catalog);
    let capacity = 1usize << options.address_bits;
    if allocation.total_steps > capacity {
        return Err(MicrocodeError::AddressOverflow {
            steps: allocation.total_steps,
            bits: options.address_bits,
            capacity,
        });
    }
    debug!(
        "{} signals, {} programs, {} steps",
        spec.registry.len(),
        allocation.placements.len(),
        allocation.total_steps
    );
    for placement in &allocation.placements {
        debug!(
            "{} at {}..{} (relative offset {:?})",
            placement.name,
            placement.base,
            placement.base + placement.len,
            placement.relative_offset
        );
    }

    let sim_image = sim_image::emit(&programs, options.annotate.then_some(&allocation));
    let lookup_table =
        lookup_table::emit(&programs, &allocation, &spec.registry, &options.module_name);
    cross_check(&sim_image, &lookup_table, &allocation)?;

    Ok(Artifacts {
        allocation,
        sim_image,
        lookup_table,
    })
}

/// A non-fetch program has to hand control back to address 0 on its last
/// cycle. A reset earlier than that cuts the program short.
fn check_reset(
    program: &EncodedProgram,
    reset_bit: u32,
    reset_name: &str,
) -> Result<(), MicrocodeError> {
    let Some((last, body)) = program.words.split_last() else {
        return Err(MicrocodeError::MissingReset {
            program: program.name.clone(),
            reset: reset_name.to_string(),
        });
    };
    if !last.has_bit(reset_bit) {
        return Err(MicrocodeError::MissingReset {
            program: program.name.clone(),
            reset: reset_name.to_string(),
        });
    }
    if let Some(early) = body.iter().position(|word| word.has_bit(reset_bit)) {
        warn!(
            "Program '{}' raises '{}' in step {}; steps {}..{} are unreachable",
            program.name,
            reset_name,
            early,
            early + 1,
            program.words.len()
        );
    }
    Ok(())
}

/// Decodes both artifacts and checks they describe the same address map.
fn cross_check(
    sim_image: &str,
    lookup_table: &str,
    allocation: &Allocation,
) -> Result<(), MicrocodeError> {
    let mismatch = MicrocodeError::ArtifactMismatch;
    let image = sim_image::decode(sim_image)
        .map_err(|e| mismatch(format!("simulation image unreadable: {}", e)))?;
    let table = lookup_table::decode(lookup_table)
        .map_err(|e| mismatch(format!("lookup table unreadable: {}", e)))?;

    if table.default != Some(ControlWord(0)) {
        return Err(mismatch("lookup table lacks an all-zero default".to_string()));
    }
    let width = address_width(allocation.total_steps);
    if table.width != width {
        return Err(mismatch(format!(
            "lookup table uses a {}-bit address, expected {}",
            table.width, width
        )));
    }
    if table.entries.len() != allocation.total_steps {
        return Err(mismatch(format!(
            "lookup table has {} entries for {} steps",
            table.entries.len(),
            allocation.total_steps
        )));
    }
    if image.len() != allocation.placements.len() {
        return Err(mismatch(format!(
            "simulation image has {} lines for {} programs",
            image.len(),
            allocation.placements.len()
        )));
    }

    for (index, (words, placement)) in image.iter().zip(&allocation.placements).enumerate() {
        if words.len() != placement.len {
            return Err(mismatch(format!(
                "program '{}' has {} words in the image, expected {}",
                placement.name,
                words.len(),
                placement.len
            )));
        }
        for (step, word) in words.iter().enumerate() {
            let address = allocation.address(index, step).ok_or_else(|| {
                mismatch(format!("step {} of '{}' has no address", step, placement.name))
            })?;
            match table.entries.get(&address) {
                Some(entry) if entry == word => {}
                Some(entry) => {
                    return Err(mismatch(format!(
                        "address {} ('{}' step {}) is {} in the image but {} in the table",
                        address, placement.name, step, word, entry
                    )))
                }
                None => {
                    return Err(mismatch(format!(
                        "address {} ('{}' step {}) missing from the table",
                        address, placement.name, step
                    )))
                }
            }
        }
    }
    if let Some(stray) = table.entries.keys().find(|a| allocation.locate(**a).is_none()) {
        return Err(mismatch(format!(
            "lookup table lists address {} that holds no step",
            stray
        )));
    }
    Ok(())
}
