use crate::{
    ds::{ControlWord, EncodedProgram, OpcodeProgram, Step},
    error::{MicrocodeError, RegistryError},
    registry::SignalRegistry,
};

/// Encodes one step. Stops at the first name the registry does not know.
pub(crate) fn encode(step: &Step, registry: &SignalRegistry) -> Result<ControlWord, RegistryError> {
    step.signals.iter().try_fold(ControlWord(0), |word, name| {
        let bit = registry.resolve(name)?;
        Ok(ControlWord(word.0 | (1 << bit)))
    })
}

pub(crate) fn encode_program(
    program: &OpcodeProgram,
    registry: &SignalRegistry,
) -> Result<EncodedProgram, MicrocodeError> {
    let words = program
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            encode(step, registry).map_err(|e| match e {
                RegistryError::UnknownSignal(signal) => MicrocodeError::UnknownSignal {
                    signal,
                    program: program.name.clone(),
                    step: index,
                },
                other => MicrocodeError::Registry(other),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EncodedProgram {
        name: program.name.clone(),
        words,
    })
}
