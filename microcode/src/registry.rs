use crate::{
    ds::{Signal, WORD_WIDTH},
    error::RegistryError,
};

/// Name to bit index table for the control word. Filled once while the
/// microcode source is loaded and only read afterwards.
#[derive(Debug, Clone, Default)]
pub(crate) struct SignalRegistry {
    signals: Vec<Signal>,
}

impl SignalRegistry {
    pub(crate) fn new() -> Self {
        SignalRegistry::default()
    }

    pub(crate) fn register(&mut self, name: &str, bit: u32) -> Result<u32, RegistryError> {
        if bit >= WORD_WIDTH {
            return Err(RegistryError::OutOfRange {
                name: name.to_string(),
                bit,
            });
        }
        if self.signals.iter().any(|s| s.name == name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.signals.iter().find(|s| s.bit == bit) {
            return Err(RegistryError::DuplicateSignal {
                name: name.to_string(),
                bit,
                existing: existing.name.clone(),
            });
        }
        self.signals.push(Signal {
            name: name.to_string(),
            bit,
        });
        Ok(bit)
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<u32, RegistryError> {
        self.signals
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.bit)
            .ok_or_else(|| RegistryError::UnknownSignal(name.to_string()))
    }

    /// Registered signals ordered by bit index
    pub(crate) fn by_bit(&self) -> Vec<&Signal> {
        let mut signals: Vec<&Signal> = self.signals.iter().collect();
        signals.sort_by_key(|s| s.bit);
        signals
    }

    pub(crate) fn len(&self) -> usize {
        self.signals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = SignalRegistry::new();
        assert_eq!(registry.register("reset", 0), Ok(0));
        assert_eq!(registry.register("load", 1), Ok(1));
        assert_eq!(registry.register("write", 31), Ok(31));
        assert_eq!(registry.resolve("load"), Ok(1));
        assert_eq!(registry.resolve("write"), Ok(31));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_error_unknown_signal() {
        let mut registry = SignalRegistry::new();
        registry.register("load", 1).unwrap();
        let err = registry.resolve("not_a_real_signal").unwrap_err();
        assert_eq!(err.to_string(), "Undefined signal 'not_a_real_signal'");
        assert!(registry.resolve("lod").is_err());
    }

    #[test]
    fn test_error_duplicate_bit() {
        let mut registry = SignalRegistry::new();
        registry.register("load", 1).unwrap();
        let err = registry.register("store", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Signal 'store' reuses bit 1 already assigned to 'load'"
        );
    }

    #[test]
    fn test_error_duplicate_name() {
        let mut registry = SignalRegistry::new();
        registry.register("load", 1).unwrap();
        assert_eq!(
            registry.register("load", 2),
            Err(RegistryError::DuplicateName {
                name: "load".to_string()
            })
        );
    }

    #[test]
    fn test_error_bit_out_of_range() {
        let mut registry = SignalRegistry::new();
        let err = registry.register("wide", 32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bit 32 of signal 'wide' is outside the 32-bit control word"
        );
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_by_bit_orders_signals() {
        let mut registry = SignalRegistry::new();
        registry.register("c", 7).unwrap();
        registry.register("a", 0).unwrap();
        registry.register("b", 3).unwrap();
        let names: Vec<&str> = registry.by_bit().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
