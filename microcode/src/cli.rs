use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::{compile::CompileOptions, parser::is_identifier};

fn module_identifier(name: &str) -> Result<String, String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        Err(format!("'{}' is not a SystemVerilog identifier", name))
    }
}

#[derive(Parser)]
#[command(name = "Microcode Compiler")]
#[command(version = "1.0")]
#[command(
    about = "Compiles control-unit microcode into a simulator image and a SystemVerilog lookup table",
    long_about = None
)]
pub(crate) struct Cli {
    /// Input file (defaults to stdin)
    #[arg(short, long)]
    pub(crate) input: Option<PathBuf>,

    /// Compile the built-in RV32I control unit instead of a source file
    #[arg(long, conflicts_with = "input")]
    pub(crate) builtin: bool,

    /// Output file prefix; writes <prefix>.hex and <prefix>.sv
    #[arg(short, long, default_value = "microcode")]
    pub(crate) output: PathBuf,

    /// Signal that returns the sequencer to address 0 [source '!' line, else micro_reset]
    #[arg(long)]
    pub(crate) reset_signal: Option<String>,

    /// Width of the microcode address bus
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=16))]
    pub(crate) address_bits: u32,

    /// Name of the generated SystemVerilog module
    #[arg(long, default_value = "microcode_rom", value_parser = module_identifier)]
    pub(crate) module_name: String,

    /// Append program/address comments to the simulation image
    #[arg(long)]
    pub(crate) annotate: bool,

    /// Print the program allocation table to stdout
    #[arg(long)]
    pub(crate) listing: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,
}

impl Cli {
    pub(crate) fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            reset_signal: self.reset_signal.clone(),
            address_bits: self.address_bits,
            module_name: self.module_name.clone(),
            annotate: self.annotate,
        }
    }

    pub(crate) fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::DEFAULT_RESET_SIGNAL;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["microcode"]);
        assert_eq!(cli.output, PathBuf::from("microcode"));
        assert_eq!(cli.log_level(), "warn");
        let options = cli.compile_options();
        assert_eq!(options.address_bits, 8);
        assert_eq!(options.module_name, "microcode_rom");
        assert_eq!(options.reset_signal, None);
        assert!(!options.annotate);
        assert_eq!(DEFAULT_RESET_SIGNAL, "micro_reset");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "microcode",
            "-i",
            "core.uc",
            "-o",
            "build/rom",
            "--reset-signal",
            "reset",
            "--address-bits",
            "6",
            "--annotate",
            "-vv",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("core.uc")));
        assert_eq!(cli.log_level(), "debug");
        let options = cli.compile_options();
        assert_eq!(options.reset_signal.as_deref(), Some("reset"));
        assert_eq!(options.address_bits, 6);
        assert!(options.annotate);
    }

    #[test]
    fn test_builtin_conflicts_with_input() {
        assert!(Cli::try_parse_from(["microcode", "--builtin", "-i", "core.uc"]).is_err());
        assert!(Cli::try_parse_from(["microcode", "--address-bits", "0"]).is_err());
    }

    #[test]
    fn test_module_name_must_be_identifier() {
        assert!(Cli::try_parse_from(["microcode", "--module-name", "my rom; endmodule"]).is_err());
        assert!(Cli::try_parse_from(["microcode", "--module-name", "9rom"]).is_err());
        assert!(Cli::try_parse_from(["microcode", "--module-name", ""]).is_err());
        let cli = Cli::parse_from(["microcode", "--module-name", "_core_rom2"]);
        assert_eq!(cli.compile_options().module_name, "_core_rom2");
    }
}
