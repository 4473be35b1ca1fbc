mod allocator;
mod cli;
mod compile;
mod ds;
mod encoder;
mod error;
mod lookup_table;
mod output;
mod parser;
mod registry;
mod rv32i;
mod sim_image;

use std::io::{self, BufRead, BufReader};
use std::process::exit;

use clap::Parser;
use cli::Cli;
use error::MicrocodeError;
use log::info;
use parser::ParserState;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{}", e);
        exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), MicrocodeError> {
    let spec = if cli.builtin {
        rv32i::spec()?
    } else {
        let reader: Box<dyn BufRead> = match &cli.input {
            Some(filename) => Box::new(BufReader::new(
                std::fs::File::open(filename).map_err(|e| MicrocodeError::io(filename, e))?,
            )),
            None => Box::new(BufReader::new(io::stdin())),
        };
        let mut parser = ParserState::new();
        parser.parse(reader)?;
        parser.into_spec()
    };

    let artifacts = compile::compile(&spec, &cli.compile_options())?;
    let (image, table) = output::write_artifacts(&artifacts, &cli.output)?;
    info!(
        "{} steps in {} programs -> {}, {}",
        artifacts.allocation.total_steps,
        artifacts.allocation.placements.len(),
        image.display(),
        table.display()
    );

    if cli.listing {
        print!("{}", output::listing(&artifacts.allocation));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn cli_for(source: &Path, prefix: &Path) -> Cli {
        Cli::parse_from([
            OsString::from("microcode"),
            "-i".into(),
            source.into(),
            "-o".into(),
            prefix.into(),
        ])
    }

    #[test]
    fn test_run_unknown_signal_exits_4_without_artifacts() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("core.uc");
        fs::write(&source, "@ reset\n! reset\n: fetch\n= reset\n: op_x\n= nope reset\n").unwrap();
        let prefix = dir.path().join("rom");

        let err = run(&cli_for(&source, &prefix)).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!dir.path().join("rom.hex").exists());
        assert!(!dir.path().join("rom.sv").exists());
    }

    #[test]
    fn test_run_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let cli = cli_for(&dir.path().join("absent.uc"), &dir.path().join("rom"));
        let err = run(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("absent.uc"));
    }

    #[test]
    fn test_run_writes_both_artifacts() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("core.uc");
        fs::write(&source, "@ reset load\n! reset\n: fetch\n= reset\n: op_x\n= load reset\n").unwrap();
        let prefix = dir.path().join("rom");

        run(&cli_for(&source, &prefix)).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("rom.hex")).unwrap(),
            "00000001\n00000003\n"
        );
        assert!(fs::read_to_string(dir.path().join("rom.sv"))
            .unwrap()
            .contains("module microcode_rom ("));
    }
}
