use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use lc3vm::emulator::{StepOutcome, from_program};

fn main() -> ExitCode {
    let mut args = env::args_os().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("usage: lc3vm <image-file>");
        return ExitCode::FAILURE;
    };
    let path = PathBuf::from(path);
    // the emulator and with it the raw terminal are gone before we print
    match execute(&path) {
        Ok(StepOutcome::Halted) => ExitCode::SUCCESS,
        Ok(outcome) => {
            eprintln!("lc3vm: {outcome}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("lc3vm: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(path: &Path) -> Result<StepOutcome, Box<dyn Error>> {
    let mut emulator = from_program(path)?;
    Ok(emulator.run()?)
}
