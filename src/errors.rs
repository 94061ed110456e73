use std::error::Error;
use std::io;

use displaydoc::Display;

/// Failures while turning an object image into initial machine state.
///
/// All of these occur before the first instruction executes; a failed load
/// leaves nothing to run.
#[derive(Display, Debug)]
pub enum LoadError {
    /// cannot read object image: {0}
    Io(io::Error),
    /// object image is missing its .ORIG origin word
    MissingOrigHeader,
    /// program of {words} words at origin 0x{origin:04X} extends past the end of the address space
    ProgramTooLarge { origin: u16, words: usize },
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(cause) => Some(cause),
            Self::MissingOrigHeader | Self::ProgramTooLarge { .. } => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(cause: io::Error) -> Self {
        Self::Io(cause)
    }
}

/// Failures raised by the I/O collaborators while a program is running.
#[derive(Display, Debug)]
pub enum ExecutionError {
    /// keyboard input failed: {0}
    Input(io::Error),
    /// program output failed: {0}
    Output(io::Error),
}

impl Error for ExecutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(cause) | Self::Output(cause) => Some(cause),
        }
    }
}
