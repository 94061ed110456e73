use std::io;
use std::io::Write;

use crossterm::terminal;

/// Keeps the terminal in raw mode for its lifetime.
///
/// Raw mode is entered best-effort, only logging on failure, since it does
/// not work under the cargo doc test harness.
pub struct RawModeGuard {}

impl RawModeGuard {
    #[must_use]
    pub fn new() -> Self {
        if let Err(e) = terminal::enable_raw_mode() {
            eprintln!("Could not set terminal to raw mode: {e}");
        }
        Self {}
    }
}

impl Default for RawModeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Error resetting terminal {e}");
        }
    }
}

/// Stdout writer for program output on a possibly-raw terminal.
///
/// Raw mode disables output post-processing, so a bare `\n` no longer
/// returns the carriage; while raw mode is active every `\n` is written as
/// `\r\n`. Outside raw mode writes pass through untouched.
pub struct ConsoleWriter {
    stdout: io::Stdout,
}

impl ConsoleWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !terminal::is_raw_mode_enabled().unwrap_or(false) {
            return self.stdout.write(buf);
        }
        for chunk in buf.split_inclusive(|&byte| byte == b'\n') {
            match chunk.split_last() {
                Some((&b'\n', head)) => {
                    self.stdout.write_all(head)?;
                    self.stdout.write_all(b"\r\n")?;
                }
                _ => self.stdout.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
