use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyModifiers, poll, read};

use crate::terminal::RawModeGuard;

/// Keyboard input capability, independent of an implementation.
///
/// The machine consumes this from exactly two places: the memory-mapped
/// status register poll and the character-input traps.
pub trait KeyboardInput {
    /// Checks whether a key is available, does not block.
    fn poll_key(&mut self) -> io::Result<bool>;
    /// Reads one key, blocking until it arrives.
    fn read_key(&mut self) -> io::Result<u8>;
}

/// Terminal-backed keyboard using crossterm key events.
///
/// Owns the raw-mode guard, so keys arrive unbuffered for as long as the
/// keyboard lives and the terminal is restored when it is dropped. CTRL-C
/// surfaces as an [`io::ErrorKind::Interrupted`] error from either method.
pub struct TerminalKeyboard {
    pending: Option<u8>,
    _raw_mode: RawModeGuard,
}

impl TerminalKeyboard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: None,
            _raw_mode: RawModeGuard::new(),
        }
    }

    fn absorb_event(&mut self, event: &Event) -> io::Result<()> {
        if let Some(key) = event.as_key_press_event() {
            if key.code.as_char() == Some('c') && key.modifiers == KeyModifiers::CONTROL {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "interrupted from keyboard",
                ));
            }
            self.pending = key_press_byte(key.code);
        }
        Ok(())
    }
}

impl Default for TerminalKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardInput for TerminalKeyboard {
    fn poll_key(&mut self) -> io::Result<bool> {
        while self.pending.is_none() && poll(Duration::from_secs(0))? {
            let event = read()?;
            self.absorb_event(&event)?;
        }
        Ok(self.pending.is_some())
    }

    fn read_key(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = self.pending.take() {
                return Ok(byte);
            }
            let event = read()?;
            self.absorb_event(&event)?;
        }
    }
}

// keys outside these produce nothing and polling continues
#[expect(clippy::cast_possible_truncation)] // ASCII only
fn key_press_byte(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Enter => Some(b'\n'),
        code => code.as_char().filter(char::is_ascii).map(|c| c as u8),
    }
}

/// Keyboard driven by a fixed byte script, for tests and embedding hosts.
///
/// A key is available while the script is non-empty; reading past the end is
/// an [`io::ErrorKind::UnexpectedEof`] error rather than a block.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeyboard {
    script: VecDeque<u8>,
}

impl ScriptedKeyboard {
    #[must_use]
    pub fn new(script: &str) -> Self {
        Self {
            script: script.bytes().collect(),
        }
    }
}

impl KeyboardInput for ScriptedKeyboard {
    fn poll_key(&mut self) -> io::Result<bool> {
        Ok(!self.script.is_empty())
    }

    fn read_key(&mut self) -> io::Result<u8> {
        self.script.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "keyboard script exhausted")
        })
    }
}
