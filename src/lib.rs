//! # LC-3 virtual machine.
//!
//! `lc3vm` runs object images for the Little Computer 3, a 16-bit teaching
//! architecture. Usage starts with a [`loader::ObjectImage`] loaded into an
//! [`emulator::Emulator`], which then executes it one [`emulator::Emulator::step`]
//! at a time or to completion with [`emulator::Emulator::run`].
//!
//! The emulator owns no terminal state by itself: keyboard input and
//! character output are collaborators handed in at construction, so programs
//! can run against the real terminal or against scripted I/O in tests.
//!
//! # Example
//! ```
//! use lc3vm::emulator::{Emulator, StepOutcome};
//! use lc3vm::hardware::keyboard::ScriptedKeyboard;
//! use lc3vm::loader::ObjectImage;
//!
//! // ADD R0, R0, #5 then HALT, in the on-disk image format
//! let image = ObjectImage::from_bytes(&[0x30, 0x00, 0x10, 0x25, 0xF0, 0x25])?;
//! let mut emulator = Emulator::with_io(ScriptedKeyboard::new(""), Vec::<u8>::new());
//! emulator.load_image(&image);
//! assert_eq!(emulator.run()?, StepOutcome::Halted);
//! assert_eq!(emulator.registers().get(0).as_binary(), 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod emulator;
pub mod errors;
pub mod hardware;
pub mod loader;
pub mod terminal;
