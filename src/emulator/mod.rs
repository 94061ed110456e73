use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use displaydoc::Display;

use crate::emulator::instruction::Instruction;
use crate::errors::{ExecutionError, LoadError};
use crate::hardware::keyboard::{KeyboardInput, TerminalKeyboard};
use crate::hardware::memory::Memory;
use crate::hardware::registers::{PC_START, Registers};
use crate::loader::ObjectImage;
use crate::terminal::ConsoleWriter;

pub mod instruction;
mod opcodes;
pub mod trap_routines;

#[cfg(test)]
pub(crate) mod test_helpers;

/// What a single executed instruction did to the machine.
///
/// [`StepOutcome::Continue`] and [`StepOutcome::UnknownTrap`] leave the
/// machine runnable, the other two are terminal.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// execution continues
    Continue,
    /// TRAP with unassigned vector 0x{vector:02X} ignored
    UnknownTrap { vector: u8 },
    /// program halted
    Halted,
    /// invalid opcode word 0x{word:04X} at 0x{address:04X}
    InvalidOpcode { address: u16, word: u16 },
}

/// Whether the machine will execute further instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// The public facing emulator used to run LC-3 programs.
///
/// All machine state lives in this value; nothing is global, so tests and
/// tools can run several machines side by side. I/O goes through the
/// injected keyboard capability and `W`, by default the real terminal.
pub struct Emulator<W: Write = ConsoleWriter> {
    registers: Registers,
    memory: Memory,
    keyboard: Rc<RefCell<dyn KeyboardInput>>,
    output: W,
    state: State,
}

impl Emulator<ConsoleWriter> {
    /// Creates an emulator wired to the local terminal.
    ///
    /// The terminal is put into raw mode for the lifetime of the value.
    #[must_use]
    pub fn new() -> Self {
        Self::with_io(TerminalKeyboard::new(), ConsoleWriter::new())
    }
}

impl Default for Emulator<ConsoleWriter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Emulator<W> {
    /// Creates an emulator with the given I/O collaborators instead of the
    /// terminal. The keyboard is shared with [`Memory`] for the status
    /// register read path.
    pub fn with_io<K: KeyboardInput + 'static>(keyboard: K, output: W) -> Self {
        let keyboard: Rc<RefCell<dyn KeyboardInput>> = Rc::new(RefCell::new(keyboard));
        Self {
            registers: Registers::new(),
            memory: Memory::new(Rc::clone(&keyboard)),
            keyboard,
            output,
            state: State::Running,
        }
    }

    /// Copies the image into memory and prepares a fresh run: the PC is set
    /// to the fixed start address, regardless of where the image loaded.
    ///
    /// General purpose registers keep their values, see
    /// [`Emulator::reset_registers`] for a full reset.
    pub fn load_image(&mut self, image: &ObjectImage) {
        self.memory.load_image(image);
        self.registers.set_pc(PC_START);
        self.state = State::Running;
    }

    /// Executes the instruction at the PC.
    ///
    /// The PC is advanced past the instruction before it executes, so every
    /// PC-relative offset is relative to the next instruction's address. On
    /// an invalid opcode the PC stays at the faulting address and the
    /// machine halts without touching any register.
    ///
    /// Stepping a halted machine does nothing and reports
    /// [`StepOutcome::Halted`] again.
    ///
    /// # Errors
    /// [`ExecutionError`] when the keyboard or the program output fails.
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        if self.state == State::Halted {
            return Ok(StepOutcome::Halted);
        }
        let fetch_pc = self.registers.pc().as_binary();
        let word = self.memory.read(fetch_pc)?;
        let Some(instruction) = Instruction::decode(word) else {
            self.state = State::Halted;
            return Ok(StepOutcome::InvalidOpcode {
                address: fetch_pc,
                word,
            });
        };
        self.registers.set_pc(fetch_pc.wrapping_add(1));
        self.dispatch(instruction)
    }

    /// Steps until the program reaches a terminal outcome.
    ///
    /// # Errors
    /// [`ExecutionError`] when the keyboard or the program output fails.
    pub fn run(&mut self) -> Result<StepOutcome, ExecutionError> {
        loop {
            match self.step()? {
                StepOutcome::Continue | StepOutcome::UnknownTrap { .. } => {}
                terminal_outcome => return Ok(terminal_outcome),
            }
        }
    }

    fn dispatch(&mut self, instruction: Instruction) -> Result<StepOutcome, ExecutionError> {
        let r = &mut self.registers;
        match instruction {
            Instruction::Add { dr, sr1, source } => opcodes::add(dr, sr1, source, r),
            Instruction::And { dr, sr1, source } => opcodes::and(dr, sr1, source, r),
            Instruction::Not { dr, sr } => opcodes::not(dr, sr, r),
            Instruction::Br { n, z, p, pc_offset } => opcodes::br(n, z, p, pc_offset, r),
            Instruction::Jmp { base } => opcodes::jmp(base, r),
            Instruction::Jsr { target } => opcodes::jsr(target, r),
            Instruction::Ld { dr, pc_offset } => {
                opcodes::ld(dr, pc_offset, r, &mut self.memory)?;
            }
            Instruction::Ldi { dr, pc_offset } => {
                opcodes::ldi(dr, pc_offset, r, &mut self.memory)?;
            }
            Instruction::Ldr { dr, base, offset } => {
                opcodes::ldr(dr, base, offset, r, &mut self.memory)?;
            }
            Instruction::Lea { dr, pc_offset } => opcodes::lea(dr, pc_offset, r),
            Instruction::St { sr, pc_offset } => opcodes::st(sr, pc_offset, r, &mut self.memory),
            Instruction::Sti { sr, pc_offset } => {
                opcodes::sti(sr, pc_offset, r, &mut self.memory)?;
            }
            Instruction::Str { sr, base, offset } => {
                opcodes::str(sr, base, offset, r, &mut self.memory);
            }
            Instruction::Trap { vector } => {
                let outcome = trap_routines::execute(
                    vector,
                    r,
                    &mut self.memory,
                    &self.keyboard,
                    &mut self.output,
                )?;
                if outcome == StepOutcome::Halted {
                    self.state = State::Halted;
                }
                return Ok(outcome);
            }
        }
        Ok(StepOutcome::Continue)
    }

    /// Register file view for inspection or tracing.
    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Memory view for inspection, reads through it have no side effects.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// Puts the register file back into its power-on state and makes the
    /// machine runnable again. Memory is left alone.
    pub fn reset_registers(&mut self) {
        self.registers = Registers::new();
        self.state = State::Running;
    }
}

/// Reads an object image file and returns a terminal-wired emulator with the
/// image loaded.
///
/// # Errors
/// [`LoadError`] when the file cannot be read or is not a valid image.
pub fn from_program<P: AsRef<Path>>(path: P) -> Result<Emulator<ConsoleWriter>, LoadError> {
    let image = ObjectImage::open(path)?;
    let mut emulator = Emulator::new();
    emulator.load_image(&image);
    Ok(emulator)
}

/// Like [`from_program`] for an image already in memory.
///
/// # Errors
/// [`LoadError`] when the bytes are not a valid image.
pub fn from_program_bytes(bytes: &[u8]) -> Result<Emulator<ConsoleWriter>, LoadError> {
    let image = ObjectImage::from_bytes(bytes)?;
    let mut emulator = Emulator::new();
    emulator.load_image(&image);
    Ok(emulator)
}
