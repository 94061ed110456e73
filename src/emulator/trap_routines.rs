use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::emulator::StepOutcome;
use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInput;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{Registers, from_binary};

/// The six assigned trap vectors.
///
/// Derived with [`enumn::N`] so a vector byte can be looked up directly;
/// lookup failure is the unassigned-vector case.
#[repr(u8)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapVector {
    GetC = 0x20,
    Out = 0x21,
    PutS = 0x22,
    In = 0x23,
    PutSp = 0x24,
    Halt = 0x25,
}

impl TrapVector {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::GetC => "GETC",
            Self::Out => "OUT",
            Self::PutS => "PUTS",
            Self::In => "IN",
            Self::PutSp => "PUTSP",
            Self::Halt => "HALT",
        }
    }
}

/// TRAP: executes the system call selected by the 8-bit vector.
/// ```text
///  15__12__11_8____7______0_
/// | 1111 | 0000 | trapvect8 |
///  -------------------------
/// ```
/// R7 receives the return address first, before the vector is inspected, so
/// an unassigned vector still clobbers R7 like a real one. What each routine
/// does:
/// - GETC reads one character into R0, high byte cleared, no echo
/// - OUT writes the low byte of R0
/// - PUTS writes one character per word starting at the address in R0 until
///   a zero word
/// - IN is GETC plus an echo of the character
/// - PUTSP writes two packed characters per word, low byte first; a zero
///   byte in either half ends the string and nothing of that word is printed
/// - HALT yields the terminal outcome
///
/// Output is flushed after every routine that writes.
pub(crate) fn execute<W: Write>(
    vector: u8,
    r: &mut Registers,
    memory: &mut Memory,
    keyboard: &Rc<RefCell<dyn KeyboardInput>>,
    output: &mut W,
) -> Result<StepOutcome, ExecutionError> {
    r.set(7, r.pc());
    let Some(known) = TrapVector::n(vector) else {
        return Ok(StepOutcome::UnknownTrap { vector });
    };
    match known {
        TrapVector::GetC => {
            let key = read_key(keyboard)?;
            r.set(0, from_binary(u16::from(key)));
        }
        TrapVector::Out => {
            write_bytes(&[low_byte(r.get(0).as_binary())], output)?;
        }
        TrapVector::PutS => {
            let bytes = collect_string(memory, r.get(0).as_binary())?;
            write_bytes(&bytes, output)?;
        }
        TrapVector::In => {
            let key = read_key(keyboard)?;
            r.set(0, from_binary(u16::from(key)));
            write_bytes(&[key], output)?;
        }
        TrapVector::PutSp => {
            let bytes = collect_packed_string(memory, r.get(0).as_binary())?;
            write_bytes(&bytes, output)?;
        }
        TrapVector::Halt => return Ok(StepOutcome::Halted),
    }
    Ok(StepOutcome::Continue)
}

fn read_key(keyboard: &Rc<RefCell<dyn KeyboardInput>>) -> Result<u8, ExecutionError> {
    keyboard
        .borrow_mut()
        .read_key()
        .map_err(ExecutionError::Input)
}

fn collect_string(memory: &mut Memory, start: u16) -> Result<Vec<u8>, ExecutionError> {
    let mut bytes = Vec::with_capacity(120);
    let mut address = start;
    loop {
        let word = memory.read(address)?;
        if word == 0 {
            break;
        }
        bytes.push(low_byte(word));
        address = address.wrapping_add(1);
    }
    Ok(bytes)
}

fn collect_packed_string(memory: &mut Memory, start: u16) -> Result<Vec<u8>, ExecutionError> {
    let mut bytes = Vec::with_capacity(120);
    let mut address = start;
    loop {
        let word = memory.read(address)?;
        let [low, high] = word.to_le_bytes();
        if low == 0 || high == 0 {
            break;
        }
        bytes.push(low);
        bytes.push(high);
        address = address.wrapping_add(1);
    }
    Ok(bytes)
}

fn write_bytes<W: Write>(bytes: &[u8], output: &mut W) -> Result<(), ExecutionError> {
    output
        .write_all(bytes)
        .and_then(|()| output.flush())
        .map_err(ExecutionError::Output)
}

#[expect(clippy::cast_possible_truncation)] // the low byte is the character
const fn low_byte(word: u16) -> u8 {
    word as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::keyboard::ScriptedKeyboard;
    use googletest::prelude::*;

    fn fixture(script: &str) -> (Registers, Memory, Rc<RefCell<dyn KeyboardInput>>) {
        let keyboard: Rc<RefCell<dyn KeyboardInput>> =
            Rc::new(RefCell::new(ScriptedKeyboard::new(script)));
        let memory = Memory::new(Rc::clone(&keyboard));
        (Registers::new(), memory, keyboard)
    }

    fn as_string(output: Vec<u8>) -> String {
        String::from_utf8(output).unwrap()
    }

    #[gtest]
    pub fn test_trap_saves_return_address_before_vector_lookup() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        regs.set_pc(0x3001);
        let outcome = execute(0x26, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::UnknownTrap { vector: 0x26 }));
        expect_that!(regs.get(7), eq(from_binary(0x3001)));
        expect_that!(output, is_empty());
    }

    #[gtest]
    pub fn test_trap_get_c() {
        let (mut regs, mut memory, keyboard) = fixture("a");
        let mut output = Vec::new();
        regs.set(0, from_binary(0xFFFF)); // to show the high byte gets cleared
        let outcome = execute(0x20, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Continue));
        expect_that!(regs.get(0), eq(from_binary(u16::from(b'a'))));
        expect_that!(output, is_empty());
    }

    #[gtest]
    pub fn test_trap_get_c_propagates_input_error() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        let result = execute(0x20, &mut regs, &mut memory, &keyboard, &mut output);
        assert!(matches!(result, Err(ExecutionError::Input(_))));
    }

    #[gtest]
    pub fn test_trap_out_writes_low_byte_only() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        regs.set(0, from_binary(0x026B)); // 'k' with a dirty high byte
        let outcome = execute(0x21, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Continue));
        expect_that!(as_string(output), eq("k"));
    }

    #[gtest]
    pub fn test_trap_put_s() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        for (i, word) in [u16::from(b'H'), u16::from(b'i'), u16::from(b'!'), 0]
            .into_iter()
            .enumerate()
        {
            memory.write(0x3005 + u16::try_from(i).unwrap(), word);
        }
        regs.set(0, from_binary(0x3005));
        let outcome = execute(0x22, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Continue));
        expect_that!(as_string(output), eq("Hi!"));
    }

    #[gtest]
    pub fn test_trap_in_echoes() {
        let (mut regs, mut memory, keyboard) = fixture("q");
        let mut output = Vec::new();
        let outcome = execute(0x23, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Continue));
        expect_that!(regs.get(0), eq(from_binary(u16::from(b'q'))));
        expect_that!(as_string(output), eq("q"));
    }

    #[gtest]
    pub fn test_trap_put_sp() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        let data = [0x6548u16, 0x6c6c, 0x206f, 0x6f57, 0x6c72, 0x2164, 0x0000];
        for (i, word) in data.into_iter().enumerate() {
            memory.write(0x3005 + u16::try_from(i).unwrap(), word);
        }
        regs.set(0, from_binary(0x3005));
        let outcome = execute(0x24, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Continue));
        expect_that!(as_string(output), eq("Hello World!"));
    }

    #[gtest]
    pub fn test_trap_put_sp_stops_at_word_with_zero_byte() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        memory.write(0x3000, 0x6948); // "Hi"
        memory.write(0x3001, 0x0021); // '!' below a zero high byte, not printed
        regs.set(0, from_binary(0x3000));
        execute(0x24, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(as_string(output), eq("Hi"));
    }

    #[gtest]
    pub fn test_trap_halt() {
        let (mut regs, mut memory, keyboard) = fixture("");
        let mut output = Vec::new();
        let outcome = execute(0x25, &mut regs, &mut memory, &keyboard, &mut output).unwrap();
        expect_that!(outcome, eq(StepOutcome::Halted));
        expect_that!(output, is_empty());
    }
}
