//! Prints a greeting through the PUTS trap routine.
use std::error::Error;

use byteorder::{BigEndian, WriteBytesExt};
use lc3vm::emulator;

fn main() -> Result<(), Box<dyn Error>> {
    let mut words = vec![
        0x3000, // origin
        0xE002, // LEA R0, #2    R0 := start of the string
        0xF022, // PUTS
        0xF025, // HALT
    ];
    words.extend("Hello World!\n".bytes().map(u16::from));
    words.push(0); // NUL terminator

    let mut bytes = Vec::with_capacity(words.len() * 2);
    for word in words {
        bytes.write_u16::<BigEndian>(word)?;
    }
    let mut emulator = emulator::from_program_bytes(&bytes)?;
    emulator.run()?;
    Ok(())
}
