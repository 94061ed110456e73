//! Counts down from 9 to 1, one digit per OUT trap.
use std::error::Error;

use byteorder::{BigEndian, WriteBytesExt};
use lc3vm::emulator;

const PROGRAM: [u16; 13] = [
    0x3000, // origin
    0x5260, // AND R1, R1, #0   counter := 0
    0x1269, // ADD R1, R1, #9   counter := 9
    0x2407, // LD  R2, #7       R2 := '0'
    0x1042, // ADD R0, R1, R2   digit character
    0xF021, // OUT
    0x127F, // ADD R1, R1, #-1
    0x03FC, // BRp #-4          back to the ADD while positive
    0x2003, // LD  R0, #3       R0 := '\n'
    0xF021, // OUT
    0xF025, // HALT
    0x0030, // '0'
    0x000A, // '\n'
];

fn main() -> Result<(), Box<dyn Error>> {
    let mut bytes = Vec::with_capacity(PROGRAM.len() * 2);
    for word in PROGRAM {
        bytes.write_u16::<BigEndian>(word)?;
    }
    let mut emulator = emulator::from_program_bytes(&bytes)?;
    emulator.run()?;
    Ok(())
}
