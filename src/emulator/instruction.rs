use std::fmt;
use std::fmt::Formatter;

use crate::emulator::trap_routines::TrapVector;

/// One decoded LC-3 instruction.
///
/// Instruction words are `OOOO_XXXX_XXXX_XXXX`: a 4-bit opcode on top of a
/// 12-bit operand field whose layout depends on the opcode. Decoding
/// extracts every operand into typed form up front (register indices are
/// `0..=7`, immediates and offsets are already sign-extended), so execution
/// is an exhaustive match with no bit fiddling left to do.
///
/// The reserved opcode pattern `0b1101` has no variant; [`Instruction::decode`]
/// returns `None` for it. The `0b1000` pattern carries the same mode-bit
/// layout as `0b0100` and decodes to [`Instruction::Jsr`] as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `DR ← SR1 + source`
    Add { dr: u8, sr1: u8, source: Operand },
    /// `DR ← SR1 & source`
    And { dr: u8, sr1: u8, source: Operand },
    /// `DR ← !SR`
    Not { dr: u8, sr: u8 },
    /// `PC ← PC + pc_offset` when a requested flag matches the condition code
    Br {
        n: bool,
        z: bool,
        p: bool,
        pc_offset: i16,
    },
    /// `PC ← BaseR`; `base` 7 is the conventional RET
    Jmp { base: u8 },
    /// `R7 ← PC`, then `PC ← PC + offset` or `PC ← BaseR`
    Jsr { target: Operand },
    /// `DR ← Memory[PC + pc_offset]`
    Ld { dr: u8, pc_offset: i16 },
    /// `DR ← Memory[Memory[PC + pc_offset]]`
    Ldi { dr: u8, pc_offset: i16 },
    /// `DR ← Memory[BaseR + offset]`
    Ldr { dr: u8, base: u8, offset: i16 },
    /// `DR ← PC + pc_offset`, the address itself
    Lea { dr: u8, pc_offset: i16 },
    /// `Memory[PC + pc_offset] ← SR`
    St { sr: u8, pc_offset: i16 },
    /// `Memory[Memory[PC + pc_offset]] ← SR`
    Sti { sr: u8, pc_offset: i16 },
    /// `Memory[BaseR + offset] ← SR`
    Str { sr: u8, base: u8, offset: i16 },
    /// System call through an 8-bit trap vector
    Trap { vector: u8 },
}

/// Second source of a binary operation or a jump target: either a register
/// or a value sign-extended out of the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Immediate(i16),
}

impl Instruction {
    /// Decodes a fetched word; `None` is the reserved opcode pattern.
    #[must_use]
    pub const fn decode(word: u16) -> Option<Self> {
        let instruction = match bit_range(word, 12, 15) {
            0b0000 => Self::Br {
                n: bit(word, 11),
                z: bit(word, 10),
                p: bit(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b0001 => Self::Add {
                dr: register_at(word, 9),
                sr1: register_at(word, 6),
                source: source_operand(word),
            },
            0b0010 => Self::Ld {
                dr: register_at(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b0011 => Self::St {
                sr: register_at(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b0100 | 0b1000 => Self::Jsr {
                target: jsr_target(word),
            },
            0b0101 => Self::And {
                dr: register_at(word, 9),
                sr1: register_at(word, 6),
                source: source_operand(word),
            },
            0b0110 => Self::Ldr {
                dr: register_at(word, 9),
                base: register_at(word, 6),
                offset: sign_extend(word, 6),
            },
            0b0111 => Self::Str {
                sr: register_at(word, 9),
                base: register_at(word, 6),
                offset: sign_extend(word, 6),
            },
            0b1001 => Self::Not {
                dr: register_at(word, 9),
                sr: register_at(word, 6),
            },
            0b1010 => Self::Ldi {
                dr: register_at(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b1011 => Self::Sti {
                sr: register_at(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b1100 => Self::Jmp {
                base: register_at(word, 6),
            },
            0b1101 => return None, // reserved
            0b1110 => Self::Lea {
                dr: register_at(word, 9),
                pc_offset: sign_extend(word, 9),
            },
            0b1111 => Self::Trap {
                vector: vector_at(word),
            },
            _ => unreachable!(), // opcode field is four bits
        };
        Some(instruction)
    }
}

impl fmt::Display for Instruction {
    /// Renders the instruction as conventional LC-3 assembly, for tracing.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Add { dr, sr1, source } => write!(f, "ADD R{dr}, R{sr1}, {source}"),
            Self::And { dr, sr1, source } => write!(f, "AND R{dr}, R{sr1}, {source}"),
            Self::Not { dr, sr } => write!(f, "NOT R{dr}, R{sr}"),
            Self::Br { n, z, p, pc_offset } => {
                f.write_str("BR")?;
                if n {
                    f.write_str("n")?;
                }
                if z {
                    f.write_str("z")?;
                }
                if p {
                    f.write_str("p")?;
                }
                write!(f, " #{pc_offset}")
            }
            Self::Jmp { base: 7 } => f.write_str("RET"),
            Self::Jmp { base } => write!(f, "JMP R{base}"),
            Self::Jsr {
                target: Operand::Immediate(pc_offset),
            } => write!(f, "JSR #{pc_offset}"),
            Self::Jsr {
                target: Operand::Register(base),
            } => write!(f, "JSRR R{base}"),
            Self::Ld { dr, pc_offset } => write!(f, "LD R{dr}, #{pc_offset}"),
            Self::Ldi { dr, pc_offset } => write!(f, "LDI R{dr}, #{pc_offset}"),
            Self::Ldr { dr, base, offset } => write!(f, "LDR R{dr}, R{base}, #{offset}"),
            Self::Lea { dr, pc_offset } => write!(f, "LEA R{dr}, #{pc_offset}"),
            Self::St { sr, pc_offset } => write!(f, "ST R{sr}, #{pc_offset}"),
            Self::Sti { sr, pc_offset } => write!(f, "STI R{sr}, #{pc_offset}"),
            Self::Str { sr, base, offset } => write!(f, "STR R{sr}, R{base}, #{offset}"),
            Self::Trap { vector } => match TrapVector::n(vector) {
                Some(known) => f.write_str(known.mnemonic()),
                None => write!(f, "TRAP x{vector:02X}"),
            },
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Register(r) => write!(f, "R{r}"),
            Self::Immediate(value) => write!(f, "#{value}"),
        }
    }
}

const fn source_operand(word: u16) -> Operand {
    if bit(word, 5) {
        Operand::Immediate(sign_extend(word, 5))
    } else {
        Operand::Register(register_at(word, 0))
    }
}

const fn jsr_target(word: u16) -> Operand {
    if bit(word, 11) {
        Operand::Immediate(sign_extend(word, 11))
    } else {
        Operand::Register(register_at(word, 6))
    }
}

/// Gives the value of only the specified bit range, `from`..=`to`.
const fn bit_range(word: u16, from: u8, to: u8) -> u16 {
    debug_assert!(from <= to, "wrong direction of bit range");
    debug_assert!(to < 16, "bit index past u16");
    (word >> from) & ((0b1 << (to - from + 1)) - 1)
}

const fn bit(word: u16, index: u8) -> bool {
    bit_range(word, index, index) != 0
}

#[expect(clippy::cast_possible_truncation)] // three bits
const fn register_at(word: u16, lowest_bit: u8) -> u8 {
    bit_range(word, lowest_bit, lowest_bit + 2) as u8
}

#[expect(clippy::cast_possible_truncation)] // eight bits
const fn vector_at(word: u16) -> u8 {
    bit_range(word, 0, 7) as u8
}

/// Two's-complement sign extension of the low `valid_bits` bits of `word`.
///
/// Upper bits of `word` are ignored, so a whole instruction word can be
/// passed directly for any offset field starting at bit 0.
#[must_use]
pub(crate) const fn sign_extend(word: u16, valid_bits: u8) -> i16 {
    let bits = bit_range(word, 0, valid_bits - 1);
    let most_significant_bit = bits >> (valid_bits - 1);
    if most_significant_bit == 1 {
        // negative: 1-extend
        (bits | (0xFFFF << valid_bits)).cast_signed()
    } else {
        // positive, already 0-extended
        bits.cast_signed()
    }
}
