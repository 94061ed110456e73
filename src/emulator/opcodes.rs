//! Implemented operations for the LC-3.
//!
//! Every PC-relative address is formed from the PC as the handler sees it,
//! which is already advanced past the current instruction word.
use crate::emulator::instruction::Operand;
use crate::errors::ExecutionError;
use crate::hardware::memory::Memory;
use crate::hardware::registers::{ConditionFlag, Registers, from_binary};

/// ADD: Mathematical addition in 2 variants, wrapping around at 16 bits
/// - DR is set with result of SR 1 + SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0001 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 + sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0001 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn add(dr: u8, sr1: u8, source: Operand, r: &mut Registers) {
    let sum = r
        .get(sr1)
        .as_binary()
        .wrapping_add(operand_value(source, r));
    r.set(dr, from_binary(sum));
    r.update_condition(dr);
}

/// AND: bit-wise AND in 2 variants
/// - DR is set with result of SR 1 AND SR 2
/// ```text
///  15__12__11_9__8_6___5___4_3__2_0_
/// | 0101 |  DR | SR1 | 0 | 00 | SR2 |
///  ---------------------------------
/// ```
/// - DR is set with result of SR 1 AND sign extended immediate
/// ```text
///  15__12__11_9__8_6___5___4___0_
/// | 0101 |  DR | SR1 | 1 |  IMM5 |
///  ------------------------------
/// ```
pub fn and(dr: u8, sr1: u8, source: Operand, r: &mut Registers) {
    let result = r.get(sr1).as_binary() & operand_value(source, r);
    r.set(dr, from_binary(result));
    r.update_condition(dr);
}

/// NOT: bit-wise complement of the value in SR
/// ```text
///  15__12__11_9__8_6___5___0_
/// | 1001 |  DR |  SR | 11111 |
///  --------------------------
/// ```
pub fn not(dr: u8, sr: u8, r: &mut Registers) {
    r.set(dr, from_binary(!r.get(sr).as_binary()));
    r.update_condition(dr);
}

/// BR: Conditional Branch.
/// Adds the sign extended offset to PC if the current `ConditionFlag` matches
/// a set bit of `n`, `z` or `p`. With none of the bits set the branch is
/// never taken.
/// ```text
///  15__12__11_9___8_______0_
/// | 0000 |  nzp | PCoffset9 |
///  -------------------------
/// ```
/// See [`ConditionFlag`]
pub fn br(n: bool, z: bool, p: bool, pc_offset: i16, r: &mut Registers) {
    let taken = match r.condition() {
        ConditionFlag::Pos => p,
        ConditionFlag::Zero => z,
        ConditionFlag::Neg => n,
    };
    if taken {
        let destination = pc_relative_address(pc_offset, r);
        r.set_pc(destination);
    }
}

/// JMP or RET operation.
/// - JMP sets the PC to the value of register `BaseR`
/// ```text
///  15__12__11_9___8_6____5____0_
/// | 1100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// - RET same as JMP, but special case for returning from JSR where former PC is saved in R7.
/// ```text
///  15__12__11_9__8_6___5____0_
/// | 1100 | 000 | 111 | 000000 |
///  ---------------------------
/// ```
pub fn jmp(base: u8, r: &mut Registers) {
    r.set_pc(r.get(base).as_binary());
}

/// JSR: Jump to Sub-Routine.
/// Two variants:
/// - JSR to `PCOffset11`
/// ```text
///  15__12__11_10_________0
/// | 0100 | 1 | PCOffset11 |
///  -----------------------
/// ```
/// - JSRR: JSR to location in `BaseR`
/// ```text
///  15__12__11_9__8___6___5____0_
/// | 0100 | 000 | BaseR | 000000 |
///  -----------------------------
/// ```
/// The former PC is saved in R7. The branch target is read before R7 is
/// written, so JSRR through R7 jumps to the old R7 value.
pub fn jsr(target: Operand, r: &mut Registers) {
    let destination = match target {
        Operand::Register(base) => r.get(base).as_binary(),
        Operand::Immediate(pc_offset) => pc_relative_address(pc_offset, r),
    };
    r.set(7, r.pc());
    r.set_pc(destination);
}

/// LD: Loads content of memory address of PC + sign extended offset into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 0010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ld(
    dr: u8,
    pc_offset: i16,
    r: &mut Registers,
    memory: &mut Memory,
) -> Result<(), ExecutionError> {
    let value = memory.read(pc_relative_address(pc_offset, r))?;
    r.set(dr, from_binary(value));
    r.update_condition(dr);
    Ok(())
}

/// LDI: Load indirect.
/// Calculates memory address of PC + sign extended offset and reads another address from there,
/// the content of the memory at that indirectly loaded address is put into DR.
/// ```text
///  15__12__11_9___8_______0_
/// | 1010 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn ldi(
    dr: u8,
    pc_offset: i16,
    r: &mut Registers,
    memory: &mut Memory,
) -> Result<(), ExecutionError> {
    let value_address = memory.read(pc_relative_address(pc_offset, r))?;
    let value = memory.read(value_address)?;
    r.set(dr, from_binary(value));
    r.update_condition(dr);
    Ok(())
}

/// LDR: Load address from base register and adds sign extended offset to load the memory content
/// from there into DR.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0110 |  DR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn ldr(
    dr: u8,
    base: u8,
    offset: i16,
    r: &mut Registers,
    memory: &mut Memory,
) -> Result<(), ExecutionError> {
    let value = memory.read(base_relative_address(base, offset, r))?;
    r.set(dr, from_binary(value));
    r.update_condition(dr);
    Ok(())
}

/// LEA: Load Effective Address loads PC + sign extended offset into DR.
/// The address itself is the result, memory is not touched.
/// ```text
///  15__12__11_9___8_______0_
/// | 1110 |  DR  | PCoffset9 |
///  -------------------------
/// ```
pub fn lea(dr: u8, pc_offset: i16, r: &mut Registers) {
    r.set(dr, from_binary(pc_relative_address(pc_offset, r)));
    r.update_condition(dr);
}

/// ST: Store. The contents of the SR are written to memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 0011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn st(sr: u8, pc_offset: i16, r: &Registers, memory: &mut Memory) {
    memory.write(pc_relative_address(pc_offset, r), r.get(sr).as_binary());
}

/// STI: Store Indirect. The contents of the SR are written to the address which is loaded from
/// memory address PC + sign extended offset.
/// ```text
///  15__12__11_9___8_______0_
/// | 1011 |  SR  | PCoffset9 |
///  -------------------------
/// ```
pub fn sti(
    sr: u8,
    pc_offset: i16,
    r: &Registers,
    memory: &mut Memory,
) -> Result<(), ExecutionError> {
    let store_address = memory.read(pc_relative_address(pc_offset, r))?;
    memory.write(store_address, r.get(sr).as_binary());
    Ok(())
}

/// STR: Store contents of SR to memory address of base register plus sign extended offset.
/// ```text
///  15__12__11_9__8___6____5____0_
/// | 0111 |  SR | BaseR | offset6 |
///  ------------------------------
/// ```
pub fn str(sr: u8, base: u8, offset: i16, r: &Registers, memory: &mut Memory) {
    memory.write(base_relative_address(base, offset, r), r.get(sr).as_binary());
}

fn operand_value(source: Operand, r: &Registers) -> u16 {
    match source {
        Operand::Register(sr2) => r.get(sr2).as_binary(),
        Operand::Immediate(value) => value.cast_unsigned(),
    }
}

fn pc_relative_address(pc_offset: i16, r: &Registers) -> u16 {
    r.pc().as_binary().wrapping_add_signed(pc_offset)
}

fn base_relative_address(base: u8, offset: i16, r: &Registers) -> u16 {
    r.get(base).as_binary().wrapping_add_signed(offset)
}
