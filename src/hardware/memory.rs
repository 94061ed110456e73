use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::errors::ExecutionError;
use crate::hardware::keyboard::KeyboardInput;
use crate::loader::ObjectImage;

/// Number of 16-bit words in the address space, 0x0000..=0xFFFF.
pub const MEMORY_WORDS: usize = 1 << 16;

/// The LC-3 memory: the full 64K word address space plus the keyboard
/// collaborator behind the two memory-mapped keyboard registers.
///
/// Every address is readable and writable; there is no out-of-range address.
/// Reading the keyboard status register polls the keyboard and refreshes the
/// status/data pair first, every other read is a plain array access.
pub struct Memory {
    /// Index equals memory address
    data: Vec<u16>,
    keyboard: Rc<RefCell<dyn KeyboardInput>>,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("words", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// Memory addresses mapped to IO functionality.
#[repr(u16)]
#[derive(enumn::N, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMappedIo {
    /// Keyboard Status Register, bit 15 set while a key is available.
    KeyboardStatus = 0xFE00,
    /// Keyboard Data Register, code of the last polled key.
    KeyboardData = 0xFE02,
}

impl Memory {
    const KEY_AVAILABLE: u16 = 1 << 15;

    #[must_use]
    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInput>>) -> Self {
        Self {
            data: vec![0x0u16; MEMORY_WORDS],
            keyboard,
        }
    }

    /// Reads the word at `addr`, applying the memory-mapped IO policy.
    ///
    /// # Errors
    /// - Keyboard collaborator failure while polling the status register
    pub fn read(&mut self, addr: u16) -> Result<u16, ExecutionError> {
        match MemoryMappedIo::n(addr) {
            Some(MemoryMappedIo::KeyboardStatus) => self.refresh_keyboard_registers()?,
            // data register reads return whatever the last poll stored
            Some(MemoryMappedIo::KeyboardData) | None => {}
        }
        Ok(self.data[usize::from(addr)])
    }

    /// Stores `value` at `addr`. Writes are plain stores everywhere,
    /// including the memory-mapped addresses.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.data[usize::from(addr)] = value;
    }

    /// Side-effect-free view of the word at `addr` for tooling and tests;
    /// never touches the keyboard.
    #[must_use]
    pub fn inspect(&self, addr: u16) -> u16 {
        self.data[usize::from(addr)]
    }

    /// Copies a parsed object image into memory at its origin.
    ///
    /// `ObjectImage` guarantees origin + length fit the address space, so the
    /// copy cannot run off the end. Everything outside the image keeps its
    /// previous contents (zero on a fresh machine).
    pub fn load_image(&mut self, image: &ObjectImage) {
        let start = usize::from(image.origin());
        let words = image.words();
        self.data[start..start + words.len()].copy_from_slice(words);
    }

    fn refresh_keyboard_registers(&mut self) -> Result<(), ExecutionError> {
        let mut keyboard = self.keyboard.borrow_mut();
        if keyboard.poll_key().map_err(ExecutionError::Input)? {
            let key = keyboard.read_key().map_err(ExecutionError::Input)?;
            self.data[MemoryMappedIo::KeyboardStatus as usize] = Self::KEY_AVAILABLE;
            self.data[MemoryMappedIo::KeyboardData as usize] = u16::from(key);
        } else {
            self.data[MemoryMappedIo::KeyboardStatus as usize] = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use googletest::prelude::*;

    use super::{Memory, MemoryMappedIo};
    use crate::hardware::keyboard::ScriptedKeyboard;
    use crate::loader::ObjectImage;

    const KBSR: u16 = MemoryMappedIo::KeyboardStatus as u16;
    const KBDR: u16 = MemoryMappedIo::KeyboardData as u16;

    fn memory_with_script(script: &str) -> Memory {
        Memory::new(Rc::new(RefCell::new(ScriptedKeyboard::new(script))))
    }

    #[gtest]
    fn test_read_write_roundtrip() {
        let mut memory = memory_with_script("");
        memory.write(0x3010, 0xCAFE);
        expect_that!(memory.read(0x3010).unwrap(), eq(0xCAFE));
        expect_that!(memory.read(0x0000).unwrap(), eq(0));
        expect_that!(memory.read(0xFFFF).unwrap(), eq(0));
    }

    #[gtest]
    fn test_status_read_with_key_sets_status_and_data() {
        let mut memory = memory_with_script("a");
        expect_that!(memory.read(KBSR).unwrap(), eq(1 << 15));
        expect_that!(memory.read(KBDR).unwrap(), eq(u16::from(b'a')));
        // data register reads have no side effect
        expect_that!(memory.read(KBDR).unwrap(), eq(u16::from(b'a')));
    }

    #[gtest]
    fn test_status_read_without_key_clears_status() {
        let mut memory = memory_with_script("a");
        expect_that!(memory.read(KBSR).unwrap(), eq(1 << 15));
        // the single scripted key was consumed by the first poll
        expect_that!(memory.read(KBSR).unwrap(), eq(0));
        expect_that!(memory.read(KBDR).unwrap(), eq(u16::from(b'a')));
    }

    #[gtest]
    fn test_inspect_never_polls() {
        let mut memory = memory_with_script("z");
        expect_that!(memory.inspect(KBSR), eq(0));
        // the key is still pending, a real read finds it
        expect_that!(memory.read(KBSR).unwrap(), eq(1 << 15));
    }

    #[gtest]
    fn test_mapped_addresses_accept_plain_writes() {
        let mut memory = memory_with_script("");
        memory.write(KBSR, 0x1234);
        memory.write(KBDR, 0x5678);
        expect_that!(memory.inspect(0xFE00), eq(0x1234));
        expect_that!(memory.inspect(0xFE02), eq(0x5678));
    }

    #[gtest]
    fn test_load_image_places_words_at_origin() {
        let image =
            ObjectImage::from_bytes(&[0x40, 0x00, 0x12, 0x34, 0xAB, 0xCD]).expect("valid image");
        let mut memory = memory_with_script("");
        memory.load_image(&image);
        expect_that!(memory.inspect(0x4000), eq(0x1234));
        expect_that!(memory.inspect(0x4001), eq(0xABCD));
        expect_that!(memory.inspect(0x3FFF), eq(0));
        expect_that!(memory.inspect(0x4002), eq(0));
    }
}
