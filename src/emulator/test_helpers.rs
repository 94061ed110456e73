use std::cell::RefCell;
use std::io;
use std::io::Write;
use std::rc::Rc;

use byteorder::{BigEndian, WriteBytesExt};

use crate::emulator::Emulator;
use crate::hardware::keyboard::ScriptedKeyboard;
use crate::loader::ObjectImage;

/// A [`Write`] whose buffer stays readable from outside the emulator.
/// Clones share the same buffer.
#[derive(Clone, Default)]
pub struct SharedWriter {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl SharedWriter {
    pub fn new() -> Self {
        Self {
            buffer: Rc::new(RefCell::new(Vec::with_capacity(120))),
        }
    }

    pub fn get_string(&self) -> String {
        String::from_utf8(self.buffer.borrow().clone()).unwrap()
    }
}

impl Write for SharedWriter {
    fn write(&mut self, data: &[u8]) -> Result<usize, io::Error> {
        self.buffer.borrow_mut().write(data)
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Serializes words into the on-disk image format, origin first, big-endian.
pub fn image_bytes(origin: u16, words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((words.len() + 1) * 2);
    bytes.write_u16::<BigEndian>(origin).unwrap();
    for &word in words {
        bytes.write_u16::<BigEndian>(word).unwrap();
    }
    bytes
}

pub fn image(origin: u16, words: &[u16]) -> ObjectImage {
    ObjectImage::from_bytes(&image_bytes(origin, words)).unwrap()
}

/// An emulator with `words` loaded at 0x3000, reading keys from `script` and
/// writing into the returned [`SharedWriter`].
pub fn emulator_with_program(words: &[u16], script: &str) -> (Emulator<SharedWriter>, SharedWriter) {
    let writer = SharedWriter::new();
    let mut emulator = Emulator::with_io(ScriptedKeyboard::new(script), writer.clone());
    emulator.load_image(&image(0x3000, words));
    (emulator, writer)
}
