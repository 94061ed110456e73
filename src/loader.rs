use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use crate::errors::LoadError;
use crate::hardware::memory::MEMORY_WORDS;

/// A parsed LC-3 object image: origin address plus the program words.
///
/// The on-disk format is a 2-byte big-endian origin followed by a stream of
/// 2-byte big-endian words, so parsing always byte-swaps explicitly instead
/// of relying on the host byte order. A successfully parsed image is
/// guaranteed to fit the address space starting at its origin.
pub struct ObjectImage {
    origin: u16,
    words: Vec<u16>,
}

impl Debug for ObjectImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ObjectImage {{ origin: 0x{:04X}, words: {} }}",
            self.origin,
            self.words.len()
        )
    }
}

impl ObjectImage {
    /// Parses an object image from raw bytes.
    ///
    /// ```
    /// use lc3vm::loader::ObjectImage;
    ///
    /// let image = ObjectImage::from_bytes(&[0x30, 0x00, 0x12, 0x34]).unwrap();
    /// assert_eq!(image.origin(), 0x3000);
    /// assert_eq!(image.words(), &[0x1234]);
    /// ```
    ///
    /// # Errors
    /// - [`LoadError::MissingOrigHeader`] if there are fewer than two bytes
    /// - [`LoadError::ProgramTooLarge`] if origin + program length leaves the
    ///   address space
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let Some((header, body)) = bytes.split_at_checked(2) else {
            return Err(LoadError::MissingOrigHeader);
        };
        let origin = BigEndian::read_u16(header);
        // whole words only, a trailing odd byte is never part of the program
        let words: Vec<u16> = body.chunks_exact(2).map(BigEndian::read_u16).collect();
        if usize::from(origin) + words.len() > MEMORY_WORDS {
            return Err(LoadError::ProgramTooLarge {
                origin,
                words: words.len(),
            });
        }
        Ok(Self { origin, words })
    }

    /// Reads and parses the object image file at `path`.
    ///
    /// # Errors
    /// - [`LoadError::Io`] if the file cannot be read
    /// - everything [`Self::from_bytes`] reports
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    #[must_use]
    pub const fn origin(&self) -> u16 {
        self.origin
    }

    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use yare::parameterized;

    use super::ObjectImage;
    use crate::errors::LoadError;

    fn image_bytes(origin: u16, words: &[u16]) -> Vec<u8> {
        let mut bytes = origin.to_be_bytes().to_vec();
        for word in words {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    #[gtest]
    fn test_from_bytes_reads_big_endian_words() {
        let image = ObjectImage::from_bytes(&[0x30, 0x00, 0x12, 0x34, 0xFE, 0x02]).unwrap();
        expect_that!(image.origin(), eq(0x3000));
        expect_that!(image.words(), eq(&[0x1234, 0xFE02][..]));
    }

    #[gtest]
    fn test_from_bytes_roundtrips_arbitrary_words() {
        let words = [0x0000, 0xFFFF, 0x00FF, 0xFF00, 0x1025];
        let image = ObjectImage::from_bytes(&image_bytes(0x4000, &words)).unwrap();
        expect_that!(image.words(), eq(&words[..]));
    }

    #[parameterized(
        empty = { &[] },
        one_byte = { &[0x30] },
    )]
    fn test_from_bytes_without_origin_fails(bytes: &[u8]) {
        assert!(matches!(
            ObjectImage::from_bytes(bytes),
            Err(LoadError::MissingOrigHeader)
        ));
    }

    #[gtest]
    fn test_from_bytes_accepts_header_only_image() {
        let image = ObjectImage::from_bytes(&[0x30, 0x00]).unwrap();
        expect_that!(image.origin(), eq(0x3000));
        expect_that!(image.words(), is_empty());
    }

    #[gtest]
    fn test_from_bytes_ignores_trailing_odd_byte() {
        let image = ObjectImage::from_bytes(&[0x30, 0x00, 0x12, 0x34, 0xAB]).unwrap();
        expect_that!(image.words(), eq(&[0x1234][..]));
    }

    #[gtest]
    fn test_last_address_is_still_loadable() {
        let image = ObjectImage::from_bytes(&image_bytes(0xFFFF, &[0xBEEF])).unwrap();
        expect_that!(image.origin(), eq(0xFFFF));
        expect_that!(image.words(), eq(&[0xBEEF][..]));
    }

    #[gtest]
    fn test_program_past_end_of_address_space_fails() {
        let result = ObjectImage::from_bytes(&image_bytes(0xFFFF, &[0xBEEF, 0xBEEF]));
        assert!(matches!(
            result,
            Err(LoadError::ProgramTooLarge {
                origin: 0xFFFF,
                words: 2,
            })
        ));
    }

    #[gtest]
    fn test_full_address_space_program_is_accepted() {
        let words = vec![0u16; 1 << 16];
        let image = ObjectImage::from_bytes(&image_bytes(0x0000, &words)).unwrap();
        expect_that!(image.words().len(), eq(1 << 16));
    }

    #[gtest]
    fn test_open_missing_file_reports_io_error() {
        let result = ObjectImage::open("/nonexistent/image.obj");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
