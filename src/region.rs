//! A bounds-checked view over one self-contained region of the input.
//!
//! The offset-driven structures (LinkInfo, serialized property stores) store
//! fields that point *into* their own extent instead of following each other,
//! so they are decoded from a region snapshot rather than from the running
//! stream. Every read is checked against the region length; nothing in the
//! higher layers indexes with raw arithmetic.

use byteorder::{ByteOrder, LE};
use encoding_rs::Encoding;
use uuid::Builder;

use crate::{Error, Guid};

/// An immutable byte region plus the absolute file offset of its first byte.
#[derive(Clone, Copy)]
pub(crate) struct Region<'a> {
    bytes: &'a [u8],
    base: u64,
}

impl<'a> Region<'a> {
    pub fn new(bytes: &'a [u8], base: u64) -> Self {
        Self { bytes, base }
    }

    /// Absolute file offset of a region-relative offset.
    pub fn abs(&self, offset: usize) -> u64 {
        self.base + offset as u64
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// A sub-view of exactly `len` bytes starting at `offset`.
    pub fn subregion(&self, offset: usize, len: usize) -> Result<Region<'a>, Error> {
        match offset.checked_add(len).and_then(|end| self.bytes.get(offset..end)) {
            Some(bytes) => Ok(Region::new(bytes, self.abs(offset))),
            None => Err(Error::Truncated {
                offset: self.abs(offset),
            }),
        }
    }

    /// Everything from `offset` to the end of the region.
    pub fn tail(&self, offset: usize) -> Result<Region<'a>, Error> {
        match self.bytes.get(offset..) {
            Some(bytes) => Ok(Region::new(bytes, self.abs(offset))),
            None => Err(Error::Truncated {
                offset: self.abs(offset),
            }),
        }
    }

    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], Error> {
        Ok(self.subregion(offset, len)?.bytes)
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, Error> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, Error> {
        Ok(LE::read_u16(self.bytes_at(offset, 2)?))
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16, Error> {
        Ok(LE::read_i16(self.bytes_at(offset, 2)?))
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, Error> {
        Ok(LE::read_u32(self.bytes_at(offset, 4)?))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32, Error> {
        Ok(LE::read_i32(self.bytes_at(offset, 4)?))
    }

    pub fn u64_at(&self, offset: usize) -> Result<u64, Error> {
        Ok(LE::read_u64(self.bytes_at(offset, 8)?))
    }

    pub fn i64_at(&self, offset: usize) -> Result<i64, Error> {
        Ok(LE::read_i64(self.bytes_at(offset, 8)?))
    }

    pub fn f32_at(&self, offset: usize) -> Result<f32, Error> {
        Ok(LE::read_f32(self.bytes_at(offset, 4)?))
    }

    pub fn f64_at(&self, offset: usize) -> Result<f64, Error> {
        Ok(LE::read_f64(self.bytes_at(offset, 8)?))
    }

    /// A GUID in packet representation (mixed endianness).
    pub fn guid_at(&self, offset: usize) -> Result<Guid, Error> {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(self.bytes_at(offset, 16)?);
        Ok(Guid::from_uuid(Builder::from_bytes_le(raw).into_uuid()))
    }

    /// A NUL-terminated code-page string starting at `offset`. The terminator
    /// must fall inside the region.
    pub fn cstring_at(&self, offset: usize, encoding: &'static Encoding) -> Result<String, Error> {
        let tail = self.tail(offset)?;
        match tail.bytes.iter().position(|&b| b == 0) {
            Some(end) => {
                let (cow, _, _) = encoding.decode(&tail.bytes[..end]);
                Ok(cow.into_owned())
            }
            None => Err(Error::Truncated {
                offset: self.abs(offset),
            }),
        }
    }

    /// A NUL-terminated UTF-16LE string starting at `offset`.
    pub fn wstring_at(&self, offset: usize) -> Result<String, Error> {
        let tail = self.tail(offset)?;
        let mut units = Vec::new();
        let mut chunks = tail.bytes.chunks_exact(2);
        loop {
            match chunks.next() {
                Some(chunk) => {
                    let unit = u16::from_le_bytes([chunk[0], chunk[1]]);
                    if unit == 0 {
                        return Ok(String::from_utf16_lossy(&units));
                    }
                    units.push(unit);
                }
                None => {
                    return Err(Error::Truncated {
                        offset: self.abs(offset),
                    })
                }
            }
        }
    }

    /// A UTF-16LE string of exactly `units` code units (no terminator).
    pub fn wstring_exact_at(&self, offset: usize, units: usize) -> Result<String, Error> {
        let bytes = self.bytes_at(offset, units * 2)?;
        let decoded: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|&u| u != 0)
            .collect();
        Ok(String::from_utf16_lossy(&decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    #[test]
    fn reads_are_bounds_checked() {
        let region = Region::new(&[1, 2, 3], 0x100);
        assert_eq!(region.u16_at(1).unwrap(), 0x0302);
        match region.u32_at(1) {
            Err(Error::Truncated { offset }) => assert_eq!(offset, 0x101),
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn subregion_tracks_absolute_offsets() {
        let data = [0u8; 16];
        let region = Region::new(&data, 0x40);
        let sub = region.subregion(4, 8).unwrap();
        assert_eq!(sub.abs(0), 0x44);
        assert!(region.subregion(10, 10).is_err());
    }

    #[test]
    fn cstring_requires_terminator() {
        let region = Region::new(b"abc\0def", 0);
        assert_eq!(region.cstring_at(0, WINDOWS_1252).unwrap(), "abc");
        assert!(region.cstring_at(4, WINDOWS_1252).is_err());
    }
}
