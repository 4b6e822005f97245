use core::fmt;

use binread::{BinRead, BinReaderExt};
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

/// One entry of an IDList ([MS-SHLLINK] 2.2.1): a 16-bit size that includes
/// the size field itself, followed by shell-data-source-defined bytes.
///
/// The payload is deliberately opaque at this layer — its interior is the
/// shell's business — but an owned copy is kept because property stores are
/// known to hide inside it (see [`crate::find_property_stores`]).
#[derive(Clone, Default, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct ItemID {
    /// Absolute file offset of the size field. Zero when the item came from
    /// a relocated buffer whose base was unknown at read time.
    #[cfg_attr(feature = "serde", serde(skip))]
    offset: u64,

    /// Declared size in bytes, including this field. Zero terminates a list.
    size: u16,

    /// The opaque payload (`size - 2` bytes).
    data: Vec<u8>,
}

impl ItemID {
    /// Absolute file offset of the payload bytes.
    pub fn payload_offset(&self) -> u64 {
        self.offset + 2
    }

    pub(crate) fn rebase(&mut self, base: u64) {
        self.offset += base;
    }
}

impl BinRead for ItemID {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let offset = reader.stream_position()?;
        let size: u16 = reader.read_le()?;
        if size == 1 || size == 2 {
            return Err(binread::Error::AssertFail {
                pos: offset,
                message: format!("an ItemID cannot be {size} bytes"),
            });
        }
        let mut data = Vec::new();
        if size > 0 {
            data = vec![0; size as usize - 2];
            reader.read_exact(&mut data)?;
        }
        Ok(Self { offset, size, data })
    }
}

impl fmt::Debug for ItemID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemID (offset 0x{:x}, {} bytes)", self.offset, self.size)
    }
}
