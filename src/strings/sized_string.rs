use std::fmt::Display;

use binread::{BinRead, BinReaderExt};
use encoding_rs::UTF_16LE;
use log::trace;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::strings::StringEncoding;

/// A counted string: a 16-bit code-unit count followed by that many units,
/// with no terminator. The count is kept alongside the decoded text because
/// it is part of the evidence.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SizedString {
    char_count: u16,
    text: String,
}

impl BinRead for SizedString {
    type Args = (StringEncoding,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let char_count: u16 = reader.read_le()?;
        trace!(
            "reading sized string of {char_count} units at 0x{:08x}",
            reader.stream_position()?
        );

        let mut buffer = vec![0; char_count as usize * args.0.unit_len()];
        reader.read_exact(&mut buffer)?;

        let (cow, _, _) = match args.0 {
            StringEncoding::CodePage(encoding) => encoding.decode(&buffer),
            StringEncoding::Unicode => UTF_16LE.decode(&buffer),
        };
        Ok(Self {
            char_count,
            text: cow.into_owned(),
        })
    }
}

impl SizedString {
    /// The stored code-unit count.
    pub fn char_count(&self) -> u16 {
        self.char_count
    }

    /// Bytes this entry occupied in the file, count field included.
    pub fn byte_len(&self, encoding: StringEncoding) -> u64 {
        2 + self.char_count as u64 * encoding.unit_len() as u64
    }
}

impl Display for SizedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.text.fmt(f)
    }
}

impl AsRef<str> for SizedString {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;
    use std::io::Cursor;

    #[test]
    fn codepage_count_is_bytes() {
        let mut reader = Cursor::new(b"\x03\x00abcde".to_vec());
        let s: SizedString = reader
            .read_le_args((StringEncoding::CodePage(WINDOWS_1252),))
            .unwrap();
        assert_eq!(s.as_ref(), "abc");
        assert_eq!(s.char_count(), 3);
        assert_eq!(s.byte_len(StringEncoding::CodePage(WINDOWS_1252)), 5);
    }

    #[test]
    fn unicode_count_is_units() {
        let mut data = vec![0x02, 0x00];
        for unit in "hi".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let mut reader = Cursor::new(data);
        let s: SizedString = reader.read_le_args((StringEncoding::Unicode,)).unwrap();
        assert_eq!(s.as_ref(), "hi");
        assert_eq!(s.byte_len(StringEncoding::Unicode), 6);
    }
}
