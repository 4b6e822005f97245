use core::fmt::Display;

use binread::BinRead;
use encoding_rs::Encoding;

/// A string stored in a fixed-size buffer, NUL-padded to its full extent.
///
/// The whole buffer is always consumed; the decoded text stops at the first
/// NUL. Undecodable bytes come back as U+FFFD rather than failing the parse,
/// since a damaged label is still evidence.
#[derive(Clone, Debug)]
pub struct FixedSizeString(String);

impl BinRead for FixedSizeString {
    type Args = (usize, &'static Encoding);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        (count, encoding): Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let mut buffer = vec![0; count];
        reader.read_exact(&mut buffer)?;

        let (cow, _, _) = encoding.decode(&buffer);
        let decoded = match cow.find('\0') {
            Some(end) => cow[..end].to_string(),
            None => cow.into_owned(),
        };
        Ok(Self(decoded))
    }
}

impl Display for FixedSizeString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for FixedSizeString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FixedSizeString {
    /// returns `true` if the string is empty and `false` otherwise
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binread::BinReaderExt;
    use encoding_rs::{UTF_16LE, WINDOWS_1252};
    use std::io::Cursor;

    #[test]
    fn stops_at_first_nul() {
        let mut reader = Cursor::new(b"label\0junk\0\0".to_vec());
        let s: FixedSizeString = reader.read_le_args((12, WINDOWS_1252)).unwrap();
        assert_eq!(s.as_ref(), "label");
        assert_eq!(reader.position(), 12, "the full buffer must be consumed");
    }

    #[test]
    fn decodes_utf16() {
        let mut data = Vec::new();
        for unit in "wide".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0, 0, 0]);
        let mut reader = Cursor::new(data);
        let s: FixedSizeString = reader.read_le_args((12, UTF_16LE)).unwrap();
        assert_eq!(s.as_ref(), "wide");
    }
}
