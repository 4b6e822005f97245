use encoding_rs::Encoding;

use crate::LinkFlags;

/// Selects how a stored string is encoded.
#[derive(Copy, Clone, Debug)]
pub enum StringEncoding {
    /// A character string in the system default code page.
    CodePage(&'static Encoding),

    /// UTF-16LE, which is what the format calls "Unicode".
    Unicode,
}

impl StringEncoding {
    /// Bytes per code unit.
    pub fn unit_len(&self) -> usize {
        match self {
            Self::CodePage(_) => 1,
            Self::Unicode => 2,
        }
    }

    /// The encoding the StringData section uses, given the header flags.
    pub fn for_string_data(flags: LinkFlags, default_codepage: &'static Encoding) -> Self {
        if flags.contains(LinkFlags::IS_UNICODE) {
            Self::Unicode
        } else {
            Self::CodePage(default_codepage)
        }
    }
}
