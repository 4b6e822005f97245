use binread::{BinRead, BinReaderExt};
use encoding_rs::Encoding;
use getset::Getters;
use log::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::strings::{SizedString, StringEncoding};
use crate::LinkFlags;

/// The StringData section ([MS-SHLLINK] 2.4): up to five counted strings,
/// each present iff its header flag bit is set, in this fixed order.
///
/// Whether an entry's units are bytes or UTF-16 words is decided once for
/// the whole section by the `IS_UNICODE` header flag.
#[derive(Clone, Debug, Default, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct StringData {
    name_string: Option<SizedString>,
    relative_path: Option<SizedString>,
    working_dir: Option<SizedString>,
    command_line_arguments: Option<SizedString>,
    icon_location: Option<SizedString>,
}

impl StringData {
    /// Total bytes the present entries occupy in the file.
    pub fn byte_len(&self, flags: LinkFlags) -> u64 {
        let unit: u64 = if flags.contains(LinkFlags::IS_UNICODE) {
            2
        } else {
            1
        };
        self.entries()
            .into_iter()
            .flatten()
            .map(|s| 2 + s.char_count() as u64 * unit)
            .sum()
    }

    /// The five slots in stored order.
    pub fn entries(&self) -> [Option<&SizedString>; 5] {
        [
            self.name_string.as_ref(),
            self.relative_path.as_ref(),
            self.working_dir.as_ref(),
            self.command_line_arguments.as_ref(),
            self.icon_location.as_ref(),
        ]
    }
}

impl BinRead for StringData {
    type Args = (LinkFlags, &'static Encoding);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        (flags, default_codepage): Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let encoding = StringEncoding::for_string_data(flags, default_codepage);

        let mut read_if = |bit: LinkFlags| -> binread::prelude::BinResult<Option<SizedString>> {
            if flags.contains(bit) {
                let s: SizedString = reader.read_le_args((encoding,))?;
                debug!("{bit:?}: {s}");
                Ok(Some(s))
            } else {
                Ok(None)
            }
        };

        Ok(Self {
            name_string: read_if(LinkFlags::HAS_NAME)?,
            relative_path: read_if(LinkFlags::HAS_RELATIVE_PATH)?,
            working_dir: read_if(LinkFlags::HAS_WORKING_DIR)?,
            command_line_arguments: read_if(LinkFlags::HAS_ARGUMENTS)?,
            icon_location: read_if(LinkFlags::HAS_ICON_LOCATION)?,
        })
    }
}
