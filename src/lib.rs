#![warn(missing_docs)]

//! # lnkspect — forensic parsing of Windows shell link files.
//!
//! This crate decodes the Shell Link Binary File Format
//! ([MS-SHLLINK](https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-shllink/16cb4ca1-9339-4d0c-a68d-bf1d6cc0f943))
//! into a fully typed model for forensic review: header, target IDList,
//! LinkInfo, StringData, and the ExtraData block chain, including the
//! serialized property stores ([MS-PROPSTORE]/[MS-OLEPS]) that hide in
//! three different places inside a link file.
//!
//! The decoder reads evidence, so it is deliberately conservative about
//! rejecting input: undefined flag bits are retained, unknown ExtraData
//! blocks are kept raw, and unsupported property types are captured instead
//! of failing the decode. What it will not do is read out of bounds —
//! every stored offset and size is checked, and violations surface as
//! typed [`Error`] values carrying the offending file offset.
//!
//! ```no_run
//! use lnkspect::ShellLinkFile;
//!
//! let link = ShellLinkFile::open("evidence/target.lnk").unwrap();
//! println!("created {}", link.header().creation_time().format_long());
//! ```
//!
//! Writing link files, resolving targets against a live filesystem, and
//! rendering are out of scope; the `lnkspect` binary (feature `cli`) builds
//! its reports on top of this model.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use binread::BinReaderExt;
use byteorder::{ByteOrder, LE};
use encoding_rs::{Encoding, WINDOWS_1252_INIT};
#[allow(unused)]
use log::{debug, trace, warn};
use thiserror::Error as ThisError;

#[cfg(feature = "serde")]
use serde::Serialize;

mod binread_flags;
mod filetime;
mod guid;
mod header;
mod idlist;
mod itemid;
mod region;
mod stringdata;
mod strings;

/// The LinkInfo structure: volume, network and path information used to
/// resolve a target that is no longer where it was.
pub mod linkinfo;

/// The LinkTargetIDList structure: the target as a shell-namespace path.
pub mod linktarget;

/// The ExtraData section: the tagged block chain after StringData.
pub mod extradata;

/// Serialized property stores and the PROPVARIANT value system.
pub mod propertystore;

pub use extradata::ExtraData;
pub use filetime::{FileTime, ResolvedTime};
pub use guid::{Guid, GuidDetail, SHELL_LINK_CLSID};
pub use header::{
    FileAttributeFlags, HotkeyFlags, HotkeyKey, HotkeyModifiers, LinkFlags, ShellLinkHeader,
    ShowCommand,
};
pub use itemid::ItemID;
pub use linkinfo::LinkInfo;
pub use linktarget::LinkTargetIdList;
pub use propertystore::{find_property_stores, SerializedPropertyStore};
pub use stringdata::StringData;
pub use strings::{SizedString, StringEncoding};

use region::Region;

/// The code page assumed for non-Unicode strings when the caller does not
/// say otherwise. Link files do not record which code page wrote them.
pub static DEFAULT_CODEPAGE: &Encoding = &WINDOWS_1252_INIT;

/// The error type for shell link decoding.
///
/// Region-level failures are fatal to the decode and carry the offending
/// absolute file offset. Value-level oddities (unknown flag bits, unknown
/// block signatures, unsupported property types) are captured in the model
/// instead and never surface here.
#[derive(Debug, ThisError)]
pub enum Error {
    /// An IO error occurred.
    #[error("an IO error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// The validator rejected the stream; see [`validate`].
    #[error("not a shell link: {0}")]
    NotAShellLink(ValidationFailure),

    /// A bounded read ran past the end of its region or the file.
    #[error("a read at offset 0x{offset:x} runs past the end of its region")]
    Truncated {
        /// Absolute file offset of the failed read.
        offset: u64,
    },

    /// A stored offset points outside its enclosing structure.
    #[error("the offset field at 0x{offset:x} points outside its enclosing structure")]
    InvalidOffset {
        /// Absolute file offset of the offending offset field.
        offset: u64,
    },

    /// A property store's version signature is wrong.
    #[error("the property store at 0x{offset:x} has a bad version signature")]
    InvalidPropertyStore {
        /// Absolute file offset of the version field.
        offset: u64,
    },

    /// An ExtraData block declares a size beyond the decoder's cap.
    #[error(
        "the extra data block at 0x{offset:x} declares {size} bytes, beyond the {} byte cap",
        extradata::MAX_BLOCK_SIZE
    )]
    OversizedBlock {
        /// Absolute file offset of the block's size field.
        offset: u64,
        /// The declared size.
        size: u32,
    },

    /// A structural parse error without a more specific classification.
    #[error("error while parsing: {0}")]
    BinRead(binread::Error),
}

impl Error {
    /// Fold a binread error into the taxonomy. Reads that ran off the end
    /// of the input become [`Error::Truncated`] at the region that was being
    /// decoded; everything else is passed through.
    pub(crate) fn classify(err: binread::Error, region_offset: u64) -> Self {
        match err {
            binread::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::Truncated {
                    offset: region_offset,
                }
            }
            other => Self::BinRead(other),
        }
    }
}

/// The first header check a rejected stream failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ValidationFailure {
    /// The stream is shorter than the 76-byte header.
    FileTooSmall,
    /// The HeaderSize field is not 0x4C.
    HeaderSize,
    /// The LinkCLSID is not the shell link class id.
    ClassId,
    /// The first reserved field is not zero.
    Reserved1,
    /// The second reserved field is not zero.
    Reserved2,
    /// The third reserved field is not zero.
    Reserved3,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::FileTooSmall => "shorter than a shell link header",
            Self::HeaderSize => "the HeaderSize field is not 0x4C",
            Self::ClassId => "the class id is not the shell link CLSID",
            Self::Reserved1 => "the Reserved1 field is not zero",
            Self::Reserved2 => "the Reserved2 field is not zero",
            Self::Reserved3 => "the Reserved3 field is not zero",
        };
        f.write_str(reason)
    }
}

/// Decide whether a byte stream is a shell link.
///
/// Applies the magic-number, class-id and reserved-field checks in a fixed
/// order and reports the first one that fails. A stream that passes here
/// will at minimum header-decode; it may of course still be damaged further
/// in.
pub fn validate(data: &[u8]) -> Result<(), ValidationFailure> {
    if data.len() < 0x4c {
        return Err(ValidationFailure::FileTooSmall);
    }
    if LE::read_u32(data) != 0x4c {
        return Err(ValidationFailure::HeaderSize);
    }
    let mut clsid = [0u8; 16];
    clsid.copy_from_slice(&data[4..20]);
    let clsid = uuid::Builder::from_bytes_le(clsid).into_uuid();
    if clsid != *SHELL_LINK_CLSID.as_uuid() {
        return Err(ValidationFailure::ClassId);
    }
    if LE::read_u16(&data[66..]) != 0 {
        return Err(ValidationFailure::Reserved1);
    }
    if LE::read_u32(&data[68..]) != 0 {
        return Err(ValidationFailure::Reserved2);
    }
    if LE::read_u32(&data[72..]) != 0 {
        return Err(ValidationFailure::Reserved3);
    }
    Ok(())
}

/// A fully decoded shell link file.
///
/// The model owns every string and payload copy it exposes, so the input
/// buffer can be dropped as soon as [`ShellLinkFile::parse`] returns.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ShellLinkFile {
    file_size: u64,
    header: ShellLinkHeader,
    link_target_id_list: Option<LinkTargetIdList>,
    link_info: Option<LinkInfo>,
    string_data: StringData,
    extra_data: ExtraData,
}

impl ShellLinkFile {
    /// Read and decode a shell link from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        debug!("opening {:?}", path.as_ref());
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// Decode a shell link from a byte slice, assuming [`DEFAULT_CODEPAGE`]
    /// for non-Unicode strings.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::parse_with_codepage(data, DEFAULT_CODEPAGE)
    }

    /// Decode a shell link, naming the code page for non-Unicode strings.
    ///
    /// The regions are visited in file order — header, LinkTargetIDList,
    /// LinkInfo, StringData, ExtraData — with each advance derived from the
    /// sizes the sub-decoders report, never re-read from the stream.
    pub fn parse_with_codepage(
        data: &[u8],
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        validate(data).map_err(Error::NotAShellLink)?;

        let mut cursor = Cursor::new(data);
        let header: ShellLinkHeader = cursor.read_le().map_err(|e| Error::classify(e, 0))?;
        let link_flags = *header.link_flags();
        debug!("header decoded, flags {link_flags:?}");
        let mut pos: u64 = 0x4c;

        let mut link_target_id_list = None;
        if link_flags.contains(LinkFlags::HAS_LINK_TARGET_ID_LIST) {
            cursor.set_position(pos);
            let list: LinkTargetIdList = cursor.read_le().map_err(|e| Error::classify(e, pos))?;
            trace!("IDList with {} items", list.id_list().len());
            pos += 2 + list.size() as u64;
            link_target_id_list = Some(list);
        }

        let mut link_info = None;
        if link_flags.contains(LinkFlags::HAS_LINK_INFO) {
            let start = pos as usize;
            if data.len() < start + 4 {
                return Err(Error::Truncated { offset: pos });
            }
            let size = LE::read_u32(&data[start..]) as usize;
            if size < 4 || data.len() < start + size {
                return Err(Error::Truncated { offset: pos });
            }
            let info = LinkInfo::parse(Region::new(&data[start..start + size], pos), default_codepage)?;
            pos += *info.link_info_size() as u64;
            link_info = Some(info);
        }

        cursor.set_position(pos);
        let string_data: StringData = cursor
            .read_le_args((link_flags, default_codepage))
            .map_err(|e| Error::classify(e, pos))?;
        pos += string_data.byte_len(link_flags);

        let extra_data = if (pos as usize) < data.len() {
            ExtraData::read(data, pos as usize, default_codepage)?
        } else {
            ExtraData::default()
        };

        Ok(Self {
            file_size: data.len() as u64,
            header,
            link_target_id_list,
            link_info,
            string_data,
            extra_data,
        })
    }

    /// The input length in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The ShellLinkHeader.
    pub fn header(&self) -> &ShellLinkHeader {
        &self.header
    }

    /// The LinkTargetIDList, when the header announces one.
    pub fn link_target_id_list(&self) -> Option<&LinkTargetIdList> {
        self.link_target_id_list.as_ref()
    }

    /// The LinkInfo structure, when the header announces one.
    pub fn link_info(&self) -> Option<&LinkInfo> {
        self.link_info.as_ref()
    }

    /// The StringData section.
    pub fn string_data(&self) -> &StringData {
        &self.string_data
    }

    /// The ExtraData section.
    pub fn extra_data(&self) -> &ExtraData {
        &self.extra_data
    }

    /// The link's description, if set.
    pub fn name(&self) -> Option<&str> {
        self.string_data.name_string().as_ref().map(AsRef::as_ref)
    }

    /// The link's relative path, if set.
    pub fn relative_path(&self) -> Option<&str> {
        self.string_data.relative_path().as_ref().map(AsRef::as_ref)
    }

    /// The link's working directory, if set.
    pub fn working_dir(&self) -> Option<&str> {
        self.string_data.working_dir().as_ref().map(AsRef::as_ref)
    }

    /// The link's command line arguments, if set.
    pub fn arguments(&self) -> Option<&str> {
        self.string_data
            .command_line_arguments()
            .as_ref()
            .map(AsRef::as_ref)
    }

    /// The link's icon location, if set.
    pub fn icon_location(&self) -> Option<&str> {
        self.string_data.icon_location().as_ref().map(AsRef::as_ref)
    }

    /// Hunt for property stores embedded in ItemID payloads, both in the
    /// LinkTargetIDList and in a VistaAndAboveIDList block. The payloads are
    /// opaque shell structures, so this is the locator's linear scan, not a
    /// framed decode.
    pub fn embedded_property_stores(&self) -> Vec<SerializedPropertyStore> {
        let mut stores = Vec::new();
        if let Some(list) = &self.link_target_id_list {
            for item in list.id_list() {
                stores.extend(find_property_stores(item.data(), item.payload_offset()));
            }
        }
        if let Some(block) = self.extra_data.vista_and_above_id_list() {
            for item in block.id_list() {
                stores.extend(find_property_stores(item.data(), item.payload_offset()));
            }
        }
        stores
    }
}
