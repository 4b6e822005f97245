//! The ExtraData section ([MS-SHLLINK] 2.5): an open-ended chain of tagged
//! blocks appended after StringData, ended by a terminal value below 4.
//!
//! Each block is `size (4) | signature (4) | payload (size - 8)`. Eleven
//! signatures are documented; anything else is kept as an opaque
//! [`BlockPayload::Unknown`] so a novel block never hides the rest of the
//! chain.

use binread::BinReaderExt;
use bitflags::bitflags;
use byteorder::{ByteOrder, LE};
use encoding_rs::Encoding;
use getset::Getters;
use log::{debug, warn};
use std::io::Cursor;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::region::Region;
use crate::Error;

/// The ConsoleDataBlock structure: display settings for console targets.
pub mod console_data;

/// The ConsoleFEDataBlock structure: the console code page.
pub mod console_fe_data;

/// The DarwinDataBlock structure: a Windows Installer application identifier.
pub mod darwin_data;

/// The EnvironmentVariableDataBlock structure: an environment-variable
/// encoded target path. Also the shape of the IconEnvironmentDataBlock.
pub mod environment_variable_data;

/// The KnownFolderDataBlock structure: the known-folder GUID of the target.
pub mod known_folder_data;

/// The PropertyStoreDataBlock structure: serialized property stores.
pub mod property_store_data;

/// The ShimDataBlock structure: the compatibility shim layer name.
pub mod shim_data;

/// The SpecialFolderDataBlock structure: the special-folder id of the target.
pub mod special_folder_data;

/// The TrackerDataBlock structure: Distributed Link Tracking identifiers.
pub mod tracker_data;

/// The VistaAndAboveIDListDataBlock structure: an alternate IDList.
pub mod vista_and_above_id_list_data;

use console_data::ConsoleDataBlock;
use console_fe_data::ConsoleFEDataBlock;
use darwin_data::DarwinDataBlock;
use environment_variable_data::EnvironmentVariableDataBlock;
use known_folder_data::KnownFolderDataBlock;
use property_store_data::PropertyStoreDataBlock;
use shim_data::ShimDataBlock;
use special_folder_data::SpecialFolderDataBlock;
use tracker_data::TrackerDataBlock;
use vista_and_above_id_list_data::VistaAndAboveIdListDataBlock;

/// No documented block comes close to this; a declared size beyond it is
/// treated as corruption rather than honored.
pub const MAX_BLOCK_SIZE: u32 = 4096;

bitflags! {
    /// Which block types were observed while walking the chain.
    #[allow(missing_docs)]
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct BlockTypes: u32 {
        const ENVIRONMENT_VARIABLE     = 1 << 0;
        const CONSOLE                  = 1 << 1;
        const TRACKER                  = 1 << 2;
        const CONSOLE_FE               = 1 << 3;
        const SPECIAL_FOLDER           = 1 << 4;
        const DARWIN                   = 1 << 5;
        const ICON_ENVIRONMENT         = 1 << 6;
        const SHIM                     = 1 << 7;
        const PROPERTY_STORE           = 1 << 8;
        const VISTA_AND_ABOVE_ID_LIST  = 1 << 9;
        const KNOWN_FOLDER             = 1 << 10;
        const UNKNOWN                  = 1 << 11;
    }
}

impl Default for BlockTypes {
    fn default() -> Self {
        Self::empty()
    }
}

/// The decoded ExtraData section.
#[derive(Clone, Debug, Default, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct ExtraData {
    /// The blocks in stored order.
    blocks: Vec<ExtraDataBlock>,

    /// Which block types occurred.
    observed: BlockTypes,

    /// The terminal value that ended the chain (below 4).
    terminal: u32,

    /// Total bytes consumed, terminal included.
    size: u64,
}

/// One block of the chain: its frame plus the decoded payload.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct ExtraDataBlock {
    /// Absolute file offset of the block's size field.
    offset: u64,

    /// Declared size in bytes, frame included.
    size: u32,

    /// The four-byte signature tag.
    signature: u32,

    payload: BlockPayload,
}

/// The payload union, indexed by signature.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum BlockPayload {
    /// `0xA0000001`
    EnvironmentVariable(EnvironmentVariableDataBlock),
    /// `0xA0000002`
    Console(ConsoleDataBlock),
    /// `0xA0000003`
    Tracker(TrackerDataBlock),
    /// `0xA0000004`
    ConsoleFe(ConsoleFEDataBlock),
    /// `0xA0000005`
    SpecialFolder(SpecialFolderDataBlock),
    /// `0xA0000006`
    Darwin(DarwinDataBlock),
    /// `0xA0000007`
    IconEnvironment(EnvironmentVariableDataBlock),
    /// `0xA0000008`
    Shim(ShimDataBlock),
    /// `0xA0000009`
    PropertyStore(PropertyStoreDataBlock),
    /// `0xA000000A`
    VistaAndAboveIdList(VistaAndAboveIdListDataBlock),
    /// `0xA000000B`
    KnownFolder(KnownFolderDataBlock),
    /// Any other signature; the payload is kept raw.
    Unknown(Vec<u8>),
}

impl ExtraData {
    /// Walk the chain starting at `pos` within `data`. `pos` is also the
    /// absolute file offset used for reporting.
    pub(crate) fn read(
        data: &[u8],
        pos: usize,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let start = pos;
        let mut pos = pos;
        let mut blocks = Vec::new();
        let mut observed = BlockTypes::default();
        let mut terminal = 0u32;

        loop {
            if data.len() < pos + 4 {
                // The chain may legitimately end at the end of the file
                // without a stored terminator.
                break;
            }
            let block_size = LE::read_u32(&data[pos..]);
            if block_size < 4 {
                terminal = block_size;
                pos += 4;
                break;
            }
            if block_size > MAX_BLOCK_SIZE {
                return Err(Error::OversizedBlock {
                    offset: pos as u64,
                    size: block_size,
                });
            }
            if block_size < 8 || data.len() < pos + block_size as usize {
                return Err(Error::Truncated { offset: pos as u64 });
            }

            let signature = LE::read_u32(&data[pos + 4..]);
            let body = &data[pos + 8..pos + block_size as usize];
            debug!("extra data block 0x{signature:08x} at 0x{pos:x}, {block_size} bytes");

            let (payload, types) =
                BlockPayload::parse(signature, body, pos as u64 + 8, default_codepage)?;
            observed |= types;
            blocks.push(ExtraDataBlock {
                offset: pos as u64,
                size: block_size,
                signature,
                payload,
            });
            pos += block_size as usize;
        }

        Ok(Self {
            blocks,
            observed,
            terminal,
            size: (pos - start) as u64,
        })
    }

    fn payloads(&self) -> impl Iterator<Item = &BlockPayload> {
        self.blocks.iter().map(|b| &b.payload)
    }

    /// The first ConsoleDataBlock in the chain, if any.
    pub fn console(&self) -> Option<&ConsoleDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::Console(b) => Some(b),
            _ => None,
        })
    }

    /// The first ConsoleFEDataBlock in the chain, if any.
    pub fn console_fe(&self) -> Option<&ConsoleFEDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::ConsoleFe(b) => Some(b),
            _ => None,
        })
    }

    /// The first DarwinDataBlock in the chain, if any.
    pub fn darwin(&self) -> Option<&DarwinDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::Darwin(b) => Some(b),
            _ => None,
        })
    }

    /// The first EnvironmentVariableDataBlock in the chain, if any.
    pub fn environment_variable(&self) -> Option<&EnvironmentVariableDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::EnvironmentVariable(b) => Some(b),
            _ => None,
        })
    }

    /// The first IconEnvironmentDataBlock in the chain, if any.
    pub fn icon_environment(&self) -> Option<&EnvironmentVariableDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::IconEnvironment(b) => Some(b),
            _ => None,
        })
    }

    /// The first KnownFolderDataBlock in the chain, if any.
    pub fn known_folder(&self) -> Option<&KnownFolderDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::KnownFolder(b) => Some(b),
            _ => None,
        })
    }

    /// The first PropertyStoreDataBlock in the chain, if any.
    pub fn property_store(&self) -> Option<&PropertyStoreDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::PropertyStore(b) => Some(b),
            _ => None,
        })
    }

    /// The first ShimDataBlock in the chain, if any.
    pub fn shim(&self) -> Option<&ShimDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::Shim(b) => Some(b),
            _ => None,
        })
    }

    /// The first SpecialFolderDataBlock in the chain, if any.
    pub fn special_folder(&self) -> Option<&SpecialFolderDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::SpecialFolder(b) => Some(b),
            _ => None,
        })
    }

    /// The first TrackerDataBlock in the chain, if any.
    pub fn tracker(&self) -> Option<&TrackerDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::Tracker(b) => Some(b),
            _ => None,
        })
    }

    /// The first VistaAndAboveIDListDataBlock in the chain, if any.
    pub fn vista_and_above_id_list(&self) -> Option<&VistaAndAboveIdListDataBlock> {
        self.payloads().find_map(|p| match p {
            BlockPayload::VistaAndAboveIdList(b) => Some(b),
            _ => None,
        })
    }
}

impl BlockPayload {
    fn parse(
        signature: u32,
        body: &[u8],
        body_offset: u64,
        default_codepage: &'static Encoding,
    ) -> Result<(Self, BlockTypes), Error> {
        let mut cursor = Cursor::new(body);
        let parsed = match signature {
            0xa000_0001 => (
                Self::EnvironmentVariable(
                    cursor
                        .read_le_args((default_codepage,))
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::ENVIRONMENT_VARIABLE,
            ),
            0xa000_0002 => (
                Self::Console(
                    cursor
                        .read_le()
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::CONSOLE,
            ),
            0xa000_0003 => (
                Self::Tracker(
                    cursor
                        .read_le_args((default_codepage,))
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::TRACKER,
            ),
            0xa000_0004 => (
                Self::ConsoleFe(
                    cursor
                        .read_le()
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::CONSOLE_FE,
            ),
            0xa000_0005 => (
                Self::SpecialFolder(
                    cursor
                        .read_le()
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::SPECIAL_FOLDER,
            ),
            0xa000_0006 => (
                Self::Darwin(
                    cursor
                        .read_le_args((default_codepage,))
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::DARWIN,
            ),
            0xa000_0007 => (
                Self::IconEnvironment(
                    cursor
                        .read_le_args((default_codepage,))
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::ICON_ENVIRONMENT,
            ),
            0xa000_0008 => (
                Self::Shim(ShimDataBlock::from_payload(body)),
                BlockTypes::SHIM,
            ),
            0xa000_0009 => (
                Self::PropertyStore(PropertyStoreDataBlock::parse(
                    Region::new(body, body_offset),
                    default_codepage,
                )?),
                BlockTypes::PROPERTY_STORE,
            ),
            0xa000_000a => (
                Self::VistaAndAboveIdList(VistaAndAboveIdListDataBlock::parse(body, body_offset)?),
                BlockTypes::VISTA_AND_ABOVE_ID_LIST,
            ),
            0xa000_000b => (
                Self::KnownFolder(
                    cursor
                        .read_le()
                        .map_err(|e| Error::classify(e, body_offset))?,
                ),
                BlockTypes::KNOWN_FOLDER,
            ),
            other => {
                warn!("unknown extra data signature 0x{other:08x}, keeping raw payload");
                (Self::Unknown(body.to_vec()), BlockTypes::UNKNOWN)
            }
        };
        Ok(parsed)
    }
}
