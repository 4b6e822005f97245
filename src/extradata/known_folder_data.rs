use binread::BinRead;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::Guid;

/// The KnownFolderDataBlock ([MS-SHLLINK] 2.5.6): tracks a known-folder
/// target so the IDList can be retranslated on load.
#[derive(Clone, Copy, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get = "pub")]
pub struct KnownFolderDataBlock {
    /// The known folder GUID.
    known_folder_id: Guid,

    /// Offset, in bytes into the link target IDList, of the first child
    /// segment of the IDList specified by the folder GUID.
    offset: u32,
}
