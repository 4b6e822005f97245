use binread::BinRead;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The SpecialFolderDataBlock ([MS-SHLLINK] 2.5.9): tracks a special-folder
/// target so the IDList can be retranslated on load.
#[derive(Clone, Copy, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get = "pub")]
pub struct SpecialFolderDataBlock {
    /// The folder integer ID.
    special_folder_id: u32,

    /// Offset, in bytes into the link target IDList, of the first child
    /// segment of the IDList specified by the folder ID.
    offset: u32,
}
