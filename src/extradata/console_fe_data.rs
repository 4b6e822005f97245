use binread::BinRead;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The ConsoleFEDataBlock ([MS-SHLLINK] 2.5.2): the code page used for
/// console text when the target runs in a console window.
#[derive(Clone, Copy, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get = "pub")]
pub struct ConsoleFEDataBlock {
    /// A language code identifier; see [MS-LCID].
    code_page: u32,
}
