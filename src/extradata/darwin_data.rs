use binread::BinRead;
use encoding_rs::{Encoding, UTF_16LE};
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::strings::FixedSizeString;

/// The DarwinDataBlock ([MS-SHLLINK] 2.5.3): a Windows Installer descriptor
/// used to install the application on activation instead of following the
/// target IDList.
#[derive(Clone, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little, import(default_codepage: &'static Encoding))]
#[getset(get = "pub")]
pub struct DarwinDataBlock {
    /// The code-page application identifier.
    #[br(args(260, default_codepage), map = |s: FixedSizeString| s.to_string())]
    darwin_data_ansi: String,

    /// The UTF-16LE application identifier, when one was written.
    #[br(args(520, UTF_16LE), map = |s: FixedSizeString| if s.is_empty() { None } else { Some(s.to_string()) })]
    darwin_data_unicode: Option<String>,
}
