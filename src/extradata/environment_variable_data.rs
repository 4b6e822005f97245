use binread::BinRead;
use encoding_rs::{Encoding, UTF_16LE};
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::strings::FixedSizeString;

/// The EnvironmentVariableDataBlock ([MS-SHLLINK] 2.5.4): a target path
/// expressed with environment variables, in a fixed 260-byte code-page
/// buffer and an optional fixed 520-byte UTF-16LE buffer.
///
/// The IconEnvironmentDataBlock ([MS-SHLLINK] 2.5.5) has the identical
/// shape and reuses this type.
#[derive(Clone, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little, import(default_codepage: &'static Encoding))]
#[getset(get = "pub")]
pub struct EnvironmentVariableDataBlock {
    /// The code-page rendition of the path.
    #[br(args(260, default_codepage), map = |s: FixedSizeString| s.to_string())]
    target_ansi: String,

    /// The UTF-16LE rendition, when one was written.
    #[br(args(520, UTF_16LE), map = |s: FixedSizeString| if s.is_empty() { None } else { Some(s.to_string()) })]
    target_unicode: Option<String>,
}
