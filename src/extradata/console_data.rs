use binread::BinRead;
use bitflags::bitflags;
use encoding_rs::UTF_16LE;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::binread_flags::binread_flags;
use crate::strings::FixedSizeString;

bitflags! {
    /// Foreground and background text color bits for the console window.
    /// Four bits each; the fill attribute words double as indexes into the
    /// block's color table.
    #[allow(missing_docs)]
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct FillAttributeFlags: u16 {
        const FOREGROUND_BLUE      = 0x0001;
        const FOREGROUND_GREEN     = 0x0002;
        const FOREGROUND_RED       = 0x0004;
        const FOREGROUND_INTENSITY = 0x0008;
        const BACKGROUND_BLUE      = 0x0010;
        const BACKGROUND_GREEN     = 0x0020;
        const BACKGROUND_RED       = 0x0040;
        const BACKGROUND_INTENSITY = 0x0080;
    }
}

binread_flags!(FillAttributeFlags, u16);

bitflags! {
    /// The family, and optional pitch, of the console font.
    #[allow(missing_docs)]
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct FontFamilyFlags: u32 {
        /// Family unknown.
        const FF_DONT_CARE  = 0x0000;
        /// Variable-width with serifs, like Times New Roman.
        const FF_ROMAN      = 0x0010;
        /// Variable-width without serifs, like Arial.
        const FF_SWISS      = 0x0020;
        /// Fixed-width, like Courier New.
        const FF_MODERN     = 0x0030;
        /// Handwriting-like.
        const FF_SCRIPT     = 0x0040;
        /// Novelty, like Old English.
        const FF_DECORATIVE = 0x0050;

        const TMPF_FIXED_PITCH = 0x0001;
        const TMPF_VECTOR      = 0x0002;
        const TMPF_TRUETYPE    = 0x0004;
        const TMPF_DEVICE      = 0x0008;
    }
}

binread_flags!(FontFamilyFlags, u32);

/// The ConsoleDataBlock ([MS-SHLLINK] 2.5.1): the full console window setup
/// for a console target — colors, geometry, font, edit modes, history and
/// the 16-entry color table.
#[derive(Clone, Debug, Getters, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get = "pub")]
pub struct ConsoleDataBlock {
    /// Text colors of the console window.
    fill_attributes: FillAttributeFlags,

    /// Text colors of console popups.
    popup_fill_attributes: FillAttributeFlags,

    /// Screen buffer width, in character cells.
    screen_buffer_size_x: i16,

    /// Screen buffer height, in character cells.
    screen_buffer_size_y: i16,

    /// Window width, in character cells.
    window_size_x: i16,

    /// Window height, in character cells.
    window_size_y: i16,

    /// Window origin X, in pixels.
    window_origin_x: i16,

    /// Window origin Y, in pixels.
    window_origin_y: i16,

    #[getset(skip)]
    #[cfg_attr(feature = "serde", serde(skip))]
    unused1: u32,

    #[getset(skip)]
    #[cfg_attr(feature = "serde", serde(skip))]
    unused2: u32,

    /// Font height in the high word, width in the low word (zero for
    /// vector fonts).
    font_size: u32,

    font_family: FontFamilyFlags,

    /// Stroke weight of the console font.
    font_weight: u32,

    /// Face name of the console font, stored as 32 UTF-16 units.
    #[br(args(64, UTF_16LE), map = |s: FixedSizeString| s.to_string())]
    face_name: String,

    /// Cursor size, in pixels.
    cursor_size: u32,

    /// Open the console full-screen.
    #[br(map = |b: u32| b != 0)]
    full_screen: bool,

    /// Open the console in QuickEdit mode.
    #[br(map = |b: u32| b != 0)]
    quick_edit: bool,

    /// Insert mode.
    #[br(map = |b: u32| b != 0)]
    insert_mode: bool,

    /// Automatic window positioning.
    #[br(map = |b: u32| b != 0)]
    auto_position: bool,

    /// Size, in characters, of one input history buffer.
    history_buffer_size: u32,

    number_of_history_buffers: u32,

    /// Drop duplicates from the history buffer.
    #[br(map = |b: u32| b != 0)]
    history_no_dup: bool,

    /// The RGB color table the fill attribute words index into.
    color_table: [u32; 16],
}
