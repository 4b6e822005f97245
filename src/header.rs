use std::fmt;

use binread::BinRead;
use bitflags::bitflags;
use getset::Getters;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::binread_flags::binread_flags;
use crate::{FileTime, Guid};

/// A ShellLinkHeader structure ([MS-SHLLINK] 2.1): identification
/// information, timestamps, and the flags that announce which optional
/// regions follow.
///
/// The full 76 bytes are consumed, reserved fields included — the validator
/// checks them and the tabular renderer prints them.
#[derive(Clone, Debug, Getters, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
#[getset(get = "pub")]
pub struct ShellLinkHeader {
    /// Must be 0x0000004C.
    header_size: u32,

    /// Must be the shell link class id
    /// `{00021401-0000-0000-C000-000000000046}`.
    link_clsid: Guid,

    /// Announces which optional structures are present after the header.
    link_flags: LinkFlags,

    /// File attributes of the link target as captured at link time; they can
    /// be out of sync with the target itself.
    file_attributes: FileAttributeFlags,

    /// Creation time of the link target, UTC. Zero means not set.
    creation_time: FileTime,

    /// Access time of the link target, UTC. Zero means not set.
    access_time: FileTime,

    /// Write time of the link target, UTC. Zero means not set.
    write_time: FileTime,

    /// Size of the link target in bytes; the least significant 32 bits when
    /// the target exceeds 4 GiB.
    file_size: u32,

    /// Index of the icon within the icon location.
    icon_index: i32,

    /// Expected window state of the launched application.
    #[br(map = |v: u32| ShowCommand::from_wire(v))]
    show_command: ShowCommand,

    /// The activation keystroke assigned to the link.
    hotkey: HotkeyFlags,

    /// Must be zero.
    reserved1: u16,

    /// Must be zero.
    reserved2: u32,

    /// Must be zero.
    reserved3: u32,
}

bitflags! {
    /// The LinkFlags structure ([MS-SHLLINK] 2.1.1). The low bits gate the
    /// optional regions after the header; the rest tune shell behavior.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct LinkFlags: u32 {
        /// A LinkTargetIDList follows the header.
        const HAS_LINK_TARGET_ID_LIST           = 1 << 0;
        /// A LinkInfo structure is present.
        const HAS_LINK_INFO                     = 1 << 1;
        /// A NAME_STRING StringData entry is present.
        const HAS_NAME                          = 1 << 2;
        /// A RELATIVE_PATH StringData entry is present.
        const HAS_RELATIVE_PATH                 = 1 << 3;
        /// A WORKING_DIR StringData entry is present.
        const HAS_WORKING_DIR                   = 1 << 4;
        /// A COMMAND_LINE_ARGUMENTS StringData entry is present.
        const HAS_ARGUMENTS                     = 1 << 5;
        /// An ICON_LOCATION StringData entry is present.
        const HAS_ICON_LOCATION                 = 1 << 6;
        /// StringData entries are UTF-16LE rather than code-page.
        const IS_UNICODE                        = 1 << 7;
        /// The LinkInfo structure is to be ignored by the shell.
        const FORCE_NO_LINK_INFO                = 1 << 8;
        /// An EnvironmentVariableDataBlock is present.
        const HAS_EXP_STRING                    = 1 << 9;
        /// Run a 16-bit target in a separate virtual machine.
        const RUN_IN_SEPARATE_PROCESS           = 1 << 10;
        /// Undefined; must be ignored.
        const UNUSED1                           = 1 << 11;
        /// A DarwinDataBlock is present.
        const HAS_DARWIN_ID                     = 1 << 12;
        /// Run the target as a different user.
        const RUN_AS_USER                       = 1 << 13;
        /// An IconEnvironmentDataBlock is present.
        const HAS_EXP_ICON                      = 1 << 14;
        /// Represent the file-system location in the shell namespace when
        /// parsing the path into an IDList.
        const NO_PIDL_ALIAS                     = 1 << 15;
        /// Undefined; must be ignored.
        const UNUSED2                           = 1 << 16;
        /// A ShimDataBlock is present.
        const RUN_WITH_SHIM_LAYER               = 1 << 17;
        /// The TrackerDataBlock is to be ignored.
        const FORCE_NO_LINK_TRACK               = 1 << 18;
        /// Collect target properties into the PropertyStoreDataBlock when
        /// the target is set.
        const ENABLE_TARGET_METADATA            = 1 << 19;
        /// The EnvironmentVariableDataBlock is to be ignored.
        const DISABLE_LINK_PATH_TRACKING        = 1 << 20;
        /// SpecialFolderDataBlock and KnownFolderDataBlock are to be ignored.
        const DISABLE_KNOWN_FOLDER_TRACKING     = 1 << 21;
        /// Use the unaliased form of the known folder IDList when loading.
        const DISABLE_KNOWN_FOLDER_ALIAS        = 1 << 22;
        /// Allow a link to reference another link.
        const ALLOW_LINK_TO_LINK                = 1 << 23;
        /// Prefer the unaliased known-folder form when saving.
        const UNALIAS_ON_SAVE                   = 1 << 24;
        /// Refer to the target through the EnvironmentVariableDataBlock path
        /// instead of an IDList.
        const PREFER_ENVIRONMENT_PATH           = 1 << 25;
        /// Store the local-path IDList for a UNC target on the local machine.
        const KEEP_LOCAL_ID_LIST_FOR_UNC_TARGET = 1 << 26;
    }
}

binread_flags!(LinkFlags, u32);

bitflags! {
    /// The FileAttributesFlags structure ([MS-SHLLINK] 2.1.2): attributes of
    /// the link target, if it is a file-system item.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct FileAttributeFlags: u32 {
        /// Read-only.
        const FILE_ATTRIBUTE_READONLY            = 1 << 0;
        /// Hidden from ordinary directory listings.
        const FILE_ATTRIBUTE_HIDDEN              = 1 << 1;
        /// Part of, or used exclusively by, the operating system.
        const FILE_ATTRIBUTE_SYSTEM              = 1 << 2;
        /// Reserved; must be zero.
        const RESERVED1                          = 1 << 3;
        /// The target is a directory.
        const FILE_ATTRIBUTE_DIRECTORY           = 1 << 4;
        /// Marked for backup or removal.
        const FILE_ATTRIBUTE_ARCHIVE             = 1 << 5;
        /// Reserved; must be zero.
        const RESERVED2                          = 1 << 6;
        /// No other attributes set.
        const FILE_ATTRIBUTE_NORMAL              = 1 << 7;
        /// Temporary storage.
        const FILE_ATTRIBUTE_TEMPORARY           = 1 << 8;
        /// Sparse file.
        const FILE_ATTRIBUTE_SPARSE_FILE         = 1 << 9;
        /// Has an associated reparse point.
        const FILE_ATTRIBUTE_REPARSE_POINT       = 1 << 10;
        /// Compressed content.
        const FILE_ATTRIBUTE_COMPRESSED          = 1 << 11;
        /// Content not immediately available.
        const FILE_ATTRIBUTE_OFFLINE             = 1 << 12;
        /// Excluded from content indexing.
        const FILE_ATTRIBUTE_NOT_CONTENT_INDEXED = 1 << 13;
        /// Encrypted content.
        const FILE_ATTRIBUTE_ENCRYPTED           = 1 << 14;
    }
}

binread_flags!(FileAttributeFlags, u32);

/// The expected window state of the launched application. The format defines
/// exactly three values and requires every other wire value to be treated as
/// `ShowNormal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ShowCommand {
    /// Open with a normally activated, visible window.
    ShowNormal = 0x01,
    /// Open maximized.
    ShowMaximized = 0x03,
    /// Open minimized, without taking keyboard focus.
    ShowMinNoActive = 0x07,
}

impl ShowCommand {
    pub(crate) fn from_wire(value: u32) -> Self {
        Self::from_u32(value).unwrap_or(Self::ShowNormal)
    }
}

/// The HotkeyFlags structure ([MS-SHLLINK] 2.1.3): the keystroke combination
/// assigned to the link, as a low-byte key and high-byte modifier set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HotkeyFlags {
    #[br(map = |v: u8| HotkeyKey::from(v))]
    key: HotkeyKey,
    modifiers: HotkeyModifiers,
}

impl HotkeyFlags {
    /// The primary key.
    pub fn key(&self) -> HotkeyKey {
        self.key
    }

    /// The modifier set (Shift, Ctrl, Alt).
    pub fn modifiers(&self) -> HotkeyModifiers {
        self.modifiers
    }

    /// Render like `CTRL+SHIFT+F5`, or `[NOT SET]` when no key is assigned.
    pub fn describe(&self) -> String {
        if self.key == HotkeyKey::NoKeyAssigned {
            return "[NOT SET]".to_string();
        }
        let mut parts = Vec::new();
        if self.modifiers.contains(HotkeyModifiers::HOTKEYF_CONTROL) {
            parts.push("CTRL".to_string());
        }
        if self.modifiers.contains(HotkeyModifiers::HOTKEYF_SHIFT) {
            parts.push("SHIFT".to_string());
        }
        if self.modifiers.contains(HotkeyModifiers::HOTKEYF_ALT) {
            parts.push("ALT".to_string());
        }
        parts.push(self.key.to_string());
        parts.join("+")
    }
}

/// The virtual key code in the low byte of the hotkey pair. Codes outside
/// the documented set are preserved as [`HotkeyKey::Unknown`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum HotkeyKey {
    NoKeyAssigned,
    /// `0`..`9` or `A`..`Z`.
    Char(char),
    /// Function keys F1..F24.
    Function(u8),
    NumLock,
    ScrollLock,
    /// A key code outside the documented set.
    Unknown(u8),
}

impl From<u8> for HotkeyKey {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::NoKeyAssigned,
            0x30..=0x39 | 0x41..=0x5a => Self::Char(code as char),
            0x70..=0x87 => Self::Function(code - 0x6f),
            0x90 => Self::NumLock,
            0x91 => Self::ScrollLock,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for HotkeyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKeyAssigned => f.write_str("[NOT SET]"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Function(n) => write!(f, "F{n}"),
            Self::NumLock => f.write_str("NUMLOCK"),
            Self::ScrollLock => f.write_str("SCROLLLOCK"),
            Self::Unknown(code) => write!(f, "0x{code:02X}"),
        }
    }
}

bitflags! {
    /// The modifier keys in the high byte of the hotkey pair.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct HotkeyModifiers: u8 {
        /// No modifier key is used.
        const NO_MODIFIER     = 0x00;
        /// SHIFT.
        const HOTKEYF_SHIFT   = 0x01;
        /// CTRL.
        const HOTKEYF_CONTROL = 0x02;
        /// ALT.
        const HOTKEYF_ALT     = 0x04;
    }
}

binread_flags!(HotkeyModifiers, u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkey_describe() {
        let hotkey = HotkeyFlags {
            key: HotkeyKey::from(0x74),
            modifiers: HotkeyModifiers::HOTKEYF_CONTROL | HotkeyModifiers::HOTKEYF_SHIFT,
        };
        assert_eq!(hotkey.describe(), "CTRL+SHIFT+F5");

        let unset = HotkeyFlags {
            key: HotkeyKey::NoKeyAssigned,
            modifiers: HotkeyModifiers::NO_MODIFIER,
        };
        assert_eq!(unset.describe(), "[NOT SET]");
    }

    #[test]
    fn show_command_falls_back_to_normal() {
        assert_eq!(ShowCommand::from_wire(3), ShowCommand::ShowMaximized);
        assert_eq!(ShowCommand::from_wire(7), ShowCommand::ShowMinNoActive);
        assert_eq!(ShowCommand::from_wire(0x0badf00d), ShowCommand::ShowNormal);
    }

    #[test]
    fn unknown_key_codes_are_preserved() {
        assert_eq!(HotkeyKey::from(0x41), HotkeyKey::Char('A'));
        assert_eq!(HotkeyKey::from(0x87), HotkeyKey::Function(24));
        assert_eq!(HotkeyKey::from(0x9e), HotkeyKey::Unknown(0x9e));
    }
}
