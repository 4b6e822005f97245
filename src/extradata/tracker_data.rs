use binread::BinRead;
use encoding_rs::Encoding;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::strings::FixedSizeString;
use crate::Guid;

/// The TrackerDataBlock ([MS-SHLLINK] 2.5.10): the Distributed Link
/// Tracking identifiers used to chase a target that has moved.
///
/// The droid pairs are the forensically interesting part — each is a volume
/// identifier plus an object identifier, and when the object id is a v1
/// UUID it embeds the creating machine's MAC address and a timestamp. The
/// birth pair is frozen at creation time; divergence between the two pairs
/// records that the file travelled.
#[derive(Clone, Debug, BinRead, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little, import(default_codepage: &'static Encoding))]
#[getset(get = "pub")]
pub struct TrackerDataBlock {
    /// Size of the rest of this structure; 0x58 in every version written.
    length: u32,

    /// Always zero.
    version: u32,

    /// NetBIOS name of the machine the target last resided on, in a fixed
    /// 16-byte code-page buffer.
    #[br(args(16, default_codepage), map = |s: FixedSizeString| s.to_string())]
    machine_id: String,

    /// Volume id and object id of the target.
    droid: [Guid; 2],

    /// Volume id and object id assigned when the target was created.
    droid_birth: [Guid; 2],
}
