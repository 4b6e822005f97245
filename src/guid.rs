use std::fmt::{self, Display};

use binread::BinRead;
#[cfg(feature = "serde")]
use serde::Serialize;
use uuid::{Uuid, Variant};

use crate::FileTime;

/// 100-nanosecond ticks between the UUID v1 epoch (1582-10-15) and the
/// FILETIME epoch (1601-01-01): 6653 days.
const UUID_TO_FILETIME_TICKS: u64 = 5_748_192_000_000_000;

/// The class id every shell link header carries.
pub const SHELL_LINK_CLSID: Guid =
    Guid(uuid::uuid!("00021401-0000-0000-c000-000000000046"));

/// A CLSID/GUID in packet representation: the first three fields are stored
/// little-endian, the final eight bytes big-endian ([MS-DTYP] 2.3.4.2).
///
/// Beyond identity, a version-1 identifier carries forensic value: its
/// embedded timestamp, clock sequence and node (usually a MAC address) are
/// recoverable through [`Guid::describe`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Guid(Uuid);

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl BinRead for Guid {
    type Args = ();

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        _args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let mut bytes = [0; 16];
        reader.read_exact(&mut bytes)?;
        let uuid = uuid::Builder::from_bytes_le(bytes).into_uuid();
        Ok(Self(uuid))
    }
}

impl Guid {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Braced uppercase registry form, e.g.
    /// `{D5CDD505-2E9C-101B-9397-08002B2CF9AE}`.
    pub fn braced(&self) -> String {
        format!("{{{}}}", self.0.hyphenated().to_string().to_uppercase())
    }

    /// RFC 4122 version number: the high nibble of the third field.
    pub fn version(&self) -> usize {
        self.0.get_version_num()
    }

    pub fn version_description(&self) -> String {
        match self.0.get_version_num() {
            1 => "1 - time based".to_string(),
            2 => "2 - DCE security".to_string(),
            3 => "3 - name based (MD5)".to_string(),
            4 => "4 - random".to_string(),
            5 => "5 - name based (SHA-1)".to_string(),
            n => format!("{n} - unknown version"),
        }
    }

    pub fn variant_description(&self) -> &'static str {
        match self.0.get_variant() {
            Variant::NCS => "NCS backward compatible",
            Variant::RFC4122 => "ITU (RFC 4122)",
            Variant::Microsoft => "Microsoft",
            Variant::Future => "reserved (future)",
            _ => "unknown",
        }
    }

    /// Derive the forensic fields. Time, clock sequence and node only exist
    /// for version-1 identifiers; everything else reports them as absent.
    pub fn describe(&self) -> GuidDetail {
        let mut detail = GuidDetail {
            version: self.version_description(),
            variant: self.variant_description().to_string(),
            time: None,
            clock_sequence: None,
            node: None,
        };

        if self.0.get_version_num() == 1 {
            if let Some(ts) = self.0.get_timestamp() {
                let (ticks, counter) = ts.to_rfc4122();
                // Re-anchor the Gregorian-epoch tick count onto the FILETIME
                // epoch so one formatter serves both.
                detail.time = Some(FileTime::from(ticks.saturating_sub(UUID_TO_FILETIME_TICKS)));
                detail.clock_sequence = Some(counter);
                let node = &self.0.as_fields().3[2..8];
                detail.node = Some(
                    node.iter()
                        .map(|b| format!("{b:02x}"))
                        .collect::<Vec<_>>()
                        .join(":"),
                );
            }
        }
        detail
    }
}

/// The derived fields of a GUID, ready for reporting.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GuidDetail {
    /// Version number with its RFC 4122 meaning spelled out.
    pub version: String,
    /// Variant family.
    pub variant: String,
    /// The embedded timestamp, re-anchored to the FILETIME epoch. v1 only.
    pub time: Option<FileTime>,
    /// The 14-bit clock sequence. v1 only.
    pub clock_sequence: Option<u16>,
    /// The node as a colon-separated MAC address. v1 only.
    pub node: Option<String>,
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.braced())
    }
}

#[cfg(feature = "serde")]
impl Serialize for Guid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.braced())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binread::BinReaderExt;
    use std::io::Cursor;

    // Packet representation of {00021401-0000-0000-C000-000000000046}.
    const SHELL_LINK_CLSID_BYTES: [u8; 16] = [
        0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x46,
    ];

    #[test]
    fn packet_representation_is_mixed_endian() {
        let mut reader = Cursor::new(SHELL_LINK_CLSID_BYTES.to_vec());
        let guid: Guid = reader.read_le().unwrap();
        assert_eq!(guid.braced(), "{00021401-0000-0000-C000-000000000046}");
    }

    #[test]
    fn v4_has_no_time_fields() {
        let guid = Guid::from_uuid(uuid::uuid!("f81d4fae-7dec-44d0-a765-00a0c91e6bf6"));
        let detail = guid.describe();
        assert_eq!(detail.version, "4 - random");
        assert!(detail.time.is_none());
        assert!(detail.clock_sequence.is_none());
        assert!(detail.node.is_none());
    }

    #[test]
    fn v1_time_re_anchors_to_the_filetime_epoch() {
        // 2010-01-01 00:00:00 UTC expressed as v1 ticks since 1582-10-15.
        let ticks: u64 = 134_815_968_000_000_000;
        let clock_seq: u16 = 0x1234;
        let uuid = Uuid::from_fields(
            ticks as u32,
            (ticks >> 32) as u16,
            ((ticks >> 48) as u16 & 0x0fff) | 0x1000,
            &[
                0x80 | ((clock_seq >> 8) as u8 & 0x3f),
                clock_seq as u8,
                0x00,
                0x11,
                0x22,
                0x33,
                0x44,
                0x55,
            ],
        );
        let detail = Guid::from_uuid(uuid).describe();
        assert_eq!(detail.version, "1 - time based");
        assert_eq!(
            detail.time.unwrap().format_short(),
            "2010-01-01 00:00:00 (UTC)"
        );
        assert_eq!(detail.clock_sequence, Some(clock_seq));
        assert_eq!(detail.node.as_deref(), Some("00:11:22:33:44:55"));
    }
}
