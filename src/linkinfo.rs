use bitflags::bitflags;
use encoding_rs::Encoding;
use getset::Getters;
use log::debug;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive as _;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::region::Region;
use crate::Error;

/// The LinkInfo structure ([MS-SHLLINK] 2.3): everything needed to resolve
/// the target when it is no longer where it was — the volume it lived on,
/// the mapped drive, and the UNC form of the path if one existed.
///
/// Unlike the regions before it, LinkInfo is offset-driven: its header holds
/// six to eight offsets that point into its own extent, and the strings are
/// found by following them, not by reading sequentially. The whole region is
/// therefore decoded from a snapshot, and every stored offset is checked
/// against the region before use.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct LinkInfo {
    /// Absolute file offset where the region starts.
    #[cfg_attr(feature = "serde", serde(skip))]
    start_offset: u64,

    /// Declared size of the whole LinkInfo structure; every offset below
    /// must fall inside it.
    link_info_size: u32,

    /// Size of the header section. A value of at least 0x24 means the two
    /// optional Unicode offsets are present.
    link_info_header_size: u32,

    /// Which of the optional sub-structures exist.
    link_info_flags: LinkInfoFlags,

    /// Offset of the VolumeID structure; zero when absent.
    volume_id_offset: u32,

    /// Offset of the local base path; zero when absent.
    local_base_path_offset: u32,

    /// Offset of the CommonNetworkRelativeLink structure; zero when absent.
    common_network_relative_link_offset: u32,

    /// Offset of the common path suffix.
    common_path_suffix_offset: u32,

    /// Offset of the Unicode local base path. Present only when the header
    /// size is at least 0x24.
    local_base_path_offset_unicode: Option<u32>,

    /// Offset of the Unicode common path suffix. Present only when the
    /// header size is at least 0x24.
    common_path_suffix_offset_unicode: Option<u32>,

    /// Volume information, present iff `VOLUME_ID_AND_LOCAL_BASE_PATH`.
    volume_id: Option<VolumeID>,

    /// Network location information, present iff
    /// `COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX`.
    common_network_relative_link: Option<CommonNetworkRelativeLink>,

    #[getset(skip)]
    local_base_path: Option<String>,

    #[getset(skip)]
    common_path_suffix: Option<String>,

    #[getset(skip)]
    local_base_path_unicode: Option<String>,

    #[getset(skip)]
    common_path_suffix_unicode: Option<String>,
}

impl LinkInfo {
    /// Decode a LinkInfo region. `region` must span exactly the declared
    /// size, starting at the LinkInfoSize field.
    pub(crate) fn parse(
        region: Region,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let link_info_size = region.u32_at(0)?;
        let link_info_header_size = region.u32_at(4)?;
        let link_info_flags = LinkInfoFlags::from_bits_retain(region.u32_at(8)?);
        debug!(
            "LinkInfo at 0x{:x}: {} bytes, header {} bytes, flags {:?}",
            region.abs(0),
            link_info_size,
            link_info_header_size,
            link_info_flags
        );

        let volume_id_offset = region.u32_at(12)?;
        let local_base_path_offset = region.u32_at(16)?;
        let common_network_relative_link_offset = region.u32_at(20)?;
        let common_path_suffix_offset = region.u32_at(24)?;
        let (local_base_path_offset_unicode, common_path_suffix_offset_unicode) =
            if link_info_header_size >= 0x24 {
                (Some(region.u32_at(28)?), Some(region.u32_at(32)?))
            } else {
                (None, None)
            };

        // Every stored offset, if in use, must land inside the region.
        for (field_pos, offset) in [
            (12, volume_id_offset),
            (16, local_base_path_offset),
            (20, common_network_relative_link_offset),
            (24, common_path_suffix_offset),
            (28, local_base_path_offset_unicode.unwrap_or(0)),
            (32, common_path_suffix_offset_unicode.unwrap_or(0)),
        ] {
            if offset != 0 && offset >= link_info_size {
                return Err(Error::InvalidOffset {
                    offset: region.abs(field_pos),
                });
            }
        }

        let mut volume_id = None;
        let mut local_base_path = None;
        let mut local_base_path_unicode = None;
        if link_info_flags.has_volume_id_and_local_base_path() {
            let vol_size = region.u32_at(volume_id_offset as usize)?;
            let vol_region = region.subregion(volume_id_offset as usize, vol_size as usize)?;
            volume_id = Some(VolumeID::parse(
                vol_region,
                link_info_header_size,
                default_codepage,
            )?);

            if local_base_path_offset != 0 {
                local_base_path =
                    Some(region.cstring_at(local_base_path_offset as usize, default_codepage)?);
            }
            if let Some(offset) = local_base_path_offset_unicode.filter(|&o| o != 0) {
                local_base_path_unicode = Some(region.wstring_at(offset as usize)?);
            }
        }

        let mut common_network_relative_link = None;
        if link_info_flags.has_common_network_relative_link_and_path_suffix() {
            let cnr_size = region.u32_at(common_network_relative_link_offset as usize)?;
            let cnr_region = region.subregion(
                common_network_relative_link_offset as usize,
                cnr_size as usize,
            )?;
            common_network_relative_link = Some(CommonNetworkRelativeLink::parse(
                cnr_region,
                default_codepage,
            )?);
        }

        let common_path_suffix = if common_path_suffix_offset != 0 {
            Some(region.cstring_at(common_path_suffix_offset as usize, default_codepage)?)
        } else {
            None
        };
        let common_path_suffix_unicode =
            match common_path_suffix_offset_unicode.filter(|&o| o != 0) {
                Some(offset) => Some(region.wstring_at(offset as usize)?),
                None => None,
            };

        Ok(Self {
            start_offset: region.abs(0),
            link_info_size,
            link_info_header_size,
            link_info_flags,
            volume_id_offset,
            local_base_path_offset,
            common_network_relative_link_offset,
            common_path_suffix_offset,
            local_base_path_offset_unicode,
            common_path_suffix_offset_unicode,
            volume_id,
            common_network_relative_link,
            local_base_path,
            common_path_suffix,
            local_base_path_unicode,
            common_path_suffix_unicode,
        })
    }

    /// The code-page local base path, when the link targets a local volume.
    pub fn local_base_path(&self) -> Option<&str> {
        self.local_base_path.as_deref()
    }

    /// The code-page path suffix appended to the base path.
    pub fn common_path_suffix(&self) -> Option<&str> {
        self.common_path_suffix.as_deref()
    }

    pub fn local_base_path_unicode(&self) -> Option<&str> {
        self.local_base_path_unicode.as_deref()
    }

    pub fn common_path_suffix_unicode(&self) -> Option<&str> {
        self.common_path_suffix_unicode.as_deref()
    }
}

bitflags! {
    /// Which optional LinkInfo sub-structures are present.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct LinkInfoFlags: u32 {
        /// VolumeID and the local base path are present.
        const VOLUME_ID_AND_LOCAL_BASE_PATH = 1 << 0;
        /// A CommonNetworkRelativeLink is present.
        const COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX = 1 << 1;
    }
}

#[allow(missing_docs)]
impl LinkInfoFlags {
    pub fn has_volume_id_and_local_base_path(&self) -> bool {
        self.contains(Self::VOLUME_ID_AND_LOCAL_BASE_PATH)
    }

    pub fn has_common_network_relative_link_and_path_suffix(&self) -> bool {
        self.contains(Self::COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX)
    }
}

/// The VolumeID structure ([MS-SHLLINK] 2.3.1): the volume the target was
/// stored on when the link was created.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct VolumeID {
    /// Declared size of this structure; must exceed 0x10.
    volume_id_size: u32,

    drive_type: DriveType,

    /// The volume serial number.
    drive_serial_number: u32,

    /// Offset of the code-page volume label, relative to this structure.
    volume_label_offset: u32,

    /// Offset of the UTF-16LE volume label. Only stored when the enclosing
    /// LinkInfo header is the extended (>= 0x24) layout.
    volume_label_offset_unicode: Option<u32>,

    #[getset(skip)]
    volume_label: String,
}

impl VolumeID {
    fn parse(
        region: Region,
        link_info_header_size: u32,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let volume_id_size = region.u32_at(0)?;
        let drive_type = DriveType::from_wire(region.u32_at(4)?);
        let drive_serial_number = region.u32_at(8)?;
        let volume_label_offset = region.u32_at(12)?;
        let volume_label_offset_unicode = if link_info_header_size >= 0x24 {
            Some(region.u32_at(16)?)
        } else {
            None
        };

        for (field_pos, offset) in [
            (12, volume_label_offset),
            (16, volume_label_offset_unicode.unwrap_or(0)),
        ] {
            if offset != 0 && offset >= volume_id_size {
                return Err(Error::InvalidOffset {
                    offset: region.abs(field_pos),
                });
            }
        }

        // The legacy layout stores a code-page label; the extended layout
        // points at a UTF-16 label through the Unicode offset.
        let volume_label = match volume_label_offset_unicode.filter(|&o| o != 0) {
            Some(offset) => region.wstring_at(offset as usize)?,
            None => region.cstring_at(volume_label_offset as usize, default_codepage)?,
        };

        Ok(Self {
            volume_id_size,
            drive_type,
            drive_serial_number,
            volume_label_offset,
            volume_label_offset_unicode,
            volume_label,
        })
    }

    /// The label of the volume the target was stored on.
    pub fn volume_label(&self) -> &str {
        &self.volume_label
    }
}

/// The type of drive the link target was stored on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DriveType {
    /// The drive type cannot be determined.
    DriveUnknown = 0x00,
    /// The root path is invalid; no volume is mounted at the path.
    DriveNoRootDir = 0x01,
    /// Removable media.
    DriveRemovable = 0x02,
    /// Fixed media.
    DriveFixed = 0x03,
    /// A remote (network) drive.
    DriveRemote = 0x04,
    /// A CD-ROM drive.
    DriveCDRom = 0x05,
    /// A RAM disk.
    DriveRamdisk = 0x06,
}

impl DriveType {
    fn from_wire(value: u32) -> Self {
        Self::from_u32(value).unwrap_or(Self::DriveUnknown)
    }
}

/// The CommonNetworkRelativeLink structure ([MS-SHLLINK] 2.3.2): the network
/// location the target is stored at, including the mapped device and the UNC
/// prefix. All offsets, the Unicode pair included, are relative to the start
/// of this structure.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct CommonNetworkRelativeLink {
    /// Declared size; at least 0x14.
    common_network_relative_link_size: u32,

    flags: CommonNetworkRelativeLinkFlags,

    /// Offset of the net name string.
    net_name_offset: u32,

    /// Offset of the device name string; zero unless `VALID_DEVICE`.
    device_name_offset: u32,

    /// The network provider, meaningful only under `VALID_NET_TYPE`.
    network_provider_type: Option<NetworkProviderType>,

    /// Present iff the net name offset exceeds 0x14.
    net_name_offset_unicode: Option<u32>,

    /// Present iff the net name offset exceeds 0x14.
    device_name_offset_unicode: Option<u32>,

    #[getset(skip)]
    net_name: Option<String>,

    #[getset(skip)]
    device_name: Option<String>,

    #[getset(skip)]
    net_name_unicode: Option<String>,

    #[getset(skip)]
    device_name_unicode: Option<String>,
}

impl CommonNetworkRelativeLink {
    fn parse(region: Region, default_codepage: &'static Encoding) -> Result<Self, Error> {
        let common_network_relative_link_size = region.u32_at(0)?;
        if common_network_relative_link_size < 0x14 {
            return Err(Error::Truncated {
                offset: region.abs(0),
            });
        }
        let flags = CommonNetworkRelativeLinkFlags::from_bits_retain(region.u32_at(4)?);
        let net_name_offset = region.u32_at(8)?;
        let device_name_offset = region.u32_at(12)?;
        let provider_raw = region.u32_at(16)?;
        let network_provider_type = if flags.has_valid_net_type() {
            Some(NetworkProviderType::from(provider_raw))
        } else {
            None
        };

        let (net_name_offset_unicode, device_name_offset_unicode) = if net_name_offset > 0x14 {
            (Some(region.u32_at(20)?), Some(region.u32_at(24)?))
        } else {
            (None, None)
        };

        for (field_pos, offset) in [
            (8, net_name_offset),
            (12, device_name_offset),
            (20, net_name_offset_unicode.unwrap_or(0)),
            (24, device_name_offset_unicode.unwrap_or(0)),
        ] {
            if offset != 0 && offset >= common_network_relative_link_size {
                return Err(Error::InvalidOffset {
                    offset: region.abs(field_pos),
                });
            }
        }

        let net_name = if net_name_offset != 0 {
            Some(region.cstring_at(net_name_offset as usize, default_codepage)?)
        } else {
            None
        };
        let device_name = if flags.has_valid_device() && device_name_offset != 0 {
            Some(region.cstring_at(device_name_offset as usize, default_codepage)?)
        } else {
            None
        };
        let net_name_unicode = match net_name_offset_unicode.filter(|&o| o != 0) {
            Some(offset) => Some(region.wstring_at(offset as usize)?),
            None => None,
        };
        let device_name_unicode = match device_name_offset_unicode.filter(|&o| o != 0) {
            Some(offset) => Some(region.wstring_at(offset as usize)?),
            None => None,
        };

        Ok(Self {
            common_network_relative_link_size,
            flags,
            net_name_offset,
            device_name_offset,
            network_provider_type,
            net_name_offset_unicode,
            device_name_offset_unicode,
            net_name,
            device_name,
            net_name_unicode,
            device_name_unicode,
        })
    }

    /// The server share path, e.g. `\\server\share`.
    pub fn net_name(&self) -> Option<&str> {
        self.net_name.as_deref()
    }

    /// The mapped device, e.g. `D:`.
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn net_name_unicode(&self) -> Option<&str> {
        self.net_name_unicode.as_deref()
    }

    pub fn device_name_unicode(&self) -> Option<&str> {
        self.device_name_unicode.as_deref()
    }
}

bitflags! {
    /// Which CommonNetworkRelativeLink fields carry meaning.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize))]
    pub struct CommonNetworkRelativeLinkFlags: u32 {
        /// The device name offset is meaningful.
        const VALID_DEVICE = 1 << 0;
        /// The network provider type is meaningful.
        const VALID_NET_TYPE = 1 << 1;
    }
}

#[allow(missing_docs)]
impl CommonNetworkRelativeLinkFlags {
    pub fn has_valid_device(&self) -> bool {
        self.contains(Self::VALID_DEVICE)
    }

    pub fn has_valid_net_type(&self) -> bool {
        self.contains(Self::VALID_NET_TYPE)
    }
}

/// The WNNC network provider class codes. Codes outside the documented set
/// are preserved as [`NetworkProviderType::Unknown`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum NetworkProviderType {
    MsNet,
    Smb,
    Netware,
    Vines,
    TenNet,
    Locus,
    SunPcNfs,
    LanStep,
    NineTiles,
    Lantastic,
    As400,
    FtpNfs,
    PathWorks,
    LifeNet,
    PowerLan,
    BwNfs,
    Cogent,
    Farallon,
    AppleTalk,
    Intergraph,
    SymfoNet,
    ClearCase,
    Frontier,
    Bmc,
    Dce,
    Avid,
    Docuspace,
    Mangosoft,
    Sernet,
    Riverfront1,
    Riverfront2,
    Decorb,
    Protstor,
    FjRedir,
    Distinct,
    Twins,
    Rdr2Sample,
    Csc,
    ThreeInOne,
    ExtendNet,
    Stac,
    Foxbat,
    Yahoo,
    Exifs,
    Dav,
    Knoware,
    ObjectDire,
    Masfax,
    HobNfs,
    Shiva,
    Ibmal,
    Lock,
    Termsrv,
    Srt,
    Quincy,
    Openafs,
    Avid1,
    Dfs,
    Kwnp,
    Zenworks,
    Driveonweb,
    Vmware,
    Rsfx,
    Mfiles,
    MsNfs,
    Google,
    /// A provider code outside the documented set.
    Unknown(u32),
}

impl From<u32> for NetworkProviderType {
    fn from(code: u32) -> Self {
        match code {
            0x0001_0000 => Self::MsNet,
            0x0002_0000 => Self::Smb,
            0x0003_0000 => Self::Netware,
            0x0004_0000 => Self::Vines,
            0x0005_0000 => Self::TenNet,
            0x0006_0000 => Self::Locus,
            0x0007_0000 => Self::SunPcNfs,
            0x0008_0000 => Self::LanStep,
            0x0009_0000 => Self::NineTiles,
            0x000a_0000 => Self::Lantastic,
            0x000b_0000 => Self::As400,
            0x000c_0000 => Self::FtpNfs,
            0x000d_0000 => Self::PathWorks,
            0x000e_0000 => Self::LifeNet,
            0x000f_0000 => Self::PowerLan,
            0x0010_0000 => Self::BwNfs,
            0x0011_0000 => Self::Cogent,
            0x0012_0000 => Self::Farallon,
            0x0013_0000 => Self::AppleTalk,
            0x0014_0000 => Self::Intergraph,
            0x0015_0000 => Self::SymfoNet,
            0x0016_0000 => Self::ClearCase,
            0x0017_0000 => Self::Frontier,
            0x0018_0000 => Self::Bmc,
            0x0019_0000 => Self::Dce,
            0x001a_0000 => Self::Avid,
            0x001b_0000 => Self::Docuspace,
            0x001c_0000 => Self::Mangosoft,
            0x001d_0000 => Self::Sernet,
            0x001e_0000 => Self::Riverfront1,
            0x001f_0000 => Self::Riverfront2,
            0x0020_0000 => Self::Decorb,
            0x0021_0000 => Self::Protstor,
            0x0022_0000 => Self::FjRedir,
            0x0023_0000 => Self::Distinct,
            0x0024_0000 => Self::Twins,
            0x0025_0000 => Self::Rdr2Sample,
            0x0026_0000 => Self::Csc,
            0x0027_0000 => Self::ThreeInOne,
            0x0029_0000 => Self::ExtendNet,
            0x002a_0000 => Self::Stac,
            0x002b_0000 => Self::Foxbat,
            0x002c_0000 => Self::Yahoo,
            0x002d_0000 => Self::Exifs,
            0x002e_0000 => Self::Dav,
            0x002f_0000 => Self::Knoware,
            0x0030_0000 => Self::ObjectDire,
            0x0031_0000 => Self::Masfax,
            0x0032_0000 => Self::HobNfs,
            0x0033_0000 => Self::Shiva,
            0x0034_0000 => Self::Ibmal,
            0x0035_0000 => Self::Lock,
            0x0036_0000 => Self::Termsrv,
            0x0037_0000 => Self::Srt,
            0x0038_0000 => Self::Quincy,
            0x0039_0000 => Self::Openafs,
            0x003a_0000 => Self::Avid1,
            0x003b_0000 => Self::Dfs,
            0x003c_0000 => Self::Kwnp,
            0x003d_0000 => Self::Zenworks,
            0x003e_0000 => Self::Driveonweb,
            0x003f_0000 => Self::Vmware,
            0x0040_0000 => Self::Rsfx,
            0x0041_0000 => Self::Mfiles,
            0x0042_0000 => Self::MsNfs,
            0x0043_0000 => Self::Google,
            other => Self::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes_round_trip_through_the_catch_all() {
        assert_eq!(NetworkProviderType::from(0x0002_0000), NetworkProviderType::Smb);
        assert_eq!(
            NetworkProviderType::from(0x00de_0000),
            NetworkProviderType::Unknown(0x00de_0000)
        );
    }

    #[test]
    fn drive_type_falls_back_to_unknown() {
        assert_eq!(DriveType::from_wire(3), DriveType::DriveFixed);
        assert_eq!(DriveType::from_wire(99), DriveType::DriveUnknown);
    }
}
