//! The serialized property store subsystem ([MS-PROPSTORE]).
//!
//! Property stores turn up in three places inside a link file: the
//! PropertyStoreDataBlock in ExtraData, the payloads of LinkTargetIDList
//! items, and the VistaAndAboveIDList block's items. The first is framed and
//! decoded directly; the other two have no declared position, so they are
//! found by [`find_property_stores`], a linear scan for the version
//! signature.

mod propvariant;

pub use propvariant::{ArrayDimension, Decimal, PropVariant};

use encoding_rs::{Encoding, WINDOWS_1252};
use getset::Getters;
use log::{debug, trace};
use uuid::uuid;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::region::Region;
use crate::{Error, Guid};

/// The version signature every store carries: `"1SPS"` read little-endian.
pub const STORE_VERSION: u32 = 0x5350_5331;

/// Stores with this format id name their properties with strings; every
/// other format id names them with integer ids.
const STRING_NAMES_FORMAT_ID: uuid::Uuid = uuid!("d5cdd505-2e9c-101b-9397-08002b2cf9ae");

/// How the properties of one store are named.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum NameType {
    /// Properties carry UTF-16 string names.
    StringName,
    /// Properties carry 32-bit integer ids.
    IntegerName,
}

/// One SerializedPropertyStore ([MS-PROPSTORE] 2.2): a format id and an
/// ordered run of typed property values.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct SerializedPropertyStore {
    /// Absolute file offset of the storage-size field.
    position: u64,

    /// Declared size of the whole store, terminator included.
    storage_size: u32,

    /// Always [`STORE_VERSION`] in a well-formed store.
    version: u32,

    /// Identifies the property set this store belongs to.
    format_id: Guid,

    /// Decided by comparing the format id against the string-name sentinel.
    name_type: NameType,

    /// The property values, in stored order. The zero terminator is not kept.
    values: Vec<SerializedPropertyValue>,
}

/// One SerializedPropertyValue ([MS-PROPSTORE] 2.3): a name or id, and a
/// typed value.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct SerializedPropertyValue {
    /// Declared size of this value entry, all fields included.
    value_size: u32,

    /// The property's name or integer id, per the store's name type.
    name: PropertyName,

    reserved: u8,

    /// The decoded PROPVARIANT payload.
    value: PropVariant,
}

/// A property designator: either an integer id or a UTF-16 name.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PropertyName {
    Id(u32),
    Name(String),
}

impl std::fmt::Display for PropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl SerializedPropertyStore {
    /// Decode one store starting at `offset` within `region`. A storage size
    /// of zero is the series terminator and yields `None`. On success also
    /// returns the bytes consumed.
    pub(crate) fn read(
        region: &Region,
        offset: usize,
        default_codepage: &'static Encoding,
    ) -> Result<Option<(Self, usize)>, Error> {
        let storage_size = region.u32_at(offset)?;
        if storage_size == 0 {
            return Ok(None);
        }
        let store = region.subregion(offset, storage_size as usize)?;

        let version = store.u32_at(4)?;
        if version != STORE_VERSION {
            return Err(Error::InvalidPropertyStore {
                offset: store.abs(4),
            });
        }
        let format_id = store.guid_at(8)?;
        // The sentinel comparison is over the whole 16 bytes.
        let name_type = if format_id.as_uuid() == &STRING_NAMES_FORMAT_ID {
            NameType::StringName
        } else {
            NameType::IntegerName
        };
        trace!(
            "property store at 0x{:x}: {} bytes, format id {}, {:?}",
            store.abs(0),
            storage_size,
            format_id,
            name_type
        );

        let mut values = Vec::new();
        let mut value_offset = 24usize;
        loop {
            match SerializedPropertyValue::read(&store, value_offset, name_type, default_codepage)?
            {
                Some((value, consumed)) => {
                    value_offset += consumed;
                    values.push(value);
                }
                None => break,
            }
        }

        Ok(Some((
            Self {
                position: region.abs(offset),
                storage_size,
                version,
                format_id,
                name_type,
                values,
            },
            storage_size as usize,
        )))
    }
}

impl SerializedPropertyValue {
    /// Decode one value starting at `offset` within `store`. A value size of
    /// zero is the list terminator and yields `None`.
    fn read(
        store: &Region,
        offset: usize,
        name_type: NameType,
        default_codepage: &'static Encoding,
    ) -> Result<Option<(Self, usize)>, Error> {
        let value_size = store.u32_at(offset)?;
        if value_size == 0 {
            return Ok(None);
        }
        let entry = store.subregion(offset, value_size as usize)?;

        let name_size_or_id = entry.u32_at(4)?;
        let reserved = entry.u8_at(8)?;
        let (name, variant_offset) = match name_type {
            NameType::StringName => {
                let name = entry.wstring_exact_at(9, name_size_or_id as usize / 2)?;
                (PropertyName::Name(name), 9 + name_size_or_id as usize)
            }
            NameType::IntegerName => (PropertyName::Id(name_size_or_id), 9),
        };

        let value = PropVariant::read(&entry.tail(variant_offset)?, default_codepage)?;
        Ok(Some((
            Self {
                value_size,
                name,
                reserved,
                value,
            },
            value_size as usize,
        )))
    }
}

/// Decode a run of consecutive stores ending at a zero storage size, the
/// layout of the PropertyStoreDataBlock payload. The terminator's four bytes
/// are counted in the returned consumed size.
pub(crate) fn read_store_series(
    region: &Region,
    default_codepage: &'static Encoding,
) -> Result<(Vec<SerializedPropertyStore>, usize), Error> {
    let mut stores = Vec::new();
    let mut offset = 0usize;
    while let Some((store, consumed)) =
        SerializedPropertyStore::read(region, offset, default_codepage)?
    {
        offset += consumed;
        stores.push(store);
    }
    Ok((stores, offset + 4))
}

/// Hunt for serialized property stores inside an arbitrary byte slice.
///
/// Scans for the first occurrence of the little-endian version signature,
/// rewinds four bytes to the storage-size field, and decodes the consecutive
/// store series from there. `base_offset` is the absolute file offset of
/// `data[0]`, so reported store positions are file-absolute.
///
/// This is a heuristic over opaque bytes: a hit that fails to decode ends
/// the series quietly rather than failing the caller, and a slice without
/// the signature yields an empty list.
pub fn find_property_stores(data: &[u8], base_offset: u64) -> Vec<SerializedPropertyStore> {
    let region = Region::new(data, base_offset);
    let mut stores = Vec::new();

    // No point scanning where the signature's tail or the minimum store
    // (empty value list) cannot fit.
    if data.len() < 24 {
        return stores;
    }
    for sig_pos in 4..data.len() - 19 {
        let Ok(candidate) = region.u32_at(sig_pos) else {
            break;
        };
        if candidate != STORE_VERSION {
            continue;
        }
        let mut offset = sig_pos - 4;
        loop {
            match SerializedPropertyStore::read(&region, offset, WINDOWS_1252) {
                Ok(Some((store, consumed))) => {
                    offset += consumed;
                    stores.push(store);
                }
                Ok(None) => break,
                Err(err) => {
                    debug!("embedded store series at 0x{:x} ends: {err}", region.abs(offset));
                    break;
                }
            }
        }
        break;
    }
    stores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpwstr_value_bytes(name: &str, text: &str) -> Vec<u8> {
        let mut name_units: Vec<u16> = name.encode_utf16().collect();
        name_units.push(0);
        let mut text_units: Vec<u16> = text.encode_utf16().collect();
        text_units.push(0);

        let value_size = 4 + 4 + 1 + name_units.len() * 2 + 2 + 2 + 4 + text_units.len() * 2;
        let mut out = Vec::new();
        out.extend_from_slice(&(value_size as u32).to_le_bytes());
        out.extend_from_slice(&((name_units.len() * 2) as u32).to_le_bytes());
        out.push(0);
        for unit in &name_units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&31u16.to_le_bytes()); // VT_LPWSTR
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(text_units.len() as u32).to_le_bytes());
        for unit in &text_units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    pub(crate) fn string_name_store_bytes(name: &str, text: &str) -> Vec<u8> {
        let value = lpwstr_value_bytes(name, text);
        let storage_size = 4 + 4 + 16 + value.len() + 4;
        let mut out = Vec::new();
        out.extend_from_slice(&(storage_size as u32).to_le_bytes());
        out.extend_from_slice(&STORE_VERSION.to_le_bytes());
        // {D5CDD505-2E9C-101B-9397-08002B2CF9AE} in packet representation.
        out.extend_from_slice(&[
            0x05, 0xd5, 0xcd, 0xd5, 0x9c, 0x2e, 0x1b, 0x10, 0x93, 0x97, 0x08, 0x00, 0x2b, 0x2c,
            0xf9, 0xae,
        ]);
        out.extend_from_slice(&value);
        out.extend_from_slice(&0u32.to_le_bytes()); // value list terminator
        out
    }

    #[test]
    fn locator_reports_the_storage_size_position() {
        let mut data = vec![0xab; 11]; // junk prefix
        let store_pos = data.len();
        data.extend_from_slice(&string_name_store_bytes("Title", "Demo"));
        data.extend_from_slice(&0u32.to_le_bytes()); // series terminator

        let stores = find_property_stores(&data, 0x500);
        assert_eq!(stores.len(), 1);
        assert_eq!(*stores[0].position(), 0x500 + store_pos as u64);
        assert_eq!(*stores[0].name_type(), NameType::StringName);
        assert_eq!(
            *stores[0].values()[0].name(),
            PropertyName::Name("Title".to_string())
        );
        match stores[0].values()[0].value() {
            PropVariant::Lpwstr(s) => assert_eq!(s, "Demo"),
            other => panic!("expected VT_LPWSTR, got {other:?}"),
        }
    }

    #[test]
    fn locator_returns_empty_without_a_signature() {
        let data = vec![0x41u8; 256];
        assert!(find_property_stores(&data, 0).is_empty());
    }

    #[test]
    fn version_mismatch_is_invalid() {
        let mut data = string_name_store_bytes("k", "v");
        data[4] = 0x32; // corrupt the version signature
        let region = Region::new(&data, 0);
        match SerializedPropertyStore::read(&region, 0, WINDOWS_1252) {
            Err(Error::InvalidPropertyStore { offset }) => assert_eq!(offset, 4),
            other => panic!("expected InvalidPropertyStore, got {other:?}"),
        }
    }
}
