use std::fmt;

use encoding_rs::Encoding;
use log::debug;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::region::Region;
use crate::{Error, FileTime, Guid};

const VT_VECTOR: u16 = 0x1000;
const VT_ARRAY: u16 = 0x2000;
const VT_VARIANT: u16 = 0x000c;

/// A decoded TypedPropertyValue ([MS-OLEPS] 2.15): the OLE property-variant
/// tagged union, restricted to the serialized subset.
///
/// Types outside the decoded subset are captured as
/// [`PropVariant::Unsupported`] with their raw payload — they are evidence
/// too, and must not abort the enclosing decode.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum PropVariant {
    Empty,
    Null,
    I1(i8),
    UI1(u8),
    I2(i16),
    UI2(u16),
    I4(i32),
    UI4(u32),
    I8(i64),
    UI8(u64),
    Int(i32),
    UInt(u32),
    R4(f32),
    R8(f64),
    Bool(bool),
    /// An HRESULT.
    Error(u32),
    /// CY: a 64-bit fixed-point value scaled by 10 000.
    Currency(i64),
    /// An OLE automation date (days since 1899-12-30).
    Date(f64),
    FileTime(FileTime),
    Clsid(Guid),
    Decimal(Decimal),
    Bstr(String),
    Lpstr(String),
    Lpwstr(String),
    Stream(String),
    Storage(String),
    StreamedObject(String),
    StoredObject(String),
    Blob(Vec<u8>),
    BlobObject(Vec<u8>),
    /// VT_CF: clipboard format identifier plus data, kept opaque.
    ClipboardData(Vec<u8>),
    VersionedStream {
        version_guid: Guid,
        stream_name: String,
    },
    /// VT_VECTOR: a counted sequence of one scalar type.
    Vector(Vec<PropVariant>),
    /// VT_ARRAY: a SAFEARRAY with dimension metadata.
    Array {
        element_type: u16,
        dimensions: Vec<ArrayDimension>,
        elements: Vec<PropVariant>,
    },
    /// A type outside the decoded subset; the payload is not interpreted.
    Unsupported { type_code: u16, raw: Vec<u8> },
}

/// One dimension of a VT_ARRAY value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ArrayDimension {
    /// Element count along this dimension.
    pub size: u32,
    /// Index of the first element along this dimension.
    pub index_offset: i32,
}

/// VT_DECIMAL: a 96-bit integer scaled by a power of ten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Decimal {
    /// Power of ten the mantissa is divided by (0..=28).
    pub scale: u8,
    /// 0x80 means negative.
    pub sign: u8,
    /// High 32 bits of the mantissa.
    pub hi32: u32,
    /// Low 64 bits of the mantissa.
    pub lo64: u64,
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mantissa = ((self.hi32 as u128) << 64) | self.lo64 as u128;
        let mut digits = mantissa.to_string();
        let scale = self.scale as usize;
        if scale > 0 {
            while digits.len() <= scale {
                digits.insert(0, '0');
            }
            digits.insert(digits.len() - scale, '.');
        }
        if self.sign & 0x80 != 0 {
            write!(f, "-{digits}")
        } else {
            f.write_str(&digits)
        }
    }
}

impl PropVariant {
    /// Decode a TypedPropertyValue: 16-bit type, 16 bits of padding, payload.
    /// `region` must start at the type field.
    pub(crate) fn read(
        region: &Region,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let type_code = region.u16_at(0)?;
        let _padding = region.u16_at(2)?;
        let body = region.tail(4)?;

        // The vector and array markers are single high bits; both can never
        // be combined with each other in serialized stores.
        if type_code & VT_ARRAY != 0 {
            Self::read_array(type_code, &body, default_codepage)
        } else if type_code & VT_VECTOR != 0 {
            Self::read_vector(type_code, &body, default_codepage)
        } else {
            Ok(Self::read_scalar(type_code, &body, 0, false, default_codepage)?.0)
        }
    }

    fn read_vector(
        type_code: u16,
        body: &Region,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let element_type = type_code & !VT_VECTOR;
        let count = body.u32_at(0)?;
        let mut elements = Vec::with_capacity(count.min(4096) as usize);
        let mut offset = 4usize;
        for _ in 0..count {
            let (element, consumed) =
                Self::read_element(element_type, body, offset, default_codepage)?;
            // An element that consumes nothing cannot legally repeat.
            if consumed == 0 {
                return Err(Error::Truncated {
                    offset: body.abs(offset),
                });
            }
            offset += consumed;
            elements.push(element);
        }
        Ok(Self::Vector(elements))
    }

    fn read_array(
        type_code: u16,
        body: &Region,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let element_type = (body.u32_at(0)? & 0xffff) as u16;
        let num_dimensions = body.u32_at(4)?;
        let mut dimensions = Vec::new();
        let mut offset = 8usize;
        let mut element_count = 1u64;
        for _ in 0..num_dimensions {
            let size = body.u32_at(offset)?;
            let index_offset = body.i32_at(offset + 4)?;
            element_count = element_count.saturating_mul(size as u64);
            dimensions.push(ArrayDimension { size, index_offset });
            offset += 8;
        }

        let mut elements = Vec::new();
        for _ in 0..element_count {
            let (element, consumed) =
                Self::read_element(element_type, body, offset, default_codepage)?;
            if consumed == 0 {
                return Err(Error::Truncated {
                    offset: body.abs(offset),
                });
            }
            offset += consumed;
            elements.push(element);
        }
        Ok(Self::Array {
            element_type: type_code & !VT_ARRAY,
            dimensions,
            elements,
        })
    }

    fn read_element(
        element_type: u16,
        body: &Region,
        offset: usize,
        default_codepage: &'static Encoding,
    ) -> Result<(Self, usize), Error> {
        if element_type == VT_VARIANT {
            // A vector of variants nests a full TypedPropertyValue per
            // element.
            let inner_type = body.u16_at(offset)?;
            let (value, consumed) =
                Self::read_scalar(inner_type, body, offset + 4, true, default_codepage)?;
            Ok((value, 4 + consumed))
        } else {
            Self::read_scalar(element_type, body, offset, true, default_codepage)
        }
    }

    /// Decode one scalar payload at `offset`. Returns the value and the
    /// bytes consumed; `packed` selects the in-vector layout, where small
    /// integers are not padded but variable-size payloads align to four
    /// bytes.
    fn read_scalar(
        vt: u16,
        body: &Region,
        offset: usize,
        packed: bool,
        default_codepage: &'static Encoding,
    ) -> Result<(Self, usize), Error> {
        let two = if packed { 2 } else { 4 };
        let one = if packed { 1 } else { 4 };
        let value = match vt {
            0x00 => (Self::Empty, 0),
            0x01 => (Self::Null, 0),
            0x02 => (Self::I2(body.i16_at(offset)?), two),
            0x03 => (Self::I4(body.i32_at(offset)?), 4),
            0x04 => (Self::R4(body.f32_at(offset)?), 4),
            0x05 => (Self::R8(body.f64_at(offset)?), 8),
            0x06 => (Self::Currency(body.i64_at(offset)?), 8),
            0x07 => (Self::Date(body.f64_at(offset)?), 8),
            0x08 => Self::read_codepage_string(body, offset, packed, default_codepage, Self::Bstr)?,
            0x0a => (Self::Error(body.u32_at(offset)?), 4),
            0x0b => (Self::Bool(body.u16_at(offset)? != 0), two),
            0x0e => {
                let decimal = Decimal {
                    scale: body.u8_at(offset + 2)?,
                    sign: body.u8_at(offset + 3)?,
                    hi32: body.u32_at(offset + 4)?,
                    lo64: body.u64_at(offset + 8)?,
                };
                (Self::Decimal(decimal), 16)
            }
            0x10 => (Self::I1(body.u8_at(offset)? as i8), one),
            0x11 => (Self::UI1(body.u8_at(offset)?), one),
            0x12 => (Self::UI2(body.u16_at(offset)?), two),
            0x13 => (Self::UI4(body.u32_at(offset)?), 4),
            0x14 => (Self::I8(body.i64_at(offset)?), 8),
            0x15 => (Self::UI8(body.u64_at(offset)?), 8),
            0x16 => (Self::Int(body.i32_at(offset)?), 4),
            0x17 => (Self::UInt(body.u32_at(offset)?), 4),
            0x1e => {
                Self::read_codepage_string(body, offset, packed, default_codepage, Self::Lpstr)?
            }
            0x1f => {
                let units = body.u32_at(offset)?;
                let text = body.wstring_exact_at(offset + 4, units as usize)?;
                let consumed = 4 + units as usize * 2;
                (
                    Self::Lpwstr(text),
                    if packed { round4(consumed) } else { consumed },
                )
            }
            0x40 => (Self::FileTime(FileTime::from(body.u64_at(offset)?)), 8),
            0x41 => Self::read_blob(body, offset, packed, Self::Blob)?,
            0x42 => {
                Self::read_codepage_string(body, offset, packed, default_codepage, Self::Stream)?
            }
            0x43 => {
                Self::read_codepage_string(body, offset, packed, default_codepage, Self::Storage)?
            }
            0x44 => Self::read_codepage_string(
                body,
                offset,
                packed,
                default_codepage,
                Self::StreamedObject,
            )?,
            0x45 => Self::read_codepage_string(
                body,
                offset,
                packed,
                default_codepage,
                Self::StoredObject,
            )?,
            0x46 => Self::read_blob(body, offset, packed, Self::BlobObject)?,
            0x47 => Self::read_blob(body, offset, packed, Self::ClipboardData)?,
            0x48 => (Self::Clsid(body.guid_at(offset)?), 16),
            0x49 => {
                let version_guid = body.guid_at(offset)?;
                let (stream_name, consumed) =
                    read_codepage_text(body, offset + 16, packed, default_codepage)?;
                (
                    Self::VersionedStream {
                        version_guid,
                        stream_name,
                    },
                    16 + consumed,
                )
            }
            other => {
                debug!("property type 0x{other:04x} not interpreted");
                let raw = body.tail(offset)?.as_bytes().to_vec();
                let len = raw.len();
                (
                    Self::Unsupported {
                        type_code: other,
                        raw,
                    },
                    len,
                )
            }
        };
        Ok(value)
    }

    fn read_codepage_string(
        body: &Region,
        offset: usize,
        packed: bool,
        default_codepage: &'static Encoding,
        wrap: fn(String) -> Self,
    ) -> Result<(Self, usize), Error> {
        let (text, consumed) = read_codepage_text(body, offset, packed, default_codepage)?;
        Ok((wrap(text), consumed))
    }

    fn read_blob(
        body: &Region,
        offset: usize,
        packed: bool,
        wrap: fn(Vec<u8>) -> Self,
    ) -> Result<(Self, usize), Error> {
        let len = body.u32_at(offset)? as usize;
        let bytes = body.bytes_at(offset + 4, len)?.to_vec();
        let consumed = 4 + len;
        Ok((wrap(bytes), if packed { round4(consumed) } else { consumed }))
    }

    /// The `VT_*` name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "VT_EMPTY",
            Self::Null => "VT_NULL",
            Self::I1(_) => "VT_I1",
            Self::UI1(_) => "VT_UI1",
            Self::I2(_) => "VT_I2",
            Self::UI2(_) => "VT_UI2",
            Self::I4(_) => "VT_I4",
            Self::UI4(_) => "VT_UI4",
            Self::I8(_) => "VT_I8",
            Self::UI8(_) => "VT_UI8",
            Self::Int(_) => "VT_INT",
            Self::UInt(_) => "VT_UINT",
            Self::R4(_) => "VT_R4",
            Self::R8(_) => "VT_R8",
            Self::Bool(_) => "VT_BOOL",
            Self::Error(_) => "VT_ERROR",
            Self::Currency(_) => "VT_CY",
            Self::Date(_) => "VT_DATE",
            Self::FileTime(_) => "VT_FILETIME",
            Self::Clsid(_) => "VT_CLSID",
            Self::Decimal(_) => "VT_DECIMAL",
            Self::Bstr(_) => "VT_BSTR",
            Self::Lpstr(_) => "VT_LPSTR",
            Self::Lpwstr(_) => "VT_LPWSTR",
            Self::Stream(_) => "VT_STREAM",
            Self::Storage(_) => "VT_STORAGE",
            Self::StreamedObject(_) => "VT_STREAMED_OBJECT",
            Self::StoredObject(_) => "VT_STORED_OBJECT",
            Self::Blob(_) => "VT_BLOB",
            Self::BlobObject(_) => "VT_BLOB_OBJECT",
            Self::ClipboardData(_) => "VT_CF",
            Self::VersionedStream { .. } => "VT_VERSIONED_STREAM",
            Self::Vector(_) => "VT_VECTOR",
            Self::Array { .. } => "VT_ARRAY",
            Self::Unsupported { .. } => "VT_UNKNOWN",
        }
    }
}

/// A length-prefixed code-page string. Stores written by Unicode-era shells
/// sometimes hold UTF-16 here; a trailing double NUL gives that away.
fn read_codepage_text(
    body: &Region,
    offset: usize,
    packed: bool,
    default_codepage: &'static Encoding,
) -> Result<(String, usize), Error> {
    let len = body.u32_at(offset)? as usize;
    let bytes = body.bytes_at(offset + 4, len)?;
    let text = if len >= 2 && len % 2 == 0 && bytes[len - 2..] == [0, 0] {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|&u| u != 0)
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        let (cow, _, _) = default_codepage.decode(&bytes[..end]);
        cow.into_owned()
    };
    let consumed = 4 + len;
    Ok((text, if packed { round4(consumed) } else { consumed }))
}

fn round4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1252;

    fn typed(type_code: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&type_code.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn read(data: &[u8]) -> PropVariant {
        PropVariant::read(&Region::new(data, 0), WINDOWS_1252).unwrap()
    }

    #[test]
    fn fixed_size_payloads() {
        assert_eq!(read(&typed(0x03, &(-7i32).to_le_bytes())), PropVariant::I4(-7));
        assert_eq!(
            read(&typed(0x15, &0xdead_beef_u64.to_le_bytes())),
            PropVariant::UI8(0xdead_beef)
        );
        assert_eq!(read(&typed(0x0b, &[0xff, 0xff, 0, 0])), PropVariant::Bool(true));
        assert_eq!(read(&typed(0x0b, &[0, 0, 0, 0])), PropVariant::Bool(false));
    }

    #[test]
    fn lpwstr_is_counted_in_units() {
        let mut payload = 3u32.to_le_bytes().to_vec();
        for unit in "ok\0".encode_utf16() {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(read(&typed(0x1f, &payload)), PropVariant::Lpwstr("ok".into()));
    }

    #[test]
    fn lpstr_detects_utf16_by_double_nul() {
        let mut wide = 6u32.to_le_bytes().to_vec();
        for unit in "hi\0".encode_utf16() {
            wide.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(read(&typed(0x1e, &wide)), PropVariant::Lpstr("hi".into()));

        let mut narrow = 3u32.to_le_bytes().to_vec();
        narrow.extend_from_slice(b"hi\0");
        assert_eq!(read(&typed(0x1e, &narrow)), PropVariant::Lpstr("hi".into()));
    }

    #[test]
    fn vector_counts_elements() {
        let mut payload = 3u32.to_le_bytes().to_vec();
        for v in [1i32, 2, 3] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(
            read(&typed(0x1003, &payload)),
            PropVariant::Vector(vec![
                PropVariant::I4(1),
                PropVariant::I4(2),
                PropVariant::I4(3)
            ])
        );
    }

    #[test]
    fn packed_vector_of_i2_is_unpadded() {
        let mut payload = 2u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&5i16.to_le_bytes());
        payload.extend_from_slice(&(-5i16).to_le_bytes());
        assert_eq!(
            read(&typed(0x1002, &payload)),
            PropVariant::Vector(vec![PropVariant::I2(5), PropVariant::I2(-5)])
        );
    }

    #[test]
    fn unknown_types_are_captured_not_fatal() {
        let value = read(&typed(0x0123, &[1, 2, 3, 4]));
        assert_eq!(
            value,
            PropVariant::Unsupported {
                type_code: 0x0123,
                raw: vec![1, 2, 3, 4]
            }
        );
        assert_eq!(value.type_name(), "VT_UNKNOWN");
    }

    #[test]
    fn decimal_renders_scaled() {
        let d = Decimal {
            scale: 2,
            sign: 0x80,
            hi32: 0,
            lo64: 123456,
        };
        assert_eq!(d.to_string(), "-1234.56");
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let data = typed(0x03, &[0x01, 0x02]);
        match PropVariant::read(&Region::new(&data, 0x10), WINDOWS_1252) {
            Err(Error::Truncated { offset }) => assert_eq!(offset, 0x14),
            other => panic!("expected truncation, got {other:?}"),
        }
    }
}
