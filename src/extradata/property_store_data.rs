use encoding_rs::Encoding;
use getset::Getters;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::propertystore::{read_store_series, SerializedPropertyStore};
use crate::region::Region;
use crate::Error;

/// The PropertyStoreDataBlock ([MS-SHLLINK] 2.5.7): serialized property
/// stores ([MS-PROPSTORE] 2.2) attached to the link by applications.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct PropertyStoreDataBlock {
    /// The decoded stores, in stored order.
    stores: Vec<SerializedPropertyStore>,
}

impl PropertyStoreDataBlock {
    pub(crate) fn parse(
        region: Region,
        default_codepage: &'static Encoding,
    ) -> Result<Self, Error> {
        let (stores, _) = read_store_series(&region, default_codepage)?;
        Ok(Self { stores })
    }
}
