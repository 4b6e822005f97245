use binread::BinReaderExt;
use getset::Getters;
use std::io::Cursor;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::idlist::IdList;
use crate::itemid::ItemID;
use crate::Error;

/// The VistaAndAboveIDListDataBlock ([MS-SHLLINK] 2.5.11): an alternate
/// IDList used instead of the LinkTargetIDList on platforms that support it.
#[derive(Clone, Debug, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct VistaAndAboveIdListDataBlock {
    /// The stored item identifiers, terminal ID excluded.
    #[getset(skip)]
    id_list: IdList,
}

impl VistaAndAboveIdListDataBlock {
    pub(crate) fn parse(body: &[u8], body_offset: u64) -> Result<Self, Error> {
        let mut cursor = Cursor::new(body);
        let mut id_list: IdList = cursor
            .read_le_args((body.len().min(u16::MAX as usize) as u16,))
            .map_err(|e| Error::classify(e, body_offset))?;
        // The items were read from a detached buffer; rebase their offsets
        // onto the file.
        for item in id_list.item_id_list_mut() {
            item.rebase(body_offset);
        }
        Ok(Self { id_list })
    }

    /// The stored [`ItemID`]s.
    pub fn id_list(&self) -> &Vec<ItemID> {
        self.id_list.item_id_list()
    }
}
