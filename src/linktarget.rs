use binread::BinRead;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{idlist::IdList, itemid::ItemID};

/// The LinkTargetIDList structure ([MS-SHLLINK] 2.2): the target of the
/// link as a shell-namespace path. Present iff the HasLinkTargetIDList
/// header flag is set.
#[derive(Clone, Debug, Default, BinRead)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[br(little)]
pub struct LinkTargetIdList {
    /// The size, in bytes, of the IDList field (its own two bytes excluded).
    size: u16,

    #[br(args(size))]
    id_list: IdList,
}

impl LinkTargetIdList {
    /// Declared byte size of the IDList field.
    pub fn size(&self) -> u16 {
        self.size
    }

    /// The stored [`ItemID`]s, terminal ID excluded.
    pub fn id_list(&self) -> &Vec<ItemID> {
        self.id_list.item_id_list()
    }
}
