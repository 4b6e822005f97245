use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::{trace, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::itemid::ItemID;

/// The stored IDList structure: any number of [`ItemID`]s followed by a
/// 2-byte terminal ID of zero, all within a declared byte count.
#[derive(Clone, Debug, Default, Getters)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[getset(get = "pub")]
pub struct IdList {
    /// The item identifiers, in stored order. The terminal ID is not kept.
    item_id_list: Vec<ItemID>,
}

impl IdList {
    pub(crate) fn item_id_list_mut(&mut self) -> &mut Vec<ItemID> {
        &mut self.item_id_list
    }
}

impl BinRead for IdList {
    type Args = (u16,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let mut item_id_list = Vec::new();
        let mut remaining = args.0;
        trace!("IDList declares {remaining} bytes");

        // ITEMID* TERMINALID, where the terminal ID is a zero size field.
        while remaining >= 2 {
            let item_id: ItemID = reader.read_le()?;
            if *item_id.size() == 0 {
                break;
            }
            let item_size = *item_id.size();
            if item_size > remaining {
                // The item overruns the declared total. Keep what was read;
                // the caller advances by the declared size regardless.
                warn!(
                    "ItemID at 0x{:x} overruns its IDList by {} bytes",
                    item_id.offset(),
                    item_size - remaining
                );
                item_id_list.push(item_id);
                break;
            }
            remaining -= item_size;
            item_id_list.push(item_id);
        }

        Ok(Self { item_id_list })
    }
}
