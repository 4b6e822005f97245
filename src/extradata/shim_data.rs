#[cfg(feature = "serde")]
use serde::Serialize;

/// The ShimDataBlock ([MS-SHLLINK] 2.5.8): the name of a compatibility shim
/// layer applied when the target is activated. The layer name fills the
/// whole remaining block as UTF-16LE.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ShimDataBlock {
    layer_name: String,
}

impl ShimDataBlock {
    pub(crate) fn from_payload(body: &[u8]) -> Self {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|&u| u != 0)
            .collect();
        Self {
            layer_name: String::from_utf16_lossy(&units),
        }
    }

    /// The shim layer name.
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }
}
