//! Serializable summaries of a decoded chain.
//!
//! Descriptions are diagnostic text only; the summary is not a wire format
//! and cannot be turned back into bytes.

use serde::{Deserialize, Serialize};

use crate::dispatch::PacketContext;
use crate::layer::{Layer, OsiLayer, Protocol};

/// One chain, outermost layer first.
///
/// # Examples
/// ```
/// use layerchain_core::{Dispatcher, PacketContext, ProtocolTag};
///
/// let message = [0x80, 0x94, 0x01, 0x10];
/// let chain = Dispatcher::default()
///     .build(&message, ProtocolTag::UdpPort(137), PacketContext::default())?;
/// let summary = chain.summary();
/// assert_eq!(summary.layers.len(), 1);
/// assert_eq!(summary.consumed, 4);
/// # Ok::<(), layerchain_core::DispatchError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    /// Packet context handed to the dispatcher.
    pub context: PacketContext,
    /// Length of the decoded buffer in bytes.
    pub buffer_len: usize,
    /// Bytes claimed by the layers, clamped to the buffer.
    pub consumed: usize,
    /// Bytes after the last layer that nothing claims.
    pub undecoded: usize,
    /// Layers in chain order.
    pub layers: Vec<LayerSummary>,
    /// Why the chain stopped early, when it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<String>,
}

impl ChainSummary {
    /// True when every byte was claimed and no layer failed.
    pub fn is_complete(&self) -> bool {
        self.stop.is_none() && self.undecoded == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub protocol: Protocol,
    pub osi_layer: OsiLayer,
    /// Absolute offset of the layer's first byte.
    pub offset: usize,
    /// Declared header length; may exceed the captured bytes.
    pub header_len: usize,
    pub description: String,
}

impl LayerSummary {
    pub fn from_layer<'a>(layer: &(dyn Layer<'a> + 'a)) -> Self {
        Self {
            protocol: layer.protocol(),
            osi_layer: layer.osi_layer(),
            offset: layer.offset(),
            header_len: layer.header_len(),
            description: layer.describe(),
        }
    }
}
