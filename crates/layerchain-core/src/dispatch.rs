//! Chain construction.
//!
//! The [`Dispatcher`] maps a root [`ProtocolTag`] to a layer constructor,
//! builds the root over the whole buffer, then calls `parse_next` once per
//! layer walking down the successor links. A failure while growing the
//! chain stops it there; the layers built so far stay valid and the failure
//! is recorded in the returned [`Chain`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{DispatchError, LayerError};
use crate::layer::{BoxedLayer, Layer, LayerConstructor, Layers, Protocol};
use crate::protocols::{ethercat, nbns, trailer};
use crate::report::{ChainSummary, LayerSummary};
use crate::view::BufferView;

/// Identifier used by the surrounding system to select the first layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolTag {
    /// Link-layer protocol identifier.
    EtherType(u16),
    /// Transport-layer port.
    UdpPort(u16),
    /// IP protocol number of a datagram that is not UDP.
    IpProtocol(u8),
}

impl fmt::Display for ProtocolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolTag::EtherType(value) => write!(f, "ethertype 0x{:04x}", value),
            ProtocolTag::UdpPort(port) => write!(f, "udp port {}", port),
            ProtocolTag::IpProtocol(number) => write!(f, "ip protocol {}", number),
        }
    }
}

/// Caller-owned metadata about the packet being decoded. Layers never see it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketContext {
    /// Position of the packet in its capture (0-based).
    pub index: u64,
    /// Capture timestamp in seconds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of layers in one chain.
    pub max_depth: usize,
}

impl DispatcherConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Why a chain stopped before its last layer declared itself terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStop {
    /// `parse_next` on the `after` layer failed.
    Failed { after: Protocol, error: LayerError },
    /// The chain reached the configured maximum depth.
    DepthLimit { depth: usize },
}

impl fmt::Display for ChainStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStop::Failed { after, error } => write!(f, "stopped after {}: {}", after, error),
            ChainStop::DepthLimit { depth } => write!(f, "stopped at depth limit {}", depth),
        }
    }
}

/// Registered-constructor map plus the chain driver.
///
/// # Examples
/// ```
/// use layerchain_core::{Dispatcher, PacketContext, Protocol, ProtocolTag};
///
/// let frame = [0x05, 0x10, 1, 2, 3, 4, 5, 0, 0, 0];
/// let chain = Dispatcher::default()
///     .build(&frame, ProtocolTag::EtherType(0x88a4), PacketContext::default())?;
/// let protocols: Vec<_> = chain.layers().map(|l| l.protocol()).collect();
/// assert_eq!(protocols, vec![Protocol::EtherCat, Protocol::PadBytes]);
/// # Ok::<(), layerchain_core::DispatchError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    constructors: HashMap<ProtocolTag, LayerConstructor>,
    config: DispatcherConfig,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_config(DispatcherConfig::default())
    }
}

impl Dispatcher {
    /// An empty dispatcher: every tag is unknown until registered.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            config: DispatcherConfig::default(),
        }
    }

    /// The standard protocol map with a custom configuration.
    pub fn with_config(config: DispatcherConfig) -> Self {
        let mut dispatcher = Self {
            constructors: HashMap::new(),
            config,
        };
        dispatcher.register(
            ProtocolTag::EtherType(ethercat::layout::ETHERCAT_ETHERTYPE),
            ethercat::construct,
        );
        dispatcher.register(
            ProtocolTag::UdpPort(nbns::layout::NBNS_PORT),
            nbns::construct,
        );
        dispatcher
    }

    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Add or replace the constructor for `tag`.
    pub fn register(
        &mut self,
        tag: ProtocolTag,
        constructor: LayerConstructor,
    ) -> Option<LayerConstructor> {
        self.constructors.insert(tag, constructor)
    }

    pub fn supports(&self, tag: ProtocolTag) -> bool {
        self.constructors.contains_key(&tag)
    }

    /// Decompose `buffer` starting with the protocol registered for `tag`.
    ///
    /// Fails without producing any layer when the tag is unknown or the root
    /// layer cannot be constructed.
    pub fn build<'a>(
        &self,
        buffer: &'a [u8],
        tag: ProtocolTag,
        context: PacketContext,
    ) -> Result<Chain<'a>, DispatchError> {
        let constructor = self.constructors.get(&tag).ok_or_else(|| {
            debug!(%tag, index = context.index, "no constructor registered");
            DispatchError::UnknownProtocol {
                tag,
                undecoded: buffer.len(),
            }
        })?;

        let mut root = constructor(BufferView::whole(buffer), None)?;
        debug!(
            protocol = %root.protocol(),
            offset = root.offset(),
            len = root.header_len(),
            index = context.index,
            "root layer attached"
        );
        let stop = self.grow(&mut *root, 1, context);

        Ok(Chain {
            root,
            buffer_len: buffer.len(),
            context,
            stop,
        })
    }

    fn grow<'a>(
        &self,
        layer: &mut (dyn Layer<'a> + 'a),
        depth: usize,
        context: PacketContext,
    ) -> Option<ChainStop> {
        if let Err(error) = layer.parse_next() {
            warn!(
                protocol = %layer.protocol(),
                offset = layer.offset(),
                index = context.index,
                %error,
                "chain stopped"
            );
            return Some(ChainStop::Failed {
                after: layer.protocol(),
                error,
            });
        }
        if depth >= self.config.max_depth {
            // Only a successor that would claim bytes counts as cut off.
            let dropped = layer.link_mut().detach()?;
            if dropped.view().is_empty() {
                return None;
            }
            trace!(depth, index = context.index, "depth limit reached");
            return Some(ChainStop::DepthLimit { depth });
        }
        let protocol = layer.protocol();
        let Some(next) = layer.next_layer_mut() else {
            trace!(%protocol, index = context.index, "terminal layer");
            return None;
        };
        debug!(
            protocol = %next.protocol(),
            offset = next.offset(),
            len = next.header_len(),
            index = context.index,
            "layer attached"
        );
        if next.view().is_empty() {
            trace!(index = context.index, "buffer exhausted");
            return None;
        }
        self.grow(next, depth + 1, context)
    }
}

/// A decoded chain: the owned root layer plus how decoding ended.
#[derive(Debug)]
pub struct Chain<'a> {
    root: BoxedLayer<'a>,
    buffer_len: usize,
    context: PacketContext,
    stop: Option<ChainStop>,
}

impl<'a> Chain<'a> {
    pub fn root(&self) -> &(dyn Layer<'a> + 'a) {
        &*self.root
    }

    pub fn root_mut(&mut self) -> &mut (dyn Layer<'a> + 'a) {
        &mut *self.root
    }

    pub fn into_root(self) -> BoxedLayer<'a> {
        self.root
    }

    pub fn layers(&self) -> Layers<'_, 'a> {
        Layers::new(&*self.root)
    }

    /// Number of layers. Never zero, so there is no `is_empty`.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.layers().count()
    }

    pub fn last(&self) -> &(dyn Layer<'a> + 'a) {
        let mut last: &(dyn Layer<'a> + 'a) = &*self.root;
        while let Some(next) = last.next_layer() {
            last = next;
        }
        last
    }

    pub fn context(&self) -> PacketContext {
        self.context
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn stop(&self) -> Option<&ChainStop> {
        self.stop.as_ref()
    }

    /// Sum of the bytes each layer claims, clamped to what was captured.
    pub fn consumed(&self) -> usize {
        self.layers().map(|layer| layer.claimed_len()).sum()
    }

    /// Bytes no layer claims, or `None` when the chain covers the buffer.
    pub fn undecoded(&self) -> Option<BufferView<'a>> {
        let rest = self.last().remainder();
        if rest.is_empty() { None } else { Some(rest) }
    }

    /// Attach the undecoded bytes as a raw trailer after the last layer.
    ///
    /// Returns `false` when there was nothing to wrap.
    pub fn wrap_undecoded(&mut self) -> bool {
        let Some(rest) = self.undecoded() else {
            return false;
        };
        attach_to_last(&mut *self.root, rest);
        true
    }

    /// Run every layer's derived-field hook, outermost first.
    pub fn recompute_derived_fields(&mut self) {
        recompute(&mut *self.root);
    }

    pub fn summary(&self) -> ChainSummary {
        ChainSummary {
            context: self.context,
            buffer_len: self.buffer_len,
            consumed: self.consumed(),
            undecoded: self.undecoded().map_or(0, |rest| rest.len()),
            layers: self.layers().map(LayerSummary::from_layer).collect(),
            stop: self.stop.as_ref().map(ToString::to_string),
        }
    }
}

fn attach_to_last<'a>(layer: &mut (dyn Layer<'a> + 'a), rest: BufferView<'a>) {
    match layer.next_layer_mut() {
        Some(next) => attach_to_last(next, rest),
        None => {
            let prev = layer.as_predecessor();
            layer
                .link_mut()
                .attach(Box::new(trailer::TrailerLayer::new(rest, Some(prev))));
        }
    }
}

fn recompute<'a>(layer: &mut (dyn Layer<'a> + 'a)) {
    layer.recompute_derived_fields();
    if let Some(next) = layer.next_layer_mut() {
        recompute(next);
    }
}
