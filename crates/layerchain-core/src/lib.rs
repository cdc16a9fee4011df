//! LayerChain core library: layered decomposition of captured packets.
//!
//! A capture buffer is interpreted as a singly linked chain of protocol
//! layers. Each layer holds a bounded [`BufferView`] into the shared buffer
//! (no copies), validates its minimum header at construction, and builds its
//! own successor from the bytes after its header. The [`Dispatcher`] picks
//! the first layer from a [`ProtocolTag`] and drives the descent until a
//! terminal layer or the end of the buffer.
//!
//! Invariants:
//! - A view never extends past its buffer; every field read is bounds-checked.
//! - A layer is never constructed over fewer bytes than its minimum header.
//! - Each layer owns at most one successor; the chain is acyclic and its
//!   depth is bounded by the buffer length and [`DispatcherConfig`].
//! - Failures while growing a chain keep the layers already built and are
//!   reported in [`Chain::stop`], never silently dropped.
//!
//! Parsing is synchronous and performs no I/O. Diagnostic events are emitted
//! through `tracing`; installing a subscriber is up to the caller.
//!
//! Version française (résumé):
//! La crate découpe un tampon capturé en une chaîne de couches protocolaires
//! qui partagent le même tampon via des vues bornées. Le `Dispatcher` choisit
//! la première couche selon l'identifiant de protocole, puis chaque couche
//! construit la suivante. Les erreurs (hors limites, en-tête tronqué,
//! protocole inconnu) sont explicites et conservent la chaîne partielle.
//!
//! # Examples
//! ```
//! use layerchain_core::{Dispatcher, PacketContext, ProtocolTag};
//!
//! // EtherCAT header declaring 5 data bytes, followed by 3 bytes of padding.
//! let frame = [0x05, 0x10, 1, 2, 3, 4, 5, 0, 0, 0];
//! let chain = Dispatcher::default()
//!     .build(&frame, ProtocolTag::EtherType(0x88a4), PacketContext::default())?;
//! for layer in chain.layers() {
//!     println!("{}", layer.describe());
//! }
//! assert_eq!(chain.consumed(), frame.len());
//! # Ok::<(), layerchain_core::DispatchError>(())
//! ```

mod dispatch;
mod error;
mod frame;
mod layer;
pub mod protocols;
mod report;
mod view;

pub use dispatch::{Chain, ChainStop, Dispatcher, DispatcherConfig, PacketContext, ProtocolTag};
pub use error::{DispatchError, FrameError, LayerError, ViewError};
pub use frame::{FrameDecode, decode_ethernet_frame};
pub use layer::{
    BoxedLayer, Layer, LayerConstructor, LayerLink, Layers, OsiLayer, Predecessor, Protocol,
};
pub use protocols::ethercat::EtherCatLayer;
pub use protocols::nbns::NbnsLayer;
pub use protocols::trailer::TrailerLayer;
pub use report::{ChainSummary, LayerSummary};
pub use view::BufferView;
