//! EtherCAT frame header (EtherType `0x88A4`).
//!
//! The 16-bit header word is little-endian, per the EtherCAT standard. Its
//! low 11 bits give the length of the datagrams after the header; the layer
//! claims header plus datagrams and leaves anything after that (Ethernet
//! padding) to a raw trailer. A declared length longer than the captured
//! bytes ends the chain with a `Malformed` error instead of reading past the
//! buffer.

pub mod layer;
pub mod layout;
pub mod reader;

pub use layer::{EtherCatLayer, construct, is_data_valid, is_ethercat_ethertype};
