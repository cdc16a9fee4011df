//! NetBIOS Name Service (UDP port 137, RFC 1002).
//!
//! Construction needs the transaction id and flags (4 bytes); the section
//! counts are read when present. The layer claims every remaining byte and
//! never has a successor.

pub mod layer;
pub mod layout;
pub mod reader;

pub use layer::{NbnsLayer, construct, is_data_valid, is_nbns_port};
