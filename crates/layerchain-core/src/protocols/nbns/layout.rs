/// UDP port of the NetBIOS Name Service.
pub const NBNS_PORT: u16 = 137;

pub const TRANSACTION_ID_OFFSET: usize = 0;
pub const FLAGS_OFFSET: usize = 2;
pub const QDCOUNT_OFFSET: usize = 4;
pub const ANCOUNT_OFFSET: usize = 6;
pub const NSCOUNT_OFFSET: usize = 8;
pub const ARCOUNT_OFFSET: usize = 10;

/// Bytes required to construct the layer (transaction id + flags).
pub const MIN_HEADER_LEN: usize = 4;
/// Full RFC 1002 header including the four section counts.
pub const FULL_HEADER_LEN: usize = 12;

// Flags word (RFC 1002 4.2.1.1): R | OPCODE(4) | NM_FLAGS(7) | RCODE(4).
pub const RESPONSE_MASK: u16 = 0x8000;
pub const OPCODE_SHIFT: u16 = 11;
pub const OPCODE_MASK: u16 = 0x0F;
pub const NM_FLAGS_SHIFT: u16 = 4;
pub const NM_FLAGS_MASK: u16 = 0x7F;
pub const RCODE_MASK: u16 = 0x0F;
