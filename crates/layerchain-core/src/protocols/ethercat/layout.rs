/// EtherType of EtherCAT frames carried directly over Ethernet.
pub const ETHERCAT_ETHERTYPE: u16 = 0x88A4;

pub const HEADER_WORD_OFFSET: usize = 0;
pub const HEADER_LEN: usize = 2;

// Header word, little-endian on the wire:
// bits 0..=10 length, bit 11 reserved, bits 12..=15 type.
pub const LENGTH_MASK: u16 = 0x07FF;
pub const RESERVED_MASK: u16 = 0x0800;
pub const TYPE_SHIFT: u16 = 12;

/// Frame type value for EtherCAT commands (DLPDU).
pub const TYPE_COMMANDS: u8 = 0x1;
