//! Constants for the commands used by the logical channel transport

/// Class bytes
pub mod cla {
    /// GlobalPlatform proprietary class
    pub const GP: u8 = 0x80;
}

/// Instruction codes
pub mod ins {
    /// STORE DATA
    pub const STORE_DATA: u8 = 0xE2;
    /// GET RESPONSE
    pub const GET_RESPONSE: u8 = 0xC0;
}

/// STORE DATA P1 values
pub mod store_data {
    /// More segments follow
    pub const P1_MORE_BLOCKS: u8 = 0x11;
    /// Final segment
    pub const P1_LAST_BLOCK: u8 = 0x91;
}
