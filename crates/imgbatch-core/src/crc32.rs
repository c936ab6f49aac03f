//! CRC-32 checksum (IEEE 802.3, reflected polynomial `0xEDB88320`).
//!
//! This is the checksum stored in every ZIP local header and central
//! directory record. The 256-entry lookup table is built at compile time
//! with the classic bit-by-bit construction.

/// Reflected form of the IEEE polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table indexed by the low byte of `crc ^ input`.
pub static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Incremental CRC-32 state.
///
/// Feed bytes with [`Crc32::update`] and read the complemented result with
/// [`Crc32::finalize`]. Splitting the input across several `update` calls
/// yields the same value as a single call over the concatenation.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: !0 }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut c = self.state;
        for &b in bytes {
            c = (c >> 8) ^ TABLE[((c ^ b as u32) & 0xFF) as usize];
        }
        self.state = c;
    }

    pub fn finalize(self) -> u32 {
        !self.state
    }
}

/// Compute the CRC-32 of a byte slice in one call.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(bytes);
    hasher.finalize()
}
