#![no_std]

pub mod error;
pub mod lcg;
pub mod philox;
pub mod seed;
pub mod swc;
pub mod wide;

pub use error::*;
pub use lcg::Lcg;
pub use philox::*;
pub use seed::*;
pub use swc::*;
pub use wide::U128;
pub use rand_core::*;

#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

/// Selects between the two transition functions each engine family carries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Variant {
    /// Follows the commonly cited description word for word.
    Literal,
    /// Restores strict periodicity (subtract-with-carry) and
    /// the published test vectors (Philox).
    #[default]
    Corrected,
}

// Philox round constants from Salmon, J. K., Moraes, M. A., Dror, R. O. and Shaw, D. E.,
// Parallel Random Numbers: As Easy as 1, 2, 3 (2011).
// Each array is ordered (multiplier, key increment) per key word.

pub const PHILOX_2X32_CONSTANTS: [u64; 2] = [0xd256d193, 0x9e3779b9];
pub const PHILOX_4X32_CONSTANTS: [u64; 4] = [0xd2511f53, 0x9e3779b9, 0xcd9e8d57, 0xbb67ae85];
pub const PHILOX_2X64_CONSTANTS: [u64; 2] = [0xd2b74407b1ce6e93, 0x9e3779b97f4a7c15];
pub const PHILOX_4X64_CONSTANTS: [u64; 4] = [0xd2e7470ee14c6c93, 0x9e3779b97f4a7c15, 0xca5a826395121157, 0xbb67ae8584caa73b];

/// Mask of the low `bits` bits, 1 <= bits <= 64.
#[inline]
pub(crate) const fn word_mask(bits: u32) -> u64 {
    u64::MAX >> (64 - bits)
}

/// Concatenates outputs of a `word_bits`-bit generator, lowest bits first,
/// until `bits` bits are filled.
#[inline]
pub(crate) fn gather_bits<F: FnMut() -> u64>(mut next: F, word_bits: u32, bits: u32) -> u64 {
    let mut x = 0;
    let mut filled = 0;
    while filled < bits {
        x |= next() << filled;
        filled += word_bits;
    }
    x & word_mask(bits)
}

/// Fills `dest` with little-endian 64-bit words taken from `next`.
pub(crate) fn fill_bytes_via_u64<F: FnMut() -> u64>(mut next: F, dest: &mut [u8]) {
    let bytes = dest.len();
    let mut i = 0;
    while i < bytes {
        let x = next();
        let j = bytes.min(i + 8);
        // Always use Little-Endian.
        dest[i .. j].copy_from_slice(&x.to_le_bytes()[0 .. (j - i)]);
        i = j;
    }
}
