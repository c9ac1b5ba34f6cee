use wrapping_arithmetic::wrappit;
use tracing::trace;
use super::{fill_bytes_via_u64, gather_bits, word_mask, Error, ParamError, RngCore, SeedSequence, SeedableRng, Variant, U128};
use super::{PHILOX_2X32_CONSTANTS, PHILOX_2X64_CONSTANTS, PHILOX_4X32_CONSTANTS, PHILOX_4X64_CONSTANTS};

// Philox counter-based generator from Salmon, J. K., Moraes, M. A., Dror, R. O. and Shaw, D. E.,
// Parallel Random Numbers: As Easy as 1, 2, 3 (2011).
//
// Output blocks are R keyed mixing rounds applied to an N-word counter.
// Each round multiplies half of the lanes by round multipliers and folds the
// high halves of the products with the key and the other lanes.
// Variant::Literal feeds the lanes as the commonly cited description reads;
// Variant::Corrected feeds them as the reference algorithm does, and only it
// reproduces the published test vectors.

/// Philox engine with `N` words of `W` bits and `R` rounds.
/// Requires N = 2 or N = 4, R >= 1 and 1 <= W <= 64. Other parameters fail to compile:
///
/// ```compile_fail
/// use rand_stdfix::Philox;
/// let _ = Philox::<32, 3, 10>::with_constants([1, 2, 3], 0);
/// ```
///
/// ```compile_fail
/// use rand_stdfix::Philox;
/// let _ = Philox::<32, 2, 0>::with_constants([1, 2], 0);
/// ```
///
/// ```
/// use rand_stdfix::Philox;
/// assert!(Philox::<32, 2, 1>::with_constants([1, 2], 0).is_ok());
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct Philox<const W: u32, const N: usize, const R: usize> {
    /// Counter X, a little-endian N-word integer.
    counter: [u64; N],
    /// Key K; only the first N / 2 words are used, the rest stay zero.
    key: [u64; 2],
    /// Output block Y of the last generated counter.
    block: [u64; N],
    /// Index j of the last returned word of the block.
    cursor: usize,
    /// Round constants (M0, W0) or (M0, W0, M1, W1).
    constants: [u64; N],
}

/// Philox2x32-10.
pub type Philox2x32 = Philox<32, 2, 10>;
/// Philox4x32-10.
pub type Philox4x32 = Philox<32, 4, 10>;
/// Philox2x64-10.
pub type Philox2x64 = Philox<64, 2, 10>;
/// Philox4x64-10.
pub type Philox4x64 = Philox<64, 4, 10>;

// As recommended, this Debug implementation does not expose internal state.
impl<const W: u32, const N: usize, const R: usize> core::fmt::Debug for Philox<W, N, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Philox<{}, {}, {}> {{}}", W, N, R)
    }
}

/// Returns the (high, low) halves of the 2W-bit product a * b.
#[inline]
fn mulhilo<const W: u32>(a: u64, b: u64) -> (u64, u64) {
    let mask = word_mask(W);
    if W <= 32 {
        // The product fits in 64 bits.
        let ab = a * b;
        (ab >> W, ab & mask)
    } else {
        let ab = U128::widening_mul(a, b);
        ((ab >> W).low(), ab.low() & mask)
    }
}

impl<const W: u32, const N: usize, const R: usize> Philox<W, N, R> {
    pub const WORD_SIZE: u32 = W;
    pub const WORD_COUNT: usize = N;
    pub const ROUND_COUNT: usize = R;
    pub const DEFAULT_SEED: u64 = 20111115;

    const PARAMETERS_OK: () = assert!((N == 2 || N == 4) && R >= 1 && W >= 1 && W <= 64, "Philox requires N = 2 or 4, R >= 1 and 1 <= W <= 64");
    const MASK: u64 = word_mask(W);
    /// Seeding words packed into each key word.
    const WORDS_PER_KEY: usize = (W as usize - 1) / 32 + 1;

    fn with_key(constants: [u64; N], key: [u64; 2]) -> Result<Self, ParamError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::PARAMETERS_OK;

        if let Some(index) = constants.iter().position(|&c| c > Self::MASK) {
            return Err(ParamError::ConstantOutOfRange { index, value: constants[index], word_bits: W });
        }
        Ok(Philox { counter: [0; N], key, block: [0; N], cursor: N - 1, constants })
    }

    /// Creates an engine with the given round constants.
    /// The first key word is the seed masked to W bits; counter and other key words are zero.
    pub fn with_constants(constants: [u64; N], seed: u64) -> Result<Self, ParamError> {
        Self::with_key(constants, [seed & Self::MASK, 0])
    }

    /// Creates an engine with the given round constants, taking the key from
    /// `N / 2 * ((WORD_SIZE - 1) / 32 + 1)` words of the sequence.
    pub fn from_seed_seq_with_constants<Q: SeedSequence + ?Sized>(constants: [u64; N], seq: &mut Q) -> Result<Self, ParamError> {
        let key_words = N / 2;
        trace!(words = key_words * Self::WORDS_PER_KEY, "seeding Philox engine from seed sequence");

        let mut words = [0u32; 4];
        let words = &mut words[.. key_words * Self::WORDS_PER_KEY];
        seq.generate(words);

        let mut key = [0u64; 2];
        for (k, chunk) in key.iter_mut().zip(words.chunks_exact(Self::WORDS_PER_KEY)) {
            let mut value: u64 = 0;
            for (p, &word) in chunk.iter().enumerate() {
                value = value.wrapping_add((word as u64) << (32 * p));
            }
            *k = value & Self::MASK;
        }
        Self::with_key(constants, key)
    }

    /// Generates the next number with the corrected round function, in [min(), max()].
    #[inline]
    pub fn next(&mut self) -> u64 {
        self.next_with(Variant::Corrected)
    }

    /// Generates the next number, using `variant` if a new block is needed.
    #[inline]
    pub fn next_with(&mut self, variant: Variant) -> u64 {
        self.cursor += 1;
        if self.cursor == N {
            self.block = self.generate(variant);
            self.increase_counter();
            self.cursor = 0;
        }
        self.block[self.cursor]
    }

    /// Concatenates outputs of next_with(variant), lowest bits first, into 64 bits.
    pub fn next_u64_with(&mut self, variant: Variant) -> u64 {
        gather_bits(|| self.next_with(variant), W, 64)
    }

    /// Advances by count outputs with the corrected round function.
    pub fn discard(&mut self, count: u64) {
        self.discard_with(Variant::Corrected, count);
    }

    /// Advances by count outputs using `variant` for every block generated on the way.
    pub fn discard_with(&mut self, variant: Variant, count: u64) {
        for _ in 0 .. count {
            self.next_with(variant);
        }
    }

    /// Smallest output.
    #[inline]
    pub const fn min() -> u64 {
        0
    }

    /// Largest output, 2**W - 1.
    #[inline]
    pub const fn max() -> u64 {
        word_mask(W)
    }

    /// Current counter, least significant word first.
    #[inline]
    pub fn counter(&self) -> &[u64; N] {
        &self.counter
    }

    /// Key words in use.
    #[inline]
    pub fn key(&self) -> &[u64] {
        &self.key[.. N / 2]
    }

    /// Adds 1 to the counter modulo 2**(W * N).
    fn increase_counter(&mut self) {
        for word in self.counter.iter_mut() {
            *word = word.wrapping_add(1) & Self::MASK;
            if *word != 0 {
                break;
            }
        }
    }

    /// Computes the block of the current counter and key.
    #[wrappit]
    fn generate(&self, variant: Variant) -> [u64; N] {
        let c = &self.constants;
        let mut s = [0u64; 4];
        s[.. N].copy_from_slice(&self.counter);
        let mut k = self.key;

        for _ in 0 .. R {
            s = if N == 2 {
                round2::<W>(variant, s, k[0], c[0])
            } else {
                round4::<W>(variant, s, k, c[0], c[2])
            };
            k[0] = (k[0] + c[1]) & Self::MASK;
            if N == 4 {
                k[1] = (k[1] + c[3]) & Self::MASK;
            }
        }

        let mut block = [0u64; N];
        block.copy_from_slice(&s[.. N]);
        block
    }
}

/// One round over two lanes; s[2] and s[3] are unused.
#[inline]
fn round2<const W: u32>(variant: Variant, s: [u64; 4], k0: u64, m0: u64) -> [u64; 4] {
    match variant {
        Variant::Literal => {
            let (hi, lo) = mulhilo::<W>(s[1], m0);
            [lo, hi ^ k0 ^ lo, 0, 0]
        }
        Variant::Corrected => {
            let (hi, lo) = mulhilo::<W>(s[0], m0);
            [hi ^ k0 ^ s[1], lo, 0, 0]
        }
    }
}

/// One round over four lanes.
#[inline]
fn round4<const W: u32>(variant: Variant, s: [u64; 4], k: [u64; 2], m0: u64, m1: u64) -> [u64; 4] {
    match variant {
        Variant::Literal => {
            let v = [s[0], s[3], s[2], s[1]];
            let (hi1, lo1) = mulhilo::<W>(v[1], m0);
            let (hi3, lo3) = mulhilo::<W>(v[3], m1);
            [lo1, hi1 ^ k[0] ^ v[0], lo3, hi3 ^ k[1] ^ v[2]]
        }
        Variant::Corrected => {
            let v = [s[2], s[1], s[0], s[3]];
            // M1 multiplies the lane that ends up first, M0 the third.
            let (hi0, lo0) = mulhilo::<W>(v[0], m1);
            let (hi2, lo2) = mulhilo::<W>(v[2], m0);
            [hi0 ^ k[0] ^ v[1], lo0, hi2 ^ k[1] ^ v[3], lo2]
        }
    }
}

impl<const W: u32, const N: usize, const R: usize> RngCore for Philox<W, N, R> {
    fn next_u32(&mut self) -> u32 {
        gather_bits(|| self.next(), W, 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_with(Variant::Corrected)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_bytes_via_u64(|| self.next_u64(), dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Constructors for an engine with standard constants.
macro_rules! philox_preset {
    ($name:ident, $constants:ident) => {
        impl $name {
            /// Creates an engine keyed by the seed.
            pub fn new(seed: u64) -> Self {
                match Self::with_constants($constants, seed) {
                    Ok(engine) => engine,
                    Err(_) => unreachable!("standard constants fit the word size"),
                }
            }

            /// Creates an engine keyed from the seed sequence.
            pub fn from_seed_seq<Q: SeedSequence + ?Sized>(seq: &mut Q) -> Self {
                match Self::from_seed_seq_with_constants($constants, seq) {
                    Ok(engine) => engine,
                    Err(_) => unreachable!("standard constants fit the word size"),
                }
            }
        }

        impl Default for $name {
            /// Engine keyed by DEFAULT_SEED.
            fn default() -> Self {
                Self::new(Self::DEFAULT_SEED)
            }
        }

        impl SeedableRng for $name {
            type Seed = [u8; 16];

            /// Uses the seed bytes as little-endian key words.
            fn from_seed(seed: Self::Seed) -> Self {
                let mut words = [0u32; 4];
                for (word, bytes) in words.iter_mut().zip(seed.chunks_exact(4)) {
                    *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }
                Self::from_seed_seq(&mut words)
            }

            /// Creates an engine keyed by the seed, see new().
            fn seed_from_u64(state: u64) -> Self {
                Self::new(state)
            }
        }
    };
}

philox_preset!(Philox2x32, PHILOX_2X32_CONSTANTS);
philox_preset!(Philox4x32, PHILOX_4X32_CONSTANTS);
philox_preset!(Philox2x64, PHILOX_2X64_CONSTANTS);
philox_preset!(Philox4x64, PHILOX_4X64_CONSTANTS);
