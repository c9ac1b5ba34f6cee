use wrapping_arithmetic::wrappit;
use tracing::{debug, trace};
use super::{fill_bytes_via_u64, gather_bits, word_mask, Error, Lcg, RngCore, SeedSeq, SeedSequence, SeedableRng, Variant, U128};

// Subtract-with-carry generator of Marsaglia, G. and Zaman, A.,
// A New Class of Random Number Generators, The Annals of Applied Probability 1 (3) (1991).
//
// Each output is x[n] = x[n - s] - x[n - r] - carry (mod 2**w), with the carry set
// whenever the subtraction borrows. The transition only has an inverse, and the
// sequence is only strictly periodic, outside a small region of states that seeding
// can land in. Variant::Corrected leaves that region during construction by stepping
// r times forward and then r times backward.

/// Subtract-with-carry engine with word size `W` bits, short lag `S` and long lag `R`.
/// Requires 1 <= S < R and 1 <= W <= 64. Other parameters fail to compile:
///
/// ```compile_fail
/// use rand_stdfix::{SubtractWithCarry, Variant};
/// let _ = SubtractWithCarry::<16, 4, 4>::new(1, Variant::Corrected);
/// ```
///
/// ```compile_fail
/// use rand_stdfix::{SubtractWithCarry, Variant};
/// let _ = SubtractWithCarry::<65, 2, 4>::from_seed_seq(&mut [1u32; 12], Variant::Corrected);
/// ```
///
/// ```
/// use rand_stdfix::{SubtractWithCarry, Variant};
/// let _ = SubtractWithCarry::<16, 3, 4>::new(1, Variant::Corrected);
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct SubtractWithCarry<const W: u32, const S: usize, const R: usize> {
    /// Lag window, a circular buffer.
    x: [u64; R],
    /// Slot written next; it holds the value from R steps ago.
    i: usize,
    /// Borrow of the last step, 0 or 1.
    carry: u64,
}

/// Base engine of RANLUX-24.
pub type Ranlux24Base = SubtractWithCarry<24, 10, 24>;

/// Base engine of RANLUX-48.
pub type Ranlux48Base = SubtractWithCarry<48, 5, 12>;

// As recommended, this Debug implementation does not expose internal state.
impl<const W: u32, const S: usize, const R: usize> core::fmt::Debug for SubtractWithCarry<W, S, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "SubtractWithCarry<{}, {}, {}> {{}}", W, S, R)
    }
}

impl<const W: u32, const S: usize, const R: usize> SubtractWithCarry<W, S, R> {
    pub const WORD_SIZE: u32 = W;
    pub const SHORT_LAG: usize = S;
    pub const LONG_LAG: usize = R;
    /// Replaces a zero integer seed.
    pub const DEFAULT_SEED: u32 = 19780503;

    const PARAMETERS_OK: () = assert!(S >= 1 && S < R && W >= 1 && W <= 64, "subtract-with-carry requires 1 <= S < R and 1 <= W <= 64");
    const MASK: u64 = word_mask(W);
    /// Seeding words packed into each lag slot.
    const WORDS_PER_SLOT: usize = W as usize / 32 + 1;

    /// Creates an engine from an integer seed, expanded through `Lcg`.
    /// Seed 0 selects DEFAULT_SEED. Only the low 32 bits of the seed are used.
    pub fn new(seed: u64, variant: Variant) -> Self {
        let seed = if seed == 0 {
            debug!(default_seed = Self::DEFAULT_SEED, "zero seed replaced by default seed");
            Self::DEFAULT_SEED
        } else {
            seed as u32
        };
        Self::init(&mut Lcg::new(seed), variant)
    }

    /// Creates an engine from `LONG_LAG * (WORD_SIZE / 32 + 1)` words of the sequence.
    pub fn from_seed_seq<Q: SeedSequence + ?Sized>(seq: &mut Q, variant: Variant) -> Self {
        trace!(words = R * Self::WORDS_PER_SLOT, "seeding subtract-with-carry engine from seed sequence");
        Self::init(seq, variant)
    }

    fn init<Q: SeedSequence + ?Sized>(seq: &mut Q, variant: Variant) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::PARAMETERS_OK;

        // At most 3 words per slot since W <= 64.
        let mut buffer = [[0u32; 3]; R];
        let words = &mut buffer.as_flattened_mut()[.. R * Self::WORDS_PER_SLOT];
        seq.generate(words);

        let mut x = [0u64; R];
        for (slot, chunk) in x.iter_mut().zip(words.chunks_exact(Self::WORDS_PER_SLOT)) {
            let mut value: u64 = 0;
            for (k, &word) in chunk.iter().enumerate() {
                // Bits at 64 and above vanish modulo 2**W.
                if k < 2 {
                    value = value.wrapping_add((word as u64) << (32 * k));
                }
            }
            *slot = value & Self::MASK;
        }

        let carry = (x[R - 1] == 0) as u64;
        let mut engine = SubtractWithCarry { x, i: 0, carry };

        if variant == Variant::Corrected {
            trace!(steps = R, "subtract-with-carry warm-up");
            for _ in 0 .. R {
                engine.next();
            }
            for _ in 0 .. R {
                engine.prev();
            }
        }
        engine
    }

    /// Index of the slot S steps behind slot i.
    #[wrappit] #[inline]
    fn short_index(i: usize) -> usize {
        if i < S { i + R - S } else { i - S }
    }

    /// Generates the next number, in [min(), max()].
    #[wrappit] #[inline]
    pub fn next(&mut self) -> u64 {
        let i = self.i;
        let short = Self::short_index(i);
        let a = self.x[short];
        let b = self.x[i];
        // Borrow iff a < b + carry, compared without forming the sum.
        let borrow = a < b || (a == b && self.carry == 1);
        self.x[i] = (a - b - self.carry) & Self::MASK;
        self.carry = borrow as u64;
        self.i = if i == R - 1 { 0 } else { i + 1 };
        self.x[i]
    }

    /// Undoes the last call to next() and returns the number it generated.
    /// The carry is recovered by walking back through the window, which cannot
    /// resolve it for some degenerate low-entropy windows, such as constant ones.
    #[wrappit]
    fn prev(&mut self) -> u64 {
        self.i = if self.i == 0 { R - 1 } else { self.i - 1 };
        let i = self.i;
        let short = Self::short_index(i);
        let result = self.x[i];
        // The undone step subtracted t = old x[i] + old carry, 0 <= t <= 2**W,
        // and x[short] - result is t modulo 2**W.
        let carry = if self.x[short] == result {
            // t is 0 or 2**W; the current carry tells which.
            self.carry
        } else {
            self.infer_carry(i)
        };
        self.x[i] = (self.x[short] - result - carry) & Self::MASK;
        self.carry = carry;
        result
    }

    /// Recovers the carry that preceded the write at slot i from the first nonzero
    /// forward difference found walking back through the window.
    #[wrappit]
    fn infer_carry(&self, i: usize) -> u64 {
        let mut k = i;
        loop {
            k = if k == 0 { R - 1 } else { k - 1 };
            let short = Self::short_index(k);
            let difference = (self.x[short] - self.x[k]) & Self::MASK;
            if difference != 0 || k == i {
                return (self.x[short] < difference) as u64;
            }
        }
    }

    /// Advances the state by count steps.
    pub fn discard(&mut self, count: u64) {
        for _ in 0 .. count {
            self.next();
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
        // Building from the top bit avoids shifting by W, which overflows at W = 64.
        let top = 1u64 << (W - 1);
        top | (top - 1)
    }

    /// Maximal period (2**W)**R - (2**W)**S, or None if it does not fit in 128 bits.
    /// Any cycle of a corrected engine has a length that divides it.
    pub fn period() -> Option<U128> {
        let long_bits = W as usize * R;
        let short_bits = W as usize * S;
        if long_bits >= 128 {
            None
        } else {
            Some((U128::ONE << long_bits as u32) - (U128::ONE << short_bits as u32))
        }
    }
}

impl<const W: u32, const S: usize, const R: usize> Default for SubtractWithCarry<W, S, R> {
    /// Corrected engine with the default seed.
    fn default() -> Self {
        Self::new(0, Variant::Corrected)
    }
}

impl<const W: u32, const S: usize, const R: usize> RngCore for SubtractWithCarry<W, S, R> {
    fn next_u32(&mut self) -> u32 {
        gather_bits(|| self.next(), W, 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        gather_bits(|| self.next(), W, 64)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_bytes_via_u64(|| self.next_u64(), dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl<const W: u32, const S: usize, const R: usize> SeedableRng for SubtractWithCarry<W, S, R> {
    type Seed = [u8; 32];

    /// Creates a corrected engine by expanding the seed bytes through SeedSeq.
    fn from_seed(seed: Self::Seed) -> Self {
        let mut entropy = [0u32; 8];
        for (word, bytes) in entropy.iter_mut().zip(seed.chunks_exact(4)) {
            // Always use Little-Endian.
            *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Self::from_seed_seq(&mut SeedSeq::new(&entropy), Variant::Corrected)
    }

    /// Creates a corrected engine from an integer seed, see new().
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state, Variant::Corrected)
    }
}

#[cfg(test)] mod tests {
    use super::*;

    type Demo = SubtractWithCarry<16, 2, 4>;

    /// Cycle length that every corrected Demo engine returns to its start within.
    const DEMO_CYCLE: u64 = 65280;

    #[test] pub fn matches_standard_library_outputs() {
        // The 10000th outputs of default-seeded ranlux24_base and ranlux48_base.
        for variant in [Variant::Literal, Variant::Corrected] {
            let mut rng = Ranlux24Base::new(0, variant);
            rng.discard(9999);
            assert_eq!(rng.next(), 7937952);
            let mut rng = Ranlux48Base::new(0, variant);
            rng.discard(9999);
            assert_eq!(rng.next(), 61839128582725);
        }
        let mut rng = Ranlux24Base::default();
        assert_eq!([rng.next(), rng.next(), rng.next()], [15039276, 16323925, 14283486]);
        let mut rng = Ranlux48Base::default();
        assert_eq!([rng.next(), rng.next(), rng.next()], [23459059301164, 28639057539807, 276846226770426]);
    }

    #[test] pub fn corrected_engine_is_strictly_periodic() {
        let rng1 = Demo::new(0, Variant::Corrected);
        let mut rng2 = Demo::new(0, Variant::Corrected);
        rng2.discard(DEMO_CYCLE);
        assert_eq!(rng1, rng2);

        // From the default seed the cycle closes after 12 steps.
        let origin = Demo::default();
        let mut rng = origin.clone();
        for n in 1 ..= 12 {
            rng.next();
            assert_eq!(rng == origin, n == 12);
        }
    }

    #[test] pub fn literal_engine_reaches_the_cycle_late() {
        let mut rng1 = Demo::new(0, Variant::Literal);
        let mut rng2 = Demo::new(0, Variant::Literal);
        rng2.discard(DEMO_CYCLE);
        // Different state, yet the same next number...
        assert_ne!(rng1, rng2);
        assert_eq!(rng1.next(), 54994);
        assert_eq!(rng2.next(), 54994);
        // ...after which the states agree.
        assert_eq!(rng1, rng2);
    }

    #[test] pub fn run_tests() {

        let mut r: u64 = 0;
        let mut rnd = || -> u64 { r = r.wrapping_mul(0xd1342543de82ef95).wrapping_add(0xffff); r };

        for _ in 0 .. 1<<6 {
            let seed = rnd() & 0xffffff;
            let mut rng24 = Ranlux24Base::new(seed, Variant::Corrected);
            let mut rng48 = Ranlux48Base::new(seed, Variant::Corrected);
            let mut demo = Demo::new(seed, Variant::Corrected);
            let n = rnd() & 0xff;
            rng24.discard(n);
            rng48.discard(n);
            demo.discard(n);

            for _ in 0 .. 0x40 {
                // next() then prev() and prev() then next() are both identities.
                let before = rng24.clone();
                let x = rng24.next();
                assert!(x <= Ranlux24Base::max());
                assert_eq!(rng24.prev(), x);
                assert_eq!(rng24, before);
                let y = rng24.prev();
                assert_eq!(rng24.next(), y);
                assert_eq!(rng24, before);
                rng24.next();

                let before = rng48.clone();
                let x = rng48.next();
                assert!(x <= Ranlux48Base::max());
                assert_eq!(rng48.prev(), x);
                assert_eq!(rng48, before);
                let y = rng48.prev();
                assert_eq!(rng48.next(), y);
                assert_eq!(rng48, before);
                rng48.next();

                let before = demo.clone();
                let x = demo.next();
                assert_eq!(demo.prev(), x);
                assert_eq!(demo, before);
                demo.next();
            }

            // Stepping back retraces the outputs in reverse.
            let origin = rng24.clone();
            let mut forward = [0u64; 0x30];
            for x in forward.iter_mut() { *x = rng24.next(); }
            for &x in forward.iter().rev() { assert_eq!(rng24.prev(), x); }
            assert_eq!(rng24, origin);
        }
    }

    #[test] pub fn edge_word_sizes_invert() {
        fn check<const W: u32, const S: usize, const R: usize>(seed: u64) {
            let mut rng = SubtractWithCarry::<W, S, R>::new(seed, Variant::Corrected);
            for _ in 0 .. 2000 {
                let before = rng.clone();
                let x = rng.next();
                assert!(x <= SubtractWithCarry::<W, S, R>::max());
                assert_eq!(rng.prev(), x);
                assert_eq!(rng, before);
                rng.next();
            }
        }
        for seed in [0, 7, 123456] {
            check::<64, 5, 12>(seed);
            check::<32, 3, 7>(seed);
            check::<1, 1, 3>(seed);
            check::<8, 1, 2>(seed);
        }
        let mut rng = SubtractWithCarry::<64, 5, 12>::default();
        assert_eq!([rng.next(), rng.next()], [275858804168706081, 18277433121169263456]);
    }

    #[test] pub fn degenerate_windows_lose_the_carry() {
        // Steps survive the next/prev round trip until the given one.
        fn first_lost<const W: u32, const S: usize, const R: usize>(mut words: [u32; 24]) -> usize {
            let mut rng = SubtractWithCarry::<W, S, R>::from_seed_seq(&mut words, Variant::Corrected);
            for step in 0 .. 1000 {
                let before = rng.clone();
                let x = rng.next();
                let mut back = rng.clone();
                if back.prev() != x || back != before {
                    return step;
                }
            }
            1000
        }
        let bits = [0, 0, 0, 1, 0, 1, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 1, 1];
        assert_eq!(first_lost::<24, 10, 24>([0; 24]), 24);
        assert_eq!(first_lost::<24, 10, 24>([u32::MAX; 24]), 24);
        assert_eq!(first_lost::<24, 10, 24>(bits), 38);
        assert_eq!(first_lost::<48, 5, 12>(bits), 19);
        // Ordinary seeds keep it far longer.
        assert_eq!(first_lost::<24, 10, 24>([0x9e3779b9, 0x7f4a7c15, 0x85ebca6b, 0xc2b2ae35, 0x27d4eb2f, 0x165667b1, 0xd3a2646c, 0xfd7046c5, 0xb55a4f09, 0x94d049bb, 0xbf58476d, 0x1ce4e5b9, 0x2545f491, 0x4f6cdd1d, 0x6c8e9cf5, 0x9e3779b1, 0x85ebca77, 0xc2b2ae3d, 0x27d4eb4f, 0x165667c5, 0x61c88647, 0x3c6ef372, 0xa54ff53a, 0x510e527f]), 1000);
    }

    #[test] pub fn seed_sequence_construction() {
        let mut words = [1u32, 2, 3, 4];
        let rng = Demo::from_seed_seq(&mut words, Variant::Literal);
        assert_eq!((rng.x, rng.i, rng.carry), ([1, 2, 3, 4], 0, 0));
        let mut rng = Demo::from_seed_seq(&mut words, Variant::Corrected);
        assert_eq!((rng.x, rng.i, rng.carry), ([0, 2, 3, 4], 0, 1));
        assert_eq!([rng.next(), rng.next(), rng.next(), rng.next()], [2, 2, 65535, 65533]);

        // An all-zero window starts with the carry set.
        let rng = Demo::from_seed_seq(&mut [0u32; 4], Variant::Literal);
        assert_eq!((rng.x, rng.i, rng.carry), ([0, 0, 0, 0], 0, 1));
        let rng = Demo::from_seed_seq(&mut [0u32; 4], Variant::Corrected);
        assert_eq!((rng.x, rng.i, rng.carry), ([1, 0, 0, 0], 0, 0));

        let entropy = [1, 2, 3, 4, 5];
        for variant in [Variant::Literal, Variant::Corrected] {
            let mut rng = Ranlux24Base::from_seed_seq(&mut SeedSeq::new(&entropy), variant);
            assert_eq!([rng.next(), rng.next(), rng.next()], [1840324, 14804851, 5401173]);
        }

        // Integer seeding is seeding through the LCG.
        let mut lcg = Lcg::new(Ranlux48Base::DEFAULT_SEED);
        assert_eq!(Ranlux48Base::from_seed_seq(&mut lcg, Variant::Corrected), Ranlux48Base::new(0, Variant::Corrected));
        assert_eq!(Ranlux48Base::new(0, Variant::Literal), Ranlux48Base::new(19780503, Variant::Literal));
    }

    #[test] pub fn bounds_and_period() {
        assert_eq!(Ranlux24Base::min(), 0);
        assert_eq!(Ranlux24Base::max(), 0xffffff);
        assert_eq!(Ranlux48Base::max(), 0xffffffffffff);
        assert_eq!(SubtractWithCarry::<64, 5, 12>::max(), u64::MAX);
        assert_eq!(SubtractWithCarry::<1, 1, 3>::max(), 1);

        let period = Demo::period().unwrap();
        assert_eq!(u128::from(period), (1u128 << 64) - (1u128 << 32));
        assert_eq!(period % U128::from_u64(DEMO_CYCLE), U128::ZERO);
        assert_eq!(Ranlux24Base::period(), None);
        assert_eq!(Ranlux48Base::period(), None);
    }

    #[test] pub fn rng_core_concatenates_outputs() {
        let mut rng1 = Ranlux24Base::default();
        let mut rng2 = Ranlux24Base::default();
        let (a, b, c) = (rng2.next(), rng2.next(), rng2.next());
        assert_eq!(rng1.next_u64(), a | (b << 24) | (c << 48));
        assert_eq!(rng1.next_u32() as u64, (rng2.next() | (rng2.next() << 24)) & 0xffffffff);

        let mut rng1 = Ranlux48Base::seed_from_u64(99);
        let mut rng2 = Ranlux48Base::new(99, Variant::Corrected);
        let mut buffer = [0u8; 13];
        rng1.fill_bytes(&mut buffer);
        let x = rng2.next_u64().to_le_bytes();
        let y = rng2.next_u64().to_le_bytes();
        assert_eq!(buffer[.. 8], x);
        assert_eq!(buffer[8 ..], y[.. 5]);

        let a = Ranlux24Base::from_seed([7; 32]);
        let b = Ranlux24Base::from_seed([7; 32]);
        let c = Ranlux24Base::from_seed([8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
