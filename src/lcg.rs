use crate::seed::SeedSequence;

// This module contains the multiplicative LCG (linear congruential generator)
// that expands integer seeds for the subtract-with-carry engines.
// Parameters from L'Ecuyer, P., Efficient and Portable Combined Random Number Generators,
// Communications of the ACM 31 (1988).

/// LCG iteration is state <- state * MULTIPLIER mod MODULUS.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub const MULTIPLIER: u32 = 40014;
    pub const INCREMENT: u32 = 0;
    pub const MODULUS: u32 = 2147483563;

    /// Creates a new LCG. The seed is reduced modulo MODULUS;
    /// a residue of 0 would be a fixed point, so it becomes 1.
    pub fn new(seed: u32) -> Self {
        let state = seed % Self::MODULUS;
        Lcg { state: if state == 0 { 1 } else { state } }
    }

    /// Advances the state and returns it.
    #[inline]
    pub fn next(&mut self) -> u32 {
        // The product stays below 2**47, so 64 bits hold it exactly.
        let x = (self.state as u64 * Self::MULTIPLIER as u64 + Self::INCREMENT as u64) % Self::MODULUS as u64;
        self.state = x as u32;
        self.state
    }

    /// Returns state after the specified number of iterations, without advancing.
    /// Jumps by square-and-multiply, see Brown, F. B., "Random Number Generation
    /// with Arbitrary Stride", Transactions of the American Nuclear Society, 1994.
    pub fn get_state(&self, iterations: u64) -> u32 {
        let m = Self::MODULUS as u64;
        let mut unit = Self::MULTIPLIER as u64;
        let mut jump: u64 = 1;
        let mut delta = iterations;
        while delta > 0 {
            if delta & 1 == 1 {
                jump = jump * unit % m;
            }
            unit = unit * unit % m;
            delta >>= 1;
        }
        (self.state as u64 * jump % m) as u32
    }
}

impl SeedSequence for Lcg {
    fn generate(&mut self, dest: &mut [u32]) {
        for word in dest.iter_mut() {
            *word = self.next();
        }
    }
}
