use rand_core::RngCore;

/// A source of 32-bit seeding words.
/// Engines request exactly as many words as their state needs.
pub trait SeedSequence {
    /// Fills `dest` with seeding words.
    fn generate(&mut self, dest: &mut [u32]);
}

impl<S: SeedSequence + ?Sized> SeedSequence for &mut S {
    #[inline]
    fn generate(&mut self, dest: &mut [u32]) {
        (**self).generate(dest)
    }
}

/// Fixed words are handed out in order. Requests longer than the slice are zero-padded.
impl SeedSequence for [u32] {
    fn generate(&mut self, dest: &mut [u32]) {
        let n = self.len().min(dest.len());
        dest[.. n].copy_from_slice(&self[.. n]);
        dest[n ..].fill(0);
    }
}

impl<const N: usize> SeedSequence for [u32; N] {
    #[inline]
    fn generate(&mut self, dest: &mut [u32]) {
        self.as_mut_slice().generate(dest)
    }
}

/// Draws seeding words from any `RngCore`.
#[derive(Clone, Debug)]
pub struct FromRng<R>(pub R);

impl<R: RngCore> SeedSequence for FromRng<R> {
    fn generate(&mut self, dest: &mut [u32]) {
        for word in dest.iter_mut() {
            *word = self.0.next_u32();
        }
    }
}

/// Seed sequence that mixes a short entropy slice into any number of
/// well distributed words. This is the `seed_seq` algorithm of the C++ standard
/// library ([rand.util.seedseq]), so engines seeded through it agree with
/// engines seeded by `std::seed_seq` over the same entropy.
#[derive(Clone, Copy, Debug)]
pub struct SeedSeq<'a> {
    entropy: &'a [u32],
}

#[inline] fn tempering(x: u32) -> u32 {
    x ^ (x >> 27)
}

impl<'a> SeedSeq<'a> {
    pub fn new(entropy: &'a [u32]) -> Self {
        SeedSeq { entropy }
    }

    /// Number of entropy words.
    #[inline]
    pub fn size(&self) -> usize {
        self.entropy.len()
    }

    /// Copies the entropy words into the start of `dest`.
    pub fn param(&self, dest: &mut [u32]) {
        let n = self.entropy.len().min(dest.len());
        dest[.. n].copy_from_slice(&self.entropy[.. n]);
    }
}

impl<'a> SeedSequence for SeedSeq<'a> {
    fn generate(&mut self, dest: &mut [u32]) {
        let n = dest.len();
        if n == 0 {
            return;
        }
        dest.fill(0x8b8b8b8b);
        let s = self.entropy.len();
        let t = if n >= 623 { 11 } else if n >= 68 { 7 } else if n >= 39 { 5 } else if n >= 7 { 3 } else { (n - 1) / 2 };
        let p = (n - t) / 2;
        let q = p + t;
        let m = (s + 1).max(n);

        for k in 0 .. m {
            let r1 = tempering(dest[k % n] ^ dest[(k + p) % n] ^ dest[(k + n - 1) % n]).wrapping_mul(1664525);
            let r2 = if k == 0 {
                r1.wrapping_add(s as u32)
            } else if k <= s {
                r1.wrapping_add((k % n) as u32).wrapping_add(self.entropy[k - 1])
            } else {
                r1.wrapping_add((k % n) as u32)
            };
            dest[(k + p) % n] = dest[(k + p) % n].wrapping_add(r1);
            dest[(k + q) % n] = dest[(k + q) % n].wrapping_add(r2);
            dest[k % n] = r2;
        }

        for k in m .. m + n {
            let sum = dest[k % n].wrapping_add(dest[(k + p) % n]).wrapping_add(dest[(k + n - 1) % n]);
            let r3 = tempering(sum).wrapping_mul(1566083941);
            let r4 = r3.wrapping_sub((k % n) as u32);
            dest[(k + p) % n] ^= r3;
            dest[(k + q) % n] ^= r4;
            dest[k % n] = r4;
        }
    }
}
