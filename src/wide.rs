use core::ops::{Add, AddAssign, Mul, MulAssign, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub, SubAssign};

/// 128-bit unsigned integer built from two 64-bit halves.
/// Arithmetic wraps modulo 2**128.
// Field order makes the derived ordering numeric.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct U128 {
    high: u64,
    low: u64,
}

impl U128 {
    pub const ZERO: U128 = U128 { high: 0, low: 0 };
    pub const ONE: U128 = U128 { high: 0, low: 1 };
    pub const MAX: U128 = U128 { high: u64::MAX, low: u64::MAX };

    /// Value `high * 2**64 + low`.
    #[inline]
    pub const fn new(high: u64, low: u64) -> Self {
        U128 { high, low }
    }

    #[inline]
    pub const fn from_u64(x: u64) -> Self {
        U128 { high: 0, low: x }
    }

    #[inline]
    pub const fn high(self) -> u64 {
        self.high
    }

    #[inline]
    pub const fn low(self) -> u64 {
        self.low
    }

    /// Exact 128-bit product of two 64-bit values.
    #[inline]
    pub fn widening_mul(a: u64, b: u64) -> Self {
        U128::from_u64(a) * U128::from_u64(b)
    }

    /// Remainder, or `None` if `rhs` is zero.
    pub fn checked_rem(self, rhs: U128) -> Option<U128> {
        if rhs == U128::ZERO {
            None
        } else {
            Some(self.rem_nonzero(rhs))
        }
    }

    /// Binary long division keeping only the remainder.
    fn rem_nonzero(mut self, rhs: U128) -> U128 {
        // Double the divisor until it exceeds half the dividend.
        let mut x = rhs;
        let y = self >> 1;
        while x <= y {
            x <<= 1;
        }
        // Then walk it back down, subtracting wherever it fits.
        while self >= rhs {
            if self >= x {
                self -= x;
            }
            x >>= 1;
        }
        self
    }
}

impl From<u64> for U128 {
    #[inline]
    fn from(x: u64) -> Self {
        U128::from_u64(x)
    }
}

impl From<u128> for U128 {
    #[inline]
    fn from(x: u128) -> Self {
        U128::new((x >> 64) as u64, x as u64)
    }
}

impl From<U128> for u128 {
    #[inline]
    fn from(x: U128) -> Self {
        ((x.high as u128) << 64) | x.low as u128
    }
}

impl Add for U128 {
    type Output = U128;
    #[inline]
    fn add(self, rhs: U128) -> U128 {
        let low = self.low.wrapping_add(rhs.low);
        let carry = (low < self.low) as u64;
        U128::new(self.high.wrapping_add(rhs.high).wrapping_add(carry), low)
    }
}

impl AddAssign for U128 {
    #[inline]
    fn add_assign(&mut self, rhs: U128) {
        *self = *self + rhs;
    }
}

impl Sub for U128 {
    type Output = U128;
    #[inline]
    fn sub(self, rhs: U128) -> U128 {
        let low = self.low.wrapping_sub(rhs.low);
        let borrow = (low > self.low) as u64;
        U128::new(self.high.wrapping_sub(rhs.high).wrapping_sub(borrow), low)
    }
}

impl SubAssign for U128 {
    #[inline]
    fn sub_assign(&mut self, rhs: U128) {
        *self = *self - rhs;
    }
}

impl Shl<u32> for U128 {
    type Output = U128;
    #[inline]
    fn shl(self, amount: u32) -> U128 {
        // Native 64-bit shifts by 64 or more overflow, so those are special-cased.
        match amount {
            0 => self,
            1 ..= 63 => U128::new((self.high << amount) | (self.low >> (64 - amount)), self.low << amount),
            64 ..= 127 => U128::new(self.low << (amount - 64), 0),
            _ => U128::ZERO,
        }
    }
}

impl ShlAssign<u32> for U128 {
    #[inline]
    fn shl_assign(&mut self, amount: u32) {
        *self = *self << amount;
    }
}

impl Shr<u32> for U128 {
    type Output = U128;
    #[inline]
    fn shr(self, amount: u32) -> U128 {
        match amount {
            0 => self,
            1 ..= 63 => U128::new(self.high >> amount, (self.high << (64 - amount)) | (self.low >> amount)),
            64 ..= 127 => U128::new(0, self.high >> (amount - 64)),
            _ => U128::ZERO,
        }
    }
}

impl ShrAssign<u32> for U128 {
    #[inline]
    fn shr_assign(&mut self, amount: u32) {
        *self = *self >> amount;
    }
}

impl Mul for U128 {
    type Output = U128;
    /// Schoolbook multiplication on 32-bit limbs of the low halves.
    /// The high halves only contribute to the upper word modulo 2**128.
    #[inline]
    fn mul(self, rhs: U128) -> U128 {
        let a32 = self.low >> 32;
        let a00 = self.low & 0xffffffff;
        let b32 = rhs.low >> 32;
        let b00 = rhs.low & 0xffffffff;
        let high = self.high.wrapping_mul(rhs.low)
            .wrapping_add(self.low.wrapping_mul(rhs.high))
            .wrapping_add(a32 * b32);
        let mut result = U128::new(high, a00 * b00);
        result += U128::from_u64(a32 * b00) << 32;
        result += U128::from_u64(a00 * b32) << 32;
        result
    }
}

impl MulAssign for U128 {
    #[inline]
    fn mul_assign(&mut self, rhs: U128) {
        *self = *self * rhs;
    }
}

impl Rem for U128 {
    type Output = U128;
    /// Panics if `rhs` is zero.
    fn rem(self, rhs: U128) -> U128 {
        match self.checked_rem(rhs) {
            Some(x) => x,
            None => panic!("attempt to calculate the remainder with a divisor of zero"),
        }
    }
}

impl RemAssign for U128 {
    fn rem_assign(&mut self, rhs: U128) {
        *self = *self % rhs;
    }
}
