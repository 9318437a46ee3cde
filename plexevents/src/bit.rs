//! Bitwise helpers for device payload words

use num_traits::{PrimInt, Unsigned};

/// Single-bit checks and masks on unsigned payload words
pub trait BitOps: PrimInt + Unsigned {
    /// Whether bit `b` is set
    fn check(self, b: usize) -> bool;
    /// The word with bit `b` cleared
    fn without(self, b: usize) -> Self;
    /// The low `n` bits of the word
    fn low_bits(self, n: usize) -> Self;
}

macro_rules! impl_bit_ops {
    ($($t:ty),*) => {$(
        impl BitOps for $t {
            #[inline]
            fn check(self, b: usize) -> bool {
                self >> b & 1 == 1
            }

            #[inline]
            fn without(self, b: usize) -> Self {
                self & !(1 << b)
            }

            #[inline]
            fn low_bits(self, n: usize) -> Self {
                if n >= <$t>::BITS as usize {
                    self
                } else {
                    self & ((1 << n) - 1)
                }
            }
        }
    )*};
}

impl_bit_ops!(u8, u16, u32, u64);
