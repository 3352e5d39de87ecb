//! Conversion between linear bit indices and bit addresses.
//!
//! The codec numbers codeword bits most-significant-bit first: linear index `i` is bit
//! `7 - i % 8` of byte `i / 8`. A bit address `a` designates bit `a % 8` of byte `a / 8`.
//! Converting between the two reverses the bit order within every byte, which makes the
//! mapping its own inverse.

/// Convert a linear index to a bit address (or a bit address back to a linear index).
#[inline]
pub fn linearize(x: u32) -> u32 {
    (x & !7) | (7 - (x & 7))
}

/// Flip every bit address in `addrs` within `buf`.
///
/// Flipping the same addresses twice restores `buf`.
///
/// # Panics
///
/// Panics if an address falls outside of `buf`.
pub fn flip(buf: &mut [u8], addrs: &[u32]) {
    for addr in addrs {
        buf[*addr as usize / 8] ^= 1 << (addr % 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_inverse() {
        for a in 0..(1 << 15) {
            assert_eq!(linearize(linearize(a)), a);
        }
    }

    #[test]
    fn test_order_within_and_across_bytes() {
        // Reversed within a byte.
        assert!(linearize(0) > linearize(1));
        assert_eq!(linearize(0), 7);
        assert_eq!(linearize(7), 0);
        // Preserved across bytes.
        assert!(linearize(7) < linearize(8));
        assert_eq!(linearize(8), 15);
    }

    #[test]
    fn test_flip_twice_restores() {
        let original: Vec<u8> = (0..32).map(|i| (i * 37) as u8).collect();
        let mut buf = original.clone();
        let addrs = [0, 9, 63, 100, 255];
        flip(&mut buf, &addrs);
        assert_ne!(buf, original);
        assert_eq!(buf[0], original[0] ^ 1);
        assert_eq!(buf[1], original[1] ^ 2);
        flip(&mut buf, &addrs);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_linear_index_is_msb_first() {
        // Linear index 3 is the fourth bit from the top of byte 0.
        let mut buf = [0u8; 2];
        flip(&mut buf, &[linearize(3)]);
        assert_eq!(buf, [0b0001_0000, 0]);
    }
}
