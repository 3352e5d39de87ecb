//! Table-driven arithmetic over `GF(2^m)`.
//!
//! Elements are the integers `[0, 2^m)`, read as polynomials over `GF(2)` reduced modulo a
//! primitive polynomial of degree `m`. The generator `α` is the element `2` (the polynomial `X`).

use crate::{Allocator, Block, Error, System};

/// Smallest supported field order.
pub const MIN_ORDER: u32 = 5;

/// Largest supported field order.
pub const MAX_ORDER: u32 = 15;

/// Default primitive polynomial for each order in `MIN_ORDER..=MAX_ORDER`.
const PRIMITIVE_POLYNOMIALS: [u32; 11] = [
    0x25, 0x43, 0x83, 0x11d, 0x211, 0x409, 0x805, 0x1053, 0x201b, 0x402b, 0x8003,
];

/// Returns the default primitive polynomial of degree `m`, if `m` is supported.
pub fn default_polynomial(m: u32) -> Option<u32> {
    if !(MIN_ORDER..=MAX_ORDER).contains(&m) {
        return None;
    }
    Some(PRIMITIVE_POLYNOMIALS[(m - MIN_ORDER) as usize])
}

/// The field `GF(2^m)` with exponent and logarithm tables.
pub struct Field<A: Allocator = System> {
    m: u32,
    n: u32,
    poly: u32,
    // exp[i] = α^i for i in 0..=n (exp[n] = 1)
    exp: Block<A>,
    // log[exp[i]] = i, log[0] is unused
    log: Block<A>,
}

impl Field<System> {
    /// Build the field of order `m`, using the default polynomial when `poly` is `None`.
    pub fn new(m: u32, poly: Option<u32>) -> Result<Self, Error> {
        Self::new_in(m, poly, &System)
    }
}

impl<A: Allocator + Clone> Field<A> {
    /// Build the field of order `m`, obtaining both tables from `alloc`.
    pub fn new_in(m: u32, poly: Option<u32>, alloc: &A) -> Result<Self, Error> {
        let poly = match poly {
            Some(poly) => poly,
            None => default_polynomial(m).ok_or(Error::InvalidParameters { m, t: 0 })?,
        };
        if !(MIN_ORDER..=MAX_ORDER).contains(&m) {
            return Err(Error::InvalidParameters { m, t: 0 });
        }
        if poly >> m != 1 {
            return Err(Error::InvalidPolynomial { poly, m });
        }

        let n = (1u32 << m) - 1;
        let mut exp = Block::malloc(alloc, n as usize + 1)?;
        let mut log = Block::malloc(alloc, n as usize + 1)?;

        // Walk the powers of X; a primitive polynomial visits every non-zero element once.
        let mut x = 1u32;
        for i in 0..n {
            if x == 0 || (i > 0 && x == 1) {
                return Err(Error::InvalidPolynomial { poly, m });
            }
            exp[i as usize] = x;
            log[x as usize] = i;
            x <<= 1;
            if x & (1 << m) != 0 {
                x ^= poly;
            }
        }
        if x != 1 {
            return Err(Error::InvalidPolynomial { poly, m });
        }
        exp[n as usize] = 1;
        log[0] = 0;

        Ok(Self {
            m,
            n,
            poly,
            exp,
            log,
        })
    }
}

impl<A: Allocator> Field<A> {
    /// The field order `m`.
    pub fn order(&self) -> u32 {
        self.m
    }

    /// The number of non-zero elements, `2^m - 1`.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// The primitive polynomial defining the field.
    pub fn polynomial(&self) -> u32 {
        self.poly
    }

    /// Returns `α^i` for any integer exponent.
    #[inline]
    pub fn pow(&self, i: i64) -> u32 {
        self.exp[i.rem_euclid(self.n as i64) as usize]
    }

    /// Returns `i` such that `α^i = x`, with `i` in `[0, n)`.
    ///
    /// `x` must be non-zero.
    #[inline]
    pub fn log(&self, x: u32) -> u32 {
        debug_assert!(x != 0, "log of zero");
        self.log[x as usize]
    }

    #[inline]
    fn reduce(&self, i: u32) -> u32 {
        if i >= self.n {
            i - self.n
        } else {
            i
        }
    }

    #[inline]
    pub fn mul(&self, x: u32, y: u32) -> u32 {
        if x == 0 || y == 0 {
            return 0;
        }
        self.exp[self.reduce(self.log[x as usize] + self.log[y as usize]) as usize]
    }

    #[inline]
    pub fn sqr(&self, x: u32) -> u32 {
        if x == 0 {
            return 0;
        }
        self.exp[self.reduce(2 * self.log[x as usize]) as usize]
    }

    /// `x` must be non-zero.
    #[inline]
    pub fn inv(&self, x: u32) -> u32 {
        debug_assert!(x != 0, "inverse of zero");
        self.exp[(self.n - self.log[x as usize]) as usize]
    }

    /// Returns `y / x`. `x` must be non-zero.
    #[inline]
    pub fn div(&self, y: u32, x: u32) -> u32 {
        debug_assert!(x != 0, "division by zero");
        if y == 0 {
            return 0;
        }
        self.exp[self.reduce(self.log[y as usize] + self.n - self.log[x as usize]) as usize]
    }
}
