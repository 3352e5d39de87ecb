//! Reference arithmetic over `GF(2^m)` that shares nothing with the codec under test.
//!
//! Multiplication shifts and reduces by the primitive polynomial one bit at a time and
//! inversion searches every candidate, so the results never depend on exp/log tables.

use crate::{cut::Codec, Error};
use tracing::{debug, info};

/// Pairs checked by [check_field] before it starts striding over the field.
pub const DEFAULT_SAMPLE_CAP: u64 = 1 << 20;

/// Reference `GF(2^m)` arithmetic for a given primitive polynomial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Oracle {
    m: u32,
    poly: u32,
}

impl Oracle {
    pub fn new(m: u32, poly: u32) -> Self {
        Self { m, poly }
    }

    /// Build the oracle matching the field of `codec`.
    pub fn of<C: Codec>(codec: &C) -> Self {
        Self::new(codec.m(), codec.polynomial())
    }

    pub fn order(&self) -> u32 {
        self.m
    }

    /// The number of non-zero elements, `2^m - 1`.
    pub fn n(&self) -> u32 {
        (1 << self.m) - 1
    }

    #[inline]
    fn times_alpha(&self, x: u32) -> u32 {
        let x = x << 1;
        if x & (1 << self.m) != 0 {
            x ^ self.poly
        } else {
            x
        }
    }

    pub fn mul(&self, x: u32, y: u32) -> u32 {
        let mut acc = 0;
        let mut shifted = y;
        for i in 0..self.m {
            if (x >> i) & 1 == 1 {
                acc ^= shifted;
            }
            shifted = self.times_alpha(shifted);
        }
        acc
    }

    pub fn sqr(&self, x: u32) -> u32 {
        self.mul(x, x)
    }

    /// Returns the inverse of `x` by trying every candidate, or `None` for zero.
    pub fn inv(&self, x: u32) -> Option<u32> {
        if x == 0 {
            return None;
        }
        (1..=self.n()).find(|y| self.mul(x, *y) == 1)
    }

    /// Returns `y / x`, or `None` when `x` is zero.
    pub fn div(&self, y: u32, x: u32) -> Option<u32> {
        self.inv(x).map(|inv| self.mul(y, inv))
    }

    /// Returns `x^e` by square-and-multiply.
    pub fn power(&self, x: u32, mut e: u64) -> u32 {
        let mut acc = 1;
        let mut base = x;
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.sqr(base);
            e >>= 1;
        }
        acc
    }

    /// Returns `α^i` for any integer exponent.
    pub fn pow(&self, i: i64) -> u32 {
        self.power(2, i.rem_euclid(self.n() as i64) as u64)
    }

    /// Returns `1 / x` as `x^(2^m - 2)`, or zero for zero.
    ///
    /// Agrees with [Oracle::inv] on every non-zero element but costs `O(m^2)` instead of
    /// `O(m * 2^m)`.
    pub fn reciprocal(&self, x: u32) -> u32 {
        self.power(x, self.n() as u64 - 1)
    }

    /// Evaluate `poly` (lowest degree first) at `x`.
    pub fn eval(&self, poly: &[u32], x: u32) -> u32 {
        poly.iter().rev().fold(0, |acc, c| self.mul(acc, x) ^ c)
    }
}

/// Returns whether `poly` is a primitive polynomial of degree `m` (i.e. `X` has
/// multiplicative order exactly `2^m - 1` modulo `poly`).
pub fn is_primitive(poly: u32, m: u32) -> bool {
    if m == 0 || m > 31 || poly >> m != 1 {
        return false;
    }
    let n = (1u32 << m) - 1;
    let mut x = 1u32;
    for i in 0..n {
        if i > 0 && x == 1 {
            return false;
        }
        x <<= 1;
        if x & (1 << m) != 0 {
            x ^= poly;
        }
    }
    x == 1
}

/// Returns every primitive polynomial of degree `m`, in increasing order.
pub fn primitive_polynomials(m: u32) -> Vec<u32> {
    // Polynomials divisible by X (no constant term) or by X + 1 (an even number of terms)
    // cannot be primitive.
    (0..1u32 << m)
        .filter(|low| low & 1 == 1 && (low | (1 << m)).count_ones() % 2 == 1)
        .map(|low| low | (1 << m))
        .filter(|poly| is_primitive(*poly, m))
        .collect()
}

/// Verify that the codec's default polynomial for every supported order is primitive.
pub fn check_default_polynomials() -> Result<(), Error> {
    use eccheck_bch::field::{default_polynomial, MAX_ORDER, MIN_ORDER};
    for m in MIN_ORDER..=MAX_ORDER {
        let Some(poly) = default_polynomial(m) else {
            return Err(Error::Config(format!("no default polynomial for m={m}")));
        };
        if !is_primitive(poly, m) {
            return Err(Error::NotPrimitive { m, poly });
        }
        debug!(m, poly, "default polynomial is primitive");
    }
    Ok(())
}

// Smallest odd stride keeping `(size / stride)^2` under `cap`.
fn stride(size: u64, cap: u64) -> u64 {
    let cap = cap.max(1);
    let mut stride = 1;
    while size.div_ceil(stride) * size.div_ceil(stride) > cap {
        stride += 1;
    }
    stride | 1
}

/// Cross-check the codec's `sqr`, `inv`, `mul`, and `div` against `oracle`.
///
/// Every pair of elements is checked when there are at most `cap` of them. Otherwise both
/// operands step over the field with the same odd stride. Returns the number of pairs
/// checked.
pub fn check_field<C: Codec>(codec: &C, oracle: &Oracle, cap: u64) -> Result<u64, Error> {
    let size = 1u64 << oracle.order();
    let step = if size * size <= cap {
        1
    } else {
        stride(size, cap)
    };
    info!(
        m = oracle.order(),
        poly = codec.polynomial(),
        step,
        "checking field operations"
    );

    let mismatch = |op, x, y, expected, actual| Error::FieldMismatch {
        op,
        x,
        y,
        expected,
        actual,
    };
    let mut pairs = 0;
    for x in (0..size as u32).step_by(step as usize) {
        let (expected, actual) = (oracle.sqr(x), codec.sqr(x));
        if expected != actual {
            return Err(mismatch("sqr", x, x, expected, actual));
        }

        let inverse = oracle.inv(x);
        if let Some(inverse) = inverse {
            let actual = codec.inv(x);
            if inverse != actual {
                return Err(mismatch("inv", x, 0, inverse, actual));
            }
            if oracle.mul(x, inverse) != 1 {
                return Err(mismatch("inv", x, inverse, 1, oracle.mul(x, inverse)));
            }
        } else if x != 0 {
            return Err(Error::NotPrimitive {
                m: oracle.order(),
                poly: codec.polynomial(),
            });
        }

        for y in (0..size as u32).step_by(step as usize) {
            let (expected, actual) = (oracle.mul(x, y), codec.mul(x, y));
            if expected != actual {
                return Err(mismatch("mul", x, y, expected, actual));
            }
            if let Some(inverse) = inverse {
                let (expected, actual) = (oracle.mul(y, inverse), codec.div(y, x));
                if expected != actual {
                    return Err(mismatch("div", y, x, expected, actual));
                }
            }
            pairs += 1;
        }
    }
    Ok(pairs)
}
