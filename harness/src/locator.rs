//! Reference error-locator polynomials built from injected error positions.
//!
//! Polynomials are coefficient vectors over `GF(2^m)`, lowest degree first.

use crate::field::Oracle;

/// Multiply two polynomials (schoolbook).
pub fn mul(oracle: &Oracle, a: &[u32], b: &[u32]) -> Vec<u32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut product = vec![0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate().filter(|(_, x)| **x != 0) {
        for (j, y) in b.iter().enumerate() {
            product[i + j] ^= oracle.mul(*x, *y);
        }
    }
    product
}

/// Returns the degree of `poly`, or `None` for the zero polynomial.
pub fn degree(poly: &[u32]) -> Option<usize> {
    poly.iter().rposition(|c| *c != 0)
}

/// Build the error-locator polynomial for errors at the linear `positions` of a codeword of
/// `nbits` bits.
///
/// The result is `Π (X + α^-(nbits-1-p))`, scaled so that its constant term is one. Its
/// roots are exactly `α^-(nbits-1-p)` for every position `p`.
pub fn build(oracle: &Oracle, positions: &[u32], nbits: u32) -> Vec<u32> {
    let mut locator = vec![1];
    for p in positions {
        debug_assert!(*p < nbits, "position {p} outside of {nbits} bits");
        let root = oracle.pow(-((nbits - 1 - p) as i64));
        locator = mul(oracle, &locator, &[root, 1]);
    }
    let scale = oracle.reciprocal(locator[0]);
    locator.iter().map(|c| oracle.mul(*c, scale)).collect()
}
