//! Cross-check of the codec's polynomial root finder.

use crate::{field::Oracle, locator::degree, Codec, Error};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

/// Highest degree of the polynomials checked.
pub const MAX_DEGREE: usize = 4;

/// Check the roots the codec finds for `poly` (lowest degree first).
///
/// The codec must either report `deg(poly)` distinct exponents `e < 2^m - 1`, each with
/// `poly(α^-e) = 0`, or report nothing, in which case `poly` must have fewer than `deg(poly)` roots among the
/// non-zero elements.
pub fn check_polynomial<C: Codec>(
    codec: &C,
    oracle: &Oracle,
    poly: &[u32],
) -> Result<(), Error> {
    let deg = degree(poly).unwrap_or(0);
    let roots = codec.find_roots(poly);
    let mismatch = |roots: &[u32], found| Error::RootMismatch {
        poly: poly.to_vec(),
        roots: roots.to_vec(),
        found,
    };

    let mut exponents = roots.clone();
    exponents.sort_unstable();
    exponents.dedup();
    if exponents.len() != roots.len() || exponents.iter().any(|e| *e >= oracle.n()) {
        return Err(mismatch(&roots, exponents.len()));
    }

    if roots.len() == deg {
        for e in &roots {
            if oracle.eval(poly, oracle.pow(-(*e as i64))) != 0 {
                return Err(mismatch(&roots, roots.len()));
            }
        }
        return Ok(());
    }
    if !roots.is_empty() {
        return Err(mismatch(&roots, roots.len()));
    }

    // Walk α^0, α^-1, α^-2, ... and count zeros.
    let step = oracle.pow(-1);
    let mut x = 1;
    let mut found = 0;
    for _ in 0..oracle.n() {
        if oracle.eval(poly, x) == 0 {
            found += 1;
        }
        x = oracle.mul(x, step);
    }
    if found >= deg {
        return Err(mismatch(&roots, found));
    }
    Ok(())
}

/// Check every polynomial of degree at most [MAX_DEGREE] with a non-zero constant term.
///
/// Returns the number of polynomials checked.
pub fn exhaustive<C: Codec>(codec: &C, oracle: &Oracle) -> Result<u64, Error> {
    let n = oracle.n();
    info!(m = oracle.order(), "checking all polynomials of degree <= 4");
    let mut poly = [0u32; MAX_DEGREE + 1];
    let mut checked = 0;
    for c0 in 1..=n {
        poly[0] = c0;
        for c1 in 0..=n {
            poly[1] = c1;
            for c2 in 0..=n {
                poly[2] = c2;
                for c3 in 0..=n {
                    poly[3] = c3;
                    for c4 in 0..=n {
                        poly[4] = c4;
                        check_polynomial(codec, oracle, &poly)?;
                        checked += 1;
                    }
                }
            }
        }
    }
    Ok(checked)
}

/// Check `iterations` seeded random polynomials of degree at most [MAX_DEGREE].
///
/// Draws with a zero constant term are skipped. Returns the number of polynomials checked.
pub fn random<C: Codec>(
    codec: &C,
    oracle: &Oracle,
    iterations: u64,
    seed: u64,
) -> Result<u64, Error> {
    let n = oracle.n();
    info!(m = oracle.order(), iterations, seed, "checking random polynomials of degree <= 4");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut poly = [0u32; MAX_DEGREE + 1];
    let mut checked = 0;
    for _ in 0..iterations {
        for c in poly.iter_mut() {
            *c = rng.gen::<u32>() & n;
        }
        if poly[0] == 0 {
            continue;
        }
        check_polynomial(codec, oracle, &poly)?;
        checked += 1;
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eccheck_bch::{Bch, Received};

    /// Delegates to a real codec but reports a fixed list of roots.
    struct Fixed(Bch, Vec<u32>);

    impl Codec for Fixed {
        fn m(&self) -> u32 {
            self.0.m()
        }
        fn t(&self) -> u32 {
            self.0.t()
        }
        fn polynomial(&self) -> u32 {
            self.0.field().polynomial()
        }
        fn ecc_bits(&self) -> usize {
            self.0.ecc_bits()
        }
        fn ecc_bytes(&self) -> usize {
            self.0.ecc_bytes()
        }
        fn encode(&mut self, data: &[u8], ecc: &mut [u8]) {
            self.0.encode(data, ecc)
        }
        fn decode(
            &mut self,
            len: usize,
            input: Received<'_>,
            errloc: &mut Vec<u32>,
        ) -> Result<usize, eccheck_bch::Error> {
            self.0.decode(len, input, errloc)
        }
        fn mul(&self, x: u32, y: u32) -> u32 {
            self.0.field().mul(x, y)
        }
        fn sqr(&self, x: u32) -> u32 {
            self.0.field().sqr(x)
        }
        fn inv(&self, x: u32) -> u32 {
            self.0.field().inv(x)
        }
        fn div(&self, y: u32, x: u32) -> u32 {
            self.0.field().div(y, x)
        }
        fn find_roots(&self, _poly: &[u32]) -> Vec<u32> {
            self.1.clone()
        }
    }

    fn fixed(roots: Vec<u32>) -> Fixed {
        Fixed(Bch::new(5, 2, None).unwrap(), roots)
    }

    #[test]
    fn test_split_polynomial() {
        let bch = Bch::new(6, 4, None).unwrap();
        let oracle = Oracle::of(&bch);
        // (1 + α^3 X)(1 + α^20 X)
        let (a, b) = (oracle.pow(3), oracle.pow(20));
        check_polynomial(&bch, &oracle, &[1, a ^ b, oracle.mul(a, b)]).unwrap();
    }

    #[test]
    fn test_quadratics() {
        // c + X + X^2 has two roots when the trace of c is zero and none otherwise.
        let bch = Bch::new(5, 2, None).unwrap();
        let oracle = Oracle::of(&bch);
        for c in 1..=oracle.n() {
            check_polynomial(&bch, &oracle, &[c, 1, 1]).unwrap();
        }
    }

    #[test]
    fn test_repeated_root() {
        // (1 + X)^2 = 1 + X^2 has a single distinct root.
        let bch = Bch::new(7, 2, None).unwrap();
        let oracle = Oracle::of(&bch);
        assert!(bch.find_roots(&[1, 0, 1]).is_empty());
        check_polynomial(&bch, &oracle, &[1, 0, 1]).unwrap();
    }

    #[test]
    fn test_random() {
        for m in [8, 11] {
            let bch = Bch::new(m, 4, None).unwrap();
            let oracle = Oracle::of(&bch);
            let checked = random(&bch, &oracle, 300, m as u64).unwrap();
            assert!(checked > 250);
        }
    }

    #[test]
    fn test_detects_bogus_root() {
        // 1 + X vanishes at α^0, not α^-1.
        let codec = fixed(vec![1]);
        let oracle = Oracle::of(&codec);
        assert!(matches!(
            check_polynomial(&codec, &oracle, &[1, 1]),
            Err(Error::RootMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_detects_partial_roots() {
        let codec = fixed(vec![0]);
        let oracle = Oracle::of(&codec);
        // (1 + X)(1 + αX) has two roots.
        let poly = [1, 1 ^ oracle.pow(1), oracle.pow(1)];
        assert!(matches!(
            check_polynomial(&codec, &oracle, &poly),
            Err(Error::RootMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_detects_repeated_root() {
        // (1 + X)^2 vanishes only at α^0, which must not be reported twice.
        let codec = fixed(vec![0, 0]);
        let oracle = Oracle::of(&codec);
        assert!(matches!(
            check_polynomial(&codec, &oracle, &[1, 0, 1]),
            Err(Error::RootMismatch { found: 1, .. })
        ));
    }

    #[test]
    fn test_detects_unreduced_exponent() {
        // α^-31 is α^0 in GF(32), but exponents must be reduced.
        let codec = fixed(vec![31]);
        let oracle = Oracle::of(&codec);
        assert!(matches!(
            check_polynomial(&codec, &oracle, &[1, 1]),
            Err(Error::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_detects_missed_roots() {
        let codec = fixed(Vec::new());
        let oracle = Oracle::of(&codec);
        let poly = [1, 1 ^ oracle.pow(1), oracle.pow(1)];
        assert!(matches!(
            check_polynomial(&codec, &oracle, &poly),
            Err(Error::RootMismatch { found: 2, .. })
        ));
    }
}
