//! The contract of the codec under test.

use eccheck_bch::{Allocator, Bch, Error, Received};

/// A binary BCH codec whose behavior is checked against reference results.
///
/// Error positions reported by [Codec::decode] are bit addresses: `e` designates bit `e % 8`
/// of byte `e / 8`, with the parity bytes following the payload.
pub trait Codec {
    /// The field order `m`.
    fn m(&self) -> u32;

    /// The correction capability `t`.
    fn t(&self) -> u32;

    /// The primitive polynomial defining the field.
    fn polynomial(&self) -> u32;

    /// The number of parity bits, the degree of the generator polynomial.
    fn ecc_bits(&self) -> usize;

    /// The number of bytes holding [Codec::ecc_bits] parity bits.
    fn ecc_bytes(&self) -> usize;

    /// Accumulate the parity of `data` into `ecc`.
    fn encode(&mut self, data: &[u8], ecc: &mut [u8]);

    /// Decode `len` payload bytes, returning the number of errors found and their addresses.
    fn decode(
        &mut self,
        len: usize,
        input: Received<'_>,
        errloc: &mut Vec<u32>,
    ) -> Result<usize, Error>;

    /// Returns the field product `x * y`.
    fn mul(&self, x: u32, y: u32) -> u32;

    /// Returns `x * x`.
    fn sqr(&self, x: u32) -> u32;

    /// `x` must be non-zero.
    fn inv(&self, x: u32) -> u32;

    /// Returns `y / x`. `x` must be non-zero.
    fn div(&self, y: u32, x: u32) -> u32;

    /// Returns the exponents `e` with `poly(α^-e) = 0`, or nothing if `poly` does not split
    /// into distinct non-zero roots.
    fn find_roots(&self, poly: &[u32]) -> Vec<u32>;

    /// The error-locator polynomial of the last decode, if the codec exposes it.
    fn locator(&self) -> Option<Vec<u32>> {
        None
    }
}

impl<A: Allocator> Codec for Bch<A> {
    fn m(&self) -> u32 {
        Bch::m(self)
    }

    fn t(&self) -> u32 {
        Bch::t(self)
    }

    fn polynomial(&self) -> u32 {
        self.field().polynomial()
    }

    fn ecc_bits(&self) -> usize {
        Bch::ecc_bits(self)
    }

    fn ecc_bytes(&self) -> usize {
        Bch::ecc_bytes(self)
    }

    fn encode(&mut self, data: &[u8], ecc: &mut [u8]) {
        Bch::encode(self, data, ecc)
    }

    fn decode(
        &mut self,
        len: usize,
        input: Received<'_>,
        errloc: &mut Vec<u32>,
    ) -> Result<usize, Error> {
        Bch::decode(self, len, input, errloc)
    }

    fn mul(&self, x: u32, y: u32) -> u32 {
        self.field().mul(x, y)
    }

    fn sqr(&self, x: u32) -> u32 {
        self.field().sqr(x)
    }

    fn inv(&self, x: u32) -> u32 {
        self.field().inv(x)
    }

    fn div(&self, y: u32, x: u32) -> u32 {
        self.field().div(y, x)
    }

    fn find_roots(&self, poly: &[u32]) -> Vec<u32> {
        Bch::find_roots(self, poly)
    }

    fn locator(&self) -> Option<Vec<u32>> {
        Bch::locator(self).map(<[u32]>::to_vec)
    }
}
