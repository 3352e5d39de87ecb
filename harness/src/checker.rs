//! Differential decoding checks.
//!
//! A [Checker] owns an encoded buffer (payload followed by parity). Every trial flips the
//! bits of an error vector, decodes, flips them back, and compares what the codec reported
//! with what was injected.

use crate::{
    field::Oracle,
    linear::{flip, linearize},
    locator,
    vector::{self, Ceiling, Sampler},
    Codec, Coverage, Error,
};
use eccheck_bch::Received;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

/// Logs every tenth of a run.
struct Progress {
    total: u64,
    done: u64,
    reported: u64,
}

impl Progress {
    fn new(total: u64) -> Self {
        Self {
            total: total.max(1),
            done: 0,
            reported: 0,
        }
    }

    fn tick(&mut self) {
        self.done += 1;
        let tenth = self.done * 10 / self.total;
        if tenth > self.reported {
            self.reported = tenth;
            info!(done = self.done, total = self.total, "progress");
        }
    }
}

/// Runs decoding trials against one encoded buffer.
pub struct Checker<C: Codec> {
    codec: C,
    oracle: Oracle,
    len: usize,
    nbits: u32,
    buf: Vec<u8>,
    errloc: Vec<u32>,
    addrs: Vec<u32>,
}

impl<C: Codec> Checker<C> {
    /// Fill a payload of `len` bytes from `seed` and encode it with `codec`.
    pub fn new(mut codec: C, len: usize, seed: u64) -> Result<Self, Error> {
        let n = (1u64 << codec.m()) - 1;
        let nbits = len as u64 * 8 + codec.ecc_bits() as u64;
        if len == 0 || nbits > n {
            return Err(Error::Config(format!(
                "{len} bytes and {} parity bits do not fit in {n} bits",
                codec.ecc_bits()
            )));
        }

        let mut buf = vec![0u8; len + codec.ecc_bytes()];
        ChaCha8Rng::seed_from_u64(seed).fill_bytes(&mut buf[..len]);
        let (data, ecc) = buf.split_at_mut(len);
        codec.encode(data, ecc);

        let oracle = Oracle::of(&codec);
        let t = codec.t() as usize;
        Ok(Self {
            codec,
            oracle,
            len,
            nbits: nbits as u32,
            buf,
            errloc: Vec::with_capacity(t),
            addrs: Vec::with_capacity(t),
        })
    }

    /// The payload length, in bytes.
    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// The number of codeword bits, `N = 8*len + ecc_bits`.
    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    /// The encoded buffer: payload followed by parity.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Flip the bits at the given bit addresses.
    pub fn corrupt(&mut self, addrs: &[u32]) {
        flip(&mut self.buf, addrs);
    }

    /// Decode the buffer with the linear `positions` flipped, then restore it.
    ///
    /// Returns the reported bit addresses in increasing order, or the codec's failure as
    /// [Error::Codec]. Positions must be distinct and below [Checker::nbits]. Nothing else is
    /// asserted, which makes this suitable for vectors beyond the correction capability.
    pub fn probe(&mut self, positions: &[u32]) -> Result<Vec<u32>, Error> {
        vector::validate(positions, self.nbits)?;
        self.addrs.clear();
        self.addrs.extend(positions.iter().map(|p| linearize(*p)));
        flip(&mut self.buf, &self.addrs);

        let (data, ecc) = self.buf.split_at(self.len);
        let result = self.codec.decode(
            self.len,
            Received::Codeword { data, ecc },
            &mut self.errloc,
        );
        flip(&mut self.buf, &self.addrs);

        let count = result?;
        let mut reported = self.errloc[..count.min(self.errloc.len())].to_vec();
        reported.sort_unstable();
        Ok(reported)
    }

    /// Decode the buffer with the linear `positions` flipped and require exactly those
    /// positions back.
    ///
    /// When the codec exposes its error-locator polynomial, it must also equal the one
    /// rebuilt from `positions`. Returns the number of corrected errors.
    pub fn check(&mut self, positions: &[u32]) -> Result<usize, Error> {
        let t = self.codec.t() as usize;
        if positions.len() > t {
            return Err(Error::Config(format!(
                "{} errors exceed capability {t}",
                positions.len()
            )));
        }
        let mut injected: Vec<u32> = positions.iter().map(|p| linearize(*p)).collect();
        injected.sort_unstable();

        let reported = match self.probe(positions) {
            Ok(reported) => reported,
            Err(Error::Codec(eccheck_bch::Error::Uncorrectable)) => {
                return Err(Error::DecodeFailed { injected });
            }
            Err(err) => return Err(err),
        };
        if reported != injected {
            return Err(Error::DecodeMismatch { injected, reported });
        }

        if !positions.is_empty() {
            if let Some(actual) = self.codec.locator() {
                let expected = locator::build(&self.oracle, positions, self.nbits);
                if actual != expected {
                    return Err(Error::LocatorMismatch { expected, actual });
                }
            }
        }
        Ok(reported.len())
    }

    /// Check every `k`-subset of the codeword positions, unless there are too many.
    pub fn exhaustive(&mut self, k: u32, ceiling: &Ceiling) -> Result<Coverage, Error> {
        let m = self.codec.m();
        let Some(cases) = ceiling.admit(m, self.nbits, k) else {
            let cases = vector::combinations(self.nbits, k);
            warn!(m, t = self.codec.t(), k, ?cases, "skipping exhaustive run");
            return Ok(Coverage::Skipped { cases });
        };
        info!(m, t = self.codec.t(), k, cases, "checking all error vectors");

        let mut progress = Progress::new(cases);
        let mut checked = 0;
        vector::for_each_combination(self.nbits, k as usize, |positions| {
            self.check(positions)?;
            checked += 1;
            progress.tick();
            Ok::<_, Error>(())
        })?;
        Ok(Coverage::Checked { cases: checked })
    }

    /// Check every burst of `k` consecutive codeword bits.
    pub fn bursts(&mut self, k: u32) -> Result<Coverage, Error> {
        let cases = (self.nbits + 1).saturating_sub(k) as u64;
        info!(m = self.codec.m(), t = self.codec.t(), k, cases, "checking all error bursts");

        let mut progress = Progress::new(cases);
        let mut checked = 0;
        for positions in vector::bursts(self.nbits, k) {
            self.check(&positions)?;
            checked += 1;
            progress.tick();
        }
        Ok(Coverage::Checked { cases: checked })
    }

    /// Check `iterations` random vectors of `1..=t` errors drawn from `seed`.
    pub fn random(&mut self, iterations: u64, seed: u64) -> Result<Coverage, Error> {
        let t = self.codec.t();
        info!(m = self.codec.m(), t, iterations, seed, "checking random error vectors");

        let mut sampler = Sampler::new(self.nbits, seed);
        let mut progress = Progress::new(iterations);
        for _ in 0..iterations {
            let k = sampler.size(t);
            let positions = sampler.sample(k);
            debug!(?positions, "checking");
            self.check(&positions)?;
            progress.tick();
        }
        Ok(Coverage::Checked { cases: iterations })
    }
}

/// Verify that parity does not depend on how the payload is split or where it sits in memory.
///
/// Encodes a seeded payload of `len` bytes in one call and compares the result against
/// encoding it chunk by chunk and against encoding copies placed at offsets `1..4` within
/// larger buffers, for `len`, `len - 1`, and `len - 2`.
pub fn check_encode_chunks<C: Codec>(codec: &mut C, len: usize, seed: u64) -> Result<(), Error> {
    let mut payload = vec![0u8; len];
    ChaCha8Rng::seed_from_u64(seed).fill_bytes(&mut payload);
    let ecc_bytes = codec.ecc_bytes();

    for shrink in 0..3.min(len) {
        let data = &payload[..len - shrink];
        let mut expected = vec![0u8; ecc_bytes];
        codec.encode(data, &mut expected);

        for chunk in [1, 3, 7, 64, data.len().div_ceil(2)] {
            let mut actual = vec![0u8; ecc_bytes];
            for piece in data.chunks(chunk.max(1)) {
                codec.encode(piece, &mut actual);
            }
            if actual != expected {
                return Err(Error::ParityMismatch {
                    case: format!("len={} chunk={chunk}", data.len()),
                    expected,
                    actual,
                });
            }
        }

        for offset in 1..4 {
            let mut unaligned = vec![0u8; offset + data.len() + ecc_bytes];
            unaligned[offset..offset + data.len()].copy_from_slice(data);
            let (head, ecc) = unaligned.split_at_mut(offset + data.len());
            codec.encode(&head[offset..], ecc);
            if *ecc != expected[..] {
                return Err(Error::ParityMismatch {
                    case: format!("len={} offset={offset}", data.len()),
                    expected,
                    actual: ecc.to_vec(),
                });
            }
        }
    }
    debug!(m = codec.m(), t = codec.t(), len, "parity independent of layout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eccheck_bch::Bch;
    use eccheck_macros::test_traced;
    use test_case::test_case;

    fn checker(m: u32, t: u32, len: usize) -> Checker<Bch> {
        Checker::new(Bch::new(m, t, None).unwrap(), len, m as u64).unwrap()
    }

    #[test]
    fn test_clean_buffer() {
        let mut checker = checker(7, 4, 8);
        assert_eq!(checker.check(&[]).unwrap(), 0);
    }

    #[test]
    fn test_buffer_restored() {
        let mut checker = checker(8, 4, 16);
        let before = checker.buffer().to_vec();
        checker.check(&[0, 5, 100, 150]).unwrap();
        assert_eq!(checker.buffer(), &before[..]);
        let _ = checker.probe(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(checker.buffer(), &before[..]);
    }

    #[test]
    fn test_reports_addresses() {
        let mut checker = checker(7, 4, 8);
        // Linear 3 and 40 are addresses 4 and 47.
        assert_eq!(checker.probe(&[3, 40]).unwrap(), vec![4, 47]);
    }

    #[test]
    fn test_rejects_beyond_capability() {
        let mut checker = checker(7, 2, 8);
        assert!(matches!(checker.check(&[1, 2, 3]), Err(Error::Config(_))));
    }

    #[test_case(&[10_000]; "past the buffer")]
    #[test_case(&[92]; "parity padding")]
    #[test_case(&[3, 3]; "repeated")]
    fn test_rejects_invalid_positions(positions: &[u32]) {
        let mut checker = checker(7, 4, 8);
        assert_eq!(checker.nbits(), 92);
        let before = checker.buffer().to_vec();
        assert!(matches!(checker.check(positions), Err(Error::Config(_))));
        assert!(matches!(checker.probe(positions), Err(Error::Config(_))));
        assert_eq!(checker.buffer(), &before[..]);
    }

    #[test]
    fn test_last_codeword_bit() {
        let mut checker = checker(7, 4, 8);
        assert_eq!(checker.check(&[0, 91]).unwrap(), 2);
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let bch = Bch::new(7, 4, None).unwrap();
        assert!(matches!(Checker::new(bch, 13, 0), Err(Error::Config(_))));
    }

    #[test]
    fn test_detects_manual_corruption() {
        // A bit flipped behind the checker's back shows up as an unexpected correction.
        let mut checker = checker(7, 4, 8);
        checker.corrupt(&[9]);
        assert_eq!(
            checker.check(&[]),
            Err(Error::DecodeMismatch {
                injected: vec![],
                reported: vec![9],
            })
        );
        checker.corrupt(&[9]);
        assert_eq!(checker.check(&[]).unwrap(), 0);
    }

    #[test_traced("INFO")]
    fn test_exhaustive_pairs() {
        let mut checker = checker(7, 2, 8);
        let nbits = checker.nbits();
        let coverage = checker.exhaustive(2, &Ceiling::default()).unwrap();
        let expected = vector::combinations(nbits, 2).unwrap() as u64;
        assert_eq!(coverage, Coverage::Checked { cases: expected });
    }

    #[test]
    fn test_exhaustive_skipped() {
        let mut checker = checker(7, 2, 8);
        let coverage = checker
            .exhaustive(2, &Ceiling { max_cases: 10 })
            .unwrap();
        let nbits = checker.nbits();
        assert_eq!(
            coverage,
            Coverage::Skipped {
                cases: vector::combinations(nbits, 2)
            }
        );
    }

    #[test_case(7, 4, 8, 4; "m7 t4")]
    #[test_case(9, 6, 32, 6; "m9 t6")]
    #[test_case(10, 3, 64, 1; "m10 t3 single")]
    fn test_bursts(m: u32, t: u32, len: usize, k: u32) {
        let mut checker = checker(m, t, len);
        let nbits = checker.nbits();
        assert_eq!(
            checker.bursts(k).unwrap(),
            Coverage::Checked {
                cases: (nbits - k + 1) as u64
            }
        );
    }

    #[test_traced]
    fn test_random() {
        let mut checker = checker(11, 8, 128);
        assert_eq!(
            checker.random(200, 11).unwrap(),
            Coverage::Checked { cases: 200 }
        );
    }

    #[test_case(7, 1; "m7 t1")]
    #[test_case(8, 4; "m8 t4")]
    #[test_case(13, 8; "m13 t8")]
    fn test_encode_layout(m: u32, t: u32) {
        let mut bch = Bch::new(m, t, None).unwrap();
        let len = (1 << (m - 1)) / 8;
        check_encode_chunks(&mut bch, len, m as u64).unwrap();
    }
}
