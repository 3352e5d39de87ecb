use crate::{field::Field, Allocator, Block, Error, System};
use tracing::debug;

/// Input to [Bch::decode].
#[derive(Clone, Copy, Debug)]
pub enum Received<'a> {
    /// The received payload and parity. The parity of `data` is recomputed and compared.
    Codeword { data: &'a [u8], ecc: &'a [u8] },
    /// The XOR of the parity calculated over the received payload and the received parity.
    ///
    /// Callers decoding many corruptions of one payload can compute this once.
    EccDelta(&'a [u8]),
    /// Syndromes `S_1..S_2t`, in that order.
    Syndromes(&'a [u32]),
}

/// A binary BCH codec over `GF(2^m)` correcting up to `t` bit errors.
pub struct Bch<A: Allocator = System> {
    t: u32,
    ecc_bits: usize,
    ecc_bytes: usize,
    // Words needed to hold `m*t` parity bits, left-aligned.
    words: usize,
    field: Field<A>,
    // Remainder of `u * X^ecc_bits` modulo the generator, for every byte `u`.
    mod8: Block<A>,
    // Generator polynomial without its leading term, left-aligned.
    generator: Block<A>,
    ecc: Block<A>,
    ecc2: Block<A>,
    syn: Block<A>,
    elp: Block<A>,
    pelp: Block<A>,
    scratch: Block<A>,
    // Degree of the locator computed by the last decode, if any.
    elp_deg: Option<usize>,
}

impl Bch<System> {
    /// Build a codec using the global allocator.
    ///
    /// The default primitive polynomial of degree `m` is used when `poly` is `None`.
    pub fn new(m: u32, t: u32, poly: Option<u32>) -> Result<Self, Error> {
        Self::new_in(m, t, poly, System)
    }
}

impl<A: Allocator + Clone> Bch<A> {
    /// Build a codec obtaining every table from `alloc`.
    ///
    /// Fails with [Error::OutOfMemory] if any allocation is refused, in which case every block
    /// obtained so far has already been returned to `alloc`.
    pub fn new_in(m: u32, t: u32, poly: Option<u32>, alloc: A) -> Result<Self, Error> {
        if !(crate::field::MIN_ORDER..=crate::field::MAX_ORDER).contains(&m)
            || t < 1
            || m.checked_mul(t).map_or(true, |bits| bits >= (1 << m) - 1)
        {
            return Err(Error::InvalidParameters { m, t });
        }
        let field = Field::new_in(m, poly, &alloc)?;

        let words = (m * t).div_ceil(32) as usize;
        let mut mod8 = Block::malloc(&alloc, 256 * words)?;
        let ecc = Block::malloc(&alloc, words)?;
        let ecc2 = Block::malloc(&alloc, words)?;
        let syn = Block::malloc(&alloc, 2 * t as usize)?;
        let elp = Block::malloc(&alloc, 2 * t as usize + 1)?;
        let pelp = Block::malloc(&alloc, 2 * t as usize + 1)?;
        let scratch = Block::malloc(&alloc, 2 * t as usize + 1)?;
        let (generator, ecc_bits) = generator_polynomial(&field, t, words, &alloc)?;

        // Tabulate the byte-wise remainders.
        for (u, row) in mod8.chunks_exact_mut(words).enumerate() {
            row.fill(0);
            shift_in(&generator, row, u as u8);
        }

        debug!(m, t, ecc_bits, poly = field.polynomial(), "initialized codec");
        Ok(Self {
            t,
            ecc_bits,
            ecc_bytes: ecc_bits.div_ceil(8),
            words,
            field,
            mod8,
            generator,
            ecc,
            ecc2,
            syn,
            elp,
            pelp,
            scratch,
            elp_deg: None,
        })
    }
}

impl<A: Allocator> Bch<A> {
    /// The field order `m`.
    pub fn m(&self) -> u32 {
        self.field.order()
    }

    /// The correction capability `t`.
    pub fn t(&self) -> u32 {
        self.t
    }

    /// The number of parity bits (the degree of the generator polynomial).
    pub fn ecc_bits(&self) -> usize {
        self.ecc_bits
    }

    /// The number of bytes needed to store the parity bits.
    pub fn ecc_bytes(&self) -> usize {
        self.ecc_bytes
    }

    /// The largest payload, in bytes, that fits in a codeword.
    pub fn max_len(&self) -> usize {
        (self.field.n() as usize - self.ecc_bits) / 8
    }

    /// The underlying field.
    pub fn field(&self) -> &Field<A> {
        &self.field
    }

    /// The generator polynomial as bits, highest degree first, including the leading term.
    pub fn generator(&self) -> Vec<u8> {
        let mut bits = Vec::with_capacity(self.ecc_bits + 1);
        bits.push(1);
        bits.extend((0..self.ecc_bits).map(|b| bit(&self.generator, b) as u8));
        bits
    }

    /// Accumulate the parity of `data` into `ecc`.
    ///
    /// `ecc` holds the running remainder: when it is zeroed the result is the parity of
    /// `data`, and encoding consecutive chunks yields the parity of their concatenation.
    ///
    /// # Panics
    ///
    /// Panics if `ecc` is shorter than [Bch::ecc_bytes].
    pub fn encode(&mut self, data: &[u8], ecc: &mut [u8]) {
        let ecc = &mut ecc[..self.ecc_bytes];
        load(&mut self.ecc, ecc, self.ecc_bits);
        feed(&self.mod8, self.words, &mut self.ecc, data);
        store(&self.ecc, ecc);
    }

    /// Compute the syndromes `S_1..S_2t` of a received codeword.
    pub fn syndromes(&mut self, data: &[u8], ecc: &[u8]) -> Result<Vec<u32>, Error> {
        self.check_length(data.len())?;
        self.delta(data, ecc)?;
        self.compute_syndromes();
        Ok(self.syn.to_vec())
    }

    fn check_length(&self, len: usize) -> Result<usize, Error> {
        let n = self.field.n() as usize;
        len.checked_mul(8)
            .and_then(|bits| bits.checked_add(self.ecc_bits))
            .filter(|nbits| *nbits <= n)
            .ok_or(Error::InvalidLength {
                len,
                max: self.max_len(),
            })
    }

    fn check_parity(&self, ecc: &[u8]) -> Result<(), Error> {
        if ecc.len() < self.ecc_bytes {
            return Err(Error::InvalidParity {
                len: ecc.len(),
                expected: self.ecc_bytes,
            });
        }
        Ok(())
    }

    // Leaves the XOR of calculated and received parity in `self.ecc`.
    fn delta(&mut self, data: &[u8], ecc: &[u8]) -> Result<(), Error> {
        self.check_parity(ecc)?;
        self.ecc.fill(0);
        feed(&self.mod8, self.words, &mut self.ecc, data);
        load(&mut self.ecc2, &ecc[..self.ecc_bytes], self.ecc_bits);
        for (calc, recv) in self.ecc.iter_mut().zip(self.ecc2.iter()) {
            *calc ^= *recv;
        }
        Ok(())
    }

    fn compute_syndromes(&mut self) {
        let t = self.t as usize;
        let field = &self.field;
        let syn = &mut self.syn[..];
        syn.fill(0);
        for b in (0..self.ecc_bits).filter(|b| bit(&self.ecc, *b)) {
            let degree = (self.ecc_bits - 1 - b) as i64;
            for j in 0..t {
                syn[2 * j] ^= field.pow((2 * j as i64 + 1) * degree);
            }
        }
        // S_2j = S_j^2 over GF(2^m).
        for j in 0..t {
            syn[2 * j + 1] = field.sqr(syn[j]);
        }
    }

    /// Decode a received codeword of `len` payload bytes.
    ///
    /// On success, returns the number of errors and leaves their bit addresses in `errloc`
    /// (in no particular order). An address `e` refers to bit `e % 8` of byte `e / 8`, where
    /// byte `len` is the first parity byte.
    pub fn decode(
        &mut self,
        len: usize,
        input: Received<'_>,
        errloc: &mut Vec<u32>,
    ) -> Result<usize, Error> {
        errloc.clear();
        self.elp_deg = None;
        let nbits = self.check_length(len)?;

        match input {
            Received::Codeword { data, ecc } => {
                if data.len() != len {
                    return Err(Error::InvalidLength {
                        len: data.len(),
                        max: self.max_len(),
                    });
                }
                self.delta(data, ecc)?;
                if self.ecc.iter().all(|w| *w == 0) {
                    return Ok(0);
                }
                self.compute_syndromes();
            }
            Received::EccDelta(delta) => {
                self.check_parity(delta)?;
                load(&mut self.ecc, &delta[..self.ecc_bytes], self.ecc_bits);
                if self.ecc.iter().all(|w| *w == 0) {
                    return Ok(0);
                }
                self.compute_syndromes();
            }
            Received::Syndromes(syn) => {
                if syn.len() != self.syn.len() {
                    return Err(Error::InvalidParity {
                        len: syn.len(),
                        expected: self.syn.len(),
                    });
                }
                self.syn.copy_from_slice(syn);
            }
        }

        let deg = self.berlekamp_massey()?;
        self.elp_deg = Some(deg);
        if deg == 0 {
            return Ok(0);
        }

        // Chien search over the positions of the shortened code.
        let field = &self.field;
        let elp = &self.elp[..=deg];
        for d in 0..nbits {
            let mut acc = 0;
            for (j, c) in elp.iter().enumerate().filter(|(_, c)| **c != 0) {
                acc ^= field.pow(field.log(*c) as i64 - (j * d) as i64);
            }
            if acc == 0 {
                errloc.push(swap_bit_order((nbits - 1 - d) as u32));
            }
        }
        if errloc.len() != deg {
            errloc.clear();
            return Err(Error::Uncorrectable);
        }
        Ok(deg)
    }

    // Binary Berlekamp-Massey: only odd syndromes need a discrepancy update.
    fn berlekamp_massey(&mut self) -> Result<usize, Error> {
        let t = self.t as usize;
        let field = &self.field;
        let syn = &self.syn[..];
        let elp = &mut self.elp[..];
        let pelp = &mut self.pelp[..];
        let copy = &mut self.scratch[..];

        elp.fill(0);
        pelp.fill(0);
        elp[0] = 1;
        pelp[0] = 1;
        let (mut deg, mut pdeg) = (0usize, 0usize);
        let mut pp: i64 = -1;
        let mut pd = 1u32;
        let mut d = syn[0];

        for i in 0..t {
            if deg > t {
                break;
            }
            if d != 0 {
                let k = (2 * i as i64 - pp) as usize;
                copy[..=deg].copy_from_slice(&elp[..=deg]);
                let scale = field.div(d, pd);
                for j in (0..=pdeg).filter(|j| pelp[*j] != 0) {
                    let coeff = elp.get_mut(j + k).ok_or(Error::Uncorrectable)?;
                    *coeff ^= field.mul(scale, pelp[j]);
                }
                if pdeg + k > deg {
                    let next = pdeg + k;
                    pelp.fill(0);
                    pelp[..=deg].copy_from_slice(&copy[..=deg]);
                    pdeg = deg;
                    deg = next;
                    pd = d;
                    pp = 2 * i as i64;
                }
            }
            if i + 1 < t {
                d = syn[2 * i + 2];
                for j in 1..=deg.min(2 * i + 2) {
                    d ^= field.mul(elp[j], syn[2 * i + 2 - j]);
                }
            }
        }
        if deg > t {
            return Err(Error::Uncorrectable);
        }
        Ok(deg)
    }

    /// The error-locator polynomial found by the last successful decode, lowest degree first.
    ///
    /// Its constant term is always one.
    pub fn locator(&self) -> Option<&[u32]> {
        self.elp_deg.map(|deg| &self.elp[..=deg])
    }

    /// Find the roots of `poly` (lowest degree first) among the non-zero field elements.
    ///
    /// Returns every exponent `e` in `[0, 2^m - 1)` with `poly(α^-e) = 0` when there are as
    /// many as the degree of `poly`, and nothing otherwise.
    pub fn find_roots(&self, poly: &[u32]) -> Vec<u32> {
        let Some(deg) = poly.iter().rposition(|c| *c != 0) else {
            return Vec::new();
        };
        if deg == 0 {
            return Vec::new();
        }
        let field = &self.field;
        let roots: Vec<u32> = (0..field.n())
            .filter(|e| {
                poly[..=deg]
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c != 0)
                    .fold(0, |acc, (j, c)| {
                        acc ^ field.pow(field.log(*c) as i64 - j as i64 * *e as i64)
                    })
                    == 0
            })
            .collect();
        if roots.len() != deg {
            return Vec::new();
        }
        roots
    }

    /// Return every table to the allocator.
    pub fn release(self) {
        drop(self)
    }
}

// The generator is the product of the minimal polynomials of α, α^3, ..., α^(2t-1),
// i.e. of `X + α^r` for every `r` in their cyclotomic cosets.
fn generator_polynomial<A: Allocator + Clone>(
    field: &Field<A>,
    t: u32,
    words: usize,
    alloc: &A,
) -> Result<(Block<A>, usize), Error> {
    let n = field.n() as usize;
    let m = field.order();
    let mut roots = Block::calloc(alloc, n)?;
    for i in 0..t as usize {
        let mut r = 2 * i + 1;
        for _ in 0..m {
            roots[r] = 1;
            r = (2 * r) % n;
        }
    }

    let mut genpoly = Block::malloc(alloc, (m * t) as usize + 1)?;
    genpoly[0] = 1;
    let mut deg = 0;
    for (i, _) in roots.iter().enumerate().filter(|(_, r)| **r != 0) {
        let r = field.pow(i as i64);
        genpoly[deg + 1] = 1;
        for j in (1..=deg).rev() {
            genpoly[j] = field.mul(genpoly[j], r) ^ genpoly[j - 1];
        }
        genpoly[0] = field.mul(genpoly[0], r);
        deg += 1;
    }

    let mut generator = Block::calloc(alloc, words)?;
    for i in 0..deg {
        debug_assert!(genpoly[i] <= 1, "generator coefficient outside GF(2)");
        if genpoly[i] != 0 {
            let b = deg - 1 - i;
            generator[b / 32] |= 1 << (31 - b % 32);
        }
    }
    Ok((generator, deg))
}

/// Returns parity bit `b`, counted from the highest degree.
#[inline]
fn bit(words: &[u32], b: usize) -> bool {
    (words[b / 32] >> (31 - b % 32)) & 1 == 1
}

#[inline]
fn shift_left(words: &mut [u32], s: u32) {
    debug_assert!(0 < s && s < 32);
    for i in 0..words.len() {
        let carry = words.get(i + 1).map_or(0, |next| next >> (32 - s));
        words[i] = (words[i] << s) | carry;
    }
}

// Bit-serial LFSR step over the byte `u`, most significant bit first.
fn shift_in(generator: &[u32], rem: &mut [u32], u: u8) {
    for k in (0..8).rev() {
        let feedback = ((u >> k) & 1) as u32 ^ (rem[0] >> 31);
        shift_left(rem, 1);
        if feedback != 0 {
            for (r, g) in rem.iter_mut().zip(generator) {
                *r ^= *g;
            }
        }
    }
}

// Byte-wise LFSR over `data` using the remainder table.
fn feed(mod8: &[u32], words: usize, rem: &mut [u32], data: &[u8]) {
    for byte in data {
        let u = ((rem[0] >> 24) as u8 ^ byte) as usize;
        shift_left(rem, 8);
        for (r, t) in rem.iter_mut().zip(&mod8[u * words..(u + 1) * words]) {
            *r ^= *t;
        }
    }
}

// Load parity bytes into left-aligned words, clearing bits past `bits`.
fn load(rem: &mut [u32], ecc: &[u8], bits: usize) {
    rem.fill(0);
    for (i, byte) in ecc.iter().enumerate() {
        rem[i / 4] |= (*byte as u32) << (24 - 8 * (i % 4));
    }
    let (full, part) = (bits / 32, bits % 32);
    let mut start = full;
    if part != 0 {
        rem[full] &= u32::MAX << (32 - part);
        start += 1;
    }
    rem[start..].fill(0);
}

fn store(rem: &[u32], ecc: &mut [u8]) {
    for (i, byte) in ecc.iter_mut().enumerate() {
        *byte = (rem[i / 4] >> (24 - 8 * (i % 4))) as u8;
    }
}

// Codeword bit `i` (most significant bit first) lives at address `i` with its bit order
// reversed within the byte.
#[inline]
fn swap_bit_order(i: u32) -> u32 {
    (i & !7) | (7 - (i & 7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eccheck_macros::test_traced;
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use test_case::test_case;

    fn payload(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        data
    }

    fn flip(buf: &mut [u8], addr: u32) {
        buf[addr as usize / 8] ^= 1 << (addr % 8);
    }

    #[test_case(5, 2, 10; "m5 t2")]
    #[test_case(7, 4, 28; "m7 t4")]
    #[test_case(8, 4, 32; "m8 t4")]
    #[test_case(13, 4, 52; "m13 t4")]
    #[test_case(13, 8, 104; "m13 t8")]
    fn test_parity_size(m: u32, t: u32, ecc_bits: usize) {
        let bch = Bch::new(m, t, None).unwrap();
        assert_eq!(bch.ecc_bits(), ecc_bits);
        assert_eq!(bch.ecc_bytes(), ecc_bits.div_ceil(8));
    }

    #[test]
    fn test_generator_for_m5_t2() {
        // (X^5 + X^2 + 1)(X^5 + X^4 + X^3 + X^2 + 1) = X^10 + X^9 + X^8 + X^6 + X^5 + X^3 + 1
        let bch = Bch::new(5, 2, None).unwrap();
        assert_eq!(bch.generator(), vec![1, 1, 1, 0, 1, 1, 0, 1, 0, 0, 1]);
    }

    #[test_case(4, 2; "order too small")]
    #[test_case(16, 2; "order too large")]
    #[test_case(7, 0; "no capability")]
    #[test_case(5, 7; "capability too large")]
    fn test_invalid_parameters(m: u32, t: u32) {
        assert!(matches!(
            Bch::new(m, t, None),
            Err(Error::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_codeword_is_multiple_of_generator() {
        // Every codeword has zero syndromes.
        let mut bch = Bch::new(8, 6, None).unwrap();
        let data = payload(16, 1);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);
        let syn = bch.syndromes(&data, &ecc).unwrap();
        assert!(syn.iter().all(|s| *s == 0));
    }

    #[test]
    fn test_incremental_encoding() {
        let mut bch = Bch::new(10, 5, None).unwrap();
        let data = payload(64, 2);
        let mut whole = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut whole);
        let mut chunked = vec![0u8; bch.ecc_bytes()];
        for chunk in data.chunks(7) {
            bch.encode(chunk, &mut chunked);
        }
        assert_eq!(whole, chunked);
    }

    #[test]
    fn test_parity_padding_is_zero() {
        // 28 parity bits: the low nibble of the last byte is padding.
        let mut bch = Bch::new(7, 4, None).unwrap();
        for seed in 0..16 {
            let data = payload(8, seed);
            let mut ecc = vec![0u8; bch.ecc_bytes()];
            bch.encode(&data, &mut ecc);
            assert_eq!(ecc[3] & 0x0f, 0);
        }
    }

    #[test_traced]
    fn test_decode_clean_codeword() {
        let mut bch = Bch::new(7, 4, None).unwrap();
        let data = payload(8, 3);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);
        let mut errloc = vec![42];
        let count = bch
            .decode(8, Received::Codeword { data: &data, ecc: &ecc }, &mut errloc)
            .unwrap();
        assert_eq!(count, 0);
        assert!(errloc.is_empty());
    }

    #[test_case(7, 4, 8; "m7 t4")]
    #[test_case(8, 8, 12; "m8 t8")]
    #[test_case(11, 3, 100; "m11 t3")]
    #[test_case(13, 4, 512; "m13 t4")]
    fn test_decode_random_errors(m: u32, t: u32, len: usize) {
        let mut bch = Bch::new(m, t, None).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(m as u64);
        let data = payload(len, m as u64);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);
        let nbits = (len * 8 + bch.ecc_bits()) as u32;

        for _ in 0..50 {
            let count = rng.gen_range(1..=t as usize);
            let mut injected = Vec::new();
            while injected.len() < count {
                let addr = swap_bit_order(rng.gen_range(0..nbits));
                if !injected.contains(&addr) {
                    injected.push(addr);
                }
            }

            let mut received = data.clone();
            received.extend_from_slice(&ecc);
            for addr in &injected {
                flip(&mut received, *addr);
            }
            let (rdata, recc) = received.split_at(len);
            let mut errloc = Vec::new();
            let found = bch
                .decode(len, Received::Codeword { data: rdata, ecc: recc }, &mut errloc)
                .unwrap();
            assert_eq!(found, count);

            injected.sort_unstable();
            errloc.sort_unstable();
            assert_eq!(errloc, injected);

            // Correcting restores the original codeword.
            for addr in &errloc {
                flip(&mut received, *addr);
            }
            assert_eq!(&received[..len], &data[..]);
            assert_eq!(&received[len..], &ecc[..]);
        }
    }

    #[test]
    fn test_decode_modes_agree() {
        let mut bch = Bch::new(9, 5, None).unwrap();
        let len = 32;
        let data = payload(len, 4);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);

        let mut corrupted = data.clone();
        flip(&mut corrupted, 5);
        flip(&mut corrupted, 77);
        flip(&mut corrupted, 200);

        let mut by_codeword = Vec::new();
        bch.decode(
            len,
            Received::Codeword {
                data: &corrupted,
                ecc: &ecc,
            },
            &mut by_codeword,
        )
        .unwrap();

        let mut delta = vec![0u8; bch.ecc_bytes()];
        bch.encode(&corrupted, &mut delta);
        for (d, e) in delta.iter_mut().zip(&ecc) {
            *d ^= *e;
        }
        let mut by_delta = Vec::new();
        bch.decode(len, Received::EccDelta(&delta), &mut by_delta)
            .unwrap();

        let syn = bch.syndromes(&corrupted, &ecc).unwrap();
        let mut by_syndromes = Vec::new();
        bch.decode(len, Received::Syndromes(&syn), &mut by_syndromes)
            .unwrap();

        for errloc in [&mut by_codeword, &mut by_delta, &mut by_syndromes] {
            errloc.sort_unstable();
            assert_eq!(*errloc, vec![5, 77, 200]);
        }
    }

    #[test]
    fn test_locator_is_normalized() {
        let mut bch = Bch::new(7, 4, None).unwrap();
        let data = payload(8, 5);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);
        let mut corrupted = data.clone();
        flip(&mut corrupted, 12);
        flip(&mut corrupted, 30);
        let mut errloc = Vec::new();
        bch.decode(
            8,
            Received::Codeword {
                data: &corrupted,
                ecc: &ecc,
            },
            &mut errloc,
        )
        .unwrap();
        let elp = bch.locator().unwrap();
        assert_eq!(elp.len(), 3);
        assert_eq!(elp[0], 1);
        assert_ne!(elp[2], 0);
    }

    #[test]
    fn test_decode_rejects_long_payload() {
        let mut bch = Bch::new(7, 4, None).unwrap();
        let max = bch.max_len();
        assert_eq!(max, 12);
        let data = vec![0u8; max + 1];
        let ecc = vec![0u8; bch.ecc_bytes()];
        let mut errloc = Vec::new();
        assert_eq!(
            bch.decode(
                max + 1,
                Received::Codeword {
                    data: &data,
                    ecc: &ecc
                },
                &mut errloc
            ),
            Err(Error::InvalidLength { len: 13, max: 12 })
        );
    }

    #[test]
    fn test_decode_rejects_short_parity() {
        let mut bch = Bch::new(7, 4, None).unwrap();
        let mut errloc = Vec::new();
        assert_eq!(
            bch.decode(8, Received::EccDelta(&[0u8; 2]), &mut errloc),
            Err(Error::InvalidParity {
                len: 2,
                expected: 4
            })
        );
    }

    #[test]
    fn test_find_roots() {
        let bch = Bch::new(6, 2, None).unwrap();
        let field = bch.field();
        // (1 + α^4 X)(1 + α^9 X) vanishes at α^-4 and α^-9.
        let (a, b) = (field.pow(4), field.pow(9));
        let poly = [1, a ^ b, field.mul(a, b)];
        let mut roots = bch.find_roots(&poly);
        roots.sort_unstable();
        assert_eq!(roots, vec![4, 9]);

        // X^2 + X + 1 splits in GF(4), a subfield of GF(2^6).
        let roots = bch.find_roots(&[1, 1, 1]);
        assert_eq!(roots.len(), 2);

        // Constant polynomials have no roots.
        assert!(bch.find_roots(&[5]).is_empty());
        assert!(bch.find_roots(&[]).is_empty());
    }

    #[test]
    fn test_explicit_polynomial() {
        // X^7 + X^3 + 1 is primitive.
        let mut bch = Bch::new(7, 3, Some(0x89)).unwrap();
        assert_eq!(bch.field().polynomial(), 0x89);
        let data = payload(4, 6);
        let mut ecc = vec![0u8; bch.ecc_bytes()];
        bch.encode(&data, &mut ecc);
        let mut corrupted = data.clone();
        flip(&mut corrupted, 9);
        let mut errloc = Vec::new();
        let count = bch
            .decode(
                4,
                Received::Codeword {
                    data: &corrupted,
                    ecc: &ecc,
                },
                &mut errloc,
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(errloc, vec![9]);
    }
}
