//! Encode data with binary BCH parity and correct bit errors in received codewords.
//!
//! A [Bch] handle is built for a Galois field order `m` (`GF(2^m)`) and a correction
//! capability `t`. Encoding appends `ecc_bytes` of parity to a payload of `len` bytes, and
//! decoding a corrupted codeword reports up to `t` bit addresses to flip back.
//!
//! # Bit addressing
//!
//! The codeword is the polynomial formed by the payload bits followed by the parity bits,
//! read most-significant-bit first within every byte. Error locations, however, are reported
//! as bit addresses into the byte buffer: an address `e` designates `buf[e / 8] & (1 << (e % 8))`,
//! where the parity bytes immediately follow the payload bytes.
//!
//! # Allocation
//!
//! Every table a handle owns is obtained through an [Allocator]. Initialization that fails
//! part-way returns every block it already obtained before reporting the failure, and dropping
//! (or [releasing](Bch::release)) a handle returns the rest.
//!
//! # Example
//!
//! ```
//! use eccheck_bch::{Bch, Received};
//!
//! let mut bch = Bch::new(7, 4, None).unwrap();
//! let mut data = vec![0xA5u8; 8];
//! let mut ecc = vec![0u8; bch.ecc_bytes()];
//! bch.encode(&data, &mut ecc);
//!
//! // Flip a single bit and recover its address.
//! data[2] ^= 1 << 3;
//! let mut errloc = Vec::new();
//! let count = bch
//!     .decode(data.len(), Received::Codeword { data: &data, ecc: &ecc }, &mut errloc)
//!     .unwrap();
//! assert_eq!(count, 1);
//! assert_eq!(errloc, vec![2 * 8 + 3]);
//! ```

use thiserror::Error;

mod alloc;
pub use alloc::{Allocator, Block, System};

mod codec;
pub use codec::{Bch, Received};

pub mod field;
pub use field::Field;

/// Errors that can occur when building a handle, encoding, or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameters: m={m} t={t}")]
    InvalidParameters { m: u32, t: u32 },
    #[error("polynomial {poly:#x} is not primitive of degree {m}")]
    InvalidPolynomial { poly: u32, m: u32 },
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid length: {len} bytes (max {max})")]
    InvalidLength { len: usize, max: usize },
    #[error("invalid parity: {len} elements (expected {expected})")]
    InvalidParity { len: usize, expected: usize },
    #[error("uncorrectable error pattern")]
    Uncorrectable,
}
