//! Cross-check a BCH codec against independent reference arithmetic.
//!
//! The harness never trusts the codec under test ([Codec]) to grade itself. Field arithmetic
//! is compared against a shift-and-reduce [field::Oracle], decoded error positions are
//! compared against the positions that were actually injected, and error-locator polynomials
//! are rebuilt from those positions by [locator::build].
//!
//! # Components
//!
//! * [linear]: conversion between linear bit indices and bit addresses.
//! * [vector]: exhaustive, burst, and seeded random error vectors.
//! * [checker]: corrupt, decode, restore, and compare.
//! * [bench]: calibrated decode latency measurement.
//! * [fault]: allocation failure injection during codec initialization.
//! * [roots]: cross-check of the codec's polynomial root finder.
//!
//! # Example
//!
//! ```
//! use eccheck_bch::Bch;
//! use eccheck_harness::{checker::Checker, Config};
//!
//! let config = Config::new(7, 4);
//! let bch = Bch::new(config.m, config.t, config.poly).unwrap();
//! let mut checker = Checker::new(bch, config.len, config.seed).unwrap();
//!
//! // Flip linear bits 3 and 40 and expect exactly those back.
//! assert_eq!(checker.check(&[3, 40]).unwrap(), 2);
//! ```

use thiserror::Error;

pub mod bench;
pub mod checker;
mod cut;
pub use cut::Codec;
pub mod fault;
pub mod field;
pub mod linear;
pub mod locator;
pub mod roots;
pub mod vector;

/// Violations detected by the harness.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{op} mismatch: x={x:#x} y={y:#x} expected={expected:#x} actual={actual:#x}")]
    FieldMismatch {
        op: &'static str,
        x: u32,
        y: u32,
        expected: u32,
        actual: u32,
    },
    #[error("polynomial {poly:#x} is not primitive of degree {m}")]
    NotPrimitive { m: u32, poly: u32 },
    #[error("locator mismatch: expected={expected:x?} actual={actual:x?}")]
    LocatorMismatch {
        expected: Vec<u32>,
        actual: Vec<u32>,
    },
    #[error("decode mismatch: injected={injected:?} reported={reported:?}")]
    DecodeMismatch {
        injected: Vec<u32>,
        reported: Vec<u32>,
    },
    #[error("decode failed: injected={injected:?}")]
    DecodeFailed { injected: Vec<u32> },
    #[error("parity mismatch ({case}): expected={expected:02x?} actual={actual:02x?}")]
    ParityMismatch {
        case: String,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
    #[error("root mismatch: poly={poly:x?} roots={roots:?} found={found}")]
    RootMismatch {
        poly: Vec<u32>,
        roots: Vec<u32>,
        found: usize,
    },
    #[error("leaked {blocks} blocks")]
    Leak { blocks: u64 },
    #[error("released {blocks} more blocks than were allocated")]
    OverFree { blocks: u64 },
    #[error("initialization succeeded despite fault {fault}")]
    UnexpectedInit { fault: u64 },
    #[error("codec error: {0}")]
    Codec(#[from] eccheck_bch::Error),
}

/// Parameters of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// The field order, `GF(2^m)`.
    pub m: u32,
    /// The correction capability, in bits.
    pub t: u32,
    /// The payload length, in bytes.
    pub len: usize,
    /// An explicit primitive polynomial (the codec default when `None`).
    pub poly: Option<u32>,
    /// Seed of the payload and of randomly drawn error vectors.
    pub seed: u64,
}

impl Config {
    /// Returns a configuration with a payload of `2^(m-1)` bits, seeded with `m`.
    pub fn new(m: u32, t: u32) -> Self {
        let len = 1usize
            .checked_shl(m.saturating_sub(1))
            .map_or(0, |bits| bits / 8);
        Self {
            m,
            t,
            len,
            poly: None,
            seed: m as u64,
        }
    }

    /// Ensure the codeword fits in the field.
    pub fn validate(&self) -> Result<(), Error> {
        use eccheck_bch::field::{MAX_ORDER, MIN_ORDER};
        if !(MIN_ORDER..=MAX_ORDER).contains(&self.m) {
            return Err(Error::Config(format!(
                "m={} outside of {MIN_ORDER}..={MAX_ORDER}",
                self.m
            )));
        }
        if self.t == 0 {
            return Err(Error::Config(String::from("t must be at least 1")));
        }
        if self.len == 0 {
            return Err(Error::Config(String::from("len must be at least 1")));
        }
        let bits = (self.len as u64)
            .checked_mul(8)
            .and_then(|bits| bits.checked_add(self.m as u64 * self.t as u64));
        if bits.map_or(true, |bits| bits >= 1 << self.m) {
            return Err(Error::Config(format!(
                "8*{} + {}*{} does not fit in GF(2^{})",
                self.len, self.m, self.t, self.m
            )));
        }
        Ok(())
    }
}

/// Outcome of an enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coverage {
    /// Every case was checked.
    Checked { cases: u64 },
    /// The run was too large to attempt. `cases` is `None` when the count overflows.
    Skipped { cases: Option<u128> },
}
