//! Calibrated decode latency measurement.
//!
//! An [Engine] first times a fixed `t`-error trial to choose how many decodes to run per
//! timed block (`niter`) and how many blocks to time per configuration (`nsamples`), then
//! measures every error count `0..=t` with and without cached parity.
//!
//! # Caching
//!
//! With caching, the parity delta of each corrupted buffer is computed once, outside of the
//! timed block, and the decoder only works from that delta. Without it, every decode
//! recomputes the parity of the whole payload.

use crate::{
    linear::{flip, linearize},
    vector::Sampler,
    Codec, Error,
};
use eccheck_bch::Received;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Source of elapsed time.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// CPU time consumed by the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuClock;

impl Clock for CpuClock {
    fn now(&self) -> Duration {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
        if rc != 0 {
            return Duration::ZERO;
        }
        Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
    }
}

/// Measurement budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Time to spend measuring each configuration.
    pub budget: Duration,
    /// Minimum duration of a timed block.
    pub min_block: Duration,
    /// Upper bound on decodes per timed block.
    pub max_niter: u64,
    /// Decodes timed during calibration.
    pub calibration_runs: u64,
    /// Blocks per configuration when calibration measures no time at all.
    pub default_samples: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(1),
            min_block: Duration::from_millis(10),
            max_niter: 100_000,
            calibration_runs: 100,
            default_samples: 10_000,
        }
    }
}

/// Result of calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Calibration {
    /// Measured cost of one decode, in microseconds.
    pub per_iteration_us: f64,
    /// Decodes per timed block.
    pub niter: u64,
    /// Timed blocks per configuration.
    pub nsamples: u64,
}

/// Progress of an [Engine].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum State {
    Uncalibrated,
    Calibrating,
    Steady(Calibration),
}

/// Latency of one configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub m: u32,
    pub t: u32,
    pub len: usize,
    /// Errors injected per decode.
    pub errors: usize,
    /// Whether the parity delta was computed outside of the timed block.
    pub cached: bool,
    /// Average decode latency, in microseconds.
    pub avg_us: f64,
    /// Worst block average, in microseconds.
    pub worst_us: f64,
    /// Payload bits decoded per second at the average latency.
    pub throughput: u64,
}

/// Decode benchmark over one encoded buffer.
pub struct Engine<C: Codec, K: Clock = CpuClock> {
    codec: C,
    clock: K,
    settings: Settings,
    state: State,
    len: usize,
    nbits: u32,
    buf: Vec<u8>,
    delta: Vec<u8>,
    errloc: Vec<u32>,
    addrs: Vec<u32>,
    sampler: Sampler,
}

impl<C: Codec, K: Clock> Engine<C, K> {
    /// Fill a payload of `len` bytes from `seed` and encode it with `codec`.
    pub fn new(
        mut codec: C,
        len: usize,
        seed: u64,
        settings: Settings,
        clock: K,
    ) -> Result<Self, Error> {
        let n = (1u64 << codec.m()) - 1;
        let nbits = len as u64 * 8 + codec.ecc_bits() as u64;
        if len == 0 || nbits > n {
            return Err(Error::Config(format!(
                "{len} bytes and {} parity bits do not fit in {n} bits",
                codec.ecc_bits()
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut buf = vec![0u8; len + codec.ecc_bytes()];
        rng.fill_bytes(&mut buf[..len]);
        let (data, ecc) = buf.split_at_mut(len);
        codec.encode(data, ecc);

        let t = codec.t() as usize;
        let delta = vec![0u8; codec.ecc_bytes()];
        Ok(Self {
            codec,
            clock,
            settings,
            state: State::Uncalibrated,
            len,
            nbits: nbits as u32,
            buf,
            delta,
            errloc: Vec::with_capacity(t),
            addrs: Vec::with_capacity(t),
            sampler: Sampler::new(nbits as u32, seed),
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Corrupt the linear `positions`, run `niter` decodes, restore the buffer, and verify
    /// the last decode. Returns the elapsed time in microseconds.
    fn trial(&mut self, positions: &[u32], cached: bool, niter: u64) -> Result<f64, Error> {
        self.addrs.clear();
        self.addrs.extend(positions.iter().map(|p| linearize(*p)));
        flip(&mut self.buf, &self.addrs);

        let len = self.len;
        let mut result = Ok(0);
        self.errloc.clear();
        let elapsed = if cached {
            let (data, ecc) = self.buf.split_at(len);
            self.delta.fill(0);
            self.codec.encode(data, &mut self.delta);
            for (d, e) in self.delta.iter_mut().zip(ecc) {
                *d ^= *e;
            }
            if self.delta.iter().any(|d| *d != 0) {
                let start = self.clock.now();
                for _ in 0..niter {
                    result =
                        self.codec
                            .decode(len, Received::EccDelta(&self.delta), &mut self.errloc);
                }
                self.clock.now().saturating_sub(start)
            } else {
                Duration::ZERO
            }
        } else {
            let (data, ecc) = self.buf.split_at(len);
            let start = self.clock.now();
            for _ in 0..niter {
                result = self.codec.decode(
                    len,
                    Received::Codeword { data, ecc },
                    &mut self.errloc,
                );
            }
            self.clock.now().saturating_sub(start)
        };
        flip(&mut self.buf, &self.addrs);

        let mut injected = self.addrs.clone();
        injected.sort_unstable();
        match result {
            Ok(count) => {
                let mut reported = self.errloc[..count.min(self.errloc.len())].to_vec();
                reported.sort_unstable();
                if reported != injected {
                    return Err(Error::DecodeMismatch { injected, reported });
                }
            }
            Err(eccheck_bch::Error::Uncorrectable) => {
                return Err(Error::DecodeFailed { injected })
            }
            Err(err) => return Err(err.into()),
        }
        Ok(elapsed.as_secs_f64() * 1e6)
    }

    /// Time a spread of `t` errors to derive `niter` and `nsamples`.
    pub fn calibrate(&mut self) -> Result<Calibration, Error> {
        self.state = State::Calibrating;
        let t = self.codec.t();
        let last = self.nbits as u64 - 1;
        let spread = if t >= 2 { t as u64 - 1 } else { 2 };
        let positions: Vec<u32> = (0..t as u64).map(|i| (i * last / spread) as u32).collect();

        let runs = self.settings.calibration_runs.max(1);
        let d = self.trial(&positions, false, runs)?;
        let min_block_us = self.settings.min_block.as_secs_f64() * 1e6;
        let budget_us = self.settings.budget.as_secs_f64() * 1e6;

        let niter = if d > 0.0 {
            (min_block_us * runs as f64 / d).floor() as u64
        } else {
            0
        };
        let niter = niter.clamp(1, self.settings.max_niter.max(1));
        let nsamples = if d > 0.0 {
            ((budget_us * runs as f64 / (d * niter as f64)).floor() as u64).max(1)
        } else {
            self.settings.default_samples.max(1)
        };

        let calibration = Calibration {
            per_iteration_us: d / runs as f64,
            niter,
            nsamples,
        };
        info!(
            m = self.codec.m(),
            t,
            per_iteration_us = calibration.per_iteration_us,
            niter,
            nsamples,
            "calibrated"
        );
        self.state = State::Steady(calibration);
        Ok(calibration)
    }

    /// Measure every error count with and without cached parity, calibrating first if needed.
    pub fn run(&mut self) -> Result<Vec<Row>, Error> {
        let calibration = match self.state {
            State::Steady(calibration) => calibration,
            State::Uncalibrated | State::Calibrating => self.calibrate()?,
        };
        let Calibration {
            niter, nsamples, ..
        } = calibration;
        let (m, t) = (self.codec.m(), self.codec.t());

        let mut rows = Vec::with_capacity(2 * (t as usize + 1));
        for cached in [true, false] {
            for errors in 0..=t as usize {
                let mut dsum = 0.0;
                let mut dmax = 0.0f64;
                for _ in 0..nsamples {
                    let positions = if errors > 0 {
                        self.sampler.sample(errors)
                    } else {
                        Vec::new()
                    };
                    let d = self.trial(&positions, cached, niter)?;
                    dmax = dmax.max(d);
                    dsum += d;
                }
                let avg_us = dsum / (nsamples as f64 * niter as f64);
                let throughput = if avg_us > 0.0 {
                    (self.len as f64 * 8.0 / (avg_us / 1e6)).floor() as u64
                } else {
                    0
                };
                let row = Row {
                    m,
                    t,
                    len: self.len,
                    errors,
                    cached,
                    avg_us,
                    worst_us: dmax / niter as f64,
                    throughput,
                };
                info!(
                    m,
                    t,
                    errors,
                    cached,
                    avg_us = row.avg_us,
                    worst_us = row.worst_us,
                    throughput,
                    "decode latency"
                );
                rows.push(row);
            }
        }
        Ok(rows)
    }
}
