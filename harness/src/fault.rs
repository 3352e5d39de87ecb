//! Allocation failure injection.
//!
//! A [FaultInjector] stands in for the codec's allocator, counts every allocation and
//! release, and refuses the allocations selected by its [FaultPlan]. Initialization must
//! return every block it obtained when it gives up part-way, and a released handle must
//! return the rest.

use crate::Error;
use eccheck_bch::{Allocator, Bch};
use std::cell::Cell;
use tracing::{debug, info, warn};

/// Contents of freshly allocated (non-zeroed) blocks.
const POISON: u32 = 0xdead_beef;

/// Which allocation calls fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPlan {
    /// Every call succeeds.
    #[default]
    Disabled,
    /// Calls `n`, `2n`, `3n`, ... fail.
    Every(u64),
    /// Only call `n` fails (counting from one).
    Once(u64),
}

/// Counting allocator that fails on demand.
#[derive(Debug, Default)]
pub struct FaultInjector {
    plan: Cell<FaultPlan>,
    calls: Cell<u64>,
    live: Cell<i64>,
    faults: Cell<u64>,
}

impl FaultInjector {
    pub fn new(plan: FaultPlan) -> Self {
        Self {
            plan: Cell::new(plan),
            ..Default::default()
        }
    }

    /// Clear all counters and switch to `plan`.
    pub fn reset(&self, plan: FaultPlan) {
        self.plan.set(plan);
        self.calls.set(0);
        self.live.set(0);
        self.faults.set(0);
    }

    /// Allocation calls made, including refused ones.
    pub fn calls(&self) -> u64 {
        self.calls.get()
    }

    /// Blocks handed out and not yet freed.
    pub fn live(&self) -> i64 {
        self.live.get()
    }

    /// Allocation calls refused.
    pub fn faults(&self) -> u64 {
        self.faults.get()
    }

    fn admit(&self, words: usize) -> bool {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        let fail = match self.plan.get() {
            FaultPlan::Disabled => false,
            FaultPlan::Every(n) => n > 0 && call % n == 0,
            FaultPlan::Once(n) => call == n,
        };
        if fail {
            self.faults.set(self.faults.get() + 1);
            warn!(call, words, "injecting allocation fault");
            return false;
        }
        self.live.set(self.live.get() + 1);
        true
    }
}

impl Allocator for FaultInjector {
    fn malloc(&self, words: usize) -> Option<Vec<u32>> {
        self.admit(words).then(|| vec![POISON; words])
    }

    fn calloc(&self, words: usize) -> Option<Vec<u32>> {
        self.admit(words).then(|| vec![0; words])
    }

    fn free(&self, block: Option<Vec<u32>>) {
        if block.is_some() {
            self.live.set(self.live.get() - 1);
        }
    }
}

/// Every valid `(m, t)` with `5 <= m <= 15` and `4 <= t <= 16`.
pub fn representative_configs() -> Vec<(u32, u32)> {
    (5..=15)
        .flat_map(|m| (4..=16).map(move |t| (m, t)))
        .filter(|(m, t)| m * t < (1 << m) - 1)
        .collect()
}

/// Requires every block handed out to have been returned exactly once.
fn ensure_released(injector: &FaultInjector) -> Result<(), Error> {
    match injector.live() {
        0 => Ok(()),
        live if live < 0 => Err(Error::OverFree {
            blocks: live.unsigned_abs(),
        }),
        live => Err(Error::Leak {
            blocks: live.unsigned_abs(),
        }),
    }
}

/// Initialize and release a codec for every configuration without faults, requiring no
/// outstanding blocks afterwards. Returns the number of configurations checked.
pub fn check_clean<I>(injector: &FaultInjector, configs: I) -> Result<usize, Error>
where
    I: IntoIterator<Item = (u32, u32)>,
{
    let mut checked = 0;
    for (m, t) in configs {
        injector.reset(FaultPlan::Disabled);
        let bch = Bch::new_in(m, t, None, injector)?;
        bch.release();
        ensure_released(injector)?;
        debug!(m, t, calls = injector.calls(), "clean initialization");
        checked += 1;
    }
    Ok(checked)
}

/// Initialize a codec under `plan`.
///
/// Initialization must fail if (and only if) a fault was injected, and must leave nothing
/// outstanding either way. Returns whether a fault was injected.
pub fn check_fault(
    injector: &FaultInjector,
    m: u32,
    t: u32,
    plan: FaultPlan,
) -> Result<bool, Error> {
    injector.reset(plan);
    let faulted = match Bch::new_in(m, t, None, injector) {
        Ok(bch) => {
            bch.release();
            if injector.faults() > 0 {
                return Err(Error::UnexpectedInit {
                    fault: injector.calls(),
                });
            }
            false
        }
        Err(eccheck_bch::Error::OutOfMemory) if injector.faults() > 0 => true,
        Err(err) => return Err(err.into()),
    };
    ensure_released(injector)?;
    Ok(faulted)
}

/// Fail each allocation of a clean initialization in turn.
///
/// Returns the number of allocations a clean initialization makes.
pub fn sweep(injector: &FaultInjector, m: u32, t: u32) -> Result<u64, Error> {
    check_fault(injector, m, t, FaultPlan::Disabled)?;
    let total = injector.calls();
    info!(m, t, total, "sweeping allocation faults");
    for n in 1..=total {
        if !check_fault(injector, m, t, FaultPlan::Once(n))? {
            return Err(Error::Config(format!("call {n} of {total} was never made")));
        }
    }
    Ok(total)
}
