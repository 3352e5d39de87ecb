#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use eccheck_bch::Bch;
use eccheck_harness::checker::Checker;
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct FuzzInput {
    m: u32,
    t: u32,
    len: usize,
    seed: u64,
    positions: Vec<u32>,
}

impl<'a> Arbitrary<'a> for FuzzInput {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let m = u.int_in_range(5..=12)?;
        let n = (1u32 << m) - 1;
        let t = u.int_in_range(1..=16.min((n - 8) / m))?; // leave room for one byte
        let len = u.int_in_range(1..=(n - m * t) / 8)? as usize;
        let seed = u.arbitrary()?;
        let count = u.int_in_range(0..=t)?;
        let mut positions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            positions.push(u.arbitrary()?);
        }
        Ok(FuzzInput {
            m,
            t,
            len,
            seed,
            positions,
        })
    }
}

fn fuzz(input: FuzzInput) {
    let bch = match Bch::new(input.m, input.t, None) {
        Ok(bch) => bch,
        Err(e) => panic!("valid parameters rejected: {e:?}"),
    };
    let mut checker = match Checker::new(bch, input.len, input.seed) {
        Ok(checker) => checker,
        Err(_) => return,
    };

    let nbits = checker.nbits();
    let mut positions: Vec<u32> = input.positions.iter().map(|p| p % nbits).collect();
    positions.sort_unstable();
    positions.dedup();

    let before = checker.buffer().to_vec();
    if let Err(e) = checker.check(&positions) {
        panic!("check failed for {input:?}: {e}");
    }
    assert_eq!(checker.buffer(), &before[..], "buffer not restored");
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
