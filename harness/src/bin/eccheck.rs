//! Cross-check a BCH codec from the command line.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use eccheck_bch::{Bch, Received};
use eccheck_harness::{
    bench::{CpuClock, Engine, Settings},
    checker::{check_encode_chunks, Checker},
    fault::{self, FaultInjector, FaultPlan},
    field::{self, Oracle},
    linear::{flip, linearize},
    roots,
    vector::{self, Ceiling, Sampler},
    Config, Coverage, Error,
};
use std::{ops::RangeInclusive, process::ExitCode, time::Duration};
use tracing::{debug, error, info, warn};

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

const VERBOSE_FLAG: &str = "verbose";

const FIELD_CMD: &str = "field";
const ROOTS_CMD: &str = "roots";
const EXHAUSTIVE_CMD: &str = "exhaustive";
const BURST_CMD: &str = "burst";
const RANDOM_CMD: &str = "random";
const LAYOUT_CMD: &str = "layout";
const BENCH_CMD: &str = "bench";
const FAULTS_CMD: &str = "faults";
const DECODE_CMD: &str = "decode";

/// Random trials run when no iteration count is given.
const DEFAULT_ITERATIONS: u64 = 1_000_000;

/// Largest order for which every polynomial of degree at most 4 is checked by default.
const MAX_EXHAUSTIVE_ROOTS_ORDER: u32 = 7;

fn parse_poly(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid polynomial {s}: {e}"))
}

fn with_field_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("order")
                .short('m')
                .long("order")
                .help("Galois field order (all supported orders when omitted)")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("capability")
                .short('t')
                .long("capability")
                .help("Error correction capability, in bits")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("len")
                .short('l')
                .long("len")
                .help("Payload length, in bytes (2^(m-1) bits when omitted)")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("poly")
                .long("poly")
                .help(
                    "Primitive polynomial, decimal or 0x-prefixed hex (codec default when omitted)",
                )
                .value_parser(parse_poly),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for payloads and random draws (m when omitted)")
                .value_parser(value_parser!(u64)),
        )
}

fn iterations_arg() -> Arg {
    Arg::new("iterations")
        .long("iterations")
        .help("Number of random trials")
        .value_parser(value_parser!(u64))
}

fn command() -> Command {
    Command::new("eccheck")
        .version(crate_version())
        .about("Cross-check a BCH codec against independent reference arithmetic.")
        .subcommand_required(true)
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            with_field_args(Command::new(FIELD_CMD))
                .about("Compare field arithmetic against shift-and-reduce reference arithmetic.")
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Check every primitive polynomial of each order")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("cap")
                        .long("cap")
                        .help("Operand pairs checked before striding over the field")
                        .default_value("1048576")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            with_field_args(Command::new(ROOTS_CMD))
                .about("Check the root finder on polynomials of degree at most 4.")
                .arg(iterations_arg()),
        )
        .subcommand(
            with_field_args(Command::new(EXHAUSTIVE_CMD))
                .about("Decode every combination of k errors, for 2 <= k <= t <= capability.")
                .arg(
                    Arg::new("max-cases")
                        .long("max-cases")
                        .help("Skip runs with more combinations than this")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            with_field_args(Command::new(BURST_CMD))
                .about("Decode every burst of k errors, for 2 <= k <= t <= capability."),
        )
        .subcommand(
            with_field_args(Command::new(RANDOM_CMD))
                .about("Decode random vectors of 1 to t errors.")
                .arg(iterations_arg()),
        )
        .subcommand(
            with_field_args(Command::new(LAYOUT_CMD))
                .about("Check that parity does not depend on chunking or buffer offsets."),
        )
        .subcommand(
            with_field_args(Command::new(BENCH_CMD))
                .about("Measure decode latency for every error count.")
                .arg(
                    Arg::new("seconds")
                        .long("seconds")
                        .help("Measurement budget per configuration")
                        .default_value("1")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the calibration and every row as JSON lines")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            with_field_args(Command::new(FAULTS_CMD))
                .about("Inject allocation faults during initialization and check for leaks.")
                .arg(
                    Arg::new("period")
                        .long("period")
                        .help("Fail every n-th allocation")
                        .default_value("2")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            with_field_args(Command::new(DECODE_CMD))
                .about("Decode a buffer of 0xff bytes, optionally corrupted.")
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .help("Comma-separated linear bit indices to corrupt once")
                        .value_delimiter(',')
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("corrupt")
                        .long("corrupt")
                        .help("Random bits to corrupt on every iteration")
                        .default_value("0")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .help("Compute the parity delta once and decode from it")
                        .action(ArgAction::SetTrue),
                )
                .arg(iterations_arg()),
        )
}

fn orders(matches: &ArgMatches, default: RangeInclusive<u32>) -> Vec<u32> {
    match matches.get_one::<u32>("order") {
        Some(m) => vec![*m],
        None => default.collect(),
    }
}

fn capability(matches: &ArgMatches, default: u32) -> u32 {
    matches.get_one::<u32>("capability").copied().unwrap_or(default)
}

fn config(matches: &ArgMatches, m: u32, t: u32, default_len: Option<usize>) -> Config {
    let mut config = Config::new(m, t);
    if let Some(len) = matches.get_one::<usize>("len").copied().or(default_len) {
        config.len = len;
    }
    config.poly = matches.get_one::<u32>("poly").copied();
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    config
}

fn field(matches: &ArgMatches) -> Result<(), Error> {
    field::check_default_polynomials()?;
    let cap = matches
        .get_one::<u64>("cap")
        .copied()
        .unwrap_or(field::DEFAULT_SAMPLE_CAP);
    for m in orders(matches, 5..=15) {
        let polys = if matches.get_flag("all") {
            field::primitive_polynomials(m)
        } else {
            vec![matches
                .get_one::<u32>("poly")
                .copied()
                .or_else(|| eccheck_bch::field::default_polynomial(m))
                .ok_or_else(|| Error::Config(format!("unsupported order m={m}")))?]
        };
        for poly in polys {
            let bch = Bch::new(m, 2, Some(poly))?;
            let pairs = field::check_field(&bch, &Oracle::of(&bch), cap)?;
            info!(m, poly, pairs, "field operations match");
        }
    }
    Ok(())
}

fn roots(matches: &ArgMatches) -> Result<(), Error> {
    let iterations = matches.get_one::<u64>("iterations").copied();
    for m in orders(matches, 5..=15) {
        let config = config(matches, m, 4, None);
        let bch = Bch::new(m, config.t, config.poly)?;
        let oracle = Oracle::of(&bch);
        let checked = match iterations {
            None if m <= MAX_EXHAUSTIVE_ROOTS_ORDER => roots::exhaustive(&bch, &oracle)?,
            _ => roots::random(
                &bch,
                &oracle,
                iterations.unwrap_or(DEFAULT_ITERATIONS),
                config.seed,
            )?,
        };
        info!(m, checked, "root finder matches");
    }
    Ok(())
}

/// Run `f` for every valid configuration with `2 <= t <= tmax`.
fn for_each_config<F>(matches: &ArgMatches, mut f: F) -> Result<(), Error>
where
    F: FnMut(&Config) -> Result<(), Error>,
{
    let tmax = capability(matches, 2);
    for m in orders(matches, 7..=15) {
        for t in 2..=tmax {
            let config = config(matches, m, t, None);
            if let Err(err) = config.validate() {
                debug!(m, t, %err, "skipping configuration");
                continue;
            }
            f(&config)?;
        }
    }
    Ok(())
}

fn checker(config: &Config) -> Result<Checker<Bch>, Error> {
    let bch = Bch::new(config.m, config.t, config.poly)?;
    Checker::new(bch, config.len, config.seed)
}

fn exhaustive(matches: &ArgMatches) -> Result<(), Error> {
    let ceiling = match matches.get_one::<u64>("max-cases") {
        Some(max_cases) => Ceiling {
            max_cases: u128::from(*max_cases),
        },
        None => Ceiling::default(),
    };
    for_each_config(matches, |config| {
        let mut checker = checker(config)?;
        for k in 2..=config.t {
            match checker.exhaustive(k, &ceiling)? {
                Coverage::Checked { cases } => {
                    info!(m = config.m, t = config.t, k, cases, "checked")
                }
                Coverage::Skipped { .. } => {}
            }
        }
        Ok(())
    })
}

fn burst(matches: &ArgMatches) -> Result<(), Error> {
    for_each_config(matches, |config| {
        let mut checker = checker(config)?;
        for k in 2..=config.t {
            checker.bursts(k)?;
        }
        Ok(())
    })
}

fn random(matches: &ArgMatches) -> Result<(), Error> {
    let iterations = matches
        .get_one::<u64>("iterations")
        .copied()
        .unwrap_or(DEFAULT_ITERATIONS);
    let t = capability(matches, 4);
    for m in orders(matches, 7..=15) {
        let config = config(matches, m, t, None);
        if let Err(err) = config.validate() {
            debug!(m, t, %err, "skipping configuration");
            continue;
        }
        checker(&config)?.random(iterations, config.seed)?;
    }
    Ok(())
}

fn layout(matches: &ArgMatches) -> Result<(), Error> {
    let tmax = capability(matches, 4);
    for m in orders(matches, 7..=15) {
        for t in 1..=tmax {
            let config = config(matches, m, t, None);
            if let Err(err) = config.validate() {
                debug!(m, t, %err, "skipping configuration");
                continue;
            }
            let mut bch = Bch::new(m, t, config.poly)?;
            check_encode_chunks(&mut bch, config.len, config.seed)?;
            info!(m, t, len = config.len, "parity independent of layout");
        }
    }
    Ok(())
}

fn bench(matches: &ArgMatches) -> Result<(), Error> {
    let seconds = matches.get_one::<u64>("seconds").copied().unwrap_or(1);
    let json = matches.get_flag("json");
    let settings = Settings {
        budget: Duration::from_secs(seconds),
        ..Settings::default()
    };
    let t = capability(matches, 4);
    for m in orders(matches, 13..=13) {
        let config = config(matches, m, t, None);
        config.validate()?;
        let bch = Bch::new(m, t, config.poly)?;
        let mut engine = Engine::new(bch, config.len, config.seed, settings, CpuClock)?;
        let calibration = engine.calibrate()?;
        let rows = engine.run()?;
        if json {
            let encode = |e: serde_json::Error| Error::Config(e.to_string());
            println!("{}", serde_json::to_string(&calibration).map_err(encode)?);
            for row in &rows {
                println!("{}", serde_json::to_string(row).map_err(encode)?);
            }
        }
    }
    Ok(())
}

fn faults(matches: &ArgMatches) -> Result<(), Error> {
    let injector = FaultInjector::default();
    let only = matches.get_one::<u32>("order").copied();
    let configs = fault::representative_configs()
        .into_iter()
        .filter(|(m, _)| only.map_or(true, |only| only == *m));
    let checked = fault::check_clean(&injector, configs)?;
    info!(checked, "clean initializations released everything");

    let m = only.unwrap_or(13);
    let t = capability(matches, 4);
    let period = matches.get_one::<u64>("period").copied().unwrap_or(2);
    if !fault::check_fault(&injector, m, t, FaultPlan::Every(period))? {
        warn!(m, t, period, "no fault was injected");
    }
    let total = fault::sweep(&injector, m, t)?;
    info!(m, t, total, "every allocation failure released everything");
    Ok(())
}

fn decode(matches: &ArgMatches) -> Result<(), Error> {
    let m = matches.get_one::<u32>("order").copied().unwrap_or(13);
    let t = capability(matches, 4);
    let config = config(matches, m, t, Some(1 << m.saturating_sub(4)));
    config.validate()?;
    let corrupt = matches.get_one::<usize>("corrupt").copied().unwrap_or(0);
    let iterations = matches.get_one::<u64>("iterations").copied().unwrap_or(1);
    let cache = matches.get_flag("cache") && corrupt == 0;
    let bits: Vec<u32> = matches
        .get_many::<u32>("bits")
        .map(|bits| bits.copied().collect())
        .unwrap_or_default();

    let mut bch = Bch::new(m, t, config.poly)?;
    let len = config.len;
    let nbits = (len * 8 + bch.ecc_bits()) as u32;
    if corrupt > nbits as usize {
        return Err(Error::Config(format!("cannot corrupt {corrupt} of {nbits} bits")));
    }
    vector::validate(&bits, nbits)?;
    let pattern: Vec<u32> = bits.into_iter().map(linearize).collect();
    let mut buf = vec![0xffu8; len + bch.ecc_bytes()];
    buf[len..].fill(0);
    let (data, ecc) = buf.split_at_mut(len);
    bch.encode(data, ecc);
    flip(&mut buf, &pattern);

    let mut delta = vec![0u8; bch.ecc_bytes()];
    if cache {
        let (data, ecc) = buf.split_at(len);
        bch.encode(data, &mut delta);
        for (d, e) in delta.iter_mut().zip(ecc) {
            *d ^= *e;
        }
    }

    let mut sampler = Sampler::new(nbits, config.seed);
    let mut errloc = Vec::with_capacity(t as usize);
    let mut failures = 0u64;
    for _ in 0..iterations {
        let injected: Vec<u32> = sampler
            .sample(corrupt)
            .into_iter()
            .map(linearize)
            .collect();
        flip(&mut buf, &injected);
        let (data, ecc) = buf.split_at(len);
        let input = if cache {
            Received::EccDelta(&delta)
        } else {
            Received::Codeword { data, ecc }
        };
        let result = bch.decode(len, input, &mut errloc);
        flip(&mut buf, &injected);

        let count = match result {
            Ok(count) => count,
            Err(err) => {
                warn!(%err, "decoding failed");
                failures += 1;
                continue;
            }
        };
        let mut reported = errloc[..count].to_vec();
        reported.sort_unstable();
        for addr in &reported {
            debug!(bit = addr, byte = addr / 8, offset = addr % 8, "error");
        }
        if corrupt > 0 && corrupt <= t as usize && pattern.is_empty() {
            let mut injected = injected;
            injected.sort_unstable();
            if reported != injected {
                return Err(Error::DecodeMismatch { injected, reported });
            }
        }
        info!(count, errors = ?reported, "decoded");
    }
    info!(m, t, len, iterations, failures, "decode finished");
    Ok(())
}

fn main() -> ExitCode {
    let matches = command().get_matches();

    // Create logger
    let level = if matches.get_flag(VERBOSE_FLAG) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let result = match matches.subcommand() {
        Some((FIELD_CMD, matches)) => field(matches),
        Some((ROOTS_CMD, matches)) => roots(matches),
        Some((EXHAUSTIVE_CMD, matches)) => exhaustive(matches),
        Some((BURST_CMD, matches)) => burst(matches),
        Some((RANDOM_CMD, matches)) => random(matches),
        Some((LAYOUT_CMD, matches)) => layout(matches),
        Some((BENCH_CMD, matches)) => bench(matches),
        Some((FAULTS_CMD, matches)) => faults(matches),
        Some((DECODE_CMD, matches)) => decode(matches),
        Some((other, _)) => Err(Error::Config(format!("unknown command {other}"))),
        None => Err(Error::Config(String::from("no command given"))),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "check failed");
            ExitCode::FAILURE
        }
    }
}
