//! MUM-HORS test harness.
//!
//! Generates the public keys of a seed, then signs and verifies a chain of messages
//! `m0 = H(seed)`, `m_{i+1} = H(m_i)`, and reports counts and timings.
//!
//! Usage:
//!   mumhors T K L R RT TESTS SEED_FILE [--window-size N] [--json]
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use mumhors::traits::{HashOracle, WindowReport};
use mumhors::{Blake2b256, Error, HorsParams, PublicKeyMatrix, Seed, Signer, Verifier};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mumhors")]
#[command(about = "Sign and verify a chain of messages with MUM-HORS", long_about = None)]
struct Cli {
    /// Number of columns, a power of two multiple of 8
    t: u32,
    /// Keys revealed per signature
    k: u32,
    /// Bit length of a key, 256
    l: u32,
    /// Rows of the key matrix
    r: u32,
    /// Rows kept in memory
    rt: u32,
    /// Number of messages to sign and verify
    tests: u64,
    /// File holding the seed
    seed_file: PathBuf,
    /// Available slots required before each message, defaults to T
    #[arg(long)]
    window_size: Option<u32>,
    /// Print one JSON object instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize, Debug)]
struct Outcome {
    params: HorsParams,
    keygen_ms: f64,
    keygen_us_per_key: f64,
    signed: u64,
    accepted: u64,
    rejected: u64,
    exhausted: bool,
    sign_us_avg: f64,
    verify_us_avg: f64,
    signer_window: WindowReport,
    verifier_window: WindowReport,
}

fn average_us(total: Duration, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total.as_secs_f64() * 1e6 / count as f64
}

fn run(cli: &Cli) -> Result<Outcome> {
    let mut params = HorsParams::new(cli.t, cli.k, cli.l, cli.r, cli.rt)?;
    if let Some(window_size) = cli.window_size {
        params = params.with_window_size(window_size)?;
    }

    let seed_bytes = std::fs::read(&cli.seed_file)
        .with_context(|| format!("reading seed file {}", cli.seed_file.display()))?;
    let seed = Seed::from_slice(&seed_bytes);
    let mut message = Blake2b256::digest(&[seed.as_ref()]);

    let start = Instant::now();
    let matrix = PublicKeyMatrix::from_seed(&seed, &params);
    let keygen = start.elapsed();
    info!(?keygen, keys = params.capacity(), "public keys generated");

    let mut signer: Signer = Signer::new(seed, params);
    let mut verifier: Verifier = Verifier::new(matrix, params)?;

    let (mut sign_time, mut verify_time) = (Duration::default(), Duration::default());
    let (mut signed, mut accepted, mut rejected) = (0u64, 0u64, 0u64);
    for _ in 0..cli.tests {
        let start = Instant::now();
        let sigma = match signer.sign(&message) {
            Ok(sigma) => sigma,
            Err(Error::RowExhaustion) => {
                warn!(signed, "key space exhausted, stopping");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        sign_time += start.elapsed();
        signed += 1;

        let start = Instant::now();
        let outcome = verifier.verify(&message, &sigma);
        verify_time += start.elapsed();
        match outcome {
            Ok(()) => accepted += 1,
            Err(e) => {
                warn!(error = %e, "signature rejected");
                rejected += 1;
            }
        }

        message = Blake2b256::digest(&[&message]);
    }

    Ok(Outcome {
        params,
        keygen_ms: keygen.as_secs_f64() * 1e3,
        keygen_us_per_key: average_us(keygen, params.capacity()),
        signed,
        accepted,
        rejected,
        exhausted: signer.is_exhausted(),
        sign_us_avg: average_us(sign_time, signed),
        verify_us_avg: average_us(verify_time, signed),
        signer_window: signer.report(),
        verifier_window: verifier.report(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = run(&cli)?;

    if cli.json {
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    println!(
        "t = {}, k = {}, l = {}, r = {}, rt = {}, window = {}",
        outcome.params.t(),
        outcome.params.k(),
        outcome.params.l(),
        outcome.params.r(),
        outcome.params.rt(),
        outcome.params.window_size()
    );
    println!(
        "keygen: {:.3} ms ({:.3} us per key)",
        outcome.keygen_ms, outcome.keygen_us_per_key
    );
    println!(
        "signed: {}, accepted: {}, rejected: {}{}",
        outcome.signed,
        outcome.accepted,
        outcome.rejected,
        if outcome.exhausted { " (exhausted)" } else { "" }
    );
    println!(
        "sign: {:.3} us avg, verify: {:.3} us avg",
        outcome.sign_us_avg, outcome.verify_us_avg
    );
    let w = outcome.signer_window;
    println!(
        "window: {} replenish calls, {} rows admitted, {} cleaned, {} evicted ({} slots discarded)",
        w.replenish_calls, w.rows_admitted, w.rows_cleaned, w.direct_evictions, w.discarded_slots
    );
    Ok(())
}
