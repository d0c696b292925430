//! sumchain - certified accumulator driver
//!
//! Benchmarks every transition of the accumulator program and exposes
//! small tools to produce and check serialized proofs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::Rng;
use sumchain::{
    fp_from_u64, fp_to_hex, Chain, Fp, Program, ProgramConfig, Proof, VerificationKey, GROUPS,
    GROUP_SIZE,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sumchain")]
#[command(about = "Recursively composable accumulator with certified transitions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Time every transition on the reference workload
    Bench {
        /// addNumber steps appended after the merge
        #[arg(short, long, default_value = "8")]
        chain: usize,

        /// Key seed as 64 hex characters (random when omitted)
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Show constraint counts per method
    Analyze,

    /// Build the reference proof tree and write proof.json and vk.json
    ProveDemo {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Key seed as 64 hex characters (random when omitted)
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Check a serialized proof against a verification key
    Verify {
        #[arg(short, long)]
        proof: PathBuf,

        #[arg(short, long)]
        vk: PathBuf,
    },

    /// Show program info
    Info,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("sumchain=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Bench { chain, seed } => run_benchmark(chain, parse_seed(seed)?),
        Command::Analyze => analyze(),
        Command::ProveDemo { out, seed } => prove_demo(&out, parse_seed(seed)?),
        Command::Verify { proof, vk } => verify(&proof, &vk),
        Command::Info => {
            show_info();
            Ok(())
        }
    }
}

fn parse_seed(seed: Option<String>) -> Result<Option<[u8; 32]>> {
    let Some(seed) = seed else {
        return Ok(None);
    };
    let bytes = hex::decode(seed.trim()).context("seed is not hex")?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("seed must be 32 bytes"))?;
    Ok(Some(seed))
}

fn compile(seed: Option<[u8; 32]>) -> Result<Program> {
    let mut config = ProgramConfig::default();
    config.seed = seed;

    tracing::info!("compiling {}", config.name);
    let start = Instant::now();
    let program = Program::compile(config)?;
    println!("Compile time {:.3}s", start.elapsed().as_secs_f64());
    Ok(program)
}

/// random batch witness: 84 three-bit digits, most significant first
fn random_batch_witness() -> (Fp, Vec<u64>) {
    let mut rng = rand::thread_rng();
    let digits: Vec<u64> = (0..GROUPS).map(|_| rng.gen_range(0..1u64 << GROUP_SIZE)).collect();
    let radix = fp_from_u64(1 << GROUP_SIZE);
    let x = digits
        .iter()
        .fold(Fp::from(0u64), |acc, &d| acc * radix + fp_from_u64(d));
    (x, digits)
}

fn timed<T>(label: &str, f: impl FnOnce() -> sumchain::Result<T>) -> Result<T> {
    tracing::info!("making proof {}", label);
    let start = Instant::now();
    let out = f()?;
    println!("{} time {:.3}s", label, start.elapsed().as_secs_f64());
    Ok(out)
}

fn run_benchmark(chain_len: usize, seed: Option<[u8; 32]>) -> Result<()> {
    let program = compile(seed)?;
    let four = fp_from_u64(4);

    let proof0 = timed("init", || program.init(Fp::from(0u64)))?;

    let (x, digits) = random_batch_witness();
    tracing::debug!(digits = ?digits, "batch witness");
    let batch_value = x * fp_from_u64(sumchain::BATCH_ROUNDS as u64);

    let batch_rand = timed("batch rand", || program.add_batch(batch_value, &proof0, x))?;
    let batch_zero = timed("batch zero", || {
        program.add_batch(batch_value, &batch_rand, Fp::from(0u64))
    })?;
    let proof1 = timed("proof 1", || program.add_number(batch_value + four, &batch_zero, four))?;
    let proof2 = timed("proof 2", || {
        program.merge(batch_value + batch_value + four, &proof1, &batch_rand)
    })?;
    println!("proof 2 data {}", fp_to_hex(&proof2.public_input()));

    let mut chain = Chain::from_proof(&program, proof2);
    for i in 0..chain_len {
        let label = format!("proof {}", i + 3);
        timed(&label, || chain.add_number(four).map(|_| ()))?;
        println!("{} data {}", label, fp_to_hex(&chain.value()));
    }

    let start = Instant::now();
    let json = chain.head().to_json()?;
    let ok = sumchain::verify(&Proof::from_json(&json)?, program.verification_key());
    println!("Verify time {:.3}s", start.elapsed().as_secs_f64());
    println!("ok {}", ok);

    if !ok {
        bail!("final proof failed verification");
    }
    Ok(())
}

fn analyze() -> Result<()> {
    let program = compile(None)?;
    println!("\n=== Method Analysis ({}) ===", program.config().name);
    for (method, stats) in program.analyze_methods() {
        println!("{:<10} {}", method.name(), stats);
    }
    Ok(())
}

fn prove_demo(out: &Path, seed: Option<[u8; 32]>) -> Result<()> {
    let program = compile(seed)?;

    let mut main = Chain::init(&program)?;
    main.add_batch(fp_from_u64(5))?;
    main.add_batch(Fp::from(0u64))?;
    main.add_number(fp_from_u64(4))?;

    let mut side = Chain::init(&program)?;
    side.add_batch(fp_from_u64(5))?;

    main.merge(side.head())?;
    tracing::info!("final value {}", fp_to_hex(&main.value()));

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    let proof_path = out.join("proof.json");
    let vk_path = out.join("vk.json");
    fs::write(&proof_path, main.head().to_json()?)?;
    fs::write(&vk_path, program.verification_key().to_json()?)?;

    println!("wrote {} and {}", proof_path.display(), vk_path.display());
    Ok(())
}

fn verify(proof_path: &Path, vk_path: &Path) -> Result<()> {
    let proof_json = fs::read_to_string(proof_path)
        .with_context(|| format!("reading {}", proof_path.display()))?;
    let vk_json = fs::read_to_string(vk_path)
        .with_context(|| format!("reading {}", vk_path.display()))?;

    let proof = Proof::from_json(&proof_json)?;
    let vk = VerificationKey::from_json(&vk_json)?;

    let start = Instant::now();
    let ok = sumchain::verify(&proof, &vk);
    println!("method {}", proof.method());
    println!("public input {}", fp_to_hex(&proof.public_input()));
    println!("Verify time {:.3}s", start.elapsed().as_secs_f64());
    println!("ok {}", ok);

    if !ok {
        bail!("proof failed verification");
    }
    Ok(())
}

fn show_info() {
    println!("sumchain - certified accumulator");
    println!();
    println!("Transitions:");
    println!("  init                 value = 0");
    println!("  addNumber            value = parent + x");
    println!("  addBatch             value = parent + {}·x ({}-bit witness)", sumchain::BATCH_ROUNDS, sumchain::BATCH_BITS);
    println!("  merge                value = left + right");
    println!();
    println!("Proving:");
    println!("  Field:               Pallas base field");
    println!("  Certificates:        ed25519 over SHA-256 statements");
    println!("  Program:             {}", sumchain::DEFAULT_PROGRAM_NAME);
}
