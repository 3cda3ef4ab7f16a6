use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cvxif_complex::{
    alu, Completion, Complex16, ComplexAlu, Coprocessor, CoprocessorConfig, Host, HostConfig,
    Instruction, Operation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpSel {
    Add,
    Conj,
    Both,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Randomized handshake regression for the complex coprocessor model"
)]
struct Opts {
    /// JSON run configuration; flags below override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(short, long)]
    seed: Option<u64>,
    /// Transactions per operation
    #[arg(short = 'n', long)]
    transactions: Option<usize>,
    #[arg(long, value_enum)]
    op: Option<OpSel>,
    /// Probability that result_ready is high on a given step
    #[arg(long)]
    ready_probability: Option<f64>,
    /// Write the per-step trace of the last transaction as JSON lines
    #[arg(long, value_name = "FILE")]
    trace_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    seed: u64,
    transactions: usize,
    op: OpSel,
    ready_probability: f64,
    coprocessor: CoprocessorConfig,
    host: HostConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            transactions: 1000,
            op: OpSel::Both,
            ready_probability: 0.5,
            coprocessor: CoprocessorConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl RunConfig {
    fn load(opts: &Opts) -> Result<Self> {
        let mut cfg = match &opts.config {
            Some(path) => {
                let txt = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?
            }
            None => RunConfig::default(),
        };
        if let Some(s) = opts.seed {
            cfg.seed = s;
        }
        if let Some(n) = opts.transactions {
            cfg.transactions = n;
        }
        if let Some(op) = opts.op {
            cfg.op = op;
        }
        if let Some(p) = opts.ready_probability {
            cfg.ready_probability = p;
        }
        anyhow::ensure!(
            cfg.ready_probability > 0.0 && cfg.ready_probability <= 1.0,
            "ready probability must be in (0, 1]"
        );
        Ok(cfg)
    }
}

fn random_complex(rng: &mut StdRng) -> Complex16 {
    Complex16::new(rng.gen(), rng.gen())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let cfg = RunConfig::load(&opts)?;
    info!(?cfg, "starting run");

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut ready_rng = StdRng::seed_from_u64(cfg.seed ^ 0x5EED);
    let cop = Coprocessor::new();
    let dec = cfg.coprocessor.decoder();
    let mut host = Host::new(cop, dec, ComplexAlu, cfg.host).with_trace(opts.trace_out.is_some());
    host.reset();

    let ops: &[Operation] = match cfg.op {
        OpSel::Add => &[Operation::Add],
        OpSel::Conj => &[Operation::Conjugate],
        OpSel::Both => &[Operation::Add, Operation::Conjugate],
    };

    let mut failures = 0usize;
    let mut total = 0usize;
    for &op in ops {
        // A foreign word first: must be turned away without further phases.
        let outcome = host.execute(0xDEAD_BEEF, &[], || true)?;
        anyhow::ensure!(
            outcome == Completion::Rejected,
            "0xdeadbeef was accepted: {outcome:?}"
        );

        let b = Complex16::new(3, 4);
        let instr = Instruction::new(op, 14, 14, 12).0;
        for _ in 0..cfg.transactions {
            let a = random_complex(&mut rng);
            let operands = [a, b];
            let p = cfg.ready_probability;
            let outcome = host.execute(instr, &operands[..op.operand_count()], || {
                ready_rng.gen_bool(p)
            })?;
            let rhs = (op == Operation::Add).then_some(b);
            let expected = alu::apply(op, a, rhs);
            total += 1;
            match outcome.result() {
                Some(got) if got == expected => {}
                got => {
                    failures += 1;
                    warn!(?op, %a, %b, %expected, ?got, "mismatch");
                }
            }
        }
    }

    if let Some(path) = &opts.trace_out {
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for step in host.trace() {
            serde_json::to_writer(&mut f, step)?;
            writeln!(f)?;
        }
    }

    println!(
        "{total} transactions, {failures} failures, {} cycles",
        host.cop.cycle()
    );
    anyhow::ensure!(failures == 0, "{failures} result mismatches");
    Ok(())
}
