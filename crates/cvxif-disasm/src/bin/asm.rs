use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use cvxif_disasm::assemble;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assembler for the complex coprocessor instructions")]
struct Opts {
    /// Input assembly file (one instruction or directive per line)
    #[arg(short, long)]
    input: PathBuf,
    /// Output binary file (little-endian words)
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let bytes = assemble(&src)?;
    fs::write(&opts.output, &bytes)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    println!("wrote {} words to {}", bytes.len() / 4, opts.output.display());
    Ok(())
}
