use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::Path;

use cvxif_complex::decoder::{CvxifDecoder, Decoder};
use cvxif_complex::disasm::fmt_decoded;
use cvxif_disasm::{load_raw_bin, read_u32};

#[derive(Parser, Debug)]
#[command(author, version, about = "Complex coprocessor disassembler CLI", long_about=None)]
struct Cli {
    /// Load address for the binary in target address space
    #[arg(long, default_value_t = 0u32)]
    base: u32,
    /// Skip N bytes at start of file before loading
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Limit bytes loaded (default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Major opcode claimed by the coprocessor
    #[arg(long, default_value_t = 0x7B)]
    opcode: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded segments
    Sections,
    /// Disassemble a range [start, end) in bytes
    Range {
        /// Start address (hex or dec)
        start: String,
        /// End address (hex or dec, exclusive); defaults to end of image
        end: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

#[derive(Debug, Clone, serde::Serialize)]
struct InsnOut {
    addr: u32,
    word: u32,
    text: String,
    accepted: bool,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let img = load_raw_bin(Path::new(&cli.input), cli.base, cli.skip, cli.len)?;

    match cli.cmd {
        Command::Sections => {
            println!("{:<10} {:<10} {:<10}", "name", "start", "end");
            for s in &img.segments {
                let (start, end) = (s.base, s.end());
                println!("{:<10} {start:#010x} {end:#010x}", s.name);
            }
        }
        Command::Range { start, end, format, out } => {
            let start = parse_u32(&start)?;
            let end = match end {
                Some(e) => parse_u32(&e)?,
                None => img.end(),
            };
            anyhow::ensure!(end >= start, "end must be >= start");

            let dec = CvxifDecoder::with_opcode(cli.opcode);
            let mut insns = Vec::new();
            let mut pc = start;
            while pc < end {
                let Some(word) = read_u32(&img, pc) else { break };
                let (text, accepted) = match dec.decode(word) {
                    Ok(d) => (fmt_decoded(&d), true),
                    Err(_) => (format!(".word {word:#010x}"), false),
                };
                insns.push(InsnOut { addr: pc, word, text, accepted });
                pc = pc.wrapping_add(4);
            }

            let buf = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&insns)?,
                OutputFormat::Text => {
                    let mut buf = String::new();
                    for i in &insns {
                        let _ = writeln!(buf, "{:#010x}: {:08x}  {}", i.addr, i.word, i.text);
                    }
                    if pc < end { let _ = writeln!(buf, "{pc:#010x}: <oob>"); }
                    buf
                }
            };
            if let Some(path) = out { std::fs::write(path, buf)?; } else { print!("{}", buf); }
        }
    }

    Ok(())
}
