#![warn(clippy::all, rust_2018_idioms)]

use std::{io::Read, path::PathBuf};

use anyhow::Context;
use clap::Parser;

/// Compile a formula into a point-free card listing.
#[derive(Parser)]
struct Args {
    /// Formula file; reads stdin when omitted
    #[arg(value_name = "FILE")]
    formula: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Log to stdout (if you run with `RUST_LOG=debug`).
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let source = match &args.formula {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("could not read stdin")?;
            buffer
        }
    };

    let listing = cardc_core::compile_to_string(&source)?;
    println!("{listing}");

    Ok(())
}
