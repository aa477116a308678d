use anyhow::Result;
use clap::Parser;
use statement_pipeline::{Config, run};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "betterment2ofx",
    about = "Convert a Betterment PDF statement into an OFX 2.2 document."
)]
struct Args {
    /// Path to the statement PDF
    statement: PathBuf,

    /// Write the OFX document here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat the input as pre-extracted statement text instead of a PDF
    #[arg(long)]
    from_text: bool,
}

fn main() -> Result<()> {
    // Diagnostics go to stderr; the financial document owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let summary = run(&Config {
        input: args.statement,
        output: args.output,
        from_text: args.from_text,
    })?;

    if summary.degraded() {
        eprintln!(
            "✓ Converted with {} diagnostics: {} accounts, {} securities, {} transactions",
            summary.diagnostics.len(),
            summary.accounts,
            summary.securities,
            summary.transactions
        );
    } else {
        eprintln!(
            "✓ Converted: {} accounts, {} securities, {} transactions",
            summary.accounts, summary.securities, summary.transactions
        );
    }
    Ok(())
}
