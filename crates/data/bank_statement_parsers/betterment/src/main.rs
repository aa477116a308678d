use anyhow::{Context, Result};
use betterment_parser::BettermentParser;
use std::env;

fn main() -> Result<()> {
    // Usage:
    //   betterment_parser <statement.pdf> [--text]
    //
    // With --text the input is treated as already-extracted statement text
    // instead of a PDF. Prints the classified, pre-reconciliation model as
    // JSON for inspection.

    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1).filter(|a| !a.starts_with("--")) else {
        anyhow::bail!("usage: betterment_parser <statement.pdf> [--text]");
    };

    let parser = BettermentParser::new();
    let stmt = if args.iter().any(|a| a == "--text") {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path))?;
        parser.parse_text(&text)?
    } else {
        parser.parse_file(path)?
    };

    println!(
        "✓ Parsed: {} accounts, {} securities, {} holdings, {} txns",
        stmt.accounts.len(),
        stmt.securities.len(),
        stmt.holdings.len(),
        stmt.transactions.len()
    );
    for account in &stmt.accounts {
        println!("  {} => {}", account.account_id, account.name);
    }
    for diagnostic in &stmt.diagnostics {
        eprintln!("⚠ {}", diagnostic);
    }

    println!("{}", serde_json::to_string_pretty(&stmt.transactions)?);
    Ok(())
}
