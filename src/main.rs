//! Account ledger CLI
//!
//! ```bash
//! cargo run -- --accounts accounts.csv postings.csv > ledger.csv
//! cargo run -- --accounts accounts.csv --strategy async --batch-size 2000 postings.csv > ledger.csv
//! LEDGER_ISOLATION=optimistic LEDGER_LOG_LEVEL=debug cargo run -- --accounts accounts.csv postings.csv
//! ```
//!
//! Seeds the ledger from the accounts file, posts every row of the postings
//! file and writes the resulting ledger rows to stdout. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, unreadable or malformed accounts file, etc.)

use account_ledger::{cli, strategy, telemetry};
use std::process;

fn main() {
    let args = cli::parse_args();
    telemetry::init(&args.log_level, args.log_format);

    let strategy = {
        let batch = if args.strategy == cli::StrategyType::Async {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, batch, args.to_ledger_config())
    };

    let input = strategy::LedgerInput::new(&args.accounts_file, &args.postings_file);
    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&input, &mut output) {
        tracing::error!(error = %e, "ledger run failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
