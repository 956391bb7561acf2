//! qryc CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`, which writes the
//! JSON envelope. Errors are repeated on stderr and exit non-zero.

use qryc::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
