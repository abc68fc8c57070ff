//! Command-line interface for logdetective-eval.
//!
//! One invocation form: evaluate a corpus against a live analyzer and judge,
//! then print the aggregate report.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
