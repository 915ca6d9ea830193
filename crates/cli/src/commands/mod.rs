//! CLI commands for the put-call parity checker.

pub mod check;
pub mod evaluate;

pub use check::{run_check, CheckArgs};
pub use evaluate::{run_evaluate, EvaluateArgs};
