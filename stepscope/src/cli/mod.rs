//! Command-line interface for the `stepscope` binary

mod args;

pub use args::{Args, Command};
