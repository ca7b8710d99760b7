//! CLI commands module.

mod bench;
mod pipe;

pub use bench::BenchCommand;
pub use pipe::PipeCommand;
