pub mod emu;
pub mod error;
pub mod perf;
pub mod report;
pub mod stats;
pub mod sweep;
pub mod topo;

pub use error::{PerfError, Result};

#[cfg(test)]
mod test;
