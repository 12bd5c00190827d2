//! Run orchestration.

pub mod generator;

pub use generator::{GenerationReport, Generator, Stream, stream_seed};
