//! Throughput benchmarking against a local runtime

pub mod runner;

pub use runner::{BenchError, BenchmarkResult, BenchmarkRunner};
