//! Capture analysis: run the decoder, parse its columns, aggregate per protocol.

pub mod aggregator;
pub mod parser;
pub mod tshark;

pub use aggregator::Analyzer;
