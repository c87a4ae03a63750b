//! Benchmarks for the `st-engine` runtime core.
