//! Observability setup for Murmur binaries.

pub mod tracing_setup;
