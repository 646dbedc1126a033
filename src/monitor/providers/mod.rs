// src/monitor/providers/mod.rs
pub mod fixture;

pub use fixture::FixtureSearch;
