//! Multi-region sampling pipeline: area table, allocation, per-region sampling.
pub mod events;
pub mod runner;
pub mod seed;
