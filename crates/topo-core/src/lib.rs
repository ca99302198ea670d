//! Core types and definitions for the topographic map pipeline.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry primitives, colors, geographic bounds, the per-render
//! configuration snapshot, projected map features, and constants.
//! It has no dependency on any I/O, rendering, or async runtime.

pub mod config;
pub mod constants;
pub mod enums;
pub mod features;
pub mod types;

#[cfg(test)]
mod tests;
